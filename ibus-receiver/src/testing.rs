//! In-memory doubles for the hardware capabilities

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use ibus_hal::{Clock, DelayNs, UartRx, UartTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeUartError;

#[derive(Debug, Default)]
struct UartState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Loopback-free UART; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeUart {
    state: Rc<RefCell<UartState>>,
}

impl FakeUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the receiver to read
    pub fn push_rx(&self, bytes: &[u8]) {
        self.state.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Bytes not yet read
    pub fn pending(&self) -> usize {
        self.state.borrow().rx.len()
    }

    /// Everything written so far
    pub fn written(&self) -> Vec<u8> {
        self.state.borrow().tx.clone()
    }

    pub fn fail_reads(&self) {
        self.state.borrow_mut().fail_reads = true;
    }

    pub fn fail_writes(&self) {
        self.state.borrow_mut().fail_writes = true;
    }
}

impl UartRx for FakeUart {
    type Error = FakeUartError;

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        let state = self.state.borrow();
        if state.fail_reads {
            return Err(FakeUartError);
        }
        Ok(state.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        self.state.borrow_mut().rx.pop_front().ok_or(FakeUartError)
    }
}

impl UartTx for FakeUart {
    type Error = FakeUartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(FakeUartError);
        }
        state.tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Manually advanced millisecond clock; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<u32>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

/// Delay that records instead of waiting; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeDelay {
    calls: Rc<Cell<u32>>,
    total_ns: Rc<Cell<u64>>,
}

impl FakeDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn total_ns(&self) -> u64 {
        self.total_ns.get()
    }

    fn record(&self, ns: u64) {
        self.calls.set(self.calls.get() + 1);
        self.total_ns.set(self.total_ns.get() + ns);
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.record(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.record(us as u64 * 1_000);
    }
}
