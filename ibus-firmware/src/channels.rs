//! Inter-task communication signals
//!
//! Uses embassy-sync primitives so the receiver task never blocks on its
//! neighbours.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use ibus_receiver::{Counters, PROTOCOL_CHANNELS};

/// Snapshot of the servo channels and counters
#[derive(Clone, Copy)]
pub struct ChannelSnapshot {
    pub channels: [u16; PROTOCOL_CHANNELS],
    pub counters: Counters,
}

/// Latest channel snapshot (updated by receiver task)
pub static CHANNELS: Signal<CriticalSectionRawMutex, ChannelSnapshot> = Signal::new();

/// Temperature reading signal (updated by sensor task)
/// Value is temperature in 0.1°C units (e.g., 450 = 45.0°C)
pub static TEMP_READING: Signal<CriticalSectionRawMutex, i16> = Signal::new();

/// Supply voltage signal (updated by sensor task), 0.01 V units
pub static VSYS_READING: Signal<CriticalSectionRawMutex, u16> = Signal::new();
