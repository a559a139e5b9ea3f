//! Receiver errors
//!
//! Protocol problems (bad length, bad checksum, unknown polls) are absorbed
//! by the receiver and show up only in its counters. The transport is the
//! only thing that can make [`crate::IbusReceiver::process`] fail.

use ibus_hal::{UartRx, UartTx};

/// Transport failure while driving the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiverError<R, W> {
    /// Reading from the UART failed
    Read(R),
    /// Writing a telemetry reply failed
    Write(W),
}

/// Error returned by `process` for a given UART type
pub type ProcessError<U> = ReceiverError<<U as UartRx>::Error, <U as UartTx>::Error>;
