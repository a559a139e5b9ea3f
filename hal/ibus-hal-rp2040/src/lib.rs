//! RP2040 bindings for the IBus receiver
//!
//! This crate provides RP2040 implementations of the `ibus-hal`
//! capabilities:
//! - Millisecond clock backed by the embassy time driver
//! - UART configuration conversion
//! - Buffered UART transport

#![no_std]

pub mod clock;
pub mod uart;

pub use clock::EmbassyClock;
pub use uart::{embassy_config, transport, BufferedTransport};
