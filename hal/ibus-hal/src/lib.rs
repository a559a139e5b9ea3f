//! IBus Hardware Abstraction Layer
//!
//! This crate defines the capabilities the IBus receiver borrows from the
//! board it runs on. The receiver never touches a peripheral directly, so
//! the same decoding logic runs against a real UART, a USB serial bridge or
//! an in-memory test harness.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (ibus-firmware, etc.)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ibus-receiver (decoder + telemetry)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ibus-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ibus-hal-rp2040 / host test doubles    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartRx`], [`uart::UartTx`] - Non-blocking byte source and byte sink
//! - [`clock::Clock`] - Monotonic millisecond counter for gap detection
//! - [`DelayNs`] - Blocking delay for the telemetry reply guard (from `embedded-hal`)

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod io;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use embedded_hal::delay::DelayNs;
pub use io::IoUart;
pub use uart::{Uart, UartConfig, UartRx, UartTx};
