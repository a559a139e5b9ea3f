//! Board-agnostic FlySky IBus receiver
//!
//! This crate turns a byte stream from an IBus controller into servo
//! channel values and answers the controller's telemetry polls:
//!
//! - Channel store holding the last value of every servo channel
//! - Sensor registry addressed by 1-based slot
//! - Telemetry responder that frames and sends replies
//! - [`IbusReceiver`], which drives all of the above from a UART
//!
//! The receiver is polled. Call [`IbusReceiver::process`] often enough that
//! the UART never overflows, typically once per millisecond.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod channels;
pub mod config;
pub mod error;
pub mod receiver;
pub mod sensors;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use channels::{ChannelStore, PROTOCOL_CHANNELS};
pub use config::ReceiverConfig;
pub use error::{ProcessError, ReceiverError};
pub use receiver::{Counters, IbusReceiver};
pub use sensors::{Sensor, SensorRegistry, MAX_SENSORS, MAX_SENSOR_SLOT};
pub use telemetry::TelemetryResponder;

pub use ibus_protocol::SensorType;
