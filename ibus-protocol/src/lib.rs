//! FlySky IBus Protocol
//!
//! This crate defines the wire format spoken between an RC controller and an
//! IBus receiver. A single half-duplex UART line carries servo channel
//! frames from the controller and, in the gaps between them, telemetry
//! polls that a receiver answers with sensor readings.
//!
//! # Protocol Overview
//!
//! Every message uses the same frame layout:
//! ```text
//! ┌────────┬─────────┬─────────────┬──────────────┐
//! │ LENGTH │ COMMAND │ PAYLOAD     │ CHECKSUM     │
//! │ 1B     │ 1B      │ 0–28B       │ 2B (LE)      │
//! └────────┴─────────┴─────────────┴──────────────┘
//! ```
//!
//! LENGTH counts the whole frame. The checksum is `0xFFFF` minus the sum of
//! every byte before it. Frames are delimited by line silence rather than a
//! start byte, so the decoder resynchronises whenever the line goes quiet.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod frame;
pub mod sensor;

pub use command::{
    ChannelValues, Command, Poll, PollKind, ReplyBytes, TelemetryReply, CMD_DISCOVER,
    CMD_SET_CHANNELS, CMD_TYPE, CMD_VALUE, MAX_REPLY_SIZE,
};
pub use frame::{
    checksum, DecoderState, Frame, FrameDecoder, FrameError, FRAME_GAP_MS, MAX_FRAME_SIZE,
    MAX_PAYLOAD_SIZE, PROTOCOL_MAX_LENGTH, PROTOCOL_OVERHEAD,
};
pub use sensor::{raw_to_temperature, temperature_to_raw, SensorType};
