//! Command types for the IBus protocol
//!
//! Commands are divided into two categories:
//! - Controller → Receiver: servo channel updates, telemetry polls
//! - Receiver → Controller: telemetry replies
//!
//! Poll and reply command bytes carry the sensor slot in the low nibble and
//! the sub-command in the high nibble.

use core::slice::ChunksExact;

use crate::frame::{checksum, Frame, FrameError, PROTOCOL_OVERHEAD};
use crate::sensor::SensorType;

// Command IDs: Controller → Receiver
pub const CMD_SET_CHANNELS: u8 = 0x40;
pub const CMD_DISCOVER: u8 = 0x80;
pub const CMD_TYPE: u8 = 0x90;
pub const CMD_VALUE: u8 = 0xA0;

/// Fixed third byte of a type reply
pub const TYPE_REPLY_RESERVED: u8 = 0x02;

/// Largest telemetry reply on the wire
pub const MAX_REPLY_SIZE: usize = 6;

const ADDRESS_MASK: u8 = 0x0F;
const SUBCOMMAND_MASK: u8 = 0xF0;

/// Commands parsed from controller-originated frames
#[derive(Debug, Clone)]
pub enum Command<'a> {
    /// New servo channel values
    SetChannels(ChannelValues<'a>),
    /// Single-byte telemetry poll
    Poll(Poll),
    /// Anything else; ignored by receivers
    Other(u8),
}

impl<'a> Command<'a> {
    /// Classify a validated frame
    ///
    /// Channel updates are recognised first. Only one-byte frames are polls.
    pub fn from_frame(frame: &'a Frame) -> Self {
        let command = frame.command();
        if command == CMD_SET_CHANNELS {
            Command::SetChannels(ChannelValues::new(frame.data()))
        } else if frame.data().is_empty() {
            Command::Poll(Poll::from_byte(command))
        } else {
            Command::Other(command)
        }
    }
}

/// Little-endian channel values following a set-channels command byte
///
/// A trailing odd byte is not a channel and is skipped.
#[derive(Debug, Clone)]
pub struct ChannelValues<'a> {
    chunks: ChunksExact<'a, u8>,
}

impl<'a> ChannelValues<'a> {
    /// Iterate the channel values in `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            chunks: data.chunks_exact(2),
        }
    }
}

impl Iterator for ChannelValues<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        self.chunks
            .next()
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for ChannelValues<'_> {}

/// Telemetry sub-command selected by the high nibble of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollKind {
    /// Is a sensor present at this slot?
    Discover,
    /// What type is the sensor?
    Type,
    /// What is the current reading?
    Value,
    /// Unrecognised sub-command, never answered
    Unknown(u8),
}

impl PollKind {
    fn from_subcommand(subcommand: u8) -> Self {
        match subcommand {
            CMD_DISCOVER => PollKind::Discover,
            CMD_TYPE => PollKind::Type,
            CMD_VALUE => PollKind::Value,
            other => PollKind::Unknown(other),
        }
    }

    fn subcommand(self) -> u8 {
        match self {
            PollKind::Discover => CMD_DISCOVER,
            PollKind::Type => CMD_TYPE,
            PollKind::Value => CMD_VALUE,
            PollKind::Unknown(other) => other & SUBCOMMAND_MASK,
        }
    }
}

/// Telemetry poll addressed to one sensor slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Poll {
    /// Requested sub-command
    pub kind: PollKind,
    /// Sensor slot, 1-based; 0 is never a valid sensor
    pub address: u8,
}

impl Poll {
    /// Split a poll command byte into sub-command and address
    pub fn from_byte(byte: u8) -> Self {
        Self {
            kind: PollKind::from_subcommand(byte & SUBCOMMAND_MASK),
            address: byte & ADDRESS_MASK,
        }
    }

    /// Wire format command byte
    pub fn to_byte(self) -> u8 {
        self.kind.subcommand() | (self.address & ADDRESS_MASK)
    }

    /// Encode this poll into a frame (for testing or controller simulation)
    pub fn to_frame(self) -> Result<Frame, FrameError> {
        Frame::new(&[self.to_byte()])
    }
}

/// Reply sent by a receiver in answer to a telemetry poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryReply {
    /// Echo confirming a sensor exists at `address`
    Discover { address: u8 },
    /// Type of the sensor at `address`
    Type { address: u8, sensor_type: SensorType },
    /// Current reading of the sensor at `address`
    Value { address: u8, value: u16 },
}

impl TelemetryReply {
    /// Slot this reply answers for
    pub fn address(&self) -> u8 {
        match *self {
            TelemetryReply::Discover { address }
            | TelemetryReply::Type { address, .. }
            | TelemetryReply::Value { address, .. } => address,
        }
    }

    /// Command byte followed by reply data
    fn payload(&self) -> ([u8; 3], usize) {
        match *self {
            TelemetryReply::Discover { address } => {
                ([CMD_DISCOVER | (address & ADDRESS_MASK), 0, 0], 1)
            }
            TelemetryReply::Type {
                address,
                sensor_type,
            } => (
                [
                    CMD_TYPE | (address & ADDRESS_MASK),
                    sensor_type.to_byte(),
                    TYPE_REPLY_RESERVED,
                ],
                3,
            ),
            TelemetryReply::Value { address, value } => {
                let [low, high] = value.to_le_bytes();
                ([CMD_VALUE | (address & ADDRESS_MASK), low, high], 3)
            }
        }
    }

    /// Encode this reply into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let (payload, len) = self.payload();
        Frame::new(&payload[..len])
    }

    /// Encode this reply straight to wire bytes
    ///
    /// Replies are always small enough to fit, so unlike [`Frame::encode`]
    /// this cannot fail.
    pub fn to_bytes(&self) -> ReplyBytes {
        let (payload, len) = self.payload();
        let length = len as u8 + PROTOCOL_OVERHEAD;
        let [low, high] = checksum(length, &payload[..len]).to_le_bytes();

        let mut buf = [0u8; MAX_REPLY_SIZE];
        buf[0] = length;
        buf[1..=len].copy_from_slice(&payload[..len]);
        buf[len + 1] = low;
        buf[len + 2] = high;

        ReplyBytes { buf, len: length }
    }

    /// Parse a reply from a frame (controller side)
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let command = frame.command();
        let address = command & ADDRESS_MASK;
        match (command & SUBCOMMAND_MASK, frame.data()) {
            (CMD_DISCOVER, []) => Ok(TelemetryReply::Discover { address }),
            (CMD_TYPE, [sensor_type, _reserved]) => Ok(TelemetryReply::Type {
                address,
                sensor_type: SensorType::from_byte(*sensor_type),
            }),
            (CMD_VALUE, [low, high]) => Ok(TelemetryReply::Value {
                address,
                value: u16::from_le_bytes([*low, *high]),
            }),
            _ => Err(FrameError::UnexpectedCommand(command)),
        }
    }
}

/// Encoded telemetry reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyBytes {
    buf: [u8; MAX_REPLY_SIZE],
    len: u8,
}

impl ReplyBytes {
    /// Bytes to put on the wire
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

impl core::ops::Deref for ReplyBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}
