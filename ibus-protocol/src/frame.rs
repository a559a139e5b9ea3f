//! Frame encoding and decoding for the IBus protocol.
//!
//! Frame format:
//! - LENGTH (1 byte): total frame size, overhead included (4-32)
//! - PAYLOAD (1-29 bytes): command byte followed by command data
//! - CHECKSUM (2 bytes, little-endian): 0xFFFF minus the sum of LENGTH and PAYLOAD
//!
//! There is no start byte. A receiver knows a new frame begins because the
//! line has been silent for at least [`FRAME_GAP_MS`].

use heapless::Vec;

/// Largest value the LENGTH byte may carry
pub const PROTOCOL_MAX_LENGTH: u8 = 0x20;

/// Bytes of every frame not available for payload (LENGTH + CHECKSUM)
pub const PROTOCOL_OVERHEAD: u8 = 3;

/// Maximum payload size in bytes, command byte included
pub const MAX_PAYLOAD_SIZE: usize = (PROTOCOL_MAX_LENGTH - PROTOCOL_OVERHEAD) as usize;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = PROTOCOL_MAX_LENGTH as usize;

/// Line silence that marks a frame boundary
pub const FRAME_GAP_MS: u32 = 3;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// LENGTH byte outside `(PROTOCOL_OVERHEAD, PROTOCOL_MAX_LENGTH]`
    InvalidLength(u8),
    /// Transmitted checksum does not match the frame contents
    ChecksumMismatch { expected: u16, received: u16 },
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Payload has no command byte
    EmptyPayload,
    /// Frame does not carry the expected command
    UnexpectedCommand(u8),
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Compute the IBus checksum over a LENGTH byte and payload
pub fn checksum(length: u8, payload: &[u8]) -> u16 {
    payload
        .iter()
        .fold(0xFFFFu16.wrapping_sub(length as u16), |acc, &byte| {
            acc.wrapping_sub(byte as u16)
        })
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a frame from a payload whose first byte is the command
    pub fn new(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.is_empty() {
            return Err(FrameError::EmptyPayload);
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            payload: payload_vec,
        })
    }

    /// Command byte
    pub fn command(&self) -> u8 {
        self.payload[0]
    }

    /// Full payload, command byte included
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload bytes following the command byte
    pub fn data(&self) -> &[u8] {
        &self.payload[1..]
    }

    /// Value of the LENGTH byte for this frame
    pub fn length(&self) -> u8 {
        self.payload.len() as u8 + PROTOCOL_OVERHEAD
    }

    /// Checksum transmitted after the payload
    pub fn checksum(&self) -> u16 {
        checksum(self.length(), &self.payload)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.length() as usize;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let end = 1 + self.payload.len();
        let [low, high] = self.checksum().to_le_bytes();

        buffer[0] = self.length();
        buffer[1..end].copy_from_slice(&self.payload);
        buffer[end] = low;
        buffer[end + 1] = high;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Decoder position within a frame
///
/// Each variant carries what the next byte needs. `checksum` is the running
/// accumulator, already reduced by every byte seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    /// Ignoring bytes until the line goes quiet
    Discarding,
    /// Next byte is a LENGTH byte
    AwaitingLength,
    /// Collecting `expected` payload bytes
    AccumulatingPayload { expected: u8, checksum: u16 },
    /// Next byte is the checksum low byte
    AwaitingChecksumLow { checksum: u16 },
    /// Next byte is the checksum high byte
    AwaitingChecksumHigh { checksum: u16, low: u8 },
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecoderState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    last_byte_ms: u32,
    frame_gap_ms: u32,
}

impl FrameDecoder {
    /// Create a decoder at time `now_ms`
    ///
    /// The decoder starts out discarding, so a frame already in flight when
    /// it comes up is skipped rather than misread.
    pub fn new(now_ms: u32) -> Self {
        Self::with_frame_gap(now_ms, FRAME_GAP_MS)
    }

    /// Create a decoder with a non-standard frame gap
    ///
    /// A gap of zero would resynchronise on every byte, so it is raised to 1 ms.
    pub fn with_frame_gap(now_ms: u32, frame_gap_ms: u32) -> Self {
        Self {
            state: DecoderState::Discarding,
            buffer: Vec::new(),
            last_byte_ms: now_ms,
            frame_gap_ms: frame_gap_ms.max(1),
        }
    }

    /// Current decoder state
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Silence that resynchronises the decoder
    pub fn frame_gap_ms(&self) -> u32 {
        self.frame_gap_ms
    }

    /// Abandon any partial frame and expect a LENGTH byte next
    pub fn resync(&mut self) {
        self.state = DecoderState::AwaitingLength;
        self.buffer.clear();
    }

    /// Feed a single byte received at `now_ms`
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Result<Option<Frame>, FrameError> {
        if now_ms.wrapping_sub(self.last_byte_ms) >= self.frame_gap_ms {
            self.resync();
        }
        self.last_byte_ms = now_ms;

        match self.state {
            DecoderState::Discarding => Ok(None),
            DecoderState::AwaitingLength => {
                if byte <= PROTOCOL_OVERHEAD || byte > PROTOCOL_MAX_LENGTH {
                    self.state = DecoderState::Discarding;
                    return Err(FrameError::InvalidLength(byte));
                }
                self.buffer.clear();
                self.state = DecoderState::AccumulatingPayload {
                    expected: byte - PROTOCOL_OVERHEAD,
                    checksum: 0xFFFF - byte as u16,
                };
                Ok(None)
            }
            DecoderState::AccumulatingPayload { expected, checksum } => {
                // Cannot overflow: expected never exceeds MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                let checksum = checksum.wrapping_sub(byte as u16);
                self.state = if self.buffer.len() == expected as usize {
                    DecoderState::AwaitingChecksumLow { checksum }
                } else {
                    DecoderState::AccumulatingPayload { expected, checksum }
                };
                Ok(None)
            }
            DecoderState::AwaitingChecksumLow { checksum } => {
                self.state = DecoderState::AwaitingChecksumHigh { checksum, low: byte };
                Ok(None)
            }
            DecoderState::AwaitingChecksumHigh { checksum, low } => {
                self.state = DecoderState::Discarding;
                let received = u16::from_le_bytes([low, byte]);
                let payload = core::mem::take(&mut self.buffer);

                if received != checksum {
                    return Err(FrameError::ChecksumMismatch {
                        expected: checksum,
                        received,
                    });
                }
                Ok(Some(Frame { payload }))
            }
        }
    }

    /// Feed multiple bytes that all arrived at `now_ms`
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8], now_ms: u32) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte, now_ms)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
