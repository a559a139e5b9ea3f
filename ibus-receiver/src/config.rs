//! Receiver configuration
//!
//! Small enough to live in a const, and serializable with postcard when the
//! `serde` feature is enabled so boards can persist it alongside other
//! settings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use ibus_protocol::FRAME_GAP_MS;

/// Pause before a telemetry reply, in microseconds
///
/// Gives the controller time to release the shared line after its poll.
pub const DEFAULT_REPLY_GUARD_US: u32 = 100;

/// Receiver behaviour settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReceiverConfig {
    /// Answer telemetry polls
    pub telemetry_enabled: bool,
    /// Line silence that starts a new frame (ms)
    pub frame_gap_ms: u32,
    /// Pause before each telemetry reply (µs)
    pub reply_guard_us: u32,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverConfig {
    /// Servo-only receiver with protocol timing
    pub const fn new() -> Self {
        Self {
            telemetry_enabled: false,
            frame_gap_ms: FRAME_GAP_MS,
            reply_guard_us: DEFAULT_REPLY_GUARD_US,
        }
    }

    /// Enable or disable telemetry replies
    pub const fn with_telemetry(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = enabled;
        self
    }

    /// Override the frame gap
    pub const fn with_frame_gap_ms(mut self, frame_gap_ms: u32) -> Self {
        self.frame_gap_ms = frame_gap_ms;
        self
    }

    /// Override the reply guard delay
    pub const fn with_reply_guard_us(mut self, reply_guard_us: u32) -> Self {
        self.reply_guard_us = reply_guard_us;
        self
    }
}
