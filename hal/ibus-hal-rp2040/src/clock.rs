//! Clock backed by `embassy-time`

use embassy_time::Instant;
use ibus_hal::Clock;

/// Millisecond clock reading the embassy time driver
///
/// Truncated to 32 bits; the receiver only compares nearby timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl EmbassyClock {
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
