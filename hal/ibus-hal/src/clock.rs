//! Time source abstraction
//!
//! The decoder only needs to know how long the line has been silent, so a
//! free-running millisecond counter is enough. Implementations may wrap;
//! consumers compare timestamps with wrapping arithmetic.

/// Monotonic millisecond counter
pub trait Clock {
    /// Current time in milliseconds since an arbitrary epoch
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
