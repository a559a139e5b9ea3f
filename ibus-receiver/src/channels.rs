//! Servo channel storage
//!
//! Holds the last value received for each channel. Values are only written
//! after a whole frame passed its checksum, so readers never see a mix of
//! two frames.

/// Channels kept by a default receiver
pub const PROTOCOL_CHANNELS: usize = 10;

/// Last-known servo channel values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStore<const N: usize = PROTOCOL_CHANNELS> {
    values: [u16; N],
}

impl<const N: usize> Default for ChannelStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChannelStore<N> {
    /// Create a store with every channel at zero
    pub const fn new() -> Self {
        Self { values: [0; N] }
    }

    /// Number of channels kept
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Value of channel `index`, or 0 if there is no such channel
    pub fn get(&self, index: usize) -> u16 {
        self.values.get(index).copied().unwrap_or(0)
    }

    /// All channel values, in channel order
    pub fn as_slice(&self) -> &[u16] {
        &self.values
    }

    /// Overwrite channels from the start with `values`
    ///
    /// Values beyond the store's capacity are dropped; channels not covered
    /// by `values` keep their previous value. Returns the number written.
    pub fn update<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = u16>,
    {
        let mut written = 0;
        for (slot, value) in self.values.iter_mut().zip(values) {
            *slot = value;
            written += 1;
        }
        written
    }
}
