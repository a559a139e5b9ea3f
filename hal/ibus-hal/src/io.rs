//! Adapter from `embedded-io` streams to the receiver's UART traits
//!
//! Most HALs expose their buffered UARTs through `embedded-io`. `ReadReady`
//! only says whether data is pending, so [`IoUart`] reports one byte at a
//! time; the receiver keeps polling until the stream runs dry.

use embedded_io::{Read, ReadExactError, ReadReady, Write};

use crate::uart::{UartRx, UartTx};

/// Wraps any `embedded-io` stream as an IBus transport
#[derive(Debug)]
pub struct IoUart<T> {
    inner: T,
}

impl<T> IoUart<T> {
    /// Wrap a stream
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped stream
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the wrapped stream
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the stream
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + ReadReady> UartRx for IoUart<T> {
    type Error = ReadExactError<T::Error>;

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        let ready = self.inner.read_ready().map_err(ReadExactError::Other)?;
        Ok(usize::from(ready))
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

impl<T: Write> UartTx for IoUart<T> {
    type Error = T::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}
