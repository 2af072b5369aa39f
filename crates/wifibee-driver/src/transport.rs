//! Byte stream abstraction.
//!
//! The platform supplies the UART (or a bridge to it); the driver only needs
//! non-blocking reads and blocking writes.

use std::io;

/// A duplex byte stream to the WifiBee.
pub trait ByteTransport {
    /// Number of bytes that can be read without waiting.
    fn available(&mut self) -> usize;

    /// Read one byte if one is available.
    fn read(&mut self) -> Option<u8>;

    /// Write all of `data`.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush buffered output.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for Box<T> {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
