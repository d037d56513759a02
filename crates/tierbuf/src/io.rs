// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, Read, Write};

use crate::{Buffer, Error};

/// Adapter that implements [`Read`] and [`Write`] for any [`Buffer`].
///
/// The buffer's boundary signals are translated to the conventions of `std::io`:
///
/// * Reading from an empty buffer returns `Ok(0)`, the standard end-of-stream marker.
/// * A write that stores only part of its input returns the short count, so
///   [`Write::write_all`] keeps retrying with the remainder.
/// * A write that stores nothing fails with [`io::ErrorKind::WriteZero`].
///
/// This makes it possible to pump data through buffers with [`std::io::copy`].
///
/// # Example
///
/// ```
/// use std::io::{Read, Write};
///
/// use tierbuf::{BufferIo, MemoryBuffer};
///
/// let mut io = BufferIo::new(MemoryBuffer::new(16));
/// io.write_all(b"hello").unwrap();
///
/// let mut text = String::new();
/// io.read_to_string(&mut text).unwrap();
/// assert_eq!(text, "hello");
/// ```
#[derive(Debug)]
pub struct BufferIo<B> {
    inner: B,
}

impl<B: Buffer> BufferIo<B> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: B) -> Self {
        Self { inner }
    }

    /// References the wrapped buffer.
    #[must_use]
    pub const fn get_ref(&self) -> &B {
        &self.inner
    }

    /// Mutably references the wrapped buffer.
    #[must_use]
    pub const fn get_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    /// Consumes the adapter and returns the wrapped buffer.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: Buffer> Read for BufferIo<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(Error::EndOfStream) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl<B: Buffer> Write for BufferIo<B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        match self.inner.write(buf) {
            Ok(n) | Err(Error::Full { written: n @ 1.. }) => Ok(n),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Buffers have nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
