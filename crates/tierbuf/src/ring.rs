// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::trace;

use crate::{Buffer, BufferAt, Result};

/// A bounded buffer that makes room for new bytes by evicting the oldest unread ones.
///
/// Writes never fail for lack of space. When the wrapped buffer cannot take a write, exactly
/// enough of its oldest unread bytes are discarded first. A single write larger than the
/// capacity keeps only its trailing `capacity` bytes. Reads, length and capacity are those of
/// the wrapped buffer.
///
/// # Example
///
/// ```
/// use tierbuf::{Buffer, MemoryBuffer, Ring};
///
/// let mut ring = Ring::new(MemoryBuffer::new(4));
/// ring.write(b"abcd").unwrap();
/// ring.write(b"ef").unwrap();
///
/// let mut out = [0_u8; 4];
/// ring.read(&mut out).unwrap();
/// assert_eq!(&out, b"cdef");
/// ```
#[derive(Debug)]
pub struct Ring<B> {
    inner: B,
}

impl<B: BufferAt> Ring<B> {
    /// Wraps `inner`, which must be empty or hold data the caller is happy to see evicted.
    #[must_use]
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    /// References the wrapped buffer.
    #[must_use]
    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    /// Consumes the ring and returns the wrapped buffer.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: BufferAt> Buffer for Ring<B> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn len(&self) -> usize {
        self.inner.len()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn capacity(&self) -> Option<usize> {
        self.inner.capacity()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.peek(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let Some(capacity) = self.inner.capacity() else {
            return self.inner.write(data);
        };

        let kept = &data[data.len().saturating_sub(capacity)..];
        let free = capacity.saturating_sub(self.inner.len());

        if kept.len() > free {
            let evicted = self.inner.discard(kept.len() - free)?;
            trace!(evicted, dropped = data.len() - kept.len(), "ring evicted oldest bytes");
        }

        self.inner.write(kept)?;

        Ok(data.len())
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn discard(&mut self, len: usize) -> Result<usize> {
        self.inner.discard(len)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }
}

/// Positional access inspects the retained window without consuming it.
impl<B: BufferAt> BufferAt for Ring<B> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read_at(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        self.inner.read_at(buf, offset)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn write_at(&mut self, data: &[u8], offset: usize) -> Result<usize> {
        self.inner.write_at(data, offset)
    }
}
