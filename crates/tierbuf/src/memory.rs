// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytes::{Buf, BytesMut};

use crate::buffer::write_outcome;
use crate::{Buffer, BufferAt, Error, Result};

/// A capacity-bounded [`Buffer`] held in memory.
///
/// The backing region grows on demand up to the configured capacity and consumed bytes are
/// released from the front, so the allocation never exceeds what is actually stored plus the
/// slack kept by [`BytesMut`].
///
/// # Example
///
/// ```
/// use tierbuf::{Buffer, MemoryBuffer};
///
/// let mut buffer = MemoryBuffer::new(8);
/// buffer.write(b"hello").unwrap();
///
/// let mut out = [0_u8; 5];
/// buffer.read(&mut out).unwrap();
/// assert_eq!(&out, b"hello");
/// ```
#[derive(Debug)]
pub struct MemoryBuffer {
    data: BytesMut,
    capacity: usize,
}

impl MemoryBuffer {
    /// Creates an empty buffer that can hold up to `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: BytesMut::new(),
            capacity,
        }
    }

    /// Creates an empty buffer and allocates its whole region up front.
    #[must_use]
    pub fn preallocated(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// The unread bytes, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Buffer for MemoryBuffer {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.data.is_empty() {
            return Err(Error::EndOfStream);
        }

        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data.advance(n);

        Ok(n)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_at(buf, 0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = data.len().min(self.capacity.saturating_sub(self.data.len()));
        self.data.extend_from_slice(&data[..n]);

        write_outcome(n, data.len())
    }

    fn discard(&mut self, len: usize) -> Result<usize> {
        let n = len.min(self.data.len());
        self.data.advance(n);
        Ok(n)
    }

    fn reset(&mut self) -> Result<()> {
        self.data.clear();
        Ok(())
    }
}

impl BufferAt for MemoryBuffer {
    fn read_at(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let Some(available) = self.data.get(offset..).filter(|rest| !rest.is_empty()) else {
            return Err(Error::EndOfStream);
        };

        let n = buf.len().min(available.len());
        buf[..n].copy_from_slice(&available[..n]);

        Ok(n)
    }

    fn write_at(&mut self, data: &[u8], offset: usize) -> Result<usize> {
        let len = self.data.len();

        if offset > len {
            return Err(Error::OutOfRange { offset, len });
        }

        let n = data.len().min(self.capacity.saturating_sub(offset));
        let overlap = n.min(len - offset);

        self.data[offset..offset + overlap].copy_from_slice(&data[..overlap]);
        self.data.extend_from_slice(&data[overlap..n]);

        write_outcome(n, data.len())
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(MemoryBuffer: Buffer, BufferAt, Send, Sync);

    #[test]
    fn round_trip_in_order() {
        let mut b = MemoryBuffer::new(16);

        assert_eq!(b.write(b"Hello, ").unwrap(), 7);
        assert_eq!(b.write(b"world").unwrap(), 5);
        assert_eq!(b.len(), 12);

        let mut out = [0_u8; 5];
        assert_eq!(b.read(&mut out).unwrap(), 5);
        assert_eq!(&out, b"Hello");

        let mut out = [0_u8; 32];
        assert_eq!(b.read(&mut out).unwrap(), 7);
        assert_eq!(&out[..7], b", world");

        assert!(matches!(b.read(&mut out), Err(Error::EndOfStream)));
    }

    #[test]
    fn write_beyond_capacity_is_partial() {
        let mut b = MemoryBuffer::new(4);

        assert!(matches!(b.write(b"abcdef"), Err(Error::Full { written: 4 })));
        assert_eq!(b.len(), 4);
        assert!(matches!(b.write(b"x"), Err(Error::Full { written: 0 })));
        assert_eq!(b.write(b"").unwrap(), 0);

        assert_eq!(b.as_slice(), b"abcd");
    }

    #[test]
    fn consumed_space_is_reusable() {
        let mut b = MemoryBuffer::preallocated(4);
        let mut out = [0_u8; 2];

        for round in 0..100_u8 {
            b.write(&[round, round]).unwrap();
            b.write(&[round, round]).unwrap();
            assert_eq!(b.read(&mut out).unwrap(), 2);
            assert_eq!(b.read(&mut out).unwrap(), 2);
            assert!(b.is_empty());
        }
    }

    #[test]
    fn empty_read_buffer_on_nonempty_buffer() {
        let mut b = MemoryBuffer::new(4);
        b.write(b"ab").unwrap();

        assert_eq!(b.read(&mut []).unwrap(), 0);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn discard_and_reset() {
        let mut b = MemoryBuffer::new(8);
        b.write(b"abcdef").unwrap();

        assert_eq!(b.discard(2).unwrap(), 2);
        assert_eq!(b.as_slice(), b"cdef");
        assert_eq!(b.discard(100).unwrap(), 4);
        assert!(b.is_empty());

        b.write(b"xyz").unwrap();
        b.reset().unwrap();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), Some(8));
    }

    #[test]
    fn zero_capacity_is_always_full_and_empty() {
        let mut b = MemoryBuffer::new(0);

        assert!(matches!(b.write(b"a"), Err(Error::Full { written: 0 })));
        assert!(matches!(b.read(&mut [0_u8; 1]), Err(Error::EndOfStream)));
    }

    #[test]
    fn read_at_does_not_consume() {
        let mut b = MemoryBuffer::new(8);
        b.write(b"abcdef").unwrap();

        let mut out = [0_u8; 3];
        assert_eq!(b.read_at(&mut out, 2).unwrap(), 3);
        assert_eq!(&out, b"cde");
        assert_eq!(b.read_at(&mut out, 5).unwrap(), 1);
        assert_eq!(out[0], b'f');
        assert!(matches!(b.read_at(&mut out, 6), Err(Error::EndOfStream)));
        assert_eq!(b.len(), 6);
    }

    #[test]
    fn write_at_overwrites_and_extends() {
        let mut b = MemoryBuffer::new(6);
        b.write(b"abcd").unwrap();
        b.discard(1).unwrap();

        // Logical offsets start at the first unread byte ("b").
        assert_eq!(b.write_at(b"XY", 1).unwrap(), 2);
        assert_eq!(b.as_slice(), b"bXY");

        assert!(matches!(b.write_at(b"123456", 2), Err(Error::Full { written: 4 })));
        assert_eq!(b.as_slice(), b"bX1234");

        assert!(matches!(b.write_at(b"z", 7), Err(Error::OutOfRange { offset: 7, len: 6 })));
    }
}
