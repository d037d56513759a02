// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::trace;

use crate::buffer::{SCRATCH_LEN, spare, stored};
use crate::{Buffer, Error, Result};

/// A buffer that starts out in a primary buffer and moves to a secondary one when it outgrows it.
///
/// Writes go to the primary buffer as long as they fit. The first write that would not fit moves
/// all unread bytes from the primary into the secondary, and from then on both reads and writes
/// use the secondary. Once the secondary has been drained, the primary is used again.
///
/// The move only happens if the secondary can hold everything the primary stores and still offer
/// more room than the primary has left. Otherwise the write stays on the primary and reports
/// [`Error::Full`]. Bytes are copied into the secondary before they are dropped from the primary,
/// so a failing secondary leaves them readable where they were.
///
/// A typical use is a small memory buffer backed by a large file buffer that is only touched when
/// traffic bursts.
#[derive(Debug)]
pub struct Swap<A, B> {
    primary: A,
    secondary: B,
    swapped: bool,
}

impl<A: Buffer, B: Buffer> Swap<A, B> {
    /// Creates a swap that starts out using `primary`.
    #[must_use]
    pub fn new(primary: A, secondary: B) -> Self {
        Self {
            primary,
            secondary,
            swapped: false,
        }
    }

    /// Whether traffic currently goes to the secondary buffer.
    #[must_use]
    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    /// References the buffer currently receiving traffic.
    #[must_use]
    pub fn active(&self) -> &dyn Buffer {
        if self.swapped {
            return &self.secondary;
        }

        &self.primary
    }

    /// Consumes the swap and returns the primary and secondary buffers.
    #[must_use]
    pub fn into_parts(self) -> (A, B) {
        (self.primary, self.secondary)
    }

    /// Whether a write of `incoming` bytes should move everything to the secondary.
    fn should_swap(&self, incoming: usize) -> bool {
        let Some(left) = spare(&self.primary) else {
            return false;
        };

        if incoming <= left {
            return false;
        }

        match spare(&self.secondary) {
            None => true,
            Some(room) => room.checked_sub(self.primary.len()).is_some_and(|room| room > left),
        }
    }

    /// Copies the primary's unread bytes into the secondary, dropping each chunk from the
    /// primary only once the secondary has stored it.
    fn migrate(&mut self) -> Result<()> {
        let mut scratch = [0_u8; SCRATCH_LEN];

        while !self.primary.is_empty() {
            let chunk = spare(&self.secondary).unwrap_or(usize::MAX).min(SCRATCH_LEN);

            if chunk == 0 {
                break;
            }

            let n = self.primary.peek(&mut scratch[..chunk])?;
            let moved = stored(self.secondary.write(&scratch[..n]))?;
            self.primary.discard(moved)?;

            if moved < n {
                break;
            }
        }

        Ok(())
    }

    fn write_secondary(&mut self, data: &[u8]) -> Result<usize> {
        self.migrate()?;

        // Leftovers in the primary are older than anything written now.
        if !self.primary.is_empty() {
            return Err(Error::Full { written: 0 });
        }

        self.secondary.write(data)
    }

    /// Goes back to the primary once the secondary holds nothing.
    fn settle(&mut self) {
        if self.swapped && self.secondary.is_empty() {
            self.swapped = false;
            trace!("swapped back to primary buffer");
        }
    }
}

impl<A: Buffer, B: Buffer> Buffer for Swap<A, B> {
    fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    /// The secondary's capacity while swapped, otherwise the larger of the two.
    fn capacity(&self) -> Option<usize> {
        if self.swapped {
            return self.secondary.capacity();
        }

        Some(self.primary.capacity()?.max(self.secondary.capacity()?))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.swapped {
            return self.primary.read(buf);
        }

        let n = self.secondary.read(buf)?;
        self.settle();

        Ok(n)
    }

    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.swapped {
            return self.secondary.peek(buf);
        }

        self.primary.peek(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.swapped {
            if !self.should_swap(data.len()) {
                return self.primary.write(data);
            }

            self.swapped = true;
            trace!(moved = self.primary.len(), "swapped to secondary buffer");
        }

        let outcome = self.write_secondary(data);
        self.settle();

        outcome
    }

    fn discard(&mut self, len: usize) -> Result<usize> {
        if !self.swapped {
            return self.primary.discard(len);
        }

        let discarded = self.secondary.discard(len)?;
        self.settle();

        if self.swapped {
            return Ok(discarded);
        }

        Ok(discarded + self.primary.discard(len - discarded)?)
    }

    fn reset(&mut self) -> Result<()> {
        self.primary.reset()?;
        self.secondary.reset()?;
        self.swapped = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;
    use tracing_test::traced_test;

    use super::*;
    use crate::testing::FakeStorage;
    use crate::{FileBuffer, MemoryBuffer};

    assert_impl_all!(Swap<MemoryBuffer, MemoryBuffer>: Buffer, Send);

    fn read_all<B: Buffer>(buffer: &mut B) -> Vec<u8> {
        let mut out = vec![0_u8; buffer.len()];
        let n = buffer.read(&mut out).unwrap();
        out.truncate(n);
        out
    }

    #[test]
    fn stays_on_primary_while_writes_fit() {
        let mut s = Swap::new(MemoryBuffer::new(4), FileBuffer::new(16, FakeStorage::new()));

        s.write(b"abcd").unwrap();
        assert!(!s.is_swapped());
        assert_eq!(s.active().len(), 4);
        assert_eq!(s.capacity(), Some(16));
    }

    #[test]
    fn moves_to_secondary_preserving_order() {
        let mut s = Swap::new(MemoryBuffer::new(4), FileBuffer::new(16, FakeStorage::new()));

        s.write(b"abc").unwrap();
        s.write(b"defgh").unwrap();

        assert!(s.is_swapped());
        assert_eq!(s.len(), 8);

        let (primary, secondary) = s.into_parts();
        assert!(primary.is_empty());
        assert_eq!(secondary.len(), 8);
    }

    #[test]
    fn returns_to_primary_once_drained() {
        let mut s = Swap::new(MemoryBuffer::new(2), MemoryBuffer::new(8));

        s.write(b"abc").unwrap();
        assert!(s.is_swapped());

        let mut out = [0_u8; 2];
        s.read(&mut out).unwrap();
        assert!(s.is_swapped());

        assert_eq!(read_all(&mut s), b"c");
        assert!(!s.is_swapped());

        s.write(b"xy").unwrap();
        assert!(!s.is_swapped());
        assert_eq!(read_all(&mut s), b"xy");
    }

    #[test]
    fn secondary_limits_apply() {
        let mut s = Swap::new(MemoryBuffer::new(2), MemoryBuffer::new(3));

        assert!(matches!(s.write(b"abcdef"), Err(Error::Full { written: 3 })));
        assert_eq!(read_all(&mut s), b"abc");
    }

    #[test]
    fn smaller_secondary_is_never_used() {
        let mut s = Swap::new(MemoryBuffer::new(4), MemoryBuffer::new(2));

        s.write(b"abcd").unwrap();
        assert!(matches!(s.write(b"e"), Err(Error::Full { written: 0 })));
        assert!(!s.is_swapped());
        assert_eq!(s.len(), 4);
        assert_eq!(s.capacity(), Some(4));

        assert_eq!(read_all(&mut s), b"abcd");
        assert!(matches!(s.write(b"abcdef"), Err(Error::Full { written: 4 })));
        assert!(!s.is_swapped());
    }

    #[test]
    fn slightly_larger_secondary_stores_what_fits() {
        let mut s = Swap::new(MemoryBuffer::new(4), MemoryBuffer::new(5));

        s.write(b"abcd").unwrap();
        assert!(matches!(s.write(b"ef"), Err(Error::Full { written: 1 })));
        assert!(s.is_swapped());
        assert_eq!(read_all(&mut s), b"abcde");
    }

    #[traced_test]
    #[test]
    fn failing_secondary_leaves_bytes_in_primary() {
        let mut s = Swap::new(MemoryBuffer::new(4), FileBuffer::new(8, FakeStorage::new().failing_writes()));

        s.write(b"abcd").unwrap();
        assert!(matches!(s.write(b"e"), Err(Error::Storage(_))));

        assert!(!s.is_swapped());
        assert_eq!(s.len(), 4);
        assert_eq!(s.active().len(), 4);
        assert_eq!(read_all(&mut s), b"abcd");

        assert!(logs_contain("swapped to secondary buffer"));
        assert!(logs_contain("swapped back to primary buffer"));
    }

    #[test]
    fn capacity_follows_active_buffer() {
        let mut s = Swap::new(MemoryBuffer::new(2), MemoryBuffer::new(8));
        assert_eq!(s.capacity(), Some(8));

        s.write(b"abc").unwrap();
        assert!(s.is_swapped());
        assert_eq!(s.capacity(), Some(8));

        let mut s = Swap::new(MemoryBuffer::new(4), MemoryBuffer::new(8));
        s.write(b"abcdefg").unwrap();
        assert!(s.is_swapped());
        assert_eq!(s.capacity(), Some(8));
        assert!(matches!(s.write(b"hi"), Err(Error::Full { written: 1 })));
    }

    #[test]
    fn discard_drains_secondary_then_swaps_back() {
        let mut s = Swap::new(MemoryBuffer::new(2), MemoryBuffer::new(8));

        s.write(b"abc").unwrap();
        assert_eq!(s.discard(2).unwrap(), 2);
        assert!(s.is_swapped());

        let mut out = [0_u8; 1];
        assert_eq!(s.peek(&mut out).unwrap(), 1);
        assert_eq!(&out, b"c");

        assert_eq!(s.discard(5).unwrap(), 1);
        assert!(!s.is_swapped());
        assert!(s.is_empty());
    }

    #[test]
    fn reset_clears_both() {
        let mut s = Swap::new(MemoryBuffer::new(2), MemoryBuffer::new(8));

        s.write(b"abcde").unwrap();
        s.reset().unwrap();

        assert!(s.is_empty());
        assert!(!s.is_swapped());
    }
}
