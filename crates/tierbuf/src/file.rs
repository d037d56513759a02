// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::buffer::write_outcome;
use crate::{Buffer, BufferAt, Error, Result, Storage, wrap};

/// A capacity-bounded [`Buffer`] stored in a fixed-size region of a [`Storage`] handle.
///
/// The region is exactly `capacity` bytes long and is never grown. Unread bytes occupy the
/// `len()` bytes starting at the read cursor, continuing at the start of the region if they run
/// past its end. Space freed by reads is therefore reused by later writes without moving any
/// stored data.
///
/// The storage handle stays owned by the caller in the sense that this type never closes or
/// removes it; use [`into_storage()`][Self::into_storage] to get it back.
///
/// # Example
///
/// ```
/// use tierbuf::{Buffer, FileBuffer};
///
/// let file = tempfile::NamedTempFile::new().unwrap();
/// let mut buffer = FileBuffer::new(10, file);
///
/// buffer.write(b"ABCDEF").unwrap();
/// let mut out = [0_u8; 4];
/// buffer.read(&mut out).unwrap();
///
/// // Only 2 bytes are unread, so all 6 fit even though they wrap around the region end.
/// buffer.write(b"GHIJKL").unwrap();
///
/// let mut out = [0_u8; 8];
/// buffer.read(&mut out).unwrap();
/// assert_eq!(&out, b"EFGHIJKL");
/// ```
#[derive(Debug)]
pub struct FileBuffer<S> {
    storage: S,
    capacity: usize,

    // Physical position of the oldest unread byte, always below `capacity` (or zero).
    read_offset: usize,
    len: usize,
}

impl<S: Storage> FileBuffer<S> {
    /// Creates an empty buffer over the first `capacity` bytes of `storage`.
    ///
    /// Any existing content of the storage is ignored and will be overwritten.
    #[must_use]
    pub fn new(capacity: usize, storage: S) -> Self {
        Self {
            storage,
            capacity,
            read_offset: 0,
            len: 0,
        }
    }

    /// References the underlying storage handle.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the buffer and returns the underlying storage handle.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Physical position at which the next written byte lands.
    fn write_offset(&self) -> usize {
        wrap::advance(self.read_offset, self.len, self.capacity)
    }

    /// Copies `buf.len()` bytes starting at logical offset `offset` out of the region.
    fn load(&mut self, buf: &mut [u8], offset: usize) -> Result<()> {
        let start = wrap::advance(self.read_offset, offset, self.capacity);
        let (head, tail) = wrap::split(start, buf.len(), self.capacity);
        let (first, second) = buf.split_at_mut(head.len());

        self.storage.read_exact_at(first, head.start as u64)?;
        if !second.is_empty() {
            self.storage.read_exact_at(second, tail.start as u64)?;
        }

        Ok(())
    }

    /// Copies `data` into the region starting at logical offset `offset`.
    fn store(&mut self, data: &[u8], offset: usize) -> Result<()> {
        let start = wrap::advance(self.read_offset, offset, self.capacity);
        let (head, tail) = wrap::split(start, data.len(), self.capacity);
        let (first, second) = data.split_at(head.len());

        self.storage.write_all_at(first, head.start as u64)?;
        if !second.is_empty() {
            self.storage.write_all_at(second, tail.start as u64)?;
        }

        Ok(())
    }

    fn consume(&mut self, n: usize) {
        self.len -= n;

        // Restarting at the region start keeps future spans from splitting needlessly.
        self.read_offset = if self.len == 0 {
            0
        } else {
            wrap::advance(self.read_offset, n, self.capacity)
        };
    }
}

impl<S: Storage> Buffer for FileBuffer<S> {
    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.len == 0 {
            return Err(Error::EndOfStream);
        }

        let n = buf.len().min(self.len);
        self.load(&mut buf[..n], 0)?;
        self.consume(n);

        Ok(n)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_at(buf, 0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = data.len().min(self.capacity - self.len);

        if n > 0 {
            self.store(&data[..n], self.len)?;
            self.len += n;
        }

        write_outcome(n, data.len())
    }

    fn discard(&mut self, len: usize) -> Result<usize> {
        let n = len.min(self.len);
        self.consume(n);
        Ok(n)
    }

    fn reset(&mut self) -> Result<()> {
        self.read_offset = 0;
        self.len = 0;
        Ok(())
    }
}

impl<S: Storage> BufferAt for FileBuffer<S> {
    fn read_at(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        if offset >= self.len {
            return Err(Error::EndOfStream);
        }

        let n = buf.len().min(self.len - offset);
        self.load(&mut buf[..n], offset)?;

        Ok(n)
    }

    fn write_at(&mut self, data: &[u8], offset: usize) -> Result<usize> {
        if offset > self.len {
            return Err(Error::OutOfRange { offset, len: self.len });
        }

        let n = data.len().min(self.capacity - offset);

        if n > 0 {
            self.store(&data[..n], offset)?;
            self.len = self.len.max(offset + n);
        }

        write_outcome(n, data.len())
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::testing::FakeStorage;

    assert_impl_all!(FileBuffer<FakeStorage>: Buffer, BufferAt, Send);

    fn read_all<B: Buffer>(buffer: &mut B) -> Vec<u8> {
        let mut out = vec![0_u8; buffer.len()];
        let n = buffer.read(&mut out).unwrap();
        out.truncate(n);
        out
    }

    #[test]
    fn partial_read_then_wrapping_write() {
        let mut b = FileBuffer::new(10, FakeStorage::new());

        assert_eq!(b.write(b"ABCDEF").unwrap(), 6);

        let mut out = [0_u8; 4];
        assert_eq!(b.read(&mut out).unwrap(), 4);
        assert_eq!(&out, b"ABCD");
        assert_eq!(b.len(), 2);

        assert_eq!(b.write(b"GHIJKL").unwrap(), 6);
        assert_eq!(b.len(), 8);

        // "KL" wrapped to the start of the region.
        assert_eq!(&b.storage().contents()[..2], b"KL");

        assert_eq!(read_all(&mut b), b"EFGHIJKL");
        assert!(b.is_empty());
    }

    #[test]
    fn fill_half_drain_refill() {
        let capacity = 16;
        let stream: Vec<u8> = (0..24).collect();
        let mut b = FileBuffer::new(capacity, FakeStorage::new());

        assert_eq!(b.write(&stream[..16]).unwrap(), 16);

        let mut half = [0_u8; 8];
        assert_eq!(b.read(&mut half).unwrap(), 8);
        assert_eq!(&half, &stream[..8]);

        assert_eq!(b.write(&stream[16..]).unwrap(), 8);
        assert_eq!(b.len(), capacity);

        assert_eq!(read_all(&mut b), &stream[8..]);
    }

    #[test]
    fn rejects_once_full() {
        let mut b = FileBuffer::new(4, FakeStorage::new());

        assert!(matches!(b.write(b"abcdef"), Err(Error::Full { written: 4 })));
        assert!(matches!(b.write(b"g"), Err(Error::Full { written: 0 })));
        assert_eq!(b.len(), 4);
        assert_eq!(b.write(b"").unwrap(), 0);

        assert_eq!(read_all(&mut b), b"abcd");
    }

    #[test]
    fn exact_wrap_to_region_start() {
        let mut b = FileBuffer::new(4, FakeStorage::new());
        let mut out = [0_u8; 3];

        b.write(b"abcd").unwrap();
        b.read(&mut out).unwrap();
        assert_eq!(b.write_offset(), 0);

        b.write(b"efg").unwrap();
        assert_eq!(b.write_offset(), 3);
        assert_eq!(read_all(&mut b), b"defg");
    }

    #[test]
    fn split_read_across_region_end() {
        let mut b = FileBuffer::new(5, FakeStorage::new());
        let mut out = [0_u8; 3];

        b.write(b"12345").unwrap();
        b.read(&mut out).unwrap();
        b.write(b"678").unwrap();

        // Unread bytes "45678" start at physical 3 and wrap after 2 bytes.
        let mut out = [0_u8; 4];
        assert_eq!(b.read(&mut out).unwrap(), 4);
        assert_eq!(&out, b"4567");
        assert_eq!(read_all(&mut b), b"8");
    }

    #[test]
    fn peek_spans_region_end_without_consuming() {
        let mut b = FileBuffer::new(5, FakeStorage::new());

        b.write(b"12345").unwrap();
        b.discard(3).unwrap();
        b.write(b"67").unwrap();

        let mut out = [0_u8; 4];
        assert_eq!(b.peek(&mut out).unwrap(), 4);
        assert_eq!(&out, b"4567");
        assert_eq!(b.len(), 4);
        assert_eq!(read_all(&mut b), b"4567");

        assert!(matches!(b.peek(&mut out), Err(Error::EndOfStream)));
    }

    #[test]
    fn many_laps_keep_order() {
        let mut b = FileBuffer::new(7, FakeStorage::new());
        let mut expected = std::collections::VecDeque::new();
        let mut next = 0_u8;

        for step in 0..200_usize {
            let mut chunk = Vec::new();
            for _ in 0..step % 5 {
                next = next.wrapping_add(1);
                chunk.push(next);
            }

            let written = match b.write(&chunk) {
                Ok(n) | Err(Error::Full { written: n }) => n,
                Err(e) => panic!("unexpected error {e}"),
            };
            expected.extend(&chunk[..written]);

            let mut out = vec![0_u8; step % 4];
            if let Ok(n) = b.read(&mut out) {
                for byte in &out[..n] {
                    assert_eq!(Some(*byte), expected.pop_front());
                }
            }

            assert_eq!(b.len(), expected.len());
            assert!(b.len() <= 7);
        }
    }

    #[test]
    fn zero_capacity_is_always_full_and_empty() {
        let mut b = FileBuffer::new(0, FakeStorage::new());

        assert!(matches!(b.write(b"a"), Err(Error::Full { written: 0 })));
        assert!(matches!(b.read(&mut [0_u8; 1]), Err(Error::EndOfStream)));
        assert_eq!(b.capacity(), Some(0));
        assert!(b.storage().contents().is_empty());
    }

    #[test]
    fn reset_restarts_region() {
        let mut b = FileBuffer::new(4, FakeStorage::new());

        b.write(b"abc").unwrap();
        b.discard(2).unwrap();
        b.reset().unwrap();

        assert!(b.is_empty());
        assert_eq!(b.write_offset(), 0);

        b.write(b"wxyz").unwrap();
        assert_eq!(read_all(&mut b), b"wxyz");
    }

    #[test]
    fn discard_advances_read_cursor() {
        let mut b = FileBuffer::new(4, FakeStorage::new());

        b.write(b"abcd").unwrap();
        assert_eq!(b.discard(3).unwrap(), 3);
        b.write(b"ef").unwrap();

        assert_eq!(read_all(&mut b), b"def");
        assert_eq!(b.discard(1).unwrap(), 0);
    }

    #[test]
    fn positional_access_is_relative_to_read_cursor() {
        let mut b = FileBuffer::new(6, FakeStorage::new());

        b.write(b"abcdef").unwrap();
        b.discard(4).unwrap();
        b.write(b"gh").unwrap();

        // Logical contents "efgh", physically split as "gh" + ... + "ef".
        let mut out = [0_u8; 3];
        assert_eq!(b.read_at(&mut out, 1).unwrap(), 3);
        assert_eq!(&out, b"fgh");
        assert!(matches!(b.read_at(&mut out, 4), Err(Error::EndOfStream)));

        assert_eq!(b.write_at(b"FG", 1).unwrap(), 2);
        assert!(matches!(b.write_at(b"XYZ", 4), Err(Error::Full { written: 2 })));
        assert!(matches!(b.write_at(b"!", 7), Err(Error::OutOfRange { offset: 7, len: 6 })));

        assert_eq!(read_all(&mut b), b"eFGhXY");
    }

    #[test]
    fn storage_failures_leave_state_untouched() {
        let mut b = FileBuffer::new(4, FakeStorage::new().failing_writes());

        assert!(matches!(b.write(b"ab"), Err(Error::Storage(_))));
        assert!(b.is_empty());

        let mut b = FileBuffer::new(4, FakeStorage::new().failing_reads());
        b.write(b"cd").unwrap();
        assert!(matches!(b.read(&mut [0_u8; 2]), Err(Error::Storage(_))));
        assert_eq!(b.len(), 2);
    }
}
