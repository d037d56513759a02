// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::buffer::{is_full, stored};
use crate::{Buffer, Error, Pool, Result};

/// An unbounded FIFO buffer assembled from bounded chunks obtained from a [`Pool`].
///
/// Writes fill the newest chunk and pull a fresh one from the pool whenever it is full, so a
/// write is never rejected. Reads drain the oldest chunk and hand it back to the pool as soon as
/// it is empty. When the partition is dropped, any chunks it still holds go back to the pool.
///
/// If the pool fails to hand out a chunk partway through a write, the bytes that already went
/// into earlier chunks stay stored and the pool's error is returned.
///
/// # Example
///
/// ```
/// use new_zealand::nz;
/// use tierbuf::{Buffer, MemoryPool, Partition};
///
/// let mut partition = Partition::new(MemoryPool::new(nz!(4)));
/// partition.write(b"more than one chunk").unwrap();
/// assert_eq!(partition.chunks(), 5);
/// assert_eq!(partition.capacity(), None);
/// ```
#[derive(Debug)]
pub struct Partition<P: Pool> {
    pool: P,
    chunks: VecDeque<P::Buffer>,
}

impl<P: Pool> Partition<P> {
    /// Creates an empty partition that draws its chunks from `pool`.
    #[must_use]
    pub fn new(pool: P) -> Self {
        Self {
            pool,
            chunks: VecDeque::new(),
        }
    }

    /// The pool chunks are drawn from and returned to.
    #[must_use]
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Number of chunks currently held.
    #[must_use]
    pub fn chunks(&self) -> usize {
        self.chunks.len()
    }

    fn grow(&mut self) -> Result<()> {
        let chunk = self.pool.get()?;
        debug!(chunks = self.chunks.len() + 1, "partition grew");
        self.chunks.push_back(chunk);
        Ok(())
    }

    /// Returns the emptied head chunk to the pool.
    ///
    /// The chunk holds no data, so a failure to release it is logged rather than reported to
    /// the reader whose bytes were already moved.
    fn shrink(&mut self) {
        let Some(chunk) = self.chunks.pop_front() else {
            return;
        };

        debug!(chunks = self.chunks.len(), "partition shrank");

        if let Err(e) = self.pool.put(chunk) {
            warn!(error = %e, "failed to return drained chunk to pool");
        }
    }

    fn release_all(&mut self) -> Result<()> {
        let mut outcome = Ok(());

        while let Some(chunk) = self.chunks.pop_front() {
            let released = self.pool.put(chunk);
            if outcome.is_ok() {
                outcome = released;
            }
        }

        outcome
    }
}

impl<P: Pool> Buffer for Partition<P> {
    fn len(&self) -> usize {
        self.chunks.iter().map(Buffer::len).sum()
    }

    fn is_empty(&self) -> bool {
        self.chunks.iter().all(Buffer::is_empty)
    }

    fn capacity(&self) -> Option<usize> {
        None
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.is_empty() {
            return Err(Error::EndOfStream);
        }

        let mut read = 0;

        while read < buf.len() {
            let Some(head) = self.chunks.front_mut() else {
                break;
            };

            if !head.is_empty() {
                read += head.read(&mut buf[read..])?;
            }

            if head.is_empty() {
                self.shrink();
            }
        }

        Ok(read)
    }

    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        let head = self.chunks.iter_mut().find(|chunk| !chunk.is_empty()).ok_or(Error::EndOfStream)?;
        head.peek(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut written = 0;

        while written < data.len() {
            if self.chunks.back().is_none_or(is_full) {
                self.grow()?;
            }

            let Some(tail) = self.chunks.back_mut() else {
                break;
            };

            let n = stored(tail.write(&data[written..]))?;

            // A pool that hands out chunks without room would make us grow forever.
            if n == 0 {
                return Err(Error::Full { written });
            }

            written += n;
        }

        Ok(written)
    }

    fn discard(&mut self, len: usize) -> Result<usize> {
        let mut discarded = 0;

        while discarded < len {
            let Some(head) = self.chunks.front_mut() else {
                break;
            };

            discarded += head.discard(len - discarded)?;

            if head.is_empty() {
                self.shrink();
            }
        }

        Ok(discarded)
    }

    fn reset(&mut self) -> Result<()> {
        self.release_all()
    }
}

impl<P: Pool> Drop for Partition<P> {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            warn!(error = %e, "failed to return chunks to pool on drop");
        }
    }
}
