// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::trace;

use crate::buffer::{SCRATCH_LEN, is_full, spare, stored, write_outcome};
use crate::{Buffer, Error, Result};

/// A fixed, ordered chain of buffers that behaves like one larger buffer.
///
/// Reads drain the children front to back. Writes fill the first child with spare capacity,
/// continuing into the following children when it overflows. Before writing, bytes from later
/// children are moved forward into space freed by earlier reads, so the chain stays packed and
/// the first child with spare capacity is always at the end of the stored data.
///
/// Capacity is the sum of the children's capacities, or unbounded if any child is.
/// [`Error::Full`] is reported only once every child is full.
///
/// Bytes are copied forward before they are dropped from the later child, so a failing child
/// never loses data that was already stored. A write that fills some children before another
/// one fails with [`Error::Storage`] keeps what it stored.
///
/// # Example
///
/// ```
/// use tierbuf::{Buffer, MemoryBuffer, Multi};
///
/// let mut chain = Multi::builder().push(MemoryBuffer::new(2)).push(MemoryBuffer::new(4)).build();
/// assert_eq!(chain.capacity(), Some(6));
///
/// chain.write(b"abcdef").unwrap();
///
/// let mut out = [0_u8; 6];
/// chain.read(&mut out).unwrap();
/// assert_eq!(&out, b"abcdef");
/// ```
#[derive(Debug)]
pub struct Multi {
    children: Vec<Box<dyn Buffer>>,
}

impl Multi {
    /// Creates a chain of the given buffers, in order.
    #[must_use]
    pub fn new(children: Vec<Box<dyn Buffer>>) -> Self {
        Self { children }
    }

    /// Starts building a chain one child at a time.
    #[must_use]
    pub fn builder() -> MultiBuilder {
        MultiBuilder { children: Vec::new() }
    }

    /// The children of the chain, in order.
    #[must_use]
    pub fn children(&self) -> &[Box<dyn Buffer>] {
        &self.children
    }

    /// Consumes the chain and returns its children.
    #[must_use]
    pub fn into_children(self) -> Vec<Box<dyn Buffer>> {
        self.children
    }

    /// Moves bytes from later children into spare capacity of earlier ones, preserving order.
    ///
    /// Bytes leave the source only after the target has stored them.
    fn compact(&mut self) -> Result<()> {
        let mut scratch = [0_u8; SCRATCH_LEN];

        for index in 0..self.children.len() {
            let (head, tail) = self.children.split_at_mut(index + 1);
            let target = &mut head[index];

            while !is_full(&**target) {
                // Children between the target and the source are empty, so the source's front is
                // the oldest byte not yet in the target.
                let Some(source) = tail.iter_mut().find(|child| !child.is_empty()) else {
                    return Ok(());
                };

                let chunk = spare(&**target).unwrap_or(usize::MAX).min(SCRATCH_LEN);
                let n = source.peek(&mut scratch[..chunk])?;
                let moved = stored(target.write(&scratch[..n]))?;
                source.discard(moved)?;

                trace!(bytes = moved, into = index, "moved bytes forward in chain");

                // The target took less than it claimed to have room for.
                if moved < n {
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Creates an instance of [`Multi`].
///
/// Access through [`Multi::builder()`][Multi::builder].
#[derive(Debug)]
pub struct MultiBuilder {
    children: Vec<Box<dyn Buffer>>,
}

impl MultiBuilder {
    /// Appends a child to the end of the chain.
    #[must_use]
    pub fn push(mut self, child: impl Buffer + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    /// Builds the `Multi` with the children pushed so far.
    #[must_use]
    pub fn build(self) -> Multi {
        Multi::new(self.children)
    }
}

impl FromIterator<Box<dyn Buffer>> for Multi {
    fn from_iter<T: IntoIterator<Item = Box<dyn Buffer>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Buffer for Multi {
    fn len(&self) -> usize {
        self.children.iter().map(|child| child.len()).sum()
    }

    fn is_empty(&self) -> bool {
        self.children.iter().all(|child| child.is_empty())
    }

    fn capacity(&self) -> Option<usize> {
        self.children.iter().map(|child| child.capacity()).sum()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.is_empty() {
            return Err(Error::EndOfStream);
        }

        let mut read = 0;

        for child in &mut self.children {
            while read < buf.len() && !child.is_empty() {
                read += child.read(&mut buf[read..])?;
            }

            if read == buf.len() {
                break;
            }
        }

        Ok(read)
    }

    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        let head = self.children.iter_mut().find(|child| !child.is_empty()).ok_or(Error::EndOfStream)?;
        head.peek(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        self.compact()?;

        // New bytes go after the newest stored byte, even if compaction left a gap before it.
        let start = self.children.iter().rposition(|child| !child.is_empty()).unwrap_or(0);
        let mut written = 0;

        for child in &mut self.children[start..] {
            if written == data.len() {
                break;
            }

            if !is_full(&**child) {
                written += stored(child.write(&data[written..]))?;
            }
        }

        write_outcome(written, data.len())
    }

    fn discard(&mut self, len: usize) -> Result<usize> {
        let mut discarded = 0;

        for child in &mut self.children {
            if discarded == len {
                break;
            }

            discarded += child.discard(len - discarded)?;
        }

        Ok(discarded)
    }

    fn reset(&mut self) -> Result<()> {
        self.children.iter_mut().try_for_each(|child| child.reset())
    }
}
