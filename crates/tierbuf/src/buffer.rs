// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use crate::{Error, Result};

/// Size of the stack block used when bytes have to be moved between buffers.
pub(crate) const SCRATCH_LEN: usize = 4096;

/// A FIFO byte buffer with a read side and a write side.
///
/// Every backend and composite in this crate implements this trait, so they can be nested in any
/// combination and driven by code that does not know which one it is talking to.
///
/// # Boundaries
///
/// No operation blocks or waits. A write that does not fit returns [`Error::Full`] carrying the
/// number of bytes that *were* stored, and a read from a buffer without unread bytes returns
/// [`Error::EndOfStream`]. Composites that absorb overflow (growing, evicting or spilling)
/// never report [`Error::Full`].
///
/// # Ownership
///
/// All mutating methods take `&mut self`, so a single buffer is only ever accessed by one
/// operation at a time. A buffer handed to a composite belongs to that composite.
pub trait Buffer: Debug + Send {
    /// Number of unread bytes currently stored.
    fn len(&self) -> usize;

    /// Whether the buffer holds no unread bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of bytes the buffer can store, or `None` if it is unbounded.
    fn capacity(&self) -> Option<usize>;

    /// Moves up to `buf.len()` unread bytes into `buf`, returning how many were moved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfStream`] if the buffer holds no unread bytes and
    /// [`Error::Storage`] if the backing storage fails.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Copies up to `buf.len()` of the oldest unread bytes into `buf` without consuming them.
    ///
    /// A buffer made of several parts may return fewer bytes than it holds, but never zero
    /// unless `buf` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfStream`] if the buffer holds no unread bytes and
    /// [`Error::Storage`] if the backing storage fails.
    fn peek(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Stores as much of `data` as fits, returning how many bytes were stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Full`] if only a prefix of `data` could be stored and
    /// [`Error::Storage`] if the backing storage fails.
    ///
    /// A composite that spreads `data` over several children may already have stored a prefix
    /// when a later child fails with [`Error::Storage`]. That prefix is kept: it is counted by
    /// [`len()`][Buffer::len] and will be read back in order. A retry should skip as many bytes
    /// as [`len()`][Buffer::len] grew by.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Drops up to `len` unread bytes from the front without copying them anywhere.
    ///
    /// Returns how many bytes were dropped, which is zero for an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backing storage fails.
    fn discard(&mut self, len: usize) -> Result<usize> {
        let mut scratch = [0_u8; SCRATCH_LEN];
        let mut discarded = 0;

        while discarded < len && !self.is_empty() {
            let chunk = (len - discarded).min(SCRATCH_LEN);
            discarded += self.read(&mut scratch[..chunk])?;
        }

        Ok(discarded)
    }

    /// Drops all unread bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if a composite fails to release one of its children.
    fn reset(&mut self) -> Result<()>;
}

/// A [`Buffer`] that also supports random access relative to its first unread byte.
///
/// Offset zero always designates the oldest unread byte, regardless of where that byte lives
/// in the underlying storage.
pub trait BufferAt: Buffer {
    /// Copies up to `buf.len()` unread bytes starting at `offset` into `buf` without consuming them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfStream`] if `offset` is not less than [`len()`][Buffer::len] and
    /// [`Error::Storage`] if the backing storage fails.
    fn read_at(&mut self, buf: &mut [u8], offset: usize) -> Result<usize>;

    /// Stores `data` starting at `offset`, overwriting unread bytes and extending the buffer
    /// past its current end if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `offset` is greater than [`len()`][Buffer::len],
    /// [`Error::Full`] if only a prefix of `data` fits, and [`Error::Storage`] if the backing
    /// storage fails.
    fn write_at(&mut self, data: &[u8], offset: usize) -> Result<usize>;
}

impl<B: Buffer + ?Sized> Buffer for Box<B> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn len(&self) -> usize {
        (**self).len()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).peek(buf)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn discard(&mut self, len: usize) -> Result<usize> {
        (**self).discard(len)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

impl<B: BufferAt + ?Sized> BufferAt for Box<B> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read_at(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn write_at(&mut self, data: &[u8], offset: usize) -> Result<usize> {
        (**self).write_at(data, offset)
    }
}

impl<B: Buffer + ?Sized> Buffer for &mut B {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn len(&self) -> usize {
        (**self).len()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).peek(buf)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn discard(&mut self, len: usize) -> Result<usize> {
        (**self).discard(len)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

impl<B: BufferAt + ?Sized> BufferAt for &mut B {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read_at(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        (**self).read_at(buf, offset)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn write_at(&mut self, data: &[u8], offset: usize) -> Result<usize> {
        (**self).write_at(data, offset)
    }
}

/// Bytes that can still be written, or `None` if the buffer is unbounded.
pub(crate) fn spare<B: Buffer + ?Sized>(buffer: &B) -> Option<usize> {
    buffer.capacity().map(|capacity| capacity.saturating_sub(buffer.len()))
}

pub(crate) fn is_full<B: Buffer + ?Sized>(buffer: &B) -> bool {
    spare(buffer) == Some(0)
}

/// Turns the outcome of a child write into the number of bytes the child stored.
///
/// Only [`Error::Full`] is translated; every other error is passed through.
pub(crate) fn stored(outcome: Result<usize>) -> Result<usize> {
    match outcome {
        Ok(written) | Err(Error::Full { written }) => Ok(written),
        Err(e) => Err(e),
    }
}

/// The standard outcome of a write that stored `written` of `requested` bytes.
pub(crate) fn write_outcome(written: usize, requested: usize) -> Result<usize> {
    if written < requested {
        Err(Error::Full { written })
    } else {
        Ok(written)
    }
}
