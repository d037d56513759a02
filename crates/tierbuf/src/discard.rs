// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;

use crate::{Buffer, BufferAt, Error, Result};

/// A [`Buffer`] that stores nothing.
///
/// Writes report every byte as written and drop it; reads always report the end of the stream.
/// The type holds no state, so every instance is interchangeable.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Discard;

impl Buffer for Discard {
    fn len(&self) -> usize {
        0
    }

    fn capacity(&self) -> Option<usize> {
        Some(0)
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::EndOfStream)
    }

    fn peek(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::EndOfStream)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(data.len())
    }

    fn discard(&mut self, _len: usize) -> Result<usize> {
        Ok(0)
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to reset.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}

impl BufferAt for Discard {
    fn read_at(&mut self, _buf: &mut [u8], _offset: usize) -> Result<usize> {
        Err(Error::EndOfStream)
    }

    fn write_at(&mut self, data: &[u8], _offset: usize) -> Result<usize> {
        Ok(data.len())
    }
}

/// Lets `Discard` serve as a sink wherever `std::io::Write` is expected.
impl io::Write for Discard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
