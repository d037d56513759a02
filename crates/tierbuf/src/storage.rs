// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::fs::File;
use std::io;

use tempfile::NamedTempFile;

/// A caller-supplied persistent storage handle used by [`FileBuffer`][crate::FileBuffer].
///
/// The handle is addressed positionally; the buffer decides which offsets hold live data. The
/// caller opens the handle and decides how it is released, either by closing it or by closing
/// it and removing the persistent artifact behind it.
pub trait Storage: Debug + Send {
    /// Fills `buf` with the bytes stored at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be read in full.
    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()>;

    /// Stores all of `data` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be written in full.
    fn write_all_at(&mut self, data: &[u8], offset: u64) -> io::Result<()>;

    /// Releases the handle, leaving the persistent artifact in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be released cleanly.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;

    /// Releases the handle and removes the persistent artifact behind it.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be removed.
    fn close_and_remove(self) -> io::Result<()>
    where
        Self: Sized;
}

impl Storage for NamedTempFile {
    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        positional_read_exact(self.as_file(), buf, offset)
    }

    fn write_all_at(&mut self, data: &[u8], offset: u64) -> io::Result<()> {
        positional_write_all(self.as_file(), data, offset)
    }

    fn close(self) -> io::Result<()> {
        self.keep().map(drop).map_err(|e| e.error)
    }

    fn close_and_remove(self) -> io::Result<()> {
        // Resolves to the inherent `NamedTempFile::close()`, which deletes the file.
        Self::close(self)
    }
}

#[cfg(unix)]
fn positional_read_exact(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn positional_write_all(file: &File, data: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(data, offset)
}

/// `seek_read` may return short counts, so keep going until `buf` is filled.
#[cfg(windows)]
fn positional_read_exact(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                buf = &mut std::mem::take(&mut buf)[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(windows)]
fn positional_write_all(file: &File, mut data: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !data.is_empty() {
        match file.seek_write(data, offset) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => {
                data = &data[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
