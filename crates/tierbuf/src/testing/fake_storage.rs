// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Storage;

/// A [`Storage`] that keeps its contents in memory.
///
/// Reads and writes can be made to fail on demand, and the instance records whether it was
/// released with [`close_and_remove()`][Storage::close_and_remove]. Intended for tests only.
#[derive(Debug, Default)]
pub struct FakeStorage {
    contents: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
    removed: Arc<AtomicBool>,
}

impl FakeStorage {
    /// Creates a new empty `FakeStorage` on which every operation succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read fail with an I/O error.
    #[must_use]
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Makes every subsequent write fail with an I/O error.
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Returns a flag that becomes `true` once the storage is closed and removed.
    ///
    /// The flag stays readable after the storage itself has been consumed.
    #[must_use]
    pub fn removal_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.removed)
    }

    /// The raw stored bytes, in physical order.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }
}

impl Storage for FakeStorage {
    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        if self.fail_reads {
            return Err(io::Error::other("injected read failure"));
        }

        let start = usize::try_from(offset).map_err(io::Error::other)?;
        let source = self
            .contents
            .get(start..start + buf.len())
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        buf.copy_from_slice(source);
        Ok(())
    }

    fn write_all_at(&mut self, data: &[u8], offset: u64) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::other("injected write failure"));
        }

        let start = usize::try_from(offset).map_err(io::Error::other)?;
        let end = start + data.len();

        if self.contents.len() < end {
            self.contents.resize(end, 0);
        }

        self.contents[start..end].copy_from_slice(data);
        Ok(())
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to release.
    fn close(self) -> io::Result<()> {
        Ok(())
    }

    fn close_and_remove(self) -> io::Result<()> {
        self.removed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
