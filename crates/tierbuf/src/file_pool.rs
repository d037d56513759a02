// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;
use std::path::{Path, PathBuf};

use nm::{Event, Magnitude};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::pool::PoolCounters;
use crate::{Buffer, FileBuffer, Pool, PoolStats, Result, Storage};

/// File name prefix used by a [`FilePool`] unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "tierbuf";

/// A [`Pool`] of [`FileBuffer`]s, each backed by its own temporary file.
///
/// Every [`get()`][Pool::get] creates a new temporary file in the configured directory and
/// every [`put()`][Pool::put] closes and deletes it, so no file outlives the buffer that
/// used it.
#[derive(Debug)]
pub struct FilePool {
    capacity: NonZero<usize>,
    directory: PathBuf,
    prefix: String,
    counters: PoolCounters,
}

impl FilePool {
    /// Creates a pool of `capacity`-byte file buffers in the system temporary directory.
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        Self::builder(capacity).build()
    }

    /// Starts building a pool of `capacity`-byte file buffers.
    #[must_use]
    pub fn builder(capacity: NonZero<usize>) -> FilePoolBuilder {
        FilePoolBuilder {
            capacity,
            directory: None,
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }

    /// Capacity of every buffer handed out by this pool.
    #[must_use]
    pub fn buffer_capacity(&self) -> NonZero<usize> {
        self.capacity
    }

    /// The directory in which backing files are created.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Usage counters accumulated since the pool was created.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

impl Pool for FilePool {
    type Buffer = FileBuffer<NamedTempFile>;

    fn get(&self) -> Result<Self::Buffer> {
        let file = tempfile::Builder::new().prefix(&self.prefix).tempfile_in(&self.directory)?;

        debug!(path = %file.path().display(), capacity = self.capacity.get(), "created pooled file buffer");
        POOL_FILE_CREATED_BYTES.with(|e| e.observe(self.capacity.get()));
        self.counters.record_created();

        Ok(FileBuffer::new(self.capacity.get(), file))
    }

    fn put(&self, mut buffer: Self::Buffer) -> Result<()> {
        buffer.reset()?;
        self.counters.record_released();

        let file = buffer.into_storage();
        debug!(path = %file.path().display(), "removing pooled file buffer");
        file.close_and_remove()?;

        Ok(())
    }
}

/// Creates an instance of [`FilePool`].
///
/// Access through [`FilePool::builder()`][FilePool::builder].
#[derive(Debug)]
pub struct FilePoolBuilder {
    capacity: NonZero<usize>,
    directory: Option<PathBuf>,
    prefix: String,
}

impl FilePoolBuilder {
    /// The directory in which backing files are created. It must already exist.
    ///
    /// Optional. Defaults to [`std::env::temp_dir()`].
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// The file name prefix of backing files.
    ///
    /// Optional. Defaults to [`DEFAULT_PREFIX`].
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Builds the `FilePool` with the provided configuration.
    #[must_use]
    pub fn build(self) -> FilePool {
        FilePool {
            capacity: self.capacity,
            directory: self.directory.unwrap_or_else(std::env::temp_dir),
            prefix: self.prefix,
            counters: PoolCounters::default(),
        }
    }
}

const FILE_SIZE_BUCKETS: &[Magnitude] = &[65_536, 1_048_576, 16_777_216, 268_435_456];

thread_local! {
    static POOL_FILE_CREATED_BYTES: Event = Event::builder()
        .name("tierbuf_file_pool_created_bytes")
        .histogram(FILE_SIZE_BUCKETS)
        .build();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use new_zealand::nz;
    use static_assertions::assert_impl_all;
    use tempfile::TempDir;

    use super::*;
    use crate::Error;

    assert_impl_all!(FilePool: Pool, Send, Sync);

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn get_creates_and_put_removes_backing_file() {
        let dir = TempDir::new().unwrap();
        let pool = FilePool::builder(nz!(32)).directory(dir.path()).prefix("chunk").build();

        let mut buffer = pool.get().unwrap();
        assert_eq!(file_count(dir.path()), 1);
        assert!(
            buffer
                .storage()
                .path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("chunk")
        );

        buffer.write(b"some bytes").unwrap();
        pool.put(buffer).unwrap();

        assert_eq!(file_count(dir.path()), 0);
        assert_eq!(
            pool.stats(),
            PoolStats {
                created: 1,
                revived: 0,
                released: 1,
            }
        );
    }

    #[test]
    fn buffers_have_pool_capacity() {
        let dir = TempDir::new().unwrap();
        let pool = FilePool::builder(nz!(4)).directory(dir.path()).build();

        let mut buffer = pool.get().unwrap();
        assert_eq!(buffer.capacity(), Some(4));
        assert!(matches!(buffer.write(b"12345"), Err(Error::Full { written: 4 })));

        pool.put(buffer).unwrap();
    }

    #[test]
    fn missing_directory_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let pool = FilePool::builder(nz!(4)).directory(dir.path().join("missing")).build();

        assert!(matches!(pool.get(), Err(Error::Storage(_))));
        assert_eq!(pool.stats().created, 0);
    }

    #[test]
    fn default_prefix_names_files() {
        let dir = TempDir::new().unwrap();
        let pool = FilePool::builder(nz!(4)).directory(dir.path()).build();

        let buffer = pool.get().unwrap();
        let name = buffer.storage().path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(DEFAULT_PREFIX));

        pool.put(buffer).unwrap();
    }

    #[test]
    fn defaults_to_system_temp_dir() {
        let pool = FilePool::new(nz!(4));

        assert_eq!(pool.directory(), std::env::temp_dir());
        assert_eq!(pool.buffer_capacity().get(), 4);
    }
}
