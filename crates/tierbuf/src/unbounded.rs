// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;
use std::path::PathBuf;

use crate::{FilePool, MemoryBuffer, Multi, Partition};

/// Creates an unbounded buffer that keeps up to `memory` bytes in memory and overflows into
/// temporary files of `chunk` bytes each, created in `directory`.
///
/// Files are created only once the memory part is full and removed again as soon as their
/// contents have been read. Byte order is preserved across the memory/file boundary.
///
/// # Example
///
/// ```
/// use new_zealand::nz;
/// use tierbuf::{Buffer, unbounded};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut buffer = unbounded(4, nz!(8), dir.path());
///
/// buffer.write(b"first memory, then files").unwrap();
/// assert_eq!(buffer.capacity(), None);
///
/// let mut out = [0_u8; 24];
/// buffer.read(&mut out).unwrap();
/// assert_eq!(&out, b"first memory, then files");
/// ```
#[must_use]
pub fn unbounded(memory: usize, chunk: NonZero<usize>, directory: impl Into<PathBuf>) -> Multi {
    let pool = FilePool::builder(chunk).directory(directory).build();

    Multi::builder()
        .push(MemoryBuffer::new(memory))
        .push(Partition::new(pool))
        .build()
}
