// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Interchangeable byte buffers backed by memory or files, and composites built from them.
//!
//! Every buffer in this crate implements the [`Buffer`] trait: a FIFO queue of bytes with a
//! write side and a read side. Because backends and composites share that one contract, they
//! can be nested freely. A chain of a memory buffer and a file-backed partition, wrapped in a
//! ring, is still just a [`Buffer`].
//!
//! # Backends
//!
//! * [`MemoryBuffer`] keeps its bytes in a growable memory region bounded by a fixed capacity.
//! * [`FileBuffer`] keeps its bytes in a fixed-size region of [`Storage`], such as a temporary
//!   file, wrapping around when it reaches the end.
//! * [`Discard`] accepts and drops everything.
//!
//! Buffers of a fixed size can be recycled through a [`Pool`]: [`MemoryPool`] keeps idle
//! buffers for reuse and [`FilePool`] creates and removes temporary files on demand.
//!
//! # Composites
//!
//! | Type | Behavior when full |
//! |------|--------------------|
//! | [`Multi`] | Overflows into the next child of a fixed chain, reports full when all are full |
//! | [`Partition`] | Grows by another chunk from its pool, never full |
//! | [`Ring`] | Evicts the oldest unread bytes, never full |
//! | [`Spill`] | Forwards the overflow to a [`std::io::Write`] sink, never full |
//! | [`Swap`] | Moves everything from a primary to a larger secondary buffer |
//!
//! [`unbounded()`] combines these into the most common setup: a memory buffer that overflows
//! into pooled temporary files.
//!
//! # Boundaries
//!
//! No operation blocks. A write that does not fit returns [`Error::Full`] with the number of
//! bytes that were stored, and reading from an empty buffer returns [`Error::EndOfStream`].
//! [`BufferIo`] translates these into the conventions of [`std::io::Read`] and
//! [`std::io::Write`].
//!
//! ```
//! use std::io::Write;
//!
//! use new_zealand::nz;
//! use tierbuf::{Buffer, BufferIo, MemoryPool, Partition};
//!
//! let mut io = BufferIo::new(Partition::new(MemoryPool::new(nz!(64))));
//! io.write_all(&[0_u8; 1000]).unwrap();
//!
//! assert_eq!(io.get_ref().len(), 1000);
//! ```
//!
//! # Sharing
//!
//! Buffers are `Send` but not internally synchronized. All mutating operations take
//! `&mut self`; wrap a buffer in a mutex to share it between threads. Pools are `Sync` and
//! can be shared through [`Arc`][std::sync::Arc] or by reference.

mod buffer;
mod discard;
mod error;
mod file;
mod file_pool;
mod io;
mod memory;
mod memory_pool;
mod multi;
mod partition;
mod pool;
mod ring;
mod spill;
mod storage;
mod swap;
mod unbounded;
mod wrap;

#[cfg(any(test, feature = "test-util"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;

pub use buffer::{Buffer, BufferAt};
pub use discard::Discard;
pub use error::{Error, Result};
pub use file::FileBuffer;
pub use file_pool::{DEFAULT_PREFIX, FilePool, FilePoolBuilder};
pub use io::BufferIo;
pub use memory::MemoryBuffer;
pub use memory_pool::{DEFAULT_MAX_IDLE, MemoryPool, MemoryPoolBuilder};
pub use multi::{Multi, MultiBuilder};
pub use partition::Partition;
pub use pool::{Pool, PoolStats};
pub use ring::Ring;
pub use spill::{Spill, SpillPolicy};
pub use storage::Storage;
pub use swap::Swap;
pub use unbounded::unbounded;
