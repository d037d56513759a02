// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;

use nm::{Event, Magnitude};
use parking_lot::Mutex;
use tracing::debug;

use crate::pool::PoolCounters;
use crate::{Buffer, MemoryBuffer, Pool, PoolStats, Result};

/// How many returned buffers a [`MemoryPool`] keeps for reuse unless configured otherwise.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// A [`Pool`] of [`MemoryBuffer`]s.
///
/// Returned buffers are reset and kept on a free list so their memory can be handed out again.
/// Buffers beyond the idle limit are simply dropped.
///
/// # Example
///
/// ```
/// use new_zealand::nz;
/// use tierbuf::{MemoryPool, Pool};
///
/// let pool = MemoryPool::new(nz!(1024));
///
/// let buffer = pool.get().unwrap();
/// pool.put(buffer).unwrap();
///
/// // The second request is served from the free list.
/// let _buffer = pool.get().unwrap();
/// assert_eq!(pool.stats().created, 1);
/// ```
#[derive(Debug)]
pub struct MemoryPool {
    capacity: NonZero<usize>,
    max_idle: usize,
    idle: Mutex<Vec<MemoryBuffer>>,
    counters: PoolCounters,
}

impl MemoryPool {
    /// Creates a pool of buffers holding `capacity` bytes each, with default settings.
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        Self::builder(capacity).build()
    }

    /// Starts building a pool of buffers holding `capacity` bytes each.
    #[must_use]
    pub fn builder(capacity: NonZero<usize>) -> MemoryPoolBuilder {
        MemoryPoolBuilder {
            capacity,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }

    /// Capacity of every buffer handed out by this pool.
    #[must_use]
    pub fn buffer_capacity(&self) -> NonZero<usize> {
        self.capacity
    }

    /// Number of returned buffers currently waiting for reuse.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Usage counters accumulated since the pool was created.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

impl Pool for MemoryPool {
    type Buffer = MemoryBuffer;

    fn get(&self) -> Result<MemoryBuffer> {
        let revived = self.idle.lock().pop();

        if let Some(buffer) = revived {
            debug!(capacity = self.capacity.get(), "reviving idle memory buffer");
            self.counters.record_revived();
            return Ok(buffer);
        }

        debug!(capacity = self.capacity.get(), "allocating pooled memory buffer");
        POOL_ALLOCATED_BYTES.with(|e| e.observe(self.capacity.get()));
        self.counters.record_created();

        Ok(MemoryBuffer::new(self.capacity.get()))
    }

    fn put(&self, mut buffer: MemoryBuffer) -> Result<()> {
        buffer.reset()?;
        self.counters.record_released();

        // A buffer of a different size would break the pool's capacity promise.
        if buffer.capacity() != Some(self.capacity.get()) {
            debug!(capacity = ?buffer.capacity(), "dropping foreign buffer returned to memory pool");
            return Ok(());
        }

        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buffer);
            debug!(idle = idle.len(), "memory buffer returned to pool");
        }

        Ok(())
    }
}

/// Creates an instance of [`MemoryPool`].
///
/// Access through [`MemoryPool::builder()`][MemoryPool::builder].
#[derive(Debug)]
pub struct MemoryPoolBuilder {
    capacity: NonZero<usize>,
    max_idle: usize,
}

impl MemoryPoolBuilder {
    /// How many returned buffers to keep for reuse. Zero disables reuse.
    ///
    /// Optional. Defaults to [`DEFAULT_MAX_IDLE`].
    #[must_use]
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Builds the `MemoryPool` with the provided configuration.
    #[must_use]
    pub fn build(self) -> MemoryPool {
        MemoryPool {
            capacity: self.capacity,
            max_idle: self.max_idle,
            idle: Mutex::new(Vec::new()),
            counters: PoolCounters::default(),
        }
    }
}

const ALLOCATION_SIZE_BUCKETS: &[Magnitude] = &[1024, 4096, 16_384, 65_536, 262_144, 1_048_576];

thread_local! {
    static POOL_ALLOCATED_BYTES: Event = Event::builder()
        .name("tierbuf_memory_pool_allocated_bytes")
        .histogram(ALLOCATION_SIZE_BUCKETS)
        .build();
}
