// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Buffer, Result};

/// Manufactures same-capacity buffers and takes them back once their owner is done with them.
///
/// A pool is the only component that knows how to materialize and tear down backing storage.
/// [`get()`][Pool::get] transfers exclusive ownership of a buffer to the caller and
/// [`put()`][Pool::put] transfers it back; the caller must not keep using a buffer it returned.
///
/// Methods take `&self` so that one pool can serve several owners at once.
pub trait Pool: Debug + Send {
    /// The type of buffer handed out by this pool.
    type Buffer: Buffer;

    /// Returns an empty buffer of the pool's capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`][crate::Error::Storage] if backing storage cannot be provisioned.
    fn get(&self) -> Result<Self::Buffer>;

    /// Takes back a buffer obtained from [`get()`][Pool::get], resetting it and releasing or
    /// recycling its backing storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`][crate::Error::Storage] if backing storage cannot be released.
    fn put(&self, buffer: Self::Buffer) -> Result<()>;
}

impl<P: Pool + Sync> Pool for Arc<P> {
    type Buffer = P::Buffer;

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn get(&self) -> Result<Self::Buffer> {
        (**self).get()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn put(&self, buffer: Self::Buffer) -> Result<()> {
        (**self).put(buffer)
    }
}

impl<P: Pool + Sync> Pool for &P {
    type Buffer = P::Buffer;

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn get(&self) -> Result<Self::Buffer> {
        (**self).get()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn put(&self, buffer: Self::Buffer) -> Result<()> {
        (**self).put(buffer)
    }
}

/// A snapshot of how a pool has been used since it was created.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    /// Buffers allocated from scratch by [`Pool::get()`].
    pub created: usize,

    /// Buffers handed out again after having been returned.
    pub revived: usize,

    /// Buffers taken back by [`Pool::put()`].
    pub released: usize,
}

impl PoolStats {
    /// Buffers currently handed out and not yet returned.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        (self.created + self.revived).saturating_sub(self.released)
    }
}

#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    created: AtomicUsize,
    revived: AtomicUsize,
    released: AtomicUsize,
}

impl PoolCounters {
    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_revived(&self) {
        self.revived.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            revived: self.revived.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_snapshot() {
        let counters = PoolCounters::default();

        counters.record_created();
        counters.record_created();
        counters.record_revived();
        counters.record_released();

        let stats = counters.snapshot();
        assert_eq!(
            stats,
            PoolStats {
                created: 2,
                revived: 1,
                released: 1,
            }
        );
        assert_eq!(stats.outstanding(), 2);
    }
}
