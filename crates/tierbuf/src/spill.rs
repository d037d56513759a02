// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::io;

use nm::{Event, Magnitude};
use tracing::{debug, trace};

use crate::{Buffer, Error, Result};

/// Decides which failures of the wrapped buffer send a write to the spill sink.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum SpillPolicy {
    /// Any write error of the wrapped buffer spills the bytes it did not store.
    ///
    /// Storage failures are treated like running out of capacity: the bytes are offloaded
    /// instead of being reported as lost.
    #[default]
    AnyError,

    /// Only [`Error::Full`] spills; every other error is returned to the caller.
    FullOnly,
}

/// A bounded buffer that forwards whatever it cannot store to a secondary sink.
///
/// Writes first go to the wrapped buffer. The bytes it rejects are written to the sink and the
/// write is reported as complete, since offloading them is the intended outcome. Spilled bytes
/// are never read back: reads and resets concern the wrapped buffer only.
///
/// # Example
///
/// ```
/// use tierbuf::{Buffer, MemoryBuffer, Spill};
///
/// let mut spill = Spill::new(MemoryBuffer::new(4), Vec::new());
/// assert_eq!(spill.write(b"abcdef").unwrap(), 6);
///
/// let mut out = [0_u8; 4];
/// spill.read(&mut out).unwrap();
/// assert_eq!(&out, b"abcd");
/// assert_eq!(spill.sink(), b"ef");
/// ```
#[derive(Debug)]
pub struct Spill<B, W> {
    inner: B,
    sink: W,
    policy: SpillPolicy,
}

impl<B: Buffer, W: io::Write + Debug + Send> Spill<B, W> {
    /// Wraps `inner`, spilling overflow into `sink` under [`SpillPolicy::AnyError`].
    #[must_use]
    pub fn new(inner: B, sink: W) -> Self {
        Self::with_policy(inner, sink, SpillPolicy::default())
    }

    /// Wraps `inner`, spilling overflow into `sink` under the given policy.
    #[must_use]
    pub fn with_policy(inner: B, sink: W, policy: SpillPolicy) -> Self {
        Self { inner, sink, policy }
    }

    /// References the wrapped buffer.
    #[must_use]
    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    /// References the spill sink.
    #[must_use]
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Consumes the spill and returns the wrapped buffer and the sink.
    #[must_use]
    pub fn into_parts(self) -> (B, W) {
        (self.inner, self.sink)
    }
}

impl<B: Buffer, W: io::Write + Debug + Send> Buffer for Spill<B, W> {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn len(&self) -> usize {
        self.inner.len()
    }

    /// Unbounded, since overflow is forwarded instead of rejected.
    fn capacity(&self) -> Option<usize> {
        None
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn peek(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.peek(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let stored = match self.inner.write(data) {
            Ok(written) => return Ok(written),
            Err(Error::Full { written }) => written,
            Err(e) if self.policy == SpillPolicy::AnyError => {
                debug!(error = %e, "spilling write after buffer failure");
                0
            }
            Err(e) => return Err(e),
        };

        let rest = &data[stored..];
        self.sink.write_all(rest)?;

        SPILLED_BYTES.with(|e| e.observe(rest.len()));
        trace!(stored, spilled = rest.len(), "spilled overflow to sink");

        Ok(data.len())
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn discard(&mut self, len: usize) -> Result<usize> {
        self.inner.discard(len)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }
}

const SPILLED_BYTES_BUCKETS: &[Magnitude] = &[0, 64, 1024, 16_384, 262_144, 4_194_304];

thread_local! {
    static SPILLED_BYTES: Event = Event::builder()
        .name("tierbuf_spilled_bytes")
        .histogram(SPILLED_BYTES_BUCKETS)
        .build();
}
