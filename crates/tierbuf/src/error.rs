// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Any condition signaled by a buffer in this crate.
///
/// Two of the variants are not failures in the usual sense: [`Error::Full`] and
/// [`Error::EndOfStream`] report that a buffer reached one of its boundaries. Callers that drive
/// data through a buffer are expected to react to them (stop writing, stop reading) rather than
/// abandon the operation.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The buffer ran out of capacity before all of the offered bytes could be stored.
    ///
    /// The first `written` bytes of the offered data were stored; the remainder was rejected.
    #[error("buffer full after accepting {written} bytes")]
    Full {
        /// How many bytes were stored before capacity was exhausted.
        written: usize,
    },

    /// The buffer holds no unread bytes.
    ///
    /// More data may become available after further writes.
    #[error("end of stream")]
    EndOfStream,

    /// A positional write was requested past the end of the unread data.
    ///
    /// Positional writes may overwrite unread bytes or extend them but may not leave a gap.
    #[error("offset {offset} is past the {len} unread bytes of the buffer")]
    OutOfRange {
        /// The requested logical offset.
        offset: usize,
        /// How many unread bytes the buffer held at the time of the request.
        len: usize,
    },

    /// We are forwarding an error received from the underlying storage handle or sink.
    #[error(transparent)]
    Storage(#[from] std::io::Error),
}

/// A `Result` that may contain an [`Error`] from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a buffer error as a standard I/O error.
///
/// This is used when handing buffers to code that only speaks `std::io`.
impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Storage(error) => error,
            Error::Full { .. } => Self::new(std::io::ErrorKind::WriteZero, value),
            Error::EndOfStream => Self::new(std::io::ErrorKind::UnexpectedEof, value),
            Error::OutOfRange { .. } => Self::new(std::io::ErrorKind::InvalidInput, value),
        }
    }
}
