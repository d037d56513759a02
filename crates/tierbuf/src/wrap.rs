// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cursor arithmetic for a fixed-size region whose logical contents may run past the physical
//! end and continue at the start.

use std::ops::Range;

/// Maps `len` bytes starting at physical position `start` to at most two physical ranges.
///
/// The first range begins at `start`; the second, if non-empty, begins at zero and holds the
/// bytes that ran past the end of the region. The caller guarantees `len <= capacity` and,
/// when `len > 0`, `start < capacity`.
pub(crate) fn split(start: usize, len: usize, capacity: usize) -> (Range<usize>, Range<usize>) {
    debug_assert!(len <= capacity, "span of {len} bytes does not fit in {capacity}");
    debug_assert!(len == 0 || start < capacity, "start {start} outside region of {capacity}");

    let head = len.min(capacity.saturating_sub(start));

    (start..start + head, 0..len - head)
}

/// Moves a physical position forward by `by` bytes within a region of `capacity` bytes.
pub(crate) fn advance(position: usize, by: usize, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }

    // Both operands are below `capacity` after the first reduction, so the sum cannot overflow.
    (position % capacity + by % capacity) % capacity
}
