//! Debug assertion macros for the cursor invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is zero
//! overhead in release builds. Cursors are `u32` counters that wrap, so every
//! check is phrased in terms of `wrapping_sub` distances, never raw `<=`.

// =============================================================================
// Bounded length
// =============================================================================

/// Assert that the stored byte count does not exceed capacity.
///
/// **Invariant**: `0 ≤ tail.wrapping_sub(head) ≤ capacity`
///
/// Used in: `push_shared()` before publishing the new tail
macro_rules! debug_assert_bounded_len {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "bounded length violated: {} bytes stored in a {} byte ring",
            $len,
            $capacity
        )
    };
}

/// Assert that the consumer does not advance past the producer.
///
/// **Invariant**: bytes released by the consumer ≤ bytes available
///
/// Used in: `get_shared()` and `skip_shared()` before publishing the new head
macro_rules! debug_assert_head_not_past_tail {
    ($advance:expr, $available:expr) => {
        debug_assert!(
            $advance <= $available,
            "advancing head by {} with only {} bytes available",
            $advance,
            $available
        )
    };
}

// =============================================================================
// Segment bounds
// =============================================================================

/// Assert that a contiguous segment lies inside the backing array.
///
/// Used in: `write_at()` / `read_at()` before the raw copy
macro_rules! debug_assert_segment_in_bounds {
    ($offset:expr, $len:expr, $capacity:expr) => {
        debug_assert!(
            $offset + $len <= $capacity,
            "segment [{}, {}) exceeds buffer of {} bytes",
            $offset,
            $offset + $len,
            $capacity
        )
    };
}

pub(crate) use debug_assert_bounded_len;
pub(crate) use debug_assert_head_not_past_tail;
pub(crate) use debug_assert_segment_in_bounds;
