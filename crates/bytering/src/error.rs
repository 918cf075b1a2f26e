//! Error types for ring construction.
//!
//! Running out of space or data is never an error: `push` and `get` report
//! how many bytes they moved. Only an invalid geometry is rejected.

use thiserror::Error;

/// Errors that can occur when building a [`RingBuffer`](crate::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Capacity is zero or not a power of two, so offsets can't be masked.
    #[error("capacity {capacity} is not a non-zero power of two")]
    CapacityNotPowerOfTwo {
        /// The rejected capacity.
        capacity: u32,
    },

    /// `ring_bits` would not fit a 32-bit capacity.
    #[error("ring_bits {ring_bits} out of range (max: {max})", max = crate::config::MAX_RING_BITS)]
    RingBitsOutOfRange {
        /// The rejected bit count.
        ring_bits: u8,
    },
}
