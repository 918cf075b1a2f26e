use crate::RingError;

/// Largest `ring_bits` that still fits a `u32` capacity.
pub const MAX_RING_BITS: u8 = 31;

/// Default ring size in bytes (32 KiB).
pub const DEFAULT_CAPACITY: u32 = 1 << 15;

/// Configuration for a [`RingBuffer`](crate::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Ring buffer size as power of 2 (default: 15 = 32 KiB)
    pub ring_bits: u8,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(ring_bits: u8, enable_metrics: bool) -> Self {
        Self {
            ring_bits,
            enable_metrics,
        }
    }

    /// Returns the capacity in bytes, or an error if `ring_bits` overflows `u32`.
    #[inline]
    pub const fn capacity(&self) -> Result<u32, RingError> {
        if self.ring_bits > MAX_RING_BITS {
            return Err(RingError::RingBitsOutOfRange {
                ring_bits: self.ring_bits,
            });
        }
        Ok(1 << self.ring_bits)
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(&self) -> Result<u32, RingError> {
        match self.capacity() {
            Ok(capacity) => Ok(capacity - 1),
            Err(e) => Err(e),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring_bits: DEFAULT_CAPACITY.trailing_zeros() as u8,
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (4 KiB, fits in L1 cache)
pub const LOW_LATENCY_CONFIG: Config = Config::new(12, false);

/// High throughput configuration (1 MiB)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(20, false);
