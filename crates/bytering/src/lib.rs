//! ByteRing - Lock-Free Single-Producer Single-Consumer Byte Buffer
//!
//! A fixed-capacity circular byte buffer for one writer thread and one reader
//! thread running in parallel without a lock. Two 32-bit cursors count the
//! bytes ever pushed and consumed; their wrapping difference is the stored
//! length, and a power-of-two capacity turns offsets into a bitmask.
//!
//! # Key Features
//!
//! - No allocation after construction
//! - Non-blocking: a full push keeps the prefix that fits, an empty get returns 0
//! - Acquire/release cursor protocol, cursors on separate cache lines
//! - `Producer` / `Consumer` split enforcing one writer and one reader
//!
//! # Example
//!
//! ```
//! use bytering_rs::{Config, RingBuffer};
//!
//! let ring = RingBuffer::with_config(Config::new(10, false))?; // 1 KiB
//! let (mut producer, mut consumer) = ring.split();
//!
//! let sent = producer.push(b"hello world");
//! assert_eq!(sent, 11);
//!
//! let mut buf = [0u8; 5];
//! assert_eq!(consumer.get(&mut buf), 5);
//! assert_eq!(&buf, b"hello");
//! # Ok::<(), bytering_rs::RingError>(())
//! ```

mod config;
mod error;
mod invariants;
mod metrics;
mod ring;
mod split;

pub use config::{
    Config, DEFAULT_CAPACITY, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG, MAX_RING_BITS,
};
pub use error::RingError;
pub use metrics::MetricsSnapshot;
pub use ring::RingBuffer;
pub use split::{Consumer, Producer};
