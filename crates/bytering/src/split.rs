//! Producer / consumer handles for using one ring from two threads.
//!
//! [`RingBuffer::split`] moves the ring behind an `Arc` shared by exactly one
//! [`Producer`] and one [`Consumer`]. Neither handle is `Clone`, and every
//! mutating method takes `&mut self`, so a second writer or reader can't be
//! expressed in safe code.
//!
//! Both handles also speak `std::io`: `Producer` is a non-blocking `Write`
//! and `Consumer` a non-blocking `Read`. A full or empty ring surfaces as
//! `ErrorKind::WouldBlock`; a dropped peer as `BrokenPipe` (writer) or
//! end-of-stream (reader).

use crate::{MetricsSnapshot, RingBuffer};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

struct Shared {
    ring: RingBuffer,
    producer_dropped: AtomicBool,
    consumer_dropped: AtomicBool,
}

impl RingBuffer {
    /// Splits the ring into its producer and consumer halves.
    ///
    /// Bytes already stored stay readable through the `Consumer`.
    ///
    /// ```
    /// use bytering_rs::RingBuffer;
    /// use std::thread;
    ///
    /// let (mut tx, mut rx) = RingBuffer::new(64)?.split();
    /// let writer = thread::spawn(move || tx.push(b"ping"));
    /// assert_eq!(writer.join().unwrap(), 4);
    ///
    /// let mut buf = [0u8; 4];
    /// assert_eq!(rx.get(&mut buf), 4);
    /// assert_eq!(&buf, b"ping");
    /// # Ok::<(), bytering_rs::RingError>(())
    /// ```
    pub fn split(self) -> (Producer, Consumer) {
        let shared = Arc::new(Shared {
            ring: self,
            producer_dropped: AtomicBool::new(false),
            consumer_dropped: AtomicBool::new(false),
        });
        (
            Producer {
                shared: Arc::clone(&shared),
            },
            Consumer { shared },
        )
    }
}

// ---------------------------------------------------------------------
// PRODUCER
// ---------------------------------------------------------------------

/// The writing half of a split [`RingBuffer`].
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    /// Appends the longest prefix of `data` that fits; see [`RingBuffer::push`].
    #[inline]
    pub fn push(&mut self, data: &[u8]) -> usize {
        // SAFETY: this is the only Producer for the ring and `&mut self`
        // serializes its calls.
        unsafe { self.shared.ring.push_shared(data) }
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.shared.ring.capacity()
    }

    /// Bytes stored. May be stale high while the consumer drains.
    #[inline]
    pub fn len(&self) -> u32 {
        self.shared.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    /// Free bytes. May be stale low while the consumer drains.
    #[inline]
    pub fn free_space(&self) -> u32 {
        self.shared.ring.free_space()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.shared.ring.is_full()
    }

    /// Returns `true` once the `Consumer` has been dropped.
    #[inline]
    pub fn is_abandoned(&self) -> bool {
        self.shared.consumer_dropped.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.ring.metrics()
    }
}

impl io::Write for Producer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.is_abandoned() {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        match self.push(buf) {
            0 => Err(io::ErrorKind::WouldBlock.into()),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.shared.producer_dropped.store(true, Ordering::Release);
        debug!(pending = self.shared.ring.len(), "ring producer dropped");
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("ring", &self.shared.ring)
            .finish()
    }
}

// ---------------------------------------------------------------------
// CONSUMER
// ---------------------------------------------------------------------

/// The reading half of a split [`RingBuffer`].
pub struct Consumer {
    shared: Arc<Shared>,
}

impl Consumer {
    /// Drains up to `dest.len()` of the oldest bytes; see [`RingBuffer::get`].
    #[inline]
    pub fn get(&mut self, dest: &mut [u8]) -> usize {
        // SAFETY: this is the only Consumer for the ring and `&mut self`
        // serializes its calls.
        unsafe { self.shared.ring.get_shared(dest) }
    }

    /// Copies the oldest bytes without consuming them.
    #[inline]
    pub fn peek(&mut self, dest: &mut [u8]) -> usize {
        // SAFETY: as in `get`.
        unsafe { self.shared.ring.peek_shared(dest) }
    }

    /// Discards up to `n` of the oldest bytes.
    #[inline]
    pub fn skip(&mut self, n: usize) -> usize {
        // SAFETY: as in `get`.
        unsafe { self.shared.ring.skip_shared(n) }
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.shared.ring.capacity()
    }

    /// Bytes stored. May be stale low while the producer writes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.shared.ring.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    /// Returns `true` once the `Producer` has been dropped.
    ///
    /// Bytes it pushed before dropping are still readable.
    #[inline]
    pub fn is_abandoned(&self) -> bool {
        self.shared.producer_dropped.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.ring.metrics()
    }
}

impl io::Read for Consumer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.get(buf) {
            0 if self.is_abandoned() => {
                // The producer may have pushed right before dropping; the
                // Acquire above makes those bytes visible to this retry.
                Ok(self.get(buf))
            }
            0 => Err(io::ErrorKind::WouldBlock.into()),
            n => Ok(n),
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.shared.consumer_dropped.store(true, Ordering::Release);
        debug!(unread = self.shared.ring.len(), "ring consumer dropped");
    }
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("ring", &self.shared.ring)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_split_keeps_stored_bytes() {
        let mut ring = RingBuffer::new(8).unwrap();
        ring.push(b"abc");
        let (mut tx, mut rx) = ring.split();

        assert_eq!(tx.push(b"defghij"), 5);
        assert!(tx.is_full());

        let mut out = [0u8; 8];
        assert_eq!(rx.get(&mut out), 8);
        assert_eq!(&out, b"abcdefgh");
        assert!(rx.is_empty());
    }

    #[test]
    fn test_abandonment_flags() {
        let (tx, rx) = RingBuffer::new(4).unwrap().split();
        assert!(!tx.is_abandoned());
        drop(rx);
        assert!(tx.is_abandoned());

        let (tx, rx) = RingBuffer::new(4).unwrap().split();
        drop(tx);
        assert!(rx.is_abandoned());
    }

    #[test]
    fn test_io_write_would_block_when_full() {
        let (mut tx, _rx) = RingBuffer::new(4).unwrap().split();
        assert_eq!(tx.write(b"abcdef").unwrap(), 4);
        let err = tx.write(b"g").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(tx.write(b"").unwrap(), 0);
        tx.flush().unwrap();
    }

    #[test]
    fn test_io_write_broken_pipe() {
        let (mut tx, rx) = RingBuffer::new(4).unwrap().split();
        drop(rx);
        assert_eq!(tx.write(b"a").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_io_read_would_block_then_eof() {
        let (mut tx, mut rx) = RingBuffer::new(4).unwrap().split();
        let mut buf = [0u8; 4];
        assert_eq!(rx.read(&mut buf).unwrap_err().kind(), io::ErrorKind::WouldBlock);

        tx.push(b"hi");
        drop(tx);

        let mut all = Vec::new();
        rx.read_to_end(&mut all).unwrap();
        assert_eq!(all, b"hi");
        assert_eq!(rx.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_consumer_peek_skip() {
        let (mut tx, mut rx) = RingBuffer::new(8).unwrap().split();
        tx.push(b"header:body");

        let mut head = [0u8; 7];
        assert_eq!(rx.peek(&mut head), 7);
        assert_eq!(&head, b"header:");
        assert_eq!(rx.skip(7), 7);

        let mut body = [0u8; 8];
        assert_eq!(rx.get(&mut body), 1);
        assert_eq!(body[0], b'b');
    }
}
