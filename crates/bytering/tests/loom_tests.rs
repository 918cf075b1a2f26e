//! Loom-based concurrency tests for the cursor protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores thread interleavings. The byte ring below is a
//! pared-down copy of the production protocol (u32 wrapping cursors, masked
//! offsets, two-segment copies) over a 4-byte buffer, with every byte in a
//! `loom::cell::UnsafeCell` so that any producer/consumer overlap on a byte is
//! reported as a data race.

#![cfg(feature = "loom")]

use loom::cell::UnsafeCell;
use loom::sync::atomic::{AtomicU32, Ordering};
use loom::sync::Arc;
use loom::thread;

const CAPACITY: u32 = 4;
const MASK: u32 = CAPACITY - 1;

struct LoomByteRing {
    /// Bytes ever pushed (written by producer)
    tail: AtomicU32,
    /// Bytes ever consumed (written by consumer)
    head: AtomicU32,
    buffer: [UnsafeCell<u8>; CAPACITY as usize],
}

unsafe impl Send for LoomByteRing {}
unsafe impl Sync for LoomByteRing {}

impl LoomByteRing {
    fn starting_at(cursor: u32) -> Self {
        Self {
            tail: AtomicU32::new(cursor),
            head: AtomicU32::new(cursor),
            buffer: [
                UnsafeCell::new(0),
                UnsafeCell::new(0),
                UnsafeCell::new(0),
                UnsafeCell::new(0),
            ],
        }
    }

    /// Producer: store the prefix of `data` that fits.
    fn push(&self, data: &[u8]) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let free = (CAPACITY - tail.wrapping_sub(head)) as usize;
        let accepted = data.len().min(free);

        for (i, &b) in data[..accepted].iter().enumerate() {
            let idx = (tail.wrapping_add(i as u32) & MASK) as usize;
            self.buffer[idx].with_mut(|p| unsafe { *p = b });
        }

        // Release: publishes the bytes to the consumer
        self.tail
            .store(tail.wrapping_add(accepted as u32), Ordering::Release);
        accepted
    }

    /// Consumer: drain the oldest bytes into `dest`.
    fn get(&self, dest: &mut [u8]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let returned = dest.len().min(tail.wrapping_sub(head) as usize);

        for (i, slot) in dest[..returned].iter_mut().enumerate() {
            let idx = (head.wrapping_add(i as u32) & MASK) as usize;
            *slot = self.buffer[idx].with(|p| unsafe { *p });
        }

        // Release: hands the region back to the producer
        self.head
            .store(head.wrapping_add(returned as u32), Ordering::Release);
        returned
    }
}

/// Bytes arrive in push order with no race on the buffer.
#[test]
fn loom_spsc_fifo() {
    loom::model(|| {
        let ring = Arc::new(LoomByteRing::starting_at(0));
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            let mut sent = producer_ring.push(b"ab");
            sent += producer_ring.push(b"c");
            sent
        });

        let mut received = Vec::new();
        let mut buf = [0u8; 2];
        for _ in 0..3 {
            let n = ring.get(&mut buf);
            received.extend_from_slice(&buf[..n]);
            thread::yield_now();
        }

        let sent = producer.join().unwrap();
        drain(&ring, &mut received);

        assert_eq!(sent, 3);
        assert_eq!(received, b"abc");
    });
}

/// A full ring truncates; the freed space is reusable after a get.
#[test]
fn loom_spsc_full_ring() {
    loom::model(|| {
        let ring = Arc::new(LoomByteRing::starting_at(0));
        let consumer_ring = Arc::clone(&ring);

        assert_eq!(ring.push(b"wxyz!"), 4);

        let consumer = thread::spawn(move || {
            let mut one = [0u8; 1];
            let n = consumer_ring.get(&mut one);
            (n, one[0])
        });

        assert_eq!(consumer.join().unwrap(), (1, b'w'));
        assert_eq!(ring.push(b"!"), 1);
    });
}

/// Cursors straddling u32::MAX while both threads copy split segments.
#[test]
fn loom_spsc_cursor_wrap() {
    loom::model(|| {
        // Physical offset 2: "123" lands at 2, 3, 0
        let ring = Arc::new(LoomByteRing::starting_at(u32::MAX - 1));
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || producer_ring.push(b"123"));

        let mut received = Vec::new();
        let mut buf = [0u8; 2];
        for _ in 0..2 {
            let n = ring.get(&mut buf);
            received.extend_from_slice(&buf[..n]);
            thread::yield_now();
        }

        assert_eq!(producer.join().unwrap(), 3);
        drain(&ring, &mut received);

        assert_eq!(received, b"123");
        assert_eq!(ring.tail.load(Ordering::SeqCst), 1);
        assert_eq!(ring.head.load(Ordering::SeqCst), 1);
    });
}

/// Reads whatever is left once the producer has finished.
fn drain(ring: &LoomByteRing, received: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    loop {
        let n = ring.get(&mut buf);
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }
}
