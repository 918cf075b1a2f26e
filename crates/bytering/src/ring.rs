use crate::invariants::{
    debug_assert_bounded_len, debug_assert_head_not_past_tail, debug_assert_segment_in_bounds,
};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::{Config, RingError, DEFAULT_CAPACITY};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace, warn};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// ## Cursors
//
// `tail` counts every byte ever pushed and `head` every byte ever consumed,
// both modulo 2^32. The stored length is `tail.wrapping_sub(head)`, which
// stays correct across counter overflow because it never exceeds capacity
// (at most 2^31). The physical offset of a cursor is `cursor & mask`.
//
// ## Memory Ordering Protocol
//
// **Producer (push):**
// 1. Load `tail` with Relaxed (only producer writes tail)
// 2. Load `head` with Acquire (synchronizes with consumer's Release)
// 3. Copy bytes into the free region, split in at most two segments
// 4. Store `tail` with Release (publishes the bytes to the consumer)
//
// **Consumer (get):**
// 1. Load `head` with Relaxed (only consumer writes head)
// 2. Load `tail` with Acquire (synchronizes with producer's Release)
// 3. Copy bytes out of the stored region, split in at most two segments
// 4. Store `head` with Release (hands the region back to the producer)
//
// ## Single-Writer Invariants
//
// - `tail` and bytes in `[tail, head + capacity)`: written by the producer only
// - `head`: written by the consumer only
// - bytes in `[head, tail)`: read by the consumer only
//
// Safe code gets these through `&mut RingBuffer` (one thread does both) or
// through the `Producer`/`Consumer` pair from `split()`.
//
// =============================================================================

/// Lock-free single-producer single-consumer circular byte buffer.
///
/// Capacity is a power of two fixed at construction. `push` stores as much
/// of its input as fits and drops the rest; `get` drains the oldest bytes.
/// Neither ever blocks or allocates.
///
/// # Example
///
/// ```
/// use bytering_rs::RingBuffer;
///
/// let mut ring = RingBuffer::new(4)?;
/// assert_eq!(ring.push(b"abcde"), 4); // "e" doesn't fit
///
/// let mut one = [0u8; 1];
/// assert_eq!(ring.get(&mut one), 1);
/// assert_eq!(&one, b"a");
/// assert_eq!(ring.len(), 3);
/// # Ok::<(), bytering_rs::RingError>(())
/// ```
pub struct RingBuffer {
    /// Bytes ever pushed (written by producer, read by consumer)
    tail: CachePadded<AtomicU32>,
    /// Bytes ever consumed (written by consumer, read by producer)
    head: CachePadded<AtomicU32>,

    capacity: u32,
    mask: u32,
    enable_metrics: bool,
    metrics: Metrics,

    /// Backing storage. Each byte sits in an `UnsafeCell` so the producer
    /// can write the free region while the consumer reads the stored one.
    buffer: Box<[UnsafeCell<u8>]>,
}

// SAFETY: every `&self` method that touches `buffer` is either read-only
// (`peek`, with no writer able to exist while `&self` is shared) or a
// crate-private `unsafe fn` whose callers uphold the single-producer /
// single-consumer contract. Cursors are atomics.
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates an empty ring of `capacity` bytes.
    ///
    /// Fails unless `capacity` is a non-zero power of two.
    pub fn new(capacity: u32) -> Result<Self, RingError> {
        Self::build(capacity, false)
    }

    /// Creates an empty ring sized and instrumented by `config`.
    pub fn with_config(config: Config) -> Result<Self, RingError> {
        let capacity = config.capacity().map_err(|e| {
            warn!(ring_bits = config.ring_bits, "rejecting ring configuration");
            e
        })?;
        Self::build(capacity, config.enable_metrics)
    }

    fn build(capacity: u32, enable_metrics: bool) -> Result<Self, RingError> {
        if !capacity.is_power_of_two() {
            warn!(capacity, "rejecting ring capacity that is not a power of two");
            return Err(RingError::CapacityNotPowerOfTwo { capacity });
        }
        Ok(Self::from_validated(capacity, enable_metrics))
    }

    fn from_validated(capacity: u32, enable_metrics: bool) -> Self {
        let buffer: Box<[UnsafeCell<u8>]> = (0..capacity).map(|_| UnsafeCell::new(0)).collect();
        debug!(capacity, enable_metrics, "allocated byte ring");

        Self {
            tail: CachePadded::new(AtomicU32::new(0)),
            head: CachePadded::new(AtomicU32::new(0)),
            capacity,
            mask: capacity - 1,
            enable_metrics,
            metrics: Metrics::new(),
            buffer,
        }
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Returns the ring capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the number of bytes currently stored.
    #[inline]
    pub fn len(&self) -> u32 {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    /// Returns how many more bytes a `push` could accept right now.
    #[inline]
    pub fn free_space(&self) -> u32 {
        self.capacity - self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // ---------------------------------------------------------------------
    // EXCLUSIVE API
    // ---------------------------------------------------------------------

    /// Appends the longest prefix of `data` that fits and returns its length.
    ///
    /// Bytes past the free space are dropped. A return value smaller than
    /// `data.len()` is the signal to retry the remainder later.
    #[inline]
    pub fn push(&mut self, data: &[u8]) -> usize {
        // SAFETY: `&mut self` rules out any concurrent producer or consumer.
        unsafe { self.push_shared(data) }
    }

    /// Moves up to `dest.len()` of the oldest bytes into `dest`.
    ///
    /// Returns the number of bytes written to the front of `dest`. An empty
    /// ring returns 0 and leaves `dest` untouched.
    #[inline]
    pub fn get(&mut self, dest: &mut [u8]) -> usize {
        // SAFETY: `&mut self` rules out any concurrent producer or consumer.
        unsafe { self.get_shared(dest) }
    }

    /// Like [`get`](Self::get) but leaves the bytes in the ring.
    #[inline]
    pub fn peek(&self, dest: &mut [u8]) -> usize {
        // SAFETY: a shared borrow means no `&mut` pushes or gets can run, and
        // a split ring is only reachable through its handles.
        unsafe { self.peek_shared(dest) }
    }

    /// Discards up to `n` of the oldest bytes and returns how many went.
    #[inline]
    pub fn skip(&mut self, n: usize) -> usize {
        // SAFETY: `&mut self` rules out any concurrent consumer.
        unsafe { self.skip_shared(n) }
    }

    /// Empties the ring and resets both cursors to zero.
    pub fn clear(&mut self) {
        *self.tail.get_mut() = 0;
        *self.head.get_mut() = 0;
    }

    // ---------------------------------------------------------------------
    // PRODUCER SIDE
    // ---------------------------------------------------------------------

    /// # Safety
    ///
    /// No other thread may run a producer-side method concurrently.
    pub(crate) unsafe fn push_shared(&self, data: &[u8]) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let free = self.capacity - tail.wrapping_sub(head);
        let accepted = data.len().min(free as usize);

        if accepted > 0 {
            let offset = (tail & self.mask) as usize;
            let first = accepted.min(self.capacity as usize - offset);
            let (front, back) = data[..accepted].split_at(first);

            // SAFETY: [tail, tail + accepted) is inside the free region; the
            // consumer won't read it until the Release store below.
            unsafe {
                self.write_at(offset, front);
                self.write_at(0, back);
            }

            let new_tail = tail.wrapping_add(accepted as u32);
            debug_assert_bounded_len!(new_tail.wrapping_sub(head), self.capacity);
            self.tail.store(new_tail, Ordering::Release);
        }

        if accepted < data.len() {
            trace!(requested = data.len(), accepted, "push truncated");
        }
        if self.enable_metrics {
            self.metrics.record_push(data.len(), accepted);
        }

        accepted
    }

    /// Copies `src` into the buffer starting at physical `offset`.
    ///
    /// # Safety
    ///
    /// The target range must be owned by the producer.
    #[inline]
    unsafe fn write_at(&self, offset: usize, src: &[u8]) {
        debug_assert_segment_in_bounds!(offset, src.len(), self.buffer.len());
        // SAFETY: in bounds per the assertion above; `UnsafeCell` permits
        // writes through the shared slice.
        unsafe {
            let dst = UnsafeCell::raw_get(self.buffer.as_ptr().add(offset));
            ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
        }
    }

    // ---------------------------------------------------------------------
    // CONSUMER SIDE
    // ---------------------------------------------------------------------

    /// # Safety
    ///
    /// No other thread may run a consumer-side method concurrently.
    pub(crate) unsafe fn get_shared(&self, dest: &mut [u8]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let available = tail.wrapping_sub(head) as usize;

        // SAFETY: forwarded from the caller.
        let returned = unsafe { self.copy_out(head, available, dest) };
        if returned > 0 {
            debug_assert_head_not_past_tail!(returned, available);
            self.head
                .store(head.wrapping_add(returned as u32), Ordering::Release);
        }

        if self.enable_metrics {
            self.metrics.record_get(dest.len(), returned);
        }

        returned
    }

    /// # Safety
    ///
    /// No other thread may run a consumer-side method concurrently.
    pub(crate) unsafe fn peek_shared(&self, dest: &mut [u8]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        // SAFETY: forwarded from the caller.
        unsafe { self.copy_out(head, tail.wrapping_sub(head) as usize, dest) }
    }

    /// # Safety
    ///
    /// No other thread may run a consumer-side method concurrently.
    pub(crate) unsafe fn skip_shared(&self, n: usize) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let available = tail.wrapping_sub(head) as usize;
        let skipped = n.min(available);

        if skipped > 0 {
            debug_assert_head_not_past_tail!(skipped, available);
            self.head
                .store(head.wrapping_add(skipped as u32), Ordering::Release);
            if self.enable_metrics {
                self.metrics.record_skip(skipped);
            }
        }

        skipped
    }

    /// Copies the oldest `min(dest.len(), available)` bytes starting at
    /// cursor `head` into `dest`, without moving any cursor.
    ///
    /// # Safety
    ///
    /// `[head, head + available)` must be published by the producer and
    /// reserved to the calling consumer.
    #[inline]
    unsafe fn copy_out(&self, head: u32, available: usize, dest: &mut [u8]) -> usize {
        let n = dest.len().min(available);
        if n == 0 {
            return 0;
        }

        let offset = (head & self.mask) as usize;
        let first = n.min(self.capacity as usize - offset);
        let (front, back) = dest[..n].split_at_mut(first);

        // SAFETY: forwarded from the caller.
        unsafe {
            self.read_at(offset, front);
            self.read_at(0, back);
        }
        n
    }

    /// Fills `dst` from the buffer starting at physical `offset`.
    ///
    /// # Safety
    ///
    /// The source range must hold published bytes owned by the consumer.
    #[inline]
    unsafe fn read_at(&self, offset: usize, dst: &mut [u8]) {
        debug_assert_segment_in_bounds!(offset, dst.len(), self.buffer.len());
        // SAFETY: in bounds per the assertion above; the producer is not
        // writing this range.
        unsafe {
            let src = UnsafeCell::raw_get(self.buffer.as_ptr().add(offset)).cast_const();
            ptr::copy_nonoverlapping(src, dst.as_mut_ptr(), dst.len());
        }
    }
}

impl Default for RingBuffer {
    /// A 32 KiB ring without metrics.
    fn default() -> Self {
        Self::from_validated(DEFAULT_CAPACITY, false)
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("free_space", &self.free_space())
            .finish_non_exhaustive()
    }
}
