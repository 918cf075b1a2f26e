use std::sync::atomic::{AtomicU64, Ordering};

/// Optional counters for monitoring ring traffic.
///
/// Producer-side counters are only written by the producer and consumer-side
/// counters only by the consumer, so `Relaxed` increments are enough.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    bytes_pushed: AtomicU64,
    push_calls: AtomicU64,
    truncated_pushes: AtomicU64,
    bytes_consumed: AtomicU64,
    get_calls: AtomicU64,
    empty_gets: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_push(&self, requested: usize, accepted: usize) {
        self.push_calls.fetch_add(1, Ordering::Relaxed);
        self.bytes_pushed.fetch_add(accepted as u64, Ordering::Relaxed);
        if accepted < requested {
            self.truncated_pushes.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_get(&self, requested: usize, returned: usize) {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.bytes_consumed.fetch_add(returned as u64, Ordering::Relaxed);
        if returned == 0 && requested > 0 {
            self.empty_gets.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Bytes discarded by `skip` count as consumed but not as a `get` call.
    #[inline]
    pub(crate) fn record_skip(&self, skipped: usize) {
        self.bytes_consumed.fetch_add(skipped as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_pushed: self.bytes_pushed.load(Ordering::Relaxed),
            push_calls: self.push_calls.load(Ordering::Relaxed),
            truncated_pushes: self.truncated_pushes.load(Ordering::Relaxed),
            bytes_consumed: self.bytes_consumed.load(Ordering::Relaxed),
            get_calls: self.get_calls.load(Ordering::Relaxed),
            empty_gets: self.empty_gets.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the ring's counters.
///
/// All zeros when the ring was built without `enable_metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total bytes accepted by `push`.
    pub bytes_pushed: u64,
    /// Number of `push` calls.
    pub push_calls: u64,
    /// Pushes that dropped part of their input for lack of space.
    pub truncated_pushes: u64,
    /// Total bytes removed by `get` or `skip`.
    pub bytes_consumed: u64,
    /// Number of `get` calls.
    pub get_calls: u64,
    /// Gets with a non-empty destination that found nothing to read.
    pub empty_gets: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counting() {
        let m = Metrics::new();
        m.record_push(10, 10);
        m.record_push(10, 4);
        m.record_get(8, 8);
        m.record_get(8, 0);
        m.record_get(0, 0);
        m.record_skip(3);

        let s = m.snapshot();
        assert_eq!(s.bytes_pushed, 14);
        assert_eq!(s.push_calls, 2);
        assert_eq!(s.truncated_pushes, 1);
        assert_eq!(s.bytes_consumed, 11);
        assert_eq!(s.get_calls, 3);
        assert_eq!(s.empty_gets, 1);
    }
}
