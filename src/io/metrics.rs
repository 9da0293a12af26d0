//! Write metrics accumulator.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;

/// Counters shared by every invocation of one metered sink.
///
/// All four counters are updated under a single lock.
#[derive(Debug, Default)]
pub struct WriteMetrics {
    inner: Mutex<MetricsSnapshot>,
}

/// Point-in-time copy of [`WriteMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Bytes accepted across all writes.
    pub total_bytes: u64,
    /// Number of write calls.
    pub total_writes: u64,
    /// Time spent inside the wrapped sink.
    pub total_duration: Duration,
    /// Writes that returned an error.
    pub errors: u64,
}

impl WriteMetrics {
    /// Creates zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one write.
    pub fn record(&self, bytes: usize, elapsed: Duration, failed: bool) {
        let mut m = self.inner.lock();
        m.total_bytes += bytes as u64;
        m.total_writes += 1;
        m.total_duration += elapsed;
        if failed {
            m.errors += 1;
        }
    }

    /// Returns a copy of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        *self.inner.lock()
    }

    /// Resets every counter to zero.
    pub fn reset(&self) {
        *self.inner.lock() = MetricsSnapshot::default();
    }
}
