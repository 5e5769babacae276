//! Count-or-time batching of throughput counts
//!
//! Counting every envelope individually would put a metric emission on the
//! hot path. The batcher accumulates a count and reports it once it reaches
//! `batch_size` or once `flush_interval` has passed since the last report,
//! whichever comes first. Both conditions are checked per item, so a quiet
//! stream flushes on its next envelope rather than on a timer.

use std::time::Duration;

use tokio::time::Instant;

/// Default items per flush
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Default maximum time between flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Two-field flush state: pending count and last flush instant
#[derive(Debug)]
pub struct ThroughputBatcher {
    count: u64,
    last_flush: Instant,
    batch_size: u64,
    flush_interval: Duration,
}

impl ThroughputBatcher {
    pub fn new(batch_size: u64, flush_interval: Duration) -> Self {
        Self {
            count: 0,
            last_flush: Instant::now(),
            batch_size: batch_size.max(1),
            flush_interval,
        }
    }

    /// Count one item; returns the count to report if a flush is due
    pub fn record(&mut self) -> Option<u64> {
        self.count += 1;
        if self.count >= self.batch_size || self.last_flush.elapsed() >= self.flush_interval {
            return self.flush();
        }
        None
    }

    /// Report whatever is pending and reset
    pub fn flush(&mut self) -> Option<u64> {
        let count = std::mem::take(&mut self.count);
        self.last_flush = Instant::now();
        (count > 0).then_some(count)
    }

    /// Items counted since the last flush
    pub fn pending(&self) -> u64 {
        self.count
    }
}

impl Default for ThroughputBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL)
    }
}
