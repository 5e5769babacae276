//! Common types shared by all sinks

use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;

/// Minimum time between backpressure log lines
const LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Drops per interval above which the log level escalates to error
const CRITICAL_DROP_THRESHOLD: u64 = 100;

/// Result alias for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors raised inside sink writer tasks
///
/// These never cross into the router: a failing sink reports itself
/// through [`crate::Sink::is_healthy`] or a dropped delivery.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Write to the destination failed or timed out
    #[error("write error: {0}")]
    Write(String),

    /// The sink or its destination has been closed
    #[error("sink closed")]
    Closed,

    /// Could not reach the destination
    #[error("connection to {target} failed: {source}")]
    Connection {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a connection error
    pub fn connection(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connection {
            target: target.into(),
            source,
        }
    }
}

/// Rate-limited logging of dropped deliveries
///
/// Enqueue-or-drop sinks call [`record_drop`](Self::record_drop) on every
/// overflow. Drops accumulate in a window; the first drop after the window
/// is a second old logs the window's total and opens a new one.
#[derive(Debug)]
pub struct BackpressureTracker {
    window: Mutex<DropWindow>,
}

#[derive(Debug)]
struct DropWindow {
    opened: Instant,
    drops: u64,
}

impl BackpressureTracker {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(DropWindow {
                opened: Instant::now(),
                drops: 0,
            }),
        }
    }

    /// Record one dropped envelope for `sink_id`
    ///
    /// Returns true if this drop closed a window and logged it.
    pub fn record_drop(&self, sink_id: &str) -> bool {
        let drops = {
            let mut window = self.window.lock();
            window.drops += 1;
            if window.opened.elapsed() < LOG_INTERVAL {
                return false;
            }
            window.opened = Instant::now();
            std::mem::take(&mut window.drops)
        };

        if drops > CRITICAL_DROP_THRESHOLD {
            tracing::error!(
                sink = %sink_id,
                dropped = drops,
                threshold = CRITICAL_DROP_THRESHOLD,
                "consumer cannot keep up, dropping envelopes"
            );
        } else {
            tracing::warn!(sink = %sink_id, dropped = drops, "envelopes dropped in last second");
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn current_drops(&self) -> u64 {
        self.window.lock().drops
    }
}

impl Default for BackpressureTracker {
    fn default() -> Self {
        Self::new()
    }
}
