//! Courier - Metrics
//!
//! Self-instrumentation for the routing core.
//!
//! # Overview
//!
//! This crate provides:
//! - `MetricEmitter` - the capability components use to emit counters and
//!   value metrics
//! - `MetricsRegistry` - an in-memory emitter that aggregates by name and tags
//! - `Reporter` - periodic reporting of registry snapshots (human, JSON)
//! - `Counter` - atomic counter used by components for local tallies
//!
//! # Design Principles
//!
//! - **Lock-light**: counter updates take a read lock and an atomic add
//! - **Capability-based**: components receive `Arc<dyn MetricEmitter>` and
//!   never know where metrics end up
//! - **Configurable**: reporting interval and format come from config
//!
//! # Metric Names
//!
//! - `dropsondeUnmarshaller.*` - unmarshal stage receipts and errors
//! - `ingress` - ingestor throughput (tagged `protocol`)
//! - `messageRouter.numberOf<Kind>Sinks` - sink populations
//!
//! # Example
//!
//! ```
//! use courier_metrics::{MetricEmitter, MetricsRegistry};
//!
//! let registry = MetricsRegistry::new();
//! registry.increment_counter("dropsondeUnmarshaller.unmarshalErrors");
//! registry.add_counter("ingress", 1000, &[("protocol", "v2")]);
//! registry.send_value("messageRouter.numberOfDumpSinks", 1.0, "sinks");
//!
//! assert_eq!(registry.counter("dropsondeUnmarshaller.unmarshalErrors"), 1);
//! assert_eq!(registry.counter_with_tags("ingress", &[("protocol", "v2")]), 1000);
//! assert_eq!(registry.value("messageRouter.numberOfDumpSinks"), Some(1.0));
//! ```

pub mod format;
mod registry;
mod reporter;

pub use format::{HumanFormatter, JsonFormatter, MetricsFormatter};
pub use registry::{CounterRate, CounterSample, MetricsRegistry, MetricsSnapshot, ValueSample};
pub use reporter::Reporter;

use std::sync::atomic::{AtomicU64, Ordering};

/// Capability to emit metrics
///
/// Implementations must be cheap to call from hot paths and must never
/// block on I/O.
pub trait MetricEmitter: Send + Sync {
    /// Increment an untagged counter by one
    fn increment_counter(&self, name: &str) {
        self.add_counter(name, 1, &[]);
    }

    /// Add `delta` to a counter identified by name and tags
    fn add_counter(&self, name: &str, delta: u64, tags: &[(&str, &str)]);

    /// Record the current value of a gauge-like metric
    fn send_value(&self, name: &str, value: f64, unit: &str);
}

/// Emitter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl MetricEmitter for NoopEmitter {
    fn add_counter(&self, _name: &str, _delta: u64, _tags: &[(&str, &str)]) {}

    fn send_value(&self, _name: &str, _value: f64, _unit: &str) {}
}

/// Atomic counter wrapper for convenient metric operations
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Create a new counter initialized to 0
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increment the counter by `val` (relaxed ordering for performance)
    #[inline]
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Increment the counter by 1
    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    /// Get the current value (relaxed ordering)
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Reset the counter to 0 and return the previous value
    #[inline]
    pub fn take(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}
