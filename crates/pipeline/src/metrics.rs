//! Sink manager metrics
//!
//! Two kinds of instrumentation live here:
//!
//! - [`Population`]: how many sinks of each kind are registered, published
//!   as value metrics through the [`MetricEmitter`]. Only registration and
//!   removal change it, always under the registry's write lock.
//! - [`RouterMetrics`]: local atomic counters for routing activity, read
//!   through [`RouterMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use courier_metrics::MetricEmitter;
use courier_sinks::SinkKind;

/// Unit of every population metric
pub const POPULATION_UNIT: &str = "sinks";

/// Value metric carrying the firehose population
pub const FIREHOSE_METRIC: &str = "messageRouter.numberOfFirehoseSinks";

/// Value metric carrying the population of one sink kind
pub const fn population_metric(kind: SinkKind) -> &'static str {
    match kind {
        SinkKind::Websocket => "messageRouter.numberOfWebsocketSinks",
        SinkKind::Dump => "messageRouter.numberOfDumpSinks",
        SinkKind::ContainerMetric => "messageRouter.numberOfContainerMetricSinks",
        SinkKind::Syslog => "messageRouter.numberOfSyslogSinks",
    }
}

const fn slot(kind: SinkKind) -> usize {
    match kind {
        SinkKind::Websocket => 0,
        SinkKind::Dump => 1,
        SinkKind::ContainerMetric => 2,
        SinkKind::Syslog => 3,
    }
}

/// Registered sink counts per kind, plus firehose-scoped sinks
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Population {
    by_kind: [u64; 4],
    firehose: u64,
}

impl Population {
    /// Registered sinks of `kind`, whatever their scope
    pub fn count(&self, kind: SinkKind) -> u64 {
        self.by_kind[slot(kind)]
    }

    /// Firehose-scoped sinks
    pub fn firehose(&self) -> u64 {
        self.firehose
    }

    pub fn total(&self) -> u64 {
        self.by_kind.iter().sum()
    }

    pub(crate) fn add(&mut self, kind: SinkKind, firehose: bool) {
        self.by_kind[slot(kind)] += 1;
        if firehose {
            self.firehose += 1;
        }
    }

    pub(crate) fn remove(&mut self, kind: SinkKind, firehose: bool) {
        let count = &mut self.by_kind[slot(kind)];
        *count = count.saturating_sub(1);
        if firehose {
            self.firehose = self.firehose.saturating_sub(1);
        }
    }

    /// Publish the count for `kind`, and the firehose count if it changed
    pub(crate) fn emit(&self, emitter: &dyn MetricEmitter, kind: SinkKind, firehose: bool) {
        emitter.send_value(
            population_metric(kind),
            self.count(kind) as f64,
            POPULATION_UNIT,
        );
        if firehose {
            emitter.send_value(FIREHOSE_METRIC, self.firehose as f64, POPULATION_UNIT);
        }
    }
}

/// Routing activity counters
///
/// Relaxed ordering; values are eventually consistent.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Envelopes offered to `route`
    envelopes_received: AtomicU64,

    /// Envelopes with no matching sink
    envelopes_unrouted: AtomicU64,

    /// Deliveries a sink accepted
    deliveries_accepted: AtomicU64,

    /// Deliveries a sink dropped
    deliveries_dropped: AtomicU64,

    /// Sinks removed for being unhealthy or idle
    sinks_reaped: AtomicU64,

    /// Error envelopes generated for applications
    errors_sent: AtomicU64,
}

impl RouterMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            envelopes_received: AtomicU64::new(0),
            envelopes_unrouted: AtomicU64::new(0),
            deliveries_accepted: AtomicU64::new(0),
            deliveries_dropped: AtomicU64::new(0),
            sinks_reaped: AtomicU64::new(0),
            errors_sent: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.envelopes_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_unrouted(&self) {
        self.envelopes_unrouted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_deliveries(&self, accepted: u64, dropped: u64) {
        self.deliveries_accepted.fetch_add(accepted, Ordering::Relaxed);
        self.deliveries_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_reaped(&self, count: u64) {
        self.sinks_reaped.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_error_sent(&self) {
        self.errors_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> RouterMetricsSnapshot {
        RouterMetricsSnapshot {
            envelopes_received: self.envelopes_received.load(Ordering::Relaxed),
            envelopes_unrouted: self.envelopes_unrouted.load(Ordering::Relaxed),
            deliveries_accepted: self.deliveries_accepted.load(Ordering::Relaxed),
            deliveries_dropped: self.deliveries_dropped.load(Ordering::Relaxed),
            sinks_reaped: self.sinks_reaped.load(Ordering::Relaxed),
            errors_sent: self.errors_sent.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of router metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterMetricsSnapshot {
    pub envelopes_received: u64,
    pub envelopes_unrouted: u64,
    pub deliveries_accepted: u64,
    pub deliveries_dropped: u64,
    pub sinks_reaped: u64,
    pub errors_sent: u64,
}
