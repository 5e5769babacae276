//! Container metric sink - latest value per instance
//!
//! Holds the most recent container metric for each instance index of one
//! application. Each instance keeps its own newest timestamp: an envelope
//! older than that minus the freshness window is stale and dropped, any
//! other envelope for the instance overwrites the stored value. Instances
//! never age each other out.
//!
//! Envelopes without a timestamp are treated as time zero.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use courier_protocol::Envelope;

use crate::{Delivery, Sink, SinkKind};

/// Latest container metric per instance index
#[derive(Debug)]
pub struct ContainerMetricSink {
    id: String,
    app_id: String,
    freshness_window: i64,
    state: RwLock<LatestState>,
}

#[derive(Debug, Default)]
struct LatestState {
    by_instance: HashMap<i32, Stored>,
    closed: bool,
}

#[derive(Debug)]
struct Stored {
    /// Newest timestamp seen for this instance (nanoseconds)
    newest: i64,
    envelope: Arc<Envelope>,
}

impl ContainerMetricSink {
    pub fn new(
        id: impl Into<String>,
        app_id: impl Into<String>,
        freshness_window: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            app_id: app_id.into(),
            freshness_window: i64::try_from(freshness_window.as_nanos()).unwrap_or(i64::MAX),
            state: RwLock::new(LatestState::default()),
        }
    }

    /// Stored metric per instance, ordered by instance index
    pub fn latest(&self) -> Vec<Arc<Envelope>> {
        let state = self.state.read();
        let mut stored: Vec<(i32, &Stored)> = state
            .by_instance
            .iter()
            .map(|(index, stored)| (*index, stored))
            .collect();
        stored.sort_by_key(|(index, _)| *index);
        stored
            .into_iter()
            .map(|(_, stored)| Arc::clone(&stored.envelope))
            .collect()
    }
}

impl Sink for ContainerMetricSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SinkKind {
        SinkKind::ContainerMetric
    }

    fn app_id(&self) -> Option<&str> {
        Some(&self.app_id)
    }

    fn deliver(&self, envelope: Arc<Envelope>) -> Delivery {
        let Some(metric) = envelope.container_metric() else {
            return Delivery::Dropped;
        };
        let index = metric.instance_index.unwrap_or_default();
        let timestamp = envelope.timestamp().unwrap_or_default();

        let mut state = self.state.write();
        if state.closed {
            return Delivery::Dropped;
        }

        let newest = match state.by_instance.get(&index) {
            Some(stored) if timestamp < stored.newest.saturating_sub(self.freshness_window) => {
                tracing::trace!(sink = %self.id, instance = index, "stale container metric");
                return Delivery::Dropped;
            }
            Some(stored) => stored.newest.max(timestamp),
            None => timestamp,
        };

        state
            .by_instance
            .insert(index, Stored { newest, envelope });
        Delivery::Accepted
    }

    fn should_receive_errors(&self) -> bool {
        false
    }

    fn close(&self) {
        let mut state = self.state.write();
        state.closed = true;
        state.by_instance.clear();
    }
}

#[cfg(test)]
#[path = "container_metric_test.rs"]
mod tests;
