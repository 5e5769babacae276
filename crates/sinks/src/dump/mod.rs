//! Dump sink - bounded recent history for one application
//!
//! Keeps the last N envelopes routed to an application so a consumer that
//! connects late can ask for recent output. Delivery always succeeds while
//! the sink is open; once full, the oldest envelope is overwritten.
//!
//! Error envelopes generated by the router are retained too, so a dump shows
//! why an application's drain went away.
//!
//! The sink remembers when it last received an envelope. Owners can reclaim
//! idle sinks with [`DumpSink::is_idle`].

mod ring;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use courier_protocol::Envelope;

use crate::{Delivery, Sink, SinkKind};
use ring::EnvelopeRing;

/// Ring buffer of an application's recent envelopes
#[derive(Debug)]
pub struct DumpSink {
    id: String,
    app_id: String,
    ring: EnvelopeRing,
    last_activity: Mutex<Instant>,
}

impl DumpSink {
    /// Create a dump sink retaining up to `capacity` envelopes
    pub fn new(id: impl Into<String>, app_id: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            app_id: app_id.into(),
            ring: EnvelopeRing::with_capacity(capacity),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Retained envelopes, oldest first
    pub fn dump(&self) -> Vec<Arc<Envelope>> {
        self.ring.snapshot()
    }

    /// Number of retained envelopes
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Envelopes accepted since creation, including overwritten ones
    pub fn total_received(&self) -> u64 {
        self.ring.total_written()
    }

    /// Whether nothing has been delivered for at least `timeout`
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.last_activity.lock().elapsed() >= timeout
    }
}

impl Sink for DumpSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Dump
    }

    fn app_id(&self) -> Option<&str> {
        Some(&self.app_id)
    }

    fn deliver(&self, envelope: Arc<Envelope>) -> Delivery {
        if !self.ring.push(envelope) {
            return Delivery::Dropped;
        }
        *self.last_activity.lock() = Instant::now();
        Delivery::Accepted
    }

    fn should_receive_errors(&self) -> bool {
        true
    }

    fn close(&self) {
        self.ring.close();
        tracing::debug!(sink = %self.id, app_id = %self.app_id, "dump sink closed");
    }
}

#[cfg(test)]
#[path = "dump_test.rs"]
mod tests;
