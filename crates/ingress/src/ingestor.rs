//! Ingestor - consumes a stream of newer-generation envelopes
//!
//! Each inbound envelope is translated to the legacy form and validated into
//! the canonical [`Envelope`]. Envelopes that fail either step are skipped
//! without being counted. Valid envelopes are counted in batches (see
//! [`ThroughputBatcher`]) and handed to an [`EnvelopeSetter`], normally the
//! buffer in front of the router.
//!
//! The loop ends only when the stream fails; that error is returned as-is.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use courier_config::IngressConfig;
use courier_metrics::MetricEmitter;
use courier_protocol::convert::to_v1;
use courier_protocol::Envelope;
use courier_protocol::wire::v2;

use crate::{IngressError, Result, ThroughputBatcher};

/// Throughput counter flushed by the ingestor
const INGRESS_COUNTER: &str = "ingress";

/// Source of inbound newer-generation envelopes
#[async_trait]
pub trait EnvelopeStream: Send {
    /// Next envelope; an error terminates the consumer
    async fn recv(&mut self) -> Result<v2::Envelope>;
}

#[async_trait]
impl EnvelopeStream for mpsc::Receiver<v2::Envelope> {
    async fn recv(&mut self) -> Result<v2::Envelope> {
        mpsc::Receiver::recv(self)
            .await
            .ok_or_else(|| IngressError::stream("envelope channel closed"))
    }
}

/// Buffer the ingestor writes into
pub trait EnvelopeSetter: Send + Sync {
    /// Store an envelope; must not block
    fn set(&self, envelope: Arc<Envelope>);
}

impl EnvelopeSetter for mpsc::Sender<Arc<Envelope>> {
    fn set(&self, envelope: Arc<Envelope>) {
        match self.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!("envelope buffer full, dropping envelope");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("envelope buffer closed, dropping envelope");
            }
        }
    }
}

/// Stream consumer
pub struct Ingestor<S> {
    setter: S,
    metrics: Arc<dyn MetricEmitter>,
    batch_size: u64,
    flush_interval: std::time::Duration,
}

impl<S: EnvelopeSetter> Ingestor<S> {
    /// Ingestor with default batching (1000 envelopes or 5s)
    pub fn new(setter: S, metrics: Arc<dyn MetricEmitter>) -> Self {
        Self::with_config(setter, metrics, &IngressConfig::default())
    }

    pub fn with_config(setter: S, metrics: Arc<dyn MetricEmitter>, config: &IngressConfig) -> Self {
        Self {
            setter,
            metrics,
            batch_size: config.batch_size,
            flush_interval: config.flush_interval,
        }
    }

    /// Consume `stream` until it fails
    ///
    /// Envelopes counted but not yet flushed are reported before returning.
    pub async fn consume<R: EnvelopeStream + ?Sized>(&self, stream: &mut R) -> IngressError {
        let mut batcher = ThroughputBatcher::new(self.batch_size, self.flush_interval);
        tracing::info!(
            batch_size = self.batch_size,
            flush_interval = ?self.flush_interval,
            "ingestor started"
        );

        loop {
            let next = match stream.recv().await {
                Ok(next) => next,
                Err(e) => {
                    if let Some(count) = batcher.flush() {
                        self.report(count);
                    }
                    tracing::info!(error = %e, "ingestor stream ended");
                    return e;
                }
            };

            let Some(envelope) = canonicalize(&next) else {
                continue;
            };

            if let Some(count) = batcher.record() {
                self.report(count);
            }
            self.setter.set(Arc::new(envelope));
        }
    }

    fn report(&self, count: u64) {
        self.metrics
            .add_counter(INGRESS_COUNTER, count, &[("protocol", "v2")]);
    }
}

/// Translate and validate, `None` if either step fails
fn canonicalize(envelope: &v2::Envelope) -> Option<Envelope> {
    let legacy = to_v1(envelope)?;
    match Envelope::try_from(legacy) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            tracing::trace!(error = %e, source_id = %envelope.source_id, "skipping invalid envelope");
            None
        }
    }
}

#[cfg(test)]
#[path = "ingestor_test.rs"]
mod tests;
