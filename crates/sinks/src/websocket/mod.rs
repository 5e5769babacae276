//! Websocket sink - live streaming to one consumer
//!
//! Each consumer gets a bounded queue and a dedicated writer task. The
//! router enqueues with `try_send`; when the consumer falls behind, new
//! envelopes are dropped and counted instead of slowing routing down.
//!
//! The writer task encodes each envelope in the legacy wire format and hands
//! the frame to a [`FrameWriter`]. The transport (websocket library, test
//! channel) lives behind that trait.
//!
//! # Lifecycle
//!
//! - A write failure ends the task and marks the sink closed. It reports
//!   unhealthy and fires [`Sink::health_signal`] so the registry removes it.
//! - [`Sink::close`] cancels the task and releases the queue. Deliveries
//!   after `close` returns are dropped.
//!
//! # Example
//!
//! ```ignore
//! let (frames_tx, mut frames_rx) = mpsc::channel(16);
//! let sink = WebsocketSink::spawn("ws-1", Some("app-1".into()), frames_tx, 100);
//!
//! sink.deliver(envelope);
//! let frame: Bytes = frames_rx.recv().await.unwrap();
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use courier_metrics::Counter;
use courier_protocol::Envelope;

use crate::{BackpressureTracker, Delivery, Result, Sink, SinkError, SinkKind};

/// Egress for encoded frames
#[async_trait]
pub trait FrameWriter: Send + 'static {
    /// Write one binary frame
    async fn write_frame(&mut self, frame: Bytes) -> Result<()>;

    /// Release the transport; called once when the writer task ends
    async fn close(&mut self) {}
}

/// Frames forwarded to a channel, for adapting any websocket library
#[async_trait]
impl FrameWriter for mpsc::Sender<Bytes> {
    async fn write_frame(&mut self, frame: Bytes) -> Result<()> {
        self.send(frame).await.map_err(|_| SinkError::Closed)
    }
}

/// Live streaming sink
#[derive(Debug)]
pub struct WebsocketSink {
    id: String,
    app_id: Option<String>,
    /// Queue into the writer task, `None` once closed
    sender: RwLock<Option<mpsc::Sender<Arc<Envelope>>>>,
    cancel: CancellationToken,
    delivered: Counter,
    dropped: Counter,
    backpressure: BackpressureTracker,
}

impl WebsocketSink {
    /// Create the sink and spawn its writer task
    ///
    /// `app_id` is `None` for firehose consumers. Must be called within a
    /// tokio runtime.
    pub fn spawn<W: FrameWriter>(
        id: impl Into<String>,
        app_id: Option<String>,
        writer: W,
        buffer_size: usize,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        let sink = Arc::new(Self {
            id: id.into(),
            app_id,
            sender: RwLock::new(Some(tx)),
            cancel: CancellationToken::new(),
            delivered: Counter::new(),
            dropped: Counter::new(),
            backpressure: BackpressureTracker::new(),
        });

        tokio::spawn(write_frames(
            sink.id.clone(),
            rx,
            writer,
            sink.cancel.clone(),
        ));
        tracing::debug!(sink = %sink.id, app_id = ?sink.app_id, "websocket sink started");

        sink
    }

    /// Envelopes accepted into the queue
    pub fn delivered(&self) -> u64 {
        self.delivered.get()
    }

    /// Envelopes dropped because the queue was full or the sink closed
    pub fn dropped(&self) -> u64 {
        self.dropped.get()
    }

    fn drop_envelope(&self) -> Delivery {
        self.dropped.inc();
        Delivery::Dropped
    }
}

impl Sink for WebsocketSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Websocket
    }

    fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    fn deliver(&self, envelope: Arc<Envelope>) -> Delivery {
        if self.cancel.is_cancelled() {
            return self.drop_envelope();
        }

        // Held across try_send so close() cannot race a late enqueue
        let sender = self.sender.read();
        let Some(tx) = sender.as_ref() else {
            return self.drop_envelope();
        };

        match tx.try_send(envelope) {
            Ok(()) => {
                self.delivered.inc();
                Delivery::Accepted
            }
            Err(TrySendError::Full(_)) => {
                self.backpressure.record_drop(&self.id);
                self.drop_envelope()
            }
            Err(TrySendError::Closed(_)) => self.drop_envelope(),
        }
    }

    fn should_receive_errors(&self) -> bool {
        true
    }

    fn is_healthy(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    fn health_signal(&self) -> Option<CancellationToken> {
        Some(self.cancel.clone())
    }

    fn close(&self) {
        self.cancel.cancel();
        if self.sender.write().take().is_some() {
            tracing::debug!(
                sink = %self.id,
                delivered = self.delivered.get(),
                dropped = self.dropped.get(),
                "websocket sink closed"
            );
        }
    }
}

/// Writer task: drain the queue until cancelled, closed, or a write fails
async fn write_frames<W: FrameWriter>(
    id: String,
    mut rx: mpsc::Receiver<Arc<Envelope>>,
    mut writer: W,
    cancel: CancellationToken,
) {
    loop {
        let envelope = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        // A stalled transport must not outlive close()
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = writer.write_frame(envelope.encode_v1()) => result,
        };

        if let Err(e) = result {
            tracing::warn!(sink = %id, error = %e, "websocket write failed, closing sink");
            cancel.cancel();
            break;
        }
    }

    writer.close().await;
}

#[cfg(test)]
#[path = "websocket_test.rs"]
mod tests;
