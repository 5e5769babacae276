//! Syslog sink - relay of an application's logs to a syslog drain
//!
//! Log envelopes are queued to a dedicated relay task that formats them as
//! RFC 5424 messages and writes them through a [`SyslogWriter`]. Other event
//! types are not relayed.
//!
//! # Failure
//!
//! There is no retry. The first failed write marks the sink unhealthy and
//! ends the relay task. The registry watches [`Sink::health_signal`], so the
//! sink is unregistered as soon as that happens and the application's
//! error-receiving sinks are told why.

mod format;
mod tcp;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use courier_metrics::Counter;
use courier_protocol::Envelope;

use crate::{BackpressureTracker, Delivery, Result, Sink, SinkKind};
use format::SyslogFormat;

pub use tcp::TcpSyslogWriter;

/// Egress for formatted syslog messages
#[async_trait]
pub trait SyslogWriter: Send + 'static {
    /// Write one complete RFC 5424 message
    async fn write_message(&mut self, message: &str) -> Result<()>;

    /// Release the transport; called once when the relay task ends
    async fn close(&mut self) {}
}

/// Syslog relay sink for one application drain
#[derive(Debug)]
pub struct SyslogSink {
    id: String,
    app_id: String,
    /// Queue into the relay task, `None` once closed
    sender: RwLock<Option<mpsc::Sender<Arc<Envelope>>>>,
    cancel: CancellationToken,
    delivered: Counter,
    dropped: Counter,
    backpressure: BackpressureTracker,
}

impl SyslogSink {
    /// Create the sink and spawn its relay task
    ///
    /// `hostname` fills the HOSTNAME header field. Must be called within a
    /// tokio runtime.
    pub fn spawn<W: SyslogWriter>(
        id: impl Into<String>,
        app_id: impl Into<String>,
        hostname: &str,
        writer: W,
        buffer_size: usize,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        let sink = Arc::new(Self {
            id: id.into(),
            app_id: app_id.into(),
            sender: RwLock::new(Some(tx)),
            cancel: CancellationToken::new(),
            delivered: Counter::new(),
            dropped: Counter::new(),
            backpressure: BackpressureTracker::new(),
        });

        let format = SyslogFormat::new(hostname, &sink.app_id);
        tokio::spawn(relay(
            sink.id.clone(),
            format,
            rx,
            writer,
            sink.cancel.clone(),
        ));
        tracing::debug!(sink = %sink.id, app_id = %sink.app_id, "syslog sink started");

        sink
    }

    /// Envelopes accepted into the queue
    pub fn delivered(&self) -> u64 {
        self.delivered.get()
    }

    /// Log envelopes dropped because the queue was full or the sink closed
    pub fn dropped(&self) -> u64 {
        self.dropped.get()
    }
}

impl Sink for SyslogSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Syslog
    }

    fn app_id(&self) -> Option<&str> {
        Some(&self.app_id)
    }

    fn deliver(&self, envelope: Arc<Envelope>) -> Delivery {
        if envelope.log_message().is_none() {
            return Delivery::Dropped;
        }
        if self.cancel.is_cancelled() {
            self.dropped.inc();
            return Delivery::Dropped;
        }

        let sender = self.sender.read();
        let Some(tx) = sender.as_ref() else {
            self.dropped.inc();
            return Delivery::Dropped;
        };

        match tx.try_send(envelope) {
            Ok(()) => {
                self.delivered.inc();
                Delivery::Accepted
            }
            Err(e) => {
                if matches!(e, TrySendError::Full(_)) {
                    self.backpressure.record_drop(&self.id);
                }
                self.dropped.inc();
                Delivery::Dropped
            }
        }
    }

    fn should_receive_errors(&self) -> bool {
        false
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
                "syslog sink closed"
            );
        }
    }
}

/// Relay task: format and write until cancelled, closed, or a write fails
async fn relay<W: SyslogWriter>(
    id: String,
    format: SyslogFormat,
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

        let Some(message) = format.format(&envelope) else {
            continue;
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = writer.write_message(&message) => result,
        };

        if let Err(e) = result {
            tracing::warn!(sink = %id, error = %e, "syslog write failed, marking sink unhealthy");
            cancel.cancel();
            break;
        }
    }

    writer.close().await;
}

#[cfg(test)]
#[path = "syslog_test.rs"]
mod tests;
