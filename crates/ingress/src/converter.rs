//! Legacy byte stream adapter
//!
//! Producers that still speak the legacy format send encoded envelope
//! frames. [`LegacyStream`] converts each frame to the newer generation so
//! the same [`Ingestor`](crate::Ingestor) can consume both. Frames that do
//! not decode, or that declare a type without its payload, are skipped and
//! counted.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use courier_protocol::convert;
use courier_protocol::wire::v2;

use crate::{EnvelopeStream, IngressError, Result};

/// Newer-generation view of a channel of legacy frames
#[derive(Debug)]
pub struct LegacyStream {
    frames: mpsc::Receiver<Bytes>,
    skipped: u64,
}

impl LegacyStream {
    pub fn new(frames: mpsc::Receiver<Bytes>) -> Self {
        Self { frames, skipped: 0 }
    }

    /// Frames that could not be converted
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[async_trait]
impl EnvelopeStream for LegacyStream {
    async fn recv(&mut self) -> Result<v2::Envelope> {
        loop {
            let frame = self
                .frames
                .recv()
                .await
                .ok_or_else(|| IngressError::stream("legacy frame channel closed"))?;

            match convert::convert(&frame) {
                Ok(Some(envelope)) => return Ok(envelope),
                Ok(None) => {
                    self.skipped += 1;
                    tracing::debug!(len = frame.len(), "skipping legacy frame without payload");
                }
                Err(e) => {
                    self.skipped += 1;
                    tracing::debug!(error = %e, len = frame.len(), "skipping undecodable legacy frame");
                }
            }
        }
    }
}
