//! Courier - Ingress
//!
//! Everything between a producer's bytes and the router's buffer.
//!
//! # Stages
//!
//! - **Unmarshal** - [`Unmarshaller`] decodes and validates legacy envelope
//!   bytes and counts every outcome under `dropsondeUnmarshaller.*`
//! - **Ingest** - [`Ingestor`] consumes a stream of newer-generation
//!   envelopes, canonicalizes them and hands them to an [`EnvelopeSetter`]
//! - **Convert** - [`LegacyStream`] lets the ingestor consume legacy frames
//!
//! ```text
//! [producer] --v2--> EnvelopeStream --> Ingestor --set--> [buffer] --> SinkManager
//! [producer] --v1 bytes--> LegacyStream ---^
//! ```
//!
//! # Design Principles
//!
//! - **Never block on the buffer**: the provided setter uses `try_send` and
//!   drops on overflow
//! - **Batched throughput metrics**: one `ingress` counter update per 1000
//!   envelopes or 5 seconds
//! - **Fatal only on stream failure**: invalid envelopes are skipped, the
//!   ingestor returns only when its stream does
//!
//! # Example
//!
//! ```ignore
//! let (buffer_tx, buffer_rx) = mpsc::channel(config.ingress.buffer_capacity);
//! let ingestor = Ingestor::with_config(buffer_tx, metrics, &config.ingress);
//!
//! let err = ingestor.consume(&mut stream).await;
//! tracing::warn!(error = %err, "ingestor stopped");
//! ```

mod batcher;
mod converter;
mod error;
mod ingestor;
mod unmarshaller;

pub use batcher::{DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, ThroughputBatcher};
pub use converter::LegacyStream;
pub use error::{IngressError, Result, UnmarshalError};
pub use ingestor::{EnvelopeSetter, EnvelopeStream, Ingestor};
pub use unmarshaller::{EnvelopeWriter, Unmarshaller};
