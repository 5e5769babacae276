//! Courier - Pipeline
//!
//! The sink manager: registry of sinks per application and on the firehose,
//! router of validated envelopes to them, and publisher of sink population
//! metrics.
//!
//! # Architecture
//!
//! ```text
//! [Ingestor] --try_send--> mpsc buffer --> SinkManager::run --> route()
//!                                                                 |
//!                          app sinks (by app_id) <----------------+
//!                          firehose sinks <-----------------------+
//! ```
//!
//! # Key Design
//!
//! - **Arc fan-out**: one `Arc<Envelope>` is shared by every target sink
//! - **Non-blocking delivery**: sinks drop rather than wait
//! - **Snapshot routing**: targets are copied under a read lock, delivery
//!   happens outside it
//! - **Ordered population metrics**: published under the write lock
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use courier_metrics::MetricsRegistry;
//! use courier_pipeline::{Scope, SinkManager};
//! use courier_protocol::{Envelope, Event};
//! use courier_protocol::wire::v1;
//! use courier_sinks::DumpSink;
//!
//! let registry = Arc::new(MetricsRegistry::new());
//! let manager = SinkManager::new(registry.clone());
//!
//! let dump = Arc::new(DumpSink::new("dump-1", "app-1", 10));
//! manager.register(dump, Scope::app("app-1")).unwrap();
//! assert_eq!(registry.value("messageRouter.numberOfDumpSinks"), Some(1.0));
//!
//! let log = v1::LogMessage {
//!     app_id: Some("app-1".into()),
//!     ..Default::default()
//! };
//! let report = manager.route(Arc::new(Envelope::new("router", Event::LogMessage(log))));
//! assert_eq!(report.accepted, 1);
//! assert_eq!(manager.recent_envelopes("app-1").len(), 1);
//! ```

mod error;
mod factory;
mod manager;
mod metrics;

pub use error::{PipelineError, Result};
pub use factory::SinkFactory;
pub use manager::{ERROR_ORIGIN, ERROR_SOURCE_TYPE, RouteReport, Scope, SinkManager};
pub use metrics::{
    FIREHOSE_METRIC, POPULATION_UNIT, Population, RouterMetrics, RouterMetricsSnapshot,
    population_metric,
};

use std::sync::Arc;

use tokio::sync::mpsc;

use courier_config::IngressConfig;
use courier_protocol::Envelope;

/// Bounded buffer between ingestors and [`SinkManager::run`]
///
/// Ingestors enqueue with `try_send`, so a full buffer drops envelopes
/// instead of stalling ingestion.
pub fn envelope_buffer(
    config: &IngressConfig,
) -> (mpsc::Sender<Arc<Envelope>>, mpsc::Receiver<Arc<Envelope>>) {
    mpsc::channel(config.buffer_capacity.max(1))
}
