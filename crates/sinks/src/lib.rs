//! Courier - Sinks
//!
//! Delivery endpoints for routed envelopes. Every sink implements the same
//! [`Sink`] contract; the variant decides what "delivery" means.
//!
//! # Architecture
//!
//! The router calls [`Sink::deliver`] from its own task, so delivery must
//! never block. Live sinks own a bounded queue and a dedicated writer task;
//! storage sinks update in-memory state under a short lock.
//!
//! ```text
//! [SinkManager] --Arc<Envelope>--> deliver() --try_send--> [Sink Task] --> [Writer]
//!                                            \--push-----> [Ring / Latest map]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose | Receives errors |
//! |------|---------|-----------------|
//! | `websocket` | Live streaming to one consumer | Yes |
//! | `dump` | Bounded recent history per application | Yes |
//! | `container_metric` | Latest container metric per instance | No |
//! | `syslog` | RFC 5424 relay of log messages | No |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use courier_protocol::{Envelope, Event};
//! use courier_protocol::wire::v1;
//! use courier_sinks::{Delivery, DumpSink, Sink};
//!
//! let sink = DumpSink::new("dump-app-1", "app-1", 10);
//! let envelope = Envelope::new("router", Event::LogMessage(v1::LogMessage::default()));
//!
//! assert_eq!(sink.deliver(Arc::new(envelope)), Delivery::Accepted);
//! assert_eq!(sink.dump().len(), 1);
//! ```

/// Live streaming sink - bounded queue drained by a frame writer task
pub mod websocket;

/// Dump sink - ring buffer of recent envelopes
pub mod dump;

/// Container metric sink - latest value per instance index
pub mod container_metric;

/// Syslog sink - RFC 5424 relay through a syslog writer task
pub mod syslog;

/// Common types shared by all sinks (errors, backpressure tracking)
mod common;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use courier_protocol::Envelope;
use tokio_util::sync::CancellationToken;

pub use common::{BackpressureTracker, Result, SinkError};
pub use container_metric::ContainerMetricSink;
pub use dump::DumpSink;
pub use syslog::{SyslogSink, SyslogWriter, TcpSyslogWriter};
pub use websocket::{FrameWriter, WebsocketSink};

/// Delivery endpoint for routed envelopes
///
/// Implementations are shared between the registry and the router, so every
/// method takes `&self`. The `Any` bound lets the registry reach the
/// storage queries of concrete sinks.
pub trait Sink: Any + Send + Sync {
    /// Identifier, unique within a registration scope
    fn id(&self) -> &str;

    /// Which variant this is
    fn kind(&self) -> SinkKind;

    /// Application this sink serves, `None` for firehose consumers
    fn app_id(&self) -> Option<&str>;

    /// Offer one envelope; must not block
    fn deliver(&self, envelope: Arc<Envelope>) -> Delivery;

    /// Whether internally generated error envelopes go to this sink
    fn should_receive_errors(&self) -> bool;

    /// `false` once the sink can no longer deliver and should be removed
    fn is_healthy(&self) -> bool {
        true
    }

    /// Token cancelled once the sink stops being healthy
    ///
    /// Lets the registry remove a failed sink without waiting for the next
    /// delivery. Sinks that cannot fail on their own return `None`.
    fn health_signal(&self) -> Option<CancellationToken> {
        None
    }

    /// Stop the sink
    ///
    /// Idempotent. No delivery is accepted after this returns.
    fn close(&self);
}

/// The closed set of sink variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SinkKind {
    Websocket,
    Dump,
    ContainerMetric,
    Syslog,
}

impl SinkKind {
    /// Every kind, in reporting order
    pub const ALL: [SinkKind; 4] = [
        SinkKind::Websocket,
        SinkKind::Dump,
        SinkKind::ContainerMetric,
        SinkKind::Syslog,
    ];

    /// Name used in population metric names
    pub const fn metric_name(self) -> &'static str {
        match self {
            SinkKind::Websocket => "Websocket",
            SinkKind::Dump => "Dump",
            SinkKind::ContainerMetric => "ContainerMetric",
            SinkKind::Syslog => "Syslog",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_name())
    }
}

/// Outcome of offering an envelope to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    Dropped,
}

impl Delivery {
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, Delivery::Accepted)
    }
}
