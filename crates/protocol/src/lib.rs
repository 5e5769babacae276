//! Courier Protocol - Envelope model and codec
//!
//! This crate provides the types every other Courier crate exchanges:
//! - `wire::v1` / `wire::v2` - the two envelope wire generations (prost)
//! - `Envelope` / `Event` - validated, version-agnostic canonical form
//! - `convert` - bidirectional translation between the generations
//! - `identifier` - 128-bit identifier encoding (High/Low pair ⇔ UUID string)
//!
//! # Design Principles
//!
//! - **Validate once**: an `Envelope` can only be built from a wire envelope
//!   whose declared payload is present, so routing never sees an invalid one
//! - **Arc-friendly**: envelopes are shared as `Arc<Envelope>` across sinks
//! - **No code generation**: wire messages are hand-written prost derives
//!
//! # Example
//!
//! ```
//! use courier_protocol::convert::{to_v1, to_v2};
//! use courier_protocol::wire::v1;
//!
//! let legacy = v1::Envelope {
//!     origin: Some("router".into()),
//!     event_type: Some(v1::EventType::CounterEvent.code()),
//!     counter_event: Some(v1::CounterEvent {
//!         name: Some("requests".into()),
//!         delta: Some(1),
//!         total: Some(10),
//!     }),
//!     deployment: Some("cf".into()),
//!     job: Some("router".into()),
//!     ..Default::default()
//! };
//!
//! let newer = to_v2(&legacy).unwrap();
//! assert_eq!(newer.source_id, "cf/router");
//! assert_eq!(to_v1(&newer).unwrap().counter_event, legacy.counter_event);
//! ```

pub mod convert;
mod envelope;
mod error;
pub mod identifier;
pub mod wire;

pub use envelope::{Envelope, Event};
pub use error::ProtocolError;
pub use wire::v1::EventType;

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod envelope_test;
#[cfg(test)]
mod error_test;
