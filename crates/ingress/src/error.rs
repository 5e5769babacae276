//! Ingress error types

use thiserror::Error;

use courier_protocol::{Envelope, ProtocolError};

/// Result alias for ingress operations
pub type Result<T> = std::result::Result<T, IngressError>;

/// Errors that end an ingestor
#[derive(Debug, Error)]
pub enum IngressError {
    /// The inbound stream terminated
    #[error("stream terminated: {0}")]
    Stream(String),

    /// Transport I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngressError {
    /// Create a stream termination error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }
}

/// Outcome of a failed unmarshal
///
/// [`UnknownEventType`](Self::UnknownEventType) is recoverable: the envelope
/// is valid and still routable, it just carries a type code this build has
/// no payload for.
#[derive(Debug, Error)]
pub enum UnmarshalError {
    /// Bytes are not a legacy envelope, or lack `origin`/`event_type`
    #[error("unable to decode envelope: {0}")]
    Decode(#[source] ProtocolError),

    /// Declared event type has no matching payload
    #[error("envelope of type {event_type} failed validation")]
    Validation { event_type: &'static str },

    /// Valid envelope with an unrecognised type code
    #[error("unknown event type {code}")]
    UnknownEventType { code: i32, envelope: Box<Envelope> },
}

impl UnmarshalError {
    /// Whether the envelope can still be routed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownEventType { .. })
    }

    /// The routable envelope, if this error is recoverable
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Self::UnknownEventType { envelope, .. } => Some(*envelope),
            _ => None,
        }
    }
}

impl From<ProtocolError> for UnmarshalError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MissingPayload { event_type } => Self::Validation { event_type },
            other => Self::Decode(other),
        }
    }
}
