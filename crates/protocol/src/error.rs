//! Protocol error types
//!
//! Errors that can occur when decoding or validating envelopes.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Bytes are not a well-formed envelope
    #[error("decode failed: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A field the legacy format marks as required is absent
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Declared event type has no matching payload
    #[error("invalid envelope: event type {event_type} has no payload")]
    MissingPayload {
        /// Name of the declared event type
        event_type: &'static str,
    },

    /// Text is not a dash-formatted 128-bit identifier
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

impl ProtocolError {
    /// Create a missing field error
    #[inline]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField(field)
    }

    /// Create a missing payload error
    #[inline]
    pub fn missing_payload(event_type: &'static str) -> Self {
        Self::MissingPayload { event_type }
    }

    /// Whether the bytes could not be parsed at all
    ///
    /// Missing required fields count as decode failures, matching the
    /// behaviour of the legacy format's required-field checks.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::MissingField(_))
    }
}
