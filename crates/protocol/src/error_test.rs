//! Tests for protocol error types

use prost::Message;

use crate::error::ProtocolError;
use crate::wire;

#[test]
fn test_error_creation_missing_field() {
    let err = ProtocolError::missing_field("origin");
    assert!(matches!(err, ProtocolError::MissingField("origin")));
}

#[test]
fn test_error_creation_missing_payload() {
    let err = ProtocolError::missing_payload("HttpStartStop");
    assert!(matches!(
        err,
        ProtocolError::MissingPayload {
            event_type: "HttpStartStop"
        }
    ));
}

#[test]
fn test_error_display_missing_payload() {
    let err = ProtocolError::missing_payload("LogMessage");
    assert_eq!(
        err.to_string(),
        "invalid envelope: event type LogMessage has no payload"
    );
}

#[test]
fn test_error_display_invalid_identifier() {
    let err = ProtocolError::InvalidIdentifier("nope".into());
    assert_eq!(err.to_string(), "invalid identifier 'nope'");
}

#[test]
fn test_decode_error_from_prost() {
    let err = wire::decode_v1(&[0xff, 0xff, 0xff]).unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
    assert!(err.is_decode_failure());
}

#[test]
fn test_is_decode_failure() {
    assert!(ProtocolError::missing_field("event_type").is_decode_failure());
    assert!(!ProtocolError::missing_payload("Error").is_decode_failure());
    assert!(!ProtocolError::InvalidIdentifier(String::new()).is_decode_failure());
}

#[test]
fn test_decode_v2_rejects_truncated() {
    let bytes = crate::wire::v2::Envelope {
        source_id: "app".into(),
        ..Default::default()
    }
    .encode_to_vec();
    let err = wire::decode_v2(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
}
