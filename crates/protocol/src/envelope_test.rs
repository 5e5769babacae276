//! Tests for the canonical envelope

use prost::Message;

use crate::envelope::{Envelope, Event};
use crate::error::ProtocolError;
use crate::wire::v1::{self, EventType};

fn legacy(event_type: EventType) -> v1::Envelope {
    v1::Envelope {
        origin: Some("some-origin".into()),
        event_type: Some(event_type.code()),
        ..Default::default()
    }
}

fn log_envelope(app_id: &str) -> v1::Envelope {
    v1::Envelope {
        log_message: Some(v1::LogMessage {
            message: Some(b"hello".to_vec()),
            message_type: Some(v1::MessageType::Out as i32),
            timestamp: Some(42),
            app_id: Some(app_id.into()),
            ..Default::default()
        }),
        ..legacy(EventType::LogMessage)
    }
}

// =============================================================================
// Validation tests
// =============================================================================

#[test]
fn test_valid_log_message() {
    let envelope = Envelope::try_from(log_envelope("app-1")).unwrap();
    assert_eq!(envelope.origin(), "some-origin");
    assert_eq!(envelope.event_type(), Some(EventType::LogMessage));
    assert_eq!(envelope.event_code(), 5);
    assert!(envelope.log_message().is_some());
}

#[test]
fn test_missing_origin_is_decode_failure() {
    let mut wire = log_envelope("app-1");
    wire.origin = None;
    let err = Envelope::try_from(wire).unwrap_err();
    assert!(matches!(err, ProtocolError::MissingField("origin")));
    assert!(err.is_decode_failure());
}

#[test]
fn test_missing_event_type_is_decode_failure() {
    let mut wire = log_envelope("app-1");
    wire.event_type = None;
    let err = Envelope::try_from(wire).unwrap_err();
    assert!(matches!(err, ProtocolError::MissingField("event_type")));
}

#[test]
fn test_every_known_type_requires_its_payload() {
    for event_type in EventType::ALL {
        let err = Envelope::try_from(legacy(event_type)).unwrap_err();
        match err {
            ProtocolError::MissingPayload { event_type: name } => {
                assert_eq!(name, event_type.name())
            }
            other => panic!("unexpected error for {:?}: {}", event_type, other),
        }
    }
}

#[test]
fn test_payload_of_other_type_does_not_count() {
    let wire = v1::Envelope {
        value_metric: Some(v1::ValueMetric::default()),
        ..legacy(EventType::HttpStartStop)
    };
    assert!(matches!(
        Envelope::try_from(wire),
        Err(ProtocolError::MissingPayload { .. })
    ));
}

#[test]
fn test_unknown_code_is_valid() {
    let wire = v1::Envelope {
        event_type: Some(1),
        ..legacy(EventType::Error)
    };
    let envelope = Envelope::try_from(wire).unwrap();
    assert_eq!(envelope.event(), &Event::Other { code: 1 });
    assert_eq!(envelope.event_type(), None);
    assert_eq!(envelope.event_code(), 1);
}

// =============================================================================
// Accessor tests
// =============================================================================

#[test]
fn test_app_id_from_log_message() {
    let envelope = Envelope::try_from(log_envelope("app-1")).unwrap();
    assert_eq!(envelope.app_id().as_deref(), Some("app-1"));
}

#[test]
fn test_app_id_from_http_start_stop() {
    let wire = v1::Envelope {
        http_start_stop: Some(v1::HttpStartStop {
            application_id: Some(v1::Uuid::from_parts(0x6d47cd09695d01b3, 0xb75a4d822dadceaa)),
            ..Default::default()
        }),
        ..legacy(EventType::HttpStartStop)
    };
    let envelope = Envelope::try_from(wire).unwrap();
    assert_eq!(
        envelope.app_id().as_deref(),
        Some("b3015d69-09cd-476d-aace-ad2d824d5ab7")
    );
}

#[test]
fn test_app_id_from_container_metric() {
    let wire = v1::Envelope {
        container_metric: Some(v1::ContainerMetric {
            application_id: Some("app-2".into()),
            instance_index: Some(3),
            ..Default::default()
        }),
        ..legacy(EventType::ContainerMetric)
    };
    let envelope = Envelope::try_from(wire).unwrap();
    assert_eq!(envelope.app_id().as_deref(), Some("app-2"));
    assert_eq!(envelope.container_metric().unwrap().instance_index, Some(3));
}

#[test]
fn test_app_id_absent_for_platform_events() {
    let wire = v1::Envelope {
        counter_event: Some(v1::CounterEvent::default()),
        ..legacy(EventType::CounterEvent)
    };
    assert_eq!(Envelope::try_from(wire).unwrap().app_id(), None);
}

#[test]
fn test_empty_app_id_is_absent() {
    let envelope = Envelope::try_from(log_envelope("")).unwrap();
    assert_eq!(envelope.app_id(), None);
}

#[test]
fn test_effective_timestamp_falls_back_to_log() {
    let envelope = Envelope::try_from(log_envelope("app-1")).unwrap();
    assert_eq!(envelope.timestamp(), None);
    assert_eq!(envelope.effective_timestamp(), Some(42));

    let envelope = Envelope::try_from(v1::Envelope {
        timestamp: Some(7),
        ..log_envelope("app-1")
    })
    .unwrap();
    assert_eq!(envelope.effective_timestamp(), Some(7));
}

#[test]
fn test_builder_for_internal_events() {
    let envelope = Envelope::new(
        "courier",
        Event::LogMessage(v1::LogMessage {
            app_id: Some("app-1".into()),
            ..Default::default()
        }),
    )
    .with_timestamp(10)
    .with_tag("reason", "sink removed");

    assert_eq!(envelope.origin(), "courier");
    assert_eq!(envelope.timestamp(), Some(10));
    assert_eq!(envelope.tags().get("reason").map(String::as_str), Some("sink removed"));
    assert_eq!(envelope.app_id().as_deref(), Some("app-1"));
}

// =============================================================================
// Wire conversion tests
// =============================================================================

#[test]
fn test_to_wire_restores_input() {
    let wire = v1::Envelope {
        timestamp: Some(99),
        deployment: Some("some-deployment".into()),
        job: Some("some-job".into()),
        index: Some("0".into()),
        ip: Some("10.0.0.1".into()),
        tags: [("zone".to_string(), "z1".to_string())].into_iter().collect(),
        ..log_envelope("app-1")
    };
    let envelope = Envelope::try_from(wire.clone()).unwrap();
    assert_eq!(envelope.to_wire(), wire);
}

#[test]
fn test_unknown_code_survives_wire() {
    let wire = v1::Envelope {
        event_type: Some(2),
        ..legacy(EventType::Error)
    };
    let envelope = Envelope::try_from(wire.clone()).unwrap();
    assert_eq!(envelope.to_wire(), wire);
}

#[test]
fn test_encode_then_decode() {
    let envelope = Envelope::try_from(log_envelope("app-1")).unwrap();
    let bytes = envelope.encode_v1();
    assert_eq!(Envelope::decode(&bytes).unwrap(), envelope);
}

#[test]
fn test_decode_missing_payload() {
    let bytes = legacy(EventType::HttpStartStop).encode_to_vec();
    assert!(matches!(
        Envelope::decode(&bytes),
        Err(ProtocolError::MissingPayload {
            event_type: "HttpStartStop"
        })
    ));
}
