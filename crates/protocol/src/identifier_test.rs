//! Tests for identifier encoding

use crate::ProtocolError;
use crate::identifier::{format_uuid, parse_uuid};
use crate::wire::v1;

// =============================================================================
// format / parse tests
// =============================================================================

#[test]
fn test_format_known_value() {
    let text = format_uuid(0xbe4484acc4614f95, 0x41fb1731facd1792);
    assert_eq!(text, "954f61c4-ac84-44be-9217-cdfa3117fb41");
}

#[test]
fn test_parse_known_value() {
    let (low, high) = parse_uuid("b3015d69-09cd-476d-aace-ad2d824d5ab7").unwrap();
    assert_eq!(low, 0x6d47cd09695d01b3);
    assert_eq!(high, 0xb75a4d822dadceaa);
}

#[test]
fn test_round_trip_edges() {
    for (low, high) in [
        (0, 0),
        (u64::MAX, u64::MAX),
        (1, 0),
        (0, 1),
        (0x0123456789abcdef, 0xfedcba9876543210),
    ] {
        let text = format_uuid(low, high);
        assert_eq!(parse_uuid(&text).unwrap(), (low, high), "{}", text);
    }
}

#[test]
fn test_parse_accepts_uppercase() {
    let (low, high) = parse_uuid("954F61C4-AC84-44BE-9217-CDFA3117FB41").unwrap();
    assert_eq!(format_uuid(low, high), "954f61c4-ac84-44be-9217-cdfa3117fb41");
}

#[test]
fn test_parse_rejects_other_forms() {
    for text in [
        "",
        "application-id",
        "954f61c4ac8444be9217cdfa3117fb41",
        "{954f61c4-ac84-44be-9217-cdfa3117fb41}",
        "954f61c4-ac84-44be-9217-cdfa3117fbzz",
    ] {
        assert!(
            matches!(parse_uuid(text), Err(ProtocolError::InvalidIdentifier(_))),
            "{}",
            text
        );
    }
}

// =============================================================================
// Wire identifier helpers
// =============================================================================

#[test]
fn test_wire_uuid_parse() {
    let id = v1::Uuid::parse("954f61c4-ac84-44be-9217-cdfa3117fb41").unwrap();
    assert_eq!(id.low, Some(0xbe4484acc4614f95));
    assert_eq!(id.high, Some(0x41fb1731facd1792));
}

#[test]
fn test_wire_uuid_to_string() {
    let id = v1::Uuid::from_parts(0x6d47cd09695d01b3, 0xb75a4d822dadceaa);
    assert_eq!(id.to_uuid_string(), "b3015d69-09cd-476d-aace-ad2d824d5ab7");
}

#[test]
fn test_wire_uuid_missing_halves_are_zero() {
    let id = v1::Uuid::default();
    assert_eq!(id.to_uuid_string(), "00000000-0000-0000-0000-000000000000");
}
