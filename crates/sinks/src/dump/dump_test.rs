//! Tests for the dump sink

use std::sync::Arc;
use std::time::Duration;

use courier_protocol::wire::v1;
use courier_protocol::{Envelope, Event};

use super::*;

fn log_envelope(n: i64) -> Arc<Envelope> {
    let message = v1::LogMessage {
        message: Some(format!("line {n}").into_bytes()),
        message_type: Some(v1::MessageType::Out as i32),
        timestamp: Some(n),
        app_id: Some("app-1".into()),
        ..Default::default()
    };
    Arc::new(Envelope::new("router", Event::LogMessage(message)).with_timestamp(n))
}

fn timestamps(envelopes: &[Arc<Envelope>]) -> Vec<i64> {
    envelopes.iter().filter_map(|e| e.timestamp()).collect()
}

// =============================================================================
// Contract
// =============================================================================

#[test]
fn test_identity() {
    let sink = DumpSink::new("dump-1", "app-1", 10);
    assert_eq!(sink.id(), "dump-1");
    assert_eq!(sink.kind(), SinkKind::Dump);
    assert_eq!(sink.app_id(), Some("app-1"));
    assert!(sink.should_receive_errors());
    assert!(sink.is_healthy());
}

#[test]
fn test_empty_dump() {
    let sink = DumpSink::new("dump-1", "app-1", 10);
    assert!(sink.is_empty());
    assert!(sink.dump().is_empty());
}

// =============================================================================
// Ring behavior
// =============================================================================

#[test]
fn test_dump_oldest_first_before_wrap() {
    let sink = DumpSink::new("dump-1", "app-1", 5);
    for n in 1..=3 {
        assert_eq!(sink.deliver(log_envelope(n)), Delivery::Accepted);
    }
    assert_eq!(timestamps(&sink.dump()), vec![1, 2, 3]);
    assert_eq!(sink.len(), 3);
}

#[test]
fn test_dump_keeps_last_n_after_wrap() {
    let sink = DumpSink::new("dump-1", "app-1", 3);
    for n in 1..=7 {
        assert_eq!(sink.deliver(log_envelope(n)), Delivery::Accepted);
    }
    assert_eq!(timestamps(&sink.dump()), vec![5, 6, 7]);
    assert_eq!(sink.len(), 3);
    assert_eq!(sink.total_received(), 7);
}

#[test]
fn test_dump_exactly_full() {
    let sink = DumpSink::new("dump-1", "app-1", 3);
    for n in 1..=3 {
        sink.deliver(log_envelope(n));
    }
    assert_eq!(timestamps(&sink.dump()), vec![1, 2, 3]);
}

#[test]
fn test_zero_capacity_is_clamped() {
    let sink = DumpSink::new("dump-1", "app-1", 0);
    assert_eq!(sink.capacity(), 1);
    sink.deliver(log_envelope(1));
    sink.deliver(log_envelope(2));
    assert_eq!(timestamps(&sink.dump()), vec![2]);
}

#[test]
fn test_dump_shares_envelopes() {
    let sink = DumpSink::new("dump-1", "app-1", 3);
    let envelope = log_envelope(1);
    sink.deliver(Arc::clone(&envelope));
    assert!(Arc::ptr_eq(&sink.dump()[0], &envelope));
}

// =============================================================================
// Close
// =============================================================================

#[test]
fn test_close_rejects_delivery() {
    let sink = DumpSink::new("dump-1", "app-1", 3);
    sink.deliver(log_envelope(1));
    sink.close();

    assert_eq!(sink.deliver(log_envelope(2)), Delivery::Dropped);
    assert!(sink.dump().is_empty());

    // Idempotent
    sink.close();
    assert_eq!(sink.deliver(log_envelope(3)), Delivery::Dropped);
}

// =============================================================================
// Inactivity
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_is_idle_after_timeout() {
    let sink = DumpSink::new("dump-1", "app-1", 3);
    let timeout = Duration::from_secs(60);
    assert!(!sink.is_idle(timeout));

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(sink.is_idle(timeout));

    sink.deliver(log_envelope(1));
    assert!(!sink.is_idle(timeout));
}

#[test]
fn test_concurrent_delivery() {
    let sink = Arc::new(DumpSink::new("dump-1", "app-1", 50));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let sink = Arc::clone(&sink);
            std::thread::spawn(move || {
                for n in 0..100 {
                    sink.deliver(log_envelope(t * 1000 + n));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(sink.total_received(), 400);
    assert_eq!(sink.dump().len(), 50);
}
