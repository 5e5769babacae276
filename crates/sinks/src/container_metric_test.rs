//! Tests for the container metric sink

use std::sync::Arc;
use std::time::Duration;

use courier_protocol::wire::v1;
use courier_protocol::{Envelope, Event};

use super::*;

const SECOND: i64 = 1_000_000_000;

fn metric(index: i32, timestamp: i64, cpu: f64) -> Arc<Envelope> {
    let payload = v1::ContainerMetric {
        application_id: Some("app-1".into()),
        instance_index: Some(index),
        cpu_percentage: Some(cpu),
        memory_bytes: Some(1024),
        disk_bytes: Some(2048),
        ..Default::default()
    };
    Arc::new(Envelope::new("rep", Event::ContainerMetric(payload)).with_timestamp(timestamp))
}

fn sink() -> ContainerMetricSink {
    ContainerMetricSink::new("cm-app-1", "app-1", Duration::from_secs(60))
}

fn cpus(envelopes: &[Arc<Envelope>]) -> Vec<f64> {
    envelopes
        .iter()
        .filter_map(|e| e.container_metric().and_then(|m| m.cpu_percentage))
        .collect()
}

#[test]
fn test_identity() {
    let sink = sink();
    assert_eq!(sink.kind(), SinkKind::ContainerMetric);
    assert_eq!(sink.app_id(), Some("app-1"));
    assert!(!sink.should_receive_errors());
}

#[test]
fn test_latest_ordered_by_instance() {
    let sink = sink();
    assert_eq!(sink.deliver(metric(2, 100 * SECOND, 2.0)), Delivery::Accepted);
    assert_eq!(sink.deliver(metric(0, 100 * SECOND, 0.5)), Delivery::Accepted);
    assert_eq!(sink.deliver(metric(1, 100 * SECOND, 1.0)), Delivery::Accepted);

    assert_eq!(cpus(&sink.latest()), vec![0.5, 1.0, 2.0]);
}

#[test]
fn test_newer_replaces_older() {
    let sink = sink();
    sink.deliver(metric(0, 100 * SECOND, 1.0));
    assert_eq!(sink.deliver(metric(0, 101 * SECOND, 9.0)), Delivery::Accepted);
    assert_eq!(cpus(&sink.latest()), vec![9.0]);
}

#[test]
fn test_equal_timestamp_replaces() {
    let sink = sink();
    sink.deliver(metric(0, 100 * SECOND, 1.0));
    assert_eq!(sink.deliver(metric(0, 100 * SECOND, 3.0)), Delivery::Accepted);
    assert_eq!(cpus(&sink.latest()), vec![3.0]);
}

#[test]
fn test_late_arrival_inside_window_overwrites() {
    let sink = sink();
    sink.deliver(metric(0, 100 * SECOND, 1.0));
    assert_eq!(sink.deliver(metric(0, 99 * SECOND, 5.0)), Delivery::Accepted);
    assert_eq!(cpus(&sink.latest()), vec![5.0]);
}

#[test]
fn test_stale_envelope_is_dropped() {
    let sink = sink();
    sink.deliver(metric(0, 200 * SECOND, 1.0));
    // More than 60s behind the newest timestamp for instance 0
    assert_eq!(sink.deliver(metric(0, 100 * SECOND, 5.0)), Delivery::Dropped);
    assert_eq!(cpus(&sink.latest()), vec![1.0]);
}

#[test]
fn test_window_follows_newest_not_last_stored() {
    let sink = sink();
    sink.deliver(metric(0, 200 * SECOND, 1.0));
    sink.deliver(metric(0, 150 * SECOND, 2.0));
    // 130s is within 60s of the last stored value but not of the newest seen
    assert_eq!(sink.deliver(metric(0, 130 * SECOND, 3.0)), Delivery::Dropped);
    assert_eq!(cpus(&sink.latest()), vec![2.0]);
}

#[test]
fn test_instances_do_not_age_each_other_out() {
    let sink = sink();
    sink.deliver(metric(0, 200 * SECOND, 1.0));
    assert_eq!(sink.deliver(metric(1, 100 * SECOND, 5.0)), Delivery::Accepted);
    assert_eq!(sink.deliver(metric(2, 500 * SECOND, 7.0)), Delivery::Accepted);
    assert_eq!(cpus(&sink.latest()), vec![1.0, 5.0, 7.0]);

    // Instance 1 is still judged against its own newest timestamp
    assert_eq!(sink.deliver(metric(1, 30 * SECOND, 6.0)), Delivery::Dropped);
    assert_eq!(sink.deliver(metric(1, 50 * SECOND, 6.0)), Delivery::Accepted);
    assert_eq!(cpus(&sink.latest()), vec![1.0, 6.0, 7.0]);
}

#[test]
fn test_non_container_metric_is_dropped() {
    let sink = sink();
    let log = Envelope::new("router", Event::LogMessage(v1::LogMessage::default()));
    assert_eq!(sink.deliver(Arc::new(log)), Delivery::Dropped);
    assert!(sink.latest().is_empty());
}

#[test]
fn test_close_clears_and_rejects() {
    let sink = sink();
    sink.deliver(metric(0, 100 * SECOND, 1.0));
    sink.close();
    assert!(sink.latest().is_empty());
    assert_eq!(sink.deliver(metric(0, 101 * SECOND, 1.0)), Delivery::Dropped);
    sink.close();
}
