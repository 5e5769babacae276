//! End-to-end: ingestor -> buffer -> sink manager -> sinks

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::timeout;

use courier_config::{IngressConfig, SinksConfig};
use courier_ingress::{Ingestor, IngressError, LegacyStream};
use courier_metrics::MetricsRegistry;
use courier_pipeline::{Scope, SinkFactory, SinkManager, envelope_buffer};
use courier_protocol::convert::to_v2;
use courier_protocol::wire::{v1, v2};
use courier_protocol::{Envelope, Event, EventType};
use courier_sinks::Sink;

fn legacy_log(app_id: &str, n: i64) -> Envelope {
    let log = v1::LogMessage {
        message: Some(format!("line {n}").into_bytes()),
        message_type: Some(v1::MessageType::Out as i32),
        timestamp: Some(n),
        app_id: Some(app_id.to_string()),
        source_type: Some("APP".into()),
        source_instance: Some("0".into()),
    };
    Envelope::new("router", Event::LogMessage(log)).with_timestamp(n)
}

fn legacy_metric(app_id: &str, index: i32, n: i64) -> Envelope {
    let metric = v1::ContainerMetric {
        application_id: Some(app_id.to_string()),
        instance_index: Some(index),
        cpu_percentage: Some(12.5),
        memory_bytes: Some(1024),
        disk_bytes: Some(2048),
        ..Default::default()
    };
    Envelope::new("rep", Event::ContainerMetric(metric)).with_timestamp(n)
}

fn v2_of(envelope: &Envelope) -> v2::Envelope {
    to_v2(&envelope.to_wire()).expect("converts to v2")
}

#[tokio::test]
async fn test_v2_stream_reaches_app_and_firehose_sinks() {
    let registry = Arc::new(MetricsRegistry::new());
    let manager = SinkManager::new(registry.clone());
    let factory = SinkFactory::new(SinksConfig::default(), "courier-0");

    let dump = factory.dump("dump-app-1", "app-1");
    manager.register(dump, Scope::app("app-1")).unwrap();
    let (frames_tx, mut frames_rx) = mpsc::channel::<Bytes>(64);
    let nozzle = factory.websocket("nozzle", None, frames_tx);
    manager.register(nozzle.clone(), Scope::Firehose).unwrap();

    let (buffer_tx, buffer_rx) = envelope_buffer(&IngressConfig::default());
    let router = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.run(buffer_rx).await }
    });

    let (stream_tx, mut stream_rx) = mpsc::channel(64);
    for n in 1..=3 {
        stream_tx.send(v2_of(&legacy_log("app-1", n))).await.unwrap();
    }
    stream_tx.send(v2_of(&legacy_log("app-2", 4))).await.unwrap();
    drop(stream_tx);

    let ingestor = Ingestor::new(buffer_tx, registry.clone());
    let err = ingestor.consume(&mut stream_rx).await;
    assert!(matches!(err, IngressError::Stream(_)));
    drop(ingestor);

    timeout(Duration::from_secs(1), router)
        .await
        .expect("router stops once the buffer closes")
        .unwrap();

    // App sink: only app-1, in order
    let recent = manager.recent_envelopes("app-1");
    let timestamps: Vec<Option<i64>> = recent.iter().map(|e| e.timestamp()).collect();
    assert_eq!(timestamps, vec![Some(1), Some(2), Some(3)]);

    // Firehose: everything, as legacy frames
    let mut seen = Vec::new();
    for _ in 0..4 {
        let frame = timeout(Duration::from_secs(1), frames_rx.recv())
            .await
            .expect("frame written")
            .expect("writer alive");
        let envelope = Envelope::decode(&frame).expect("frame decodes");
        assert_eq!(envelope.event_type(), Some(EventType::LogMessage));
        seen.push(envelope.app_id());
    }
    assert_eq!(seen.iter().filter(|id| id.as_deref() == Some("app-2")).count(), 1);

    assert_eq!(registry.counter_total("ingress"), 4);
    assert_eq!(registry.value("messageRouter.numberOfDumpSinks"), Some(1.0));
    assert_eq!(registry.value("messageRouter.numberOfFirehoseSinks"), Some(1.0));

    let snapshot = manager.metrics().snapshot();
    assert_eq!(snapshot.envelopes_received, 4);
    assert_eq!(snapshot.deliveries_accepted, 7);

    assert!(manager.unregister("nozzle", &Scope::Firehose));
    assert!(!nozzle.is_healthy());
    assert_eq!(registry.value("messageRouter.numberOfFirehoseSinks"), Some(0.0));
}

#[tokio::test]
async fn test_legacy_frames_feed_container_metrics() {
    let registry = Arc::new(MetricsRegistry::new());
    let manager = SinkManager::new(registry.clone());
    let factory = SinkFactory::new(SinksConfig::default(), "courier-0");
    let sink = factory.container_metric("cm-app-1", "app-1");
    manager.register(sink, Scope::app("app-1")).unwrap();

    let (buffer_tx, buffer_rx) = mpsc::channel(64);
    let router = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.run(buffer_rx).await }
    });

    let (frames_tx, frames_rx) = mpsc::channel(16);
    frames_tx
        .send(legacy_metric("app-1", 0, 100).encode_v1())
        .await
        .unwrap();
    frames_tx
        .send(legacy_metric("app-1", 1, 150).encode_v1())
        .await
        .unwrap();
    frames_tx.send(Bytes::from_static(b"\xff\xff")).await.unwrap();
    frames_tx
        .send(legacy_metric("app-1", 0, 200).encode_v1())
        .await
        .unwrap();
    drop(frames_tx);

    let mut stream = LegacyStream::new(frames_rx);
    let ingestor = Ingestor::new(buffer_tx, registry.clone());
    ingestor.consume(&mut stream).await;
    drop(ingestor);
    assert_eq!(stream.skipped(), 1);

    timeout(Duration::from_secs(1), router)
        .await
        .expect("router stops once the buffer closes")
        .unwrap();

    let latest: Vec<(Option<i32>, Option<i64>)> = manager
        .latest_container_metrics("app-1")
        .iter()
        .map(|e| (e.container_metric().and_then(|m| m.instance_index), e.timestamp()))
        .collect();
    assert_eq!(latest, vec![(Some(0), Some(200)), (Some(1), Some(150))]);
}
