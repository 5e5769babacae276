//! Newer to legacy generation

use std::collections::HashMap;

use super::{
    CONTAINER_TAGS, CPU, DISK, DISK_QUOTA, ERROR_TAGS, HTTP_TAGS, LIST_SEPARATOR,
    LOG_TAGS, LOG_TIMESTAMP_TAG, MEMORY, MEMORY_QUOTA, METADATA_TAGS, NO_TAGS, V1_TYPE_TAG,
    fallback_source_id, tag_integer, tag_text,
};
use crate::wire::v1::{self, EventType, MessageType, Method, PeerType};
use crate::wire::v2::{self, envelope::Message, value::Data};

/// Translate a newer-generation envelope into the legacy generation
///
/// Returns `None` when the envelope carries no payload. Tags without a
/// legacy slot are copied into the legacy tag map; decimal tags and gauge
/// entries beyond the translated ones are dropped.
pub fn to_v1(envelope: &v2::Envelope) -> Option<v1::Envelope> {
    let message = envelope.message.as_ref()?;
    let tags = &envelope.tags;
    let declared = tag_text(tags, V1_TYPE_TAG).and_then(EventType::from_name);

    let timestamp = (envelope.timestamp != 0).then_some(envelope.timestamp);
    let origin = tag_text(tags, "origin").unwrap_or(envelope.source_id.as_str());

    let mut legacy = v1::Envelope {
        origin: Some(origin.to_string()),
        timestamp,
        deployment: tag_text(tags, "deployment").map(str::to_string),
        job: tag_text(tags, "job").map(str::to_string),
        index: tag_text(tags, "index").map(str::to_string),
        ip: tag_text(tags, "ip").map(str::to_string),
        ..Default::default()
    };
    let app_id = application_id(envelope, &legacy);

    let (event_type, payload_tags): (EventType, &[&str]) = match message {
        Message::Timer(timer) => {
            legacy.http_start_stop = Some(http_start_stop(timer, envelope));
            (EventType::HttpStartStop, HTTP_TAGS)
        }
        Message::Log(log) if declared == Some(EventType::Error) => {
            legacy.error = Some(v1::Error {
                source: tag_text(tags, "source").map(str::to_string),
                code: tag_integer(tags, "code").and_then(|c| i32::try_from(c).ok()),
                message: Some(String::from_utf8_lossy(&log.payload).into_owned()),
            });
            (EventType::Error, ERROR_TAGS)
        }
        Message::Log(log) => {
            let message_type = match v2::LogType::try_from(log.r#type) {
                Ok(v2::LogType::Err) => MessageType::Err,
                _ => MessageType::Out,
            };
            let log_timestamp = match tag_integer(tags, LOG_TIMESTAMP_TAG) {
                Some(own) => {
                    if timestamp == Some(own) {
                        legacy.timestamp = None;
                    }
                    (own != 0).then_some(own)
                }
                None => timestamp,
            };
            legacy.log_message = Some(v1::LogMessage {
                message: Some(log.payload.clone()),
                message_type: Some(message_type as i32),
                timestamp: log_timestamp,
                app_id,
                source_type: tag_text(tags, "source_type").map(str::to_string),
                source_instance: tag_text(tags, "source_instance").map(str::to_string),
            });
            (EventType::LogMessage, LOG_TAGS)
        }
        Message::Gauge(gauge) if is_container_metric(gauge, declared) => {
            legacy.container_metric = Some(container_metric(gauge, envelope, app_id));
            (EventType::ContainerMetric, CONTAINER_TAGS)
        }
        Message::Gauge(gauge) => {
            let (name, metric) = gauge.metrics.iter().min_by(|a, b| a.0.cmp(b.0))?;
            legacy.value_metric = Some(v1::ValueMetric {
                name: Some(name.clone()),
                value: Some(metric.value),
                unit: Some(metric.unit.clone()),
            });
            (EventType::ValueMetric, NO_TAGS)
        }
        Message::Counter(counter) => {
            legacy.counter_event = Some(v1::CounterEvent {
                name: Some(counter.name.clone()),
                delta: Some(counter.delta),
                total: Some(counter.total),
            });
            (EventType::CounterEvent, NO_TAGS)
        }
    };

    legacy.event_type = Some(event_type.code());
    legacy.tags = remaining_tags(tags, payload_tags);
    Some(legacy)
}

/// Application id implied by the source id
///
/// A source id built from deployment and job names the producer, not an
/// application, so it does not translate back.
fn application_id(envelope: &v2::Envelope, legacy: &v1::Envelope) -> Option<String> {
    let source_id = envelope.source_id.as_str();
    let fallback = fallback_source_id(legacy.deployment.as_deref(), legacy.job.as_deref());
    (!source_id.is_empty() && source_id != fallback).then(|| source_id.to_string())
}

fn http_start_stop(timer: &v2::Timer, envelope: &v2::Envelope) -> v1::HttpStartStop {
    let tags = &envelope.tags;

    v1::HttpStartStop {
        start_timestamp: Some(timer.start),
        stop_timestamp: Some(timer.stop),
        request_id: tag_text(tags, "request_id").and_then(|id| v1::Uuid::parse(id).ok()),
        peer_type: tag_text(tags, "peer_type")
            .and_then(PeerType::from_name)
            .map(|p| p as i32),
        method: tag_text(tags, "method")
            .and_then(Method::from_name)
            .map(|m| m as i32),
        uri: tag_text(tags, "uri").map(str::to_string),
        remote_address: tag_text(tags, "remote_address").map(str::to_string),
        user_agent: tag_text(tags, "user_agent").map(str::to_string),
        status_code: tag_integer(tags, "status_code").and_then(|c| i32::try_from(c).ok()),
        content_length: tag_integer(tags, "content_length"),
        application_id: v1::Uuid::parse(&envelope.source_id).ok(),
        instance_index: tag_integer(tags, "instance_index")
            .and_then(|i| i32::try_from(i).ok()),
        instance_id: tag_text(tags, "instance_id").map(str::to_string),
        forwarded: tag_text(tags, "forwarded")
            .map(|joined| joined.split(LIST_SEPARATOR).map(str::to_string).collect())
            .unwrap_or_default(),
    }
}

fn is_container_metric(gauge: &v2::Gauge, declared: Option<EventType>) -> bool {
    match declared {
        Some(EventType::ContainerMetric) => true,
        Some(EventType::ValueMetric) => false,
        _ => [CPU, MEMORY, DISK]
            .iter()
            .all(|name| gauge.metrics.contains_key(*name)),
    }
}

fn container_metric(
    gauge: &v2::Gauge,
    envelope: &v2::Envelope,
    app_id: Option<String>,
) -> v1::ContainerMetric {
    let value = |name: &str| gauge.metrics.get(name).map(|m| m.value);
    let bytes = |name: &str| value(name).map(|v| v as u64);

    v1::ContainerMetric {
        application_id: app_id,
        instance_index: tag_integer(&envelope.tags, "instance_index")
            .and_then(|i| i32::try_from(i).ok()),
        cpu_percentage: value(CPU),
        memory_bytes: bytes(MEMORY),
        disk_bytes: bytes(DISK),
        memory_bytes_quota: bytes(MEMORY_QUOTA),
        disk_bytes_quota: bytes(DISK_QUOTA),
    }
}

/// Tags without a dedicated legacy slot
fn remaining_tags(
    tags: &HashMap<String, v2::Value>,
    payload_tags: &[&str],
) -> HashMap<String, String> {
    tags.iter()
        .filter(|(key, _)| {
            let key = key.as_str();
            key != V1_TYPE_TAG && !METADATA_TAGS.contains(&key) && !payload_tags.contains(&key)
        })
        .filter_map(|(key, value)| match &value.data {
            Some(Data::Text(text)) => Some((key.clone(), text.clone())),
            Some(Data::Integer(int)) => Some((key.clone(), int.to_string())),
            Some(Data::Decimal(_)) | None => None,
        })
        .collect()
}
