//! Legacy to newer generation

use std::collections::HashMap;

use super::{
    BYTES_UNIT, CPU, DISK, DISK_QUOTA, HTTP_TIMER_NAME, LIST_SEPARATOR, LOG_TIMESTAMP_TAG, MEMORY,
    MEMORY_QUOTA, PERCENTAGE_UNIT, V1_TYPE_TAG, fallback_source_id,
};
use crate::wire::v1::{self, EventType, Method, MessageType, PeerType};
use crate::wire::v2::{self, Value, envelope::Message};

/// Translate a legacy envelope into the newer generation
///
/// Returns `None` when the declared event type has no payload. Envelopes
/// without a (known) event type still translate, carrying only metadata.
pub fn to_v2(legacy: &v1::Envelope) -> Option<v2::Envelope> {
    let event_type = legacy.event_type.and_then(EventType::from_code);

    let mut tags: HashMap<String, Value> = legacy
        .tags
        .iter()
        .map(|(key, value)| (key.clone(), Value::text(value.as_str())))
        .collect();
    let mut timestamp = legacy.timestamp;
    let mut app_id = None;

    let message = match event_type {
        Some(EventType::HttpStartStop) => {
            let http = legacy.http_start_stop.as_ref()?;
            app_id = http.application_id.as_ref().map(v1::Uuid::to_uuid_string);
            http_tags(http, &mut tags);
            Some(Message::Timer(v2::Timer {
                name: HTTP_TIMER_NAME.to_string(),
                start: http.start_timestamp.unwrap_or_default(),
                stop: http.stop_timestamp.unwrap_or_default(),
            }))
        }
        Some(EventType::LogMessage) => {
            let log = legacy.log_message.as_ref()?;
            app_id = log.app_id.clone();
            if log.timestamp != timestamp {
                let own = Value::integer(log.timestamp.unwrap_or_default());
                tags.insert(LOG_TIMESTAMP_TAG.to_string(), own);
            }
            timestamp = timestamp.or(log.timestamp);
            insert_text(&mut tags, "source_type", log.source_type.as_deref());
            insert_text(&mut tags, "source_instance", log.source_instance.as_deref());

            let log_type = match log.message_type.and_then(|t| MessageType::try_from(t).ok()) {
                Some(MessageType::Err) => v2::LogType::Err,
                _ => v2::LogType::Out,
            };
            Some(Message::Log(v2::Log {
                payload: log.message.clone().unwrap_or_default(),
                r#type: log_type as i32,
            }))
        }
        Some(EventType::ValueMetric) => {
            let metric = legacy.value_metric.as_ref()?;
            let mut metrics = HashMap::with_capacity(1);
            metrics.insert(
                metric.name.clone().unwrap_or_default(),
                v2::GaugeValue {
                    unit: metric.unit.clone().unwrap_or_default(),
                    value: metric.value.unwrap_or_default(),
                },
            );
            Some(Message::Gauge(v2::Gauge { metrics }))
        }
        Some(EventType::CounterEvent) => {
            let counter = legacy.counter_event.as_ref()?;
            Some(Message::Counter(v2::Counter {
                name: counter.name.clone().unwrap_or_default(),
                delta: counter.delta.unwrap_or_default(),
                total: counter.total.unwrap_or_default(),
            }))
        }
        Some(EventType::Error) => {
            let error = legacy.error.as_ref()?;
            insert_text(&mut tags, "source", error.source.as_deref());
            if let Some(code) = error.code {
                tags.insert("code".to_string(), Value::integer(code.into()));
            }
            Some(Message::Log(v2::Log {
                payload: error.message.clone().unwrap_or_default().into_bytes(),
                r#type: v2::LogType::Err as i32,
            }))
        }
        Some(EventType::ContainerMetric) => {
            let metric = legacy.container_metric.as_ref()?;
            app_id = metric.application_id.clone();
            if let Some(index) = metric.instance_index {
                tags.insert("instance_index".to_string(), Value::integer(index.into()));
            }
            Some(Message::Gauge(container_gauge(metric)))
        }
        None => None,
    };

    if let Some(event_type) = event_type {
        tags.insert(V1_TYPE_TAG.to_string(), Value::text(event_type.name()));
    }

    let metadata = [
        ("origin", legacy.origin.as_deref()),
        ("deployment", legacy.deployment.as_deref()),
        ("job", legacy.job.as_deref()),
        ("index", legacy.index.as_deref()),
        ("ip", legacy.ip.as_deref()),
    ];
    for (key, value) in metadata {
        insert_text(&mut tags, key, value);
    }

    let source_id = app_id.filter(|id| !id.is_empty()).unwrap_or_else(|| {
        fallback_source_id(legacy.deployment.as_deref(), legacy.job.as_deref())
    });

    Some(v2::Envelope {
        timestamp: timestamp.unwrap_or_default(),
        source_id,
        tags,
        message,
    })
}

fn insert_text(tags: &mut HashMap<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        tags.insert(key.to_string(), Value::text(value));
    }
}

fn http_tags(http: &v1::HttpStartStop, tags: &mut HashMap<String, Value>) {
    if let Some(id) = &http.request_id {
        tags.insert("request_id".to_string(), Value::text(id.to_uuid_string()));
    }
    let peer_type = http
        .peer_type
        .and_then(|p| PeerType::try_from(p).ok())
        .map(PeerType::name);
    insert_text(tags, "peer_type", peer_type);
    let method = http
        .method
        .and_then(|m| Method::try_from(m).ok())
        .map(Method::name);
    insert_text(tags, "method", method);
    insert_text(tags, "uri", http.uri.as_deref());
    insert_text(tags, "remote_address", http.remote_address.as_deref());
    insert_text(tags, "user_agent", http.user_agent.as_deref());
    if let Some(status) = http.status_code {
        tags.insert("status_code".to_string(), Value::integer(status.into()));
    }
    if let Some(length) = http.content_length {
        tags.insert("content_length".to_string(), Value::integer(length));
    }
    if let Some(index) = http.instance_index {
        tags.insert("instance_index".to_string(), Value::integer(index.into()));
    }
    insert_text(tags, "instance_id", http.instance_id.as_deref());
    if !http.forwarded.is_empty() {
        let joined = http.forwarded.join(LIST_SEPARATOR);
        tags.insert("forwarded".to_string(), Value::text(joined));
    }
}

fn container_gauge(metric: &v1::ContainerMetric) -> v2::Gauge {
    let entries = [
        (CPU, PERCENTAGE_UNIT, metric.cpu_percentage),
        (MEMORY, BYTES_UNIT, metric.memory_bytes.map(|b| b as f64)),
        (DISK, BYTES_UNIT, metric.disk_bytes.map(|b| b as f64)),
        (MEMORY_QUOTA, BYTES_UNIT, metric.memory_bytes_quota.map(|b| b as f64)),
        (DISK_QUOTA, BYTES_UNIT, metric.disk_bytes_quota.map(|b| b as f64)),
    ];

    let metrics = entries
        .into_iter()
        .filter_map(|(name, unit, value)| {
            value.map(|value| {
                (
                    name.to_string(),
                    v2::GaugeValue {
                        unit: unit.to_string(),
                        value,
                    },
                )
            })
        })
        .collect();

    v2::Gauge { metrics }
}
