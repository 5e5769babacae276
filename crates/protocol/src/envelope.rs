//! Validated canonical envelope
//!
//! [`Envelope`] is the version-agnostic form that flows from the ingress
//! stages through the router to every sink. It can only be built by
//! validating a legacy wire envelope, so a declared event type without its
//! payload never reaches routing.

use std::collections::HashMap;

use bytes::Bytes;
use prost::Message;

use crate::wire::v1::{self, EventType};
use crate::{ProtocolError, Result};

/// Payload of a canonical envelope
///
/// One variant per legacy payload kind, plus [`Event::Other`] for type codes
/// that have no dedicated payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    HttpStartStop(v1::HttpStartStop),
    LogMessage(v1::LogMessage),
    ValueMetric(v1::ValueMetric),
    CounterEvent(v1::CounterEvent),
    Error(v1::Error),
    ContainerMetric(v1::ContainerMetric),
    /// A type code without a known payload; routed but not interpreted
    Other { code: i32 },
}

impl Event {
    /// Known event type, `None` for [`Event::Other`]
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::HttpStartStop(_) => Some(EventType::HttpStartStop),
            Self::LogMessage(_) => Some(EventType::LogMessage),
            Self::ValueMetric(_) => Some(EventType::ValueMetric),
            Self::CounterEvent(_) => Some(EventType::CounterEvent),
            Self::Error(_) => Some(EventType::Error),
            Self::ContainerMetric(_) => Some(EventType::ContainerMetric),
            Self::Other { .. } => None,
        }
    }

    /// Raw event type code
    pub fn code(&self) -> i32 {
        match self {
            Self::Other { code } => *code,
            known => known.event_type().map(EventType::code).unwrap_or_default(),
        }
    }
}

/// A validated telemetry event
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    origin: String,
    timestamp: Option<i64>,
    deployment: Option<String>,
    job: Option<String>,
    index: Option<String>,
    ip: Option<String>,
    tags: HashMap<String, String>,
    event: Event,
}

impl Envelope {
    /// Create an envelope for a given producer and payload
    ///
    /// Used for internally generated events (router error notices). Wire
    /// input goes through `TryFrom<v1::Envelope>` instead.
    pub fn new(origin: impl Into<String>, event: Event) -> Self {
        Self {
            origin: origin.into(),
            timestamp: None,
            deployment: None,
            job: None,
            index: None,
            ip: None,
            tags: HashMap::new(),
            event,
        }
    }

    /// Set the timestamp (nanoseconds since the unix epoch)
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a legacy string tag
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Decode and validate legacy bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::try_from(crate::wire::decode_v1(bytes)?)
    }

    /// Producer name
    #[inline]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[inline]
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    #[inline]
    pub fn deployment(&self) -> Option<&str> {
        self.deployment.as_deref()
    }

    #[inline]
    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    #[inline]
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    #[inline]
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Legacy string tags
    #[inline]
    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Known event type, `None` for unknown codes
    #[inline]
    pub fn event_type(&self) -> Option<EventType> {
        self.event.event_type()
    }

    /// Raw event type code
    #[inline]
    pub fn event_code(&self) -> i32 {
        self.event.code()
    }

    /// Application this event belongs to, if any
    ///
    /// Events without an application (platform metrics, component errors)
    /// are only seen by firehose sinks.
    pub fn app_id(&self) -> Option<String> {
        match &self.event {
            Event::HttpStartStop(http) => http.application_id.as_ref().map(v1::Uuid::to_uuid_string),
            Event::LogMessage(log) => log.app_id.clone(),
            Event::ContainerMetric(metric) => metric.application_id.clone(),
            _ => None,
        }
        .filter(|id| !id.is_empty())
    }

    /// The log payload, if this is a log message
    pub fn log_message(&self) -> Option<&v1::LogMessage> {
        match &self.event {
            Event::LogMessage(log) => Some(log),
            _ => None,
        }
    }

    /// The container metric payload, if this is a container metric
    pub fn container_metric(&self) -> Option<&v1::ContainerMetric> {
        match &self.event {
            Event::ContainerMetric(metric) => Some(metric),
            _ => None,
        }
    }

    /// Event time, falling back to the log message's own timestamp
    pub fn effective_timestamp(&self) -> Option<i64> {
        self.timestamp
            .or_else(|| self.log_message().and_then(|log| log.timestamp))
    }

    /// Legacy wire form
    pub fn to_wire(&self) -> v1::Envelope {
        v1::Envelope::from(self.clone())
    }

    /// Encode as legacy bytes
    pub fn encode_v1(&self) -> Bytes {
        Bytes::from(self.to_wire().encode_to_vec())
    }
}

impl TryFrom<v1::Envelope> for Envelope {
    type Error = ProtocolError;

    fn try_from(wire: v1::Envelope) -> Result<Self> {
        let origin = wire
            .origin
            .ok_or_else(|| ProtocolError::missing_field("origin"))?;
        let code = wire
            .event_type
            .ok_or_else(|| ProtocolError::missing_field("event_type"))?;

        let event = match EventType::from_code(code) {
            Some(EventType::HttpStartStop) => wire
                .http_start_stop
                .map(Event::HttpStartStop)
                .ok_or_else(|| ProtocolError::missing_payload("HttpStartStop"))?,
            Some(EventType::LogMessage) => wire
                .log_message
                .map(Event::LogMessage)
                .ok_or_else(|| ProtocolError::missing_payload("LogMessage"))?,
            Some(EventType::ValueMetric) => wire
                .value_metric
                .map(Event::ValueMetric)
                .ok_or_else(|| ProtocolError::missing_payload("ValueMetric"))?,
            Some(EventType::CounterEvent) => wire
                .counter_event
                .map(Event::CounterEvent)
                .ok_or_else(|| ProtocolError::missing_payload("CounterEvent"))?,
            Some(EventType::Error) => wire
                .error
                .map(Event::Error)
                .ok_or_else(|| ProtocolError::missing_payload("Error"))?,
            Some(EventType::ContainerMetric) => wire
                .container_metric
                .map(Event::ContainerMetric)
                .ok_or_else(|| ProtocolError::missing_payload("ContainerMetric"))?,
            None => Event::Other { code },
        };

        Ok(Self {
            origin,
            timestamp: wire.timestamp,
            deployment: wire.deployment,
            job: wire.job,
            index: wire.index,
            ip: wire.ip,
            tags: wire.tags,
            event,
        })
    }
}

impl From<Envelope> for v1::Envelope {
    fn from(envelope: Envelope) -> Self {
        let mut wire = v1::Envelope {
            origin: Some(envelope.origin),
            event_type: Some(envelope.event.code()),
            timestamp: envelope.timestamp,
            deployment: envelope.deployment,
            job: envelope.job,
            index: envelope.index,
            ip: envelope.ip,
            tags: envelope.tags,
            ..Default::default()
        };

        match envelope.event {
            Event::HttpStartStop(p) => wire.http_start_stop = Some(p),
            Event::LogMessage(p) => wire.log_message = Some(p),
            Event::ValueMetric(p) => wire.value_metric = Some(p),
            Event::CounterEvent(p) => wire.counter_event = Some(p),
            Event::Error(p) => wire.error = Some(p),
            Event::ContainerMetric(p) => wire.container_metric = Some(p),
            Event::Other { .. } => {}
        }

        wire
    }
}
