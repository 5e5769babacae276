//! Unmarshal and validate legacy envelope bytes
//!
//! Every call records exactly one outcome:
//!
//! | Outcome | Counter |
//! |---------|---------|
//! | decode or validation failure | `dropsondeUnmarshaller.unmarshalErrors` |
//! | LogMessage | `dropsondeUnmarshaller.logMessageTotal` |
//! | other known type | `dropsondeUnmarshaller.<type>Received` |
//! | unknown type code | `dropsondeUnmarshaller.unknownEventTypeReceived` |
//!
//! Successful unmarshals (unknown types included) also count towards the
//! tagged `dropsondeUnmarshaller.receivedEnvelopes`.

use std::sync::Arc;

use courier_config::IngressConfig;
use courier_metrics::MetricEmitter;
use courier_protocol::{Envelope, EventType, wire};

use crate::UnmarshalError;

const UNMARSHAL_ERRORS: &str = "dropsondeUnmarshaller.unmarshalErrors";
const LOG_MESSAGE_TOTAL: &str = "dropsondeUnmarshaller.logMessageTotal";
const UNKNOWN_RECEIVED: &str = "dropsondeUnmarshaller.unknownEventTypeReceived";
const RECEIVED_ENVELOPES: &str = "dropsondeUnmarshaller.receivedEnvelopes";

/// Receipt counter for a known event type
fn received_counter(event_type: EventType) -> &'static str {
    match event_type {
        EventType::HttpStartStop => "dropsondeUnmarshaller.httpStartStopReceived",
        EventType::LogMessage => LOG_MESSAGE_TOTAL,
        EventType::ValueMetric => "dropsondeUnmarshaller.valueMetricReceived",
        EventType::CounterEvent => "dropsondeUnmarshaller.counterEventReceived",
        EventType::Error => "dropsondeUnmarshaller.errorReceived",
        EventType::ContainerMetric => "dropsondeUnmarshaller.containerMetricReceived",
    }
}

/// Downstream of the unmarshal stage
pub trait EnvelopeWriter: Send + Sync {
    fn write(&self, envelope: Envelope);
}

/// Decodes, validates and counts inbound legacy envelopes
pub struct Unmarshaller {
    protocol: String,
    metrics: Arc<dyn MetricEmitter>,
}

impl Unmarshaller {
    /// `protocol` tags the received-envelopes counter (`udp`, `tcp`, ...)
    pub fn new(protocol: impl Into<String>, metrics: Arc<dyn MetricEmitter>) -> Self {
        Self {
            protocol: protocol.into(),
            metrics,
        }
    }

    pub fn from_config(config: &IngressConfig, metrics: Arc<dyn MetricEmitter>) -> Self {
        Self::new(config.protocol.clone(), metrics)
    }

    /// Decode and validate one envelope
    pub fn unmarshal(&self, bytes: &[u8]) -> Result<Envelope, UnmarshalError> {
        let envelope = match wire::decode_v1(bytes).and_then(Envelope::try_from) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.metrics.increment_counter(UNMARSHAL_ERRORS);
                return Err(e.into());
            }
        };

        match envelope.event_type() {
            Some(event_type) => {
                self.metrics.increment_counter(received_counter(event_type));
                self.count_received(event_type.name());
                Ok(envelope)
            }
            None => {
                let code = envelope.event_code();
                self.metrics.increment_counter(UNKNOWN_RECEIVED);
                self.count_received(&code.to_string());
                Err(UnmarshalError::UnknownEventType {
                    code,
                    envelope: Box::new(envelope),
                })
            }
        }
    }

    /// Unmarshal and forward to `writer`
    ///
    /// Recoverable errors still forward the envelope; anything else is
    /// logged and dropped.
    pub fn write<W: EnvelopeWriter + ?Sized>(&self, bytes: &[u8], writer: &W) {
        match self.unmarshal(bytes) {
            Ok(envelope) => writer.write(envelope),
            Err(e) if e.is_recoverable() => {
                tracing::debug!(error = %e, "forwarding envelope with unknown event type");
                if let Some(envelope) = e.into_envelope() {
                    writer.write(envelope);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, len = bytes.len(), "dropping invalid envelope");
            }
        }
    }

    fn count_received(&self, event_type: &str) {
        self.metrics.add_counter(
            RECEIVED_ENVELOPES,
            1,
            &[("protocol", self.protocol.as_str()), ("event_type", event_type)],
        );
    }
}

#[cfg(test)]
#[path = "unmarshaller_test.rs"]
mod tests;
