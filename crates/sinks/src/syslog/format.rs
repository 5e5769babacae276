//! RFC 5424 message formatting
//!
//! ```text
//! <PRI>1 TIMESTAMP HOSTNAME APP-NAME PROCID MSGID STRUCTURED-DATA MSG
//! <14>1 2024-01-01T00:00:00.000000Z host app-1 [APP/0] - - hello
//! ```
//!
//! Facility is always `user`. Standard output maps to severity `info`,
//! standard error to `error`. PROCID carries the log source as
//! `[SOURCE/INSTANCE]`.

use chrono::{DateTime, SecondsFormat, Utc};

use courier_protocol::Envelope;
use courier_protocol::wire::v1;

/// Facility `user` (1), shifted into the PRI value
const FACILITY_USER: u8 = 1 << 3;

const SEVERITY_ERROR: u8 = 3;
const SEVERITY_INFO: u8 = 6;

/// RFC 5424 field length limits
const MAX_HOSTNAME: usize = 255;
const MAX_APP_NAME: usize = 48;
const MAX_PROCID: usize = 128;

/// Nil value for empty header fields
const NILVALUE: &str = "-";

/// Formats log envelopes for one drain
#[derive(Debug, Clone)]
pub(crate) struct SyslogFormat {
    hostname: String,
    app_name: String,
}

impl SyslogFormat {
    pub(crate) fn new(hostname: &str, app_name: &str) -> Self {
        Self {
            hostname: header_field(hostname, MAX_HOSTNAME),
            app_name: header_field(app_name, MAX_APP_NAME),
        }
    }

    /// Format a log envelope, `None` for any other event
    pub(crate) fn format(&self, envelope: &Envelope) -> Option<String> {
        let log = envelope.log_message()?;

        let severity = if log.message_type == Some(v1::MessageType::Err as i32) {
            SEVERITY_ERROR
        } else {
            SEVERITY_INFO
        };

        let timestamp = envelope
            .effective_timestamp()
            .map(DateTime::from_timestamp_nanos)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Micros, true);

        let message = log
            .message
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();

        Some(format!(
            "<{}>1 {} {} {} {} {} {} {}",
            FACILITY_USER | severity,
            timestamp,
            self.hostname,
            self.app_name,
            procid(log),
            NILVALUE,
            NILVALUE,
            message.trim_end_matches(['\r', '\n']),
        ))
    }
}

/// `[SOURCE/INSTANCE]`, or nil when the log names no source
fn procid(log: &v1::LogMessage) -> String {
    let source = log.source_type.as_deref().unwrap_or_default();
    let instance = log.source_instance.as_deref().unwrap_or_default();
    if source.is_empty() && instance.is_empty() {
        return NILVALUE.to_string();
    }
    header_field(&format!("[{source}/{instance}]"), MAX_PROCID)
}

/// Printable ASCII without spaces, truncated to `max`, nil when empty
fn header_field(value: &str, max: usize) -> String {
    let field: String = value
        .chars()
        .filter(|c| c.is_ascii_graphic())
        .take(max)
        .collect();
    if field.is_empty() {
        NILVALUE.to_string()
    } else {
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_protocol::Event;

    fn log(message: &str, message_type: v1::MessageType) -> v1::LogMessage {
        v1::LogMessage {
            message: Some(message.as_bytes().to_vec()),
            message_type: Some(message_type as i32),
            timestamp: Some(0),
            app_id: Some("app-1".into()),
            source_type: Some("APP".into()),
            source_instance: Some("0".into()),
        }
    }

    fn envelope(log: v1::LogMessage, timestamp: i64) -> Envelope {
        Envelope::new("router", Event::LogMessage(log)).with_timestamp(timestamp)
    }

    #[test]
    fn test_stdout_line() {
        let format = SyslogFormat::new("host-1", "app-1");
        let line = format
            .format(&envelope(log("hello\n", v1::MessageType::Out), 1_500_000_000))
            .unwrap();
        assert_eq!(
            line,
            "<14>1 1970-01-01T00:00:01.500000Z host-1 app-1 [APP/0] - - hello"
        );
    }

    #[test]
    fn test_stderr_uses_error_severity() {
        let format = SyslogFormat::new("host-1", "app-1");
        let line = format
            .format(&envelope(log("boom", v1::MessageType::Err), 0))
            .unwrap();
        assert!(line.starts_with("<11>1 "));
        assert!(line.ends_with(" - - boom"));
    }

    #[test]
    fn test_missing_source_is_nil() {
        let format = SyslogFormat::new("host-1", "app-1");
        let mut payload = log("hi", v1::MessageType::Out);
        payload.source_type = None;
        payload.source_instance = None;
        let line = format.format(&envelope(payload, 0)).unwrap();
        assert!(line.contains(" app-1 - - - hi"));
    }

    #[test]
    fn test_empty_header_fields_are_nil() {
        let format = SyslogFormat::new("", "my app");
        let line = format
            .format(&envelope(log("x", v1::MessageType::Out), 0))
            .unwrap();
        assert!(line.contains("Z - myapp [APP/0]"));
    }

    #[test]
    fn test_app_name_truncated() {
        let long = "a".repeat(100);
        let format = SyslogFormat::new("h", &long);
        let line = format
            .format(&envelope(log("x", v1::MessageType::Out), 0))
            .unwrap();
        assert!(line.contains(&format!(" h {} ", "a".repeat(MAX_APP_NAME))));
    }

    #[test]
    fn test_non_log_envelope_is_not_formatted() {
        let format = SyslogFormat::new("h", "app");
        let metric = Envelope::new(
            "router",
            Event::ContainerMetric(v1::ContainerMetric::default()),
        );
        assert!(format.format(&metric).is_none());
    }
}
