//! JSON metrics formatter
//!
//! Formats metrics as structured JSON for machine parsing.
//!
//! # Example Output
//!
//! ```json
//! {
//!   "type": "snapshot",
//!   "counters": [{"key": "ingress{protocol=v2}", "total": 2500, "per_sec": 500}],
//!   "values": [{"name": "messageRouter.numberOfDumpSinks", "value": 1.0, "unit": "sinks"}]
//! }
//! ```

use super::MetricsFormatter;
use crate::{CounterRate, MetricsSnapshot, ValueSample};
use serde::Serialize;

/// JSON metrics formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

/// JSON structure for snapshot output
#[derive(Serialize)]
struct SnapshotJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    counters: Vec<CounterJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<&'a ValueSample>,
}

#[derive(Serialize)]
struct CounterJson<'a> {
    key: &'a str,
    total: u64,
    per_sec: u64,
}

impl MetricsFormatter for JsonFormatter {
    fn format_snapshot(
        &self,
        snapshot: &MetricsSnapshot,
        rates: Option<&[CounterRate]>,
    ) -> String {
        let Some(rates) = rates else {
            return r#"{"type":"snapshot","status":"collecting_baseline"}"#.to_string();
        };

        let json = SnapshotJson {
            report_type: "snapshot",
            counters: rates
                .iter()
                .map(|r| CounterJson {
                    key: &r.key,
                    total: r.total,
                    per_sec: r.per_sec as u64,
                })
                .collect(),
            values: snapshot.values.iter().collect(),
        };

        // Use compact JSON (no pretty printing for log lines)
        serde_json::to_string(&json).unwrap_or_else(|_| "{}".to_string())
    }
}
