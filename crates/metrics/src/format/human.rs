//! Human-readable metrics formatter
//!
//! Formats metrics in a compact, readable format for operators.
//!
//! # Example Output
//!
//! ```text
//! [metrics] counters: dropsondeUnmarshaller.unmarshalErrors 3 (0/s) | ingress{protocol=v2} 1.2M (40.0K/s)
//! [metrics] values: messageRouter.numberOfDumpSinks 4 sinks | messageRouter.numberOfFirehoseSinks 1 sinks
//! ```

use super::{MetricsFormatter, format_count, format_rate};
use crate::{CounterRate, MetricsSnapshot};
use std::fmt::Write;

/// Human-readable metrics formatter
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        Self
    }

    fn format_counters(&self, rates: &[CounterRate]) -> Option<String> {
        if rates.is_empty() {
            return None;
        }

        let mut output = String::from("[metrics] counters:");

        for (i, rate) in rates.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }

            let _ = write!(
                output,
                " {} {} ({})",
                rate.key,
                format_count(rate.total),
                format_rate(rate.per_sec),
            );
        }

        Some(output)
    }

    fn format_values(&self, snapshot: &MetricsSnapshot) -> Option<String> {
        if snapshot.values.is_empty() {
            return None;
        }

        let mut output = String::from("[metrics] values:");

        for (i, value) in snapshot.values.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }

            let _ = write!(output, " {} {} {}", value.name, value.value, value.unit);
        }

        Some(output)
    }
}

impl MetricsFormatter for HumanFormatter {
    fn format_snapshot(
        &self,
        snapshot: &MetricsSnapshot,
        rates: Option<&[CounterRate]>,
    ) -> String {
        let Some(rates) = rates else {
            return "[metrics] collecting baseline...".to_string();
        };

        let lines: Vec<String> = [self.format_counters(rates), self.format_values(snapshot)]
            .into_iter()
            .flatten()
            .collect();

        if lines.is_empty() {
            "[metrics] no activity".to_string()
        } else {
            lines.join("\n")
        }
    }
}
