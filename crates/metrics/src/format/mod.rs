//! Snapshot formatters for the periodic report
//!
//! The reporter hands every snapshot to one [`MetricsFormatter`]; which one
//! is chosen by `[metrics] format`.

mod human;
mod json;

pub use human::HumanFormatter;
pub use json::JsonFormatter;

use crate::{CounterRate, MetricsSnapshot};

/// Renders a registry snapshot as one report
pub trait MetricsFormatter: Send + Sync {
    /// `rates` is `None` until a previous snapshot exists to diff against.
    fn format_snapshot(&self, snapshot: &MetricsSnapshot, rates: Option<&[CounterRate]>)
    -> String;
}

/// Scale to a K/M suffix, or `None` below a thousand
fn scaled(n: f64) -> Option<String> {
    [(1_000_000.0, 'M'), (1_000.0, 'K')]
        .into_iter()
        .find(|(step, _)| n >= *step)
        .map(|(step, suffix)| format!("{:.1}{suffix}", n / step))
}

/// Envelope totals such as `1.2M`
pub fn format_count(count: u64) -> String {
    scaled(count as f64).unwrap_or_else(|| count.to_string())
}

/// Throughput such as `40.0K/s`
pub fn format_rate(rate: f64) -> String {
    let scaled = scaled(rate).unwrap_or_else(|| format!("{rate:.0}"));
    format!("{scaled}/s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_below_a_thousand_are_exact() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn test_counts_are_scaled() {
        assert_eq!(format_count(2500), "2.5K");
        assert_eq!(format_count(1_000_000), "1.0M");
        assert_eq!(format_count(3_400_000), "3.4M");
    }

    #[test]
    fn test_rates() {
        assert_eq!(format_rate(12.4), "12/s");
        assert_eq!(format_rate(1000.0), "1.0K/s");
        assert_eq!(format_rate(40_000.0), "40.0K/s");
        assert_eq!(format_rate(1_200_000.0), "1.2M/s");
    }
}
