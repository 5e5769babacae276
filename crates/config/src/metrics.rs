//! `[metrics]` section: the periodic self-metrics report
//!
//! The registry always aggregates; this section only decides whether, how
//! often and in which shape the `Reporter` logs it.
//!
//! ```toml
//! [metrics]
//! interval = "30s"
//! format = "json"
//! include_values = false   # drop the sink population gauges
//! ```

use serde::Deserialize;
use std::time::Duration;

/// Shape of each report line
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// `[metrics] counters: ...` lines for operators
    #[default]
    Human,
    /// One JSON object per report, for log shippers
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Default: true
    pub enabled: bool,

    /// Time between reports. Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    pub format: MetricsFormat,

    /// Report throughput counters (`ingress`, `receivedEnvelopes`,
    /// unmarshaller counters). Default: true
    pub include_counters: bool,

    /// Report value metrics (`messageRouter.numberOf*Sinks`). Default: true
    pub include_values: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            format: MetricsFormat::default(),
            include_counters: true,
            include_values: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_section_reports_everything_every_minute() {
        let config: MetricsConfig = toml::from_str("").unwrap();
        assert!(config.enabled);
        assert!(config.include_counters && config.include_values);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.format, MetricsFormat::Human);
    }

    #[test]
    fn test_json_without_population_gauges() {
        let config: MetricsConfig = toml::from_str(
            r#"
interval = "30s"
format = "json"
include_values = false
"#,
        )
        .unwrap();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.format, MetricsFormat::Json);
        assert!(config.include_counters);
        assert!(!config.include_values);
    }

    #[test]
    fn test_reporting_can_be_switched_off() {
        let config: MetricsConfig = toml::from_str("enabled = false").unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn test_humantime_intervals() {
        let cases = [
            ("250ms", Duration::from_millis(250)),
            ("10s", Duration::from_secs(10)),
            ("2m", Duration::from_secs(120)),
        ];
        for (text, expected) in cases {
            let config: MetricsConfig =
                toml::from_str(&format!("interval = \"{text}\"")).unwrap();
            assert_eq!(config.interval, expected, "interval {text}");
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(toml::from_str::<MetricsConfig>("format = \"xml\"").is_err());
    }
}
