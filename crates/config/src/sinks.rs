//! Sink configuration
//!
//! Delivery parameters for each sink kind. Sinks themselves are created at
//! runtime as consumers connect; these settings only size and time them.
//!
//! # Example
//!
//! ```toml
//! [sinks.websocket]
//! buffer_size = 100
//!
//! [sinks.dump]
//! capacity = 100
//! inactivity_timeout = "1h"
//!
//! [sinks.container_metric]
//! freshness_window = "2m"
//!
//! [sinks.syslog]
//! buffer_size = 100
//! connection_timeout = "5s"
//! write_timeout = "5s"
//! ```

use serde::Deserialize;
use std::time::Duration;

use crate::{ConfigError, Result};

/// Configuration for all sink kinds
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    pub websocket: WebsocketSinkConfig,
    pub dump: DumpSinkConfig,
    pub container_metric: ContainerMetricSinkConfig,
    pub syslog: SyslogSinkConfig,
}

impl SinksConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.websocket.buffer_size == 0 {
            return Err(ConfigError::invalid_value(
                "sinks.websocket",
                "buffer_size",
                "must be greater than 0",
            ));
        }
        if self.dump.capacity == 0 {
            return Err(ConfigError::invalid_value(
                "sinks.dump",
                "capacity",
                "must be greater than 0",
            ));
        }
        if self.container_metric.freshness_window.is_zero() {
            return Err(ConfigError::invalid_value(
                "sinks.container_metric",
                "freshness_window",
                "must be greater than 0",
            ));
        }
        if self.syslog.buffer_size == 0 {
            return Err(ConfigError::invalid_value(
                "sinks.syslog",
                "buffer_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Live streaming sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebsocketSinkConfig {
    /// Envelopes queued per consumer before new ones are dropped
    /// Default: 100
    pub buffer_size: usize,
}

impl Default for WebsocketSinkConfig {
    fn default() -> Self {
        Self { buffer_size: 100 }
    }
}

/// Recent-history sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DumpSinkConfig {
    /// Envelopes retained per application
    /// Default: 100
    pub capacity: usize,

    /// Idle time after which a dump sink may be reclaimed
    /// Default: 1h
    #[serde(with = "humantime_serde")]
    pub inactivity_timeout: Duration,
}

impl Default for DumpSinkConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            inactivity_timeout: Duration::from_secs(3600),
        }
    }
}

/// Latest-value container metric sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerMetricSinkConfig {
    /// Envelopes older than the newest seen minus this window are dropped
    /// Default: 2m
    #[serde(with = "humantime_serde")]
    pub freshness_window: Duration,
}

impl Default for ContainerMetricSinkConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(120),
        }
    }
}

/// Syslog relay sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyslogSinkConfig {
    /// Lines queued before new ones are dropped
    /// Default: 100
    pub buffer_size: usize,

    /// Connection timeout
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Write timeout per line
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
}

impl Default for SyslogSinkConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            connection_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SinksConfig::default();
        assert_eq!(config.websocket.buffer_size, 100);
        assert_eq!(config.dump.capacity, 100);
        assert_eq!(config.dump.inactivity_timeout, Duration::from_secs(3600));
        assert_eq!(
            config.container_metric.freshness_window,
            Duration::from_secs(120)
        );
        assert_eq!(config.syslog.connection_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
[dump]
capacity = 5

[syslog]
write_timeout = "1s"
"#;
        let config: SinksConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.dump.capacity, 5);
        assert_eq!(config.dump.inactivity_timeout, Duration::from_secs(3600));
        assert_eq!(config.syslog.write_timeout, Duration::from_secs(1));
        assert_eq!(config.syslog.buffer_size, 100);
        assert_eq!(config.websocket.buffer_size, 100);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = SinksConfig::default();
        config.dump.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                section: "sinks.dump",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = SinksConfig::default();
        config.container_metric.freshness_window = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
