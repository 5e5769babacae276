//! Ingress configuration
//!
//! Controls the unmarshaller label, throughput batching and the buffer
//! between ingestion and routing.

use serde::Deserialize;
use std::time::Duration;

use crate::{ConfigError, Result};

/// Ingress configuration
///
/// # Example
///
/// ```toml
/// [ingress]
/// protocol = "udp"
/// batch_size = 1000
/// flush_interval = "5s"
/// buffer_capacity = 10000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Protocol label attached to received-envelope counters
    /// Default: udp
    pub protocol: String,

    /// Envelopes counted before the throughput counter is flushed
    /// Default: 1000
    pub batch_size: u64,

    /// Maximum time between throughput counter flushes
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Capacity of the channel between ingestion and routing
    /// Default: 10000
    pub buffer_capacity: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            protocol: "udp".to_string(),
            batch_size: 1000,
            flush_interval: Duration::from_secs(5),
            buffer_capacity: 10_000,
        }
    }
}

impl IngressConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.protocol.is_empty() {
            return Err(ConfigError::invalid_value("ingress", "protocol", "must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid_value(
                "ingress",
                "batch_size",
                "must be greater than 0",
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "ingress",
                "flush_interval",
                "must be greater than 0",
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "ingress",
                "buffer_capacity",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngressConfig::default();
        assert_eq!(config.protocol, "udp");
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.flush_interval, Duration::from_secs(5));
        assert_eq!(config.buffer_capacity, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
protocol = "grpc"
batch_size = 50
flush_interval = "250ms"
buffer_capacity = 64
"#;
        let config: IngressConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.protocol, "grpc");
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
        assert_eq!(config.buffer_capacity, 64);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = IngressConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "batch_size",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = IngressConfig {
            flush_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
