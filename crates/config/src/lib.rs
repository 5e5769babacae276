//! Courier - Configuration
//!
//! One TOML document with four optional sections. Anything left out keeps
//! its default, so an empty file is a valid configuration.
//!
//! ```
//! use courier_config::Config;
//!
//! let config: Config = "[ingress]\nbatch_size = 500".parse().unwrap();
//! assert_eq!(config.ingress.batch_size, 500);
//! assert_eq!(config.sinks.dump.capacity, 100);
//! ```
//!
//! A fuller file:
//!
//! ```toml
//! [log]
//! level = "info"
//! directives = "courier_pipeline=debug"
//!
//! [metrics]
//! interval = "30s"
//!
//! [ingress]
//! protocol = "udp"
//! flush_interval = "5s"
//!
//! [sinks.dump]
//! capacity = 200
//! ```

mod error;
mod ingress;
mod logging;
mod metrics;
mod sinks;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use ingress::IngressConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput, init_logging};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use sinks::{
    ContainerMetricSinkConfig, DumpSinkConfig, SinksConfig, SyslogSinkConfig, WebsocketSinkConfig,
};

use serde::Deserialize;

/// Top-level configuration document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[log]`
    pub log: LogConfig,

    /// `[metrics]` self-report
    pub metrics: MetricsConfig,

    /// `[ingress]` unmarshalling, batching, buffering
    pub ingress: IngressConfig,

    /// `[sinks.*]` per-kind delivery settings
    pub sinks: SinksConfig,
}

impl Config {
    /// Read and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        fs::read_to_string(path)
            .map_err(|source| ConfigError::IoError {
                path: path.display().to_string(),
                source,
            })?
            .parse()
    }

    fn check(&self) -> Result<()> {
        if self.metrics.enabled && self.metrics.interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "metrics",
                "interval",
                "must be greater than 0",
            ));
        }
        self.ingress.validate()?;
        self.sinks.validate()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    /// Parse and validate a TOML document
    fn from_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }
}
