//! `[log]` section and global subscriber installation
//!
//! ```toml
//! [log]
//! level = "info"
//! directives = "courier_sinks=debug"   # optional per-crate overrides
//! format = "json"
//! output = "/var/log/courier.log"
//! ```

use std::fs::OpenOptions;
use std::sync::Mutex;

use serde::Deserialize;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::{ConfigError, Result};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-envelope routing decisions
    Trace,
    /// Sink lifecycle and dropped frames
    Debug,
    #[default]
    Info,
    /// Backpressure and unhealthy sinks
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// Where log lines go: `stdout`, `stderr` or a file path appended to
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    #[serde(untagged)]
    File(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base level for every target
    pub level: LogLevel,

    /// Extra `EnvFilter` directives, comma separated, applied after `level`
    pub directives: Option<String>,

    pub format: LogFormat,

    pub output: LogOutput,
}

impl LogConfig {
    /// `EnvFilter` built from `level` plus `directives`
    pub fn filter(&self) -> Result<EnvFilter> {
        let spec = match self.directives.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{},{extra}", self.level.as_str()),
            _ => self.level.as_str().to_string(),
        };
        EnvFilter::try_new(&spec)
            .map_err(|e| ConfigError::logging(format!("invalid filter '{spec}': {e}")))
    }

    fn writer(&self) -> Result<BoxMakeWriter> {
        Ok(match &self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| ConfigError::IoError {
                        path: path.clone(),
                        source,
                    })?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        })
    }
}

/// Install the global tracing subscriber
///
/// Fails if the filter does not parse, the log file cannot be opened, or a
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = config.filter()?;
    let writer = config.writer()?;

    let layer = match config.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_ansi(!matches!(config.output, LogOutput::File(_)))
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| ConfigError::logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_section() {
        let config: LogConfig = toml::from_str("").unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.output, LogOutput::Stdout);
        assert!(config.directives.is_none());
    }

    #[test]
    fn test_json_to_stderr() {
        let config: LogConfig = toml::from_str(
            r#"
level = "warn"
format = "json"
output = "stderr"
"#,
        )
        .unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stderr);
    }

    #[test]
    fn test_any_other_output_is_a_file() {
        let config: LogConfig = toml::from_str("output = \"/var/log/courier.log\"").unwrap();
        assert_eq!(config.output, LogOutput::File("/var/log/courier.log".into()));
    }

    #[test]
    fn test_level_names() {
        for name in ["trace", "debug", "info", "warn", "error"] {
            let config: LogConfig = toml::from_str(&format!("level = \"{name}\"")).unwrap();
            assert_eq!(config.level.as_str(), name);
            assert!(config.filter().is_ok());
        }
    }

    #[test]
    fn test_directives_extend_level() {
        let config = LogConfig {
            level: LogLevel::Warn,
            directives: Some("courier_pipeline=trace,courier_sinks=debug".into()),
            ..Default::default()
        };
        let filter = config.filter().unwrap().to_string();
        assert!(filter.contains("warn"));
        assert!(filter.contains("courier_pipeline=trace"));
    }

    #[test]
    fn test_blank_directives_ignored() {
        let config = LogConfig {
            directives: Some("  ".into()),
            ..Default::default()
        };
        let filter = config.filter().unwrap().to_string();
        assert!(!filter.contains(','));
    }

    #[test]
    fn test_bad_directive_rejected() {
        let config = LogConfig {
            directives: Some("courier_sinks=loud".into()),
            ..Default::default()
        };
        assert!(matches!(config.filter(), Err(ConfigError::Logging(_))));
    }

    #[test]
    fn test_unwritable_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("courier.log");
        let config = LogConfig {
            output: LogOutput::File(path.display().to_string()),
            ..Default::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(ConfigError::IoError { .. })
        ));
    }
}
