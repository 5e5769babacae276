//! Configuration error types

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value parsed but is out of range, e.g. `[sinks.dump] capacity = 0`
    #[error("{section} has invalid {field}: {message}")]
    InvalidValue {
        section: &'static str,
        field: &'static str,
        message: String,
    },

    /// Bad filter directive, or a global subscriber already installed
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ConfigError {
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("sinks.dump", "capacity", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "sinks.dump has invalid capacity: must be greater than 0"
        );
    }

    #[test]
    fn test_io_error_names_path() {
        let err = ConfigError::IoError {
            path: "/etc/courier.toml".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/etc/courier.toml"));
    }

    #[test]
    fn test_logging_error() {
        let err = ConfigError::logging("already set");
        assert_eq!(
            err.to_string(),
            "failed to initialise logging: already set"
        );
    }
}
