//! Pipeline error types
//!
//! Registration errors for the sink manager. Routing itself never fails: a
//! sink that cannot take an envelope reports a dropped delivery.

use thiserror::Error;

use courier_sinks::SinkKind;

use crate::Scope;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Only live streaming sinks may consume the firehose
    #[error("{0} sinks cannot be registered on the firehose")]
    FirehoseUnsupported(SinkKind),

    /// Sink serves a different application than the scope it was registered under
    #[error("sink {sink} does not belong to scope {scope}")]
    ScopeMismatch { sink: String, scope: Scope },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::FirehoseUnsupported(SinkKind::Dump);
        assert_eq!(err.to_string(), "Dump sinks cannot be registered on the firehose");

        let err = PipelineError::ScopeMismatch {
            sink: "ws-1".into(),
            scope: Scope::app("app-2"),
        };
        assert_eq!(err.to_string(), "sink ws-1 does not belong to scope app:app-2");
    }
}
