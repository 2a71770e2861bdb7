//! Error types for the Karibu library
//!
//! This module provides comprehensive error types using thiserror for all Karibu operations.

use thiserror::Error;

/// Main error type for Karibu library operations
///
/// Sink and live-data failures are contained where they occur (logged and
/// degraded, never propagated), so the engine itself only errors on
/// misconfiguration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors from lead and transcript sinks
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SinkError {
    /// Endpoint could not be reached
    #[error("Sink connection failed: {0}")]
    Connection(String),

    /// Endpoint answered with a non-success status
    #[error("Sink rejected payload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Internal sink error
    #[error("Internal sink error: {0}")]
    Internal(String),
}

/// Errors from live data providers
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LiveDataError {
    /// Upstream request failed
    #[error("Live data request failed: {0}")]
    Request(String),

    /// Upstream answered with an unusable body
    #[error("Live data response malformed: {0}")]
    MalformedResponse(String),

    /// Requested subject is not covered by the provider
    #[error("Live data subject not covered: {0}")]
    NotCovered(String),

    /// Internal provider error
    #[error("Internal live data error: {0}")]
    Internal(String),
}

/// Type alias for Karibu library Result
pub type Result<T> = std::result::Result<T, EngineError>;

/// Type alias for sink Result
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Type alias for live data Result
pub type LiveDataResult<T> = std::result::Result<T, LiveDataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::Configuration("lead sink is required".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("lead sink is required"));
    }

    #[test]
    fn test_sink_error_rejected_display() {
        let err = SinkError::Rejected {
            status: 422,
            body: "missing consent".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("422"));
        assert!(display.contains("missing consent"));
    }

    #[test]
    fn test_live_data_error_display() {
        let err = LiveDataError::NotCovered("mars".to_string());
        let display = format!("{}", err);
        assert!(display.contains("not covered"));
        assert!(display.contains("mars"));
    }

    #[test]
    fn test_result_type_aliases() {
        fn returns_result() -> Result<()> {
            Ok(())
        }

        fn returns_sink_result() -> SinkResult<()> {
            Ok(())
        }

        fn returns_live_data_result() -> LiveDataResult<()> {
            Ok(())
        }

        assert!(returns_result().is_ok());
        assert!(returns_sink_result().is_ok());
        assert!(returns_live_data_result().is_ok());
    }
}
