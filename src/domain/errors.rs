//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Every layer returns
//! [`ExporterError`]; callers add context with [`ExporterError::with_context`]
//! without changing the kind of the underlying failure.

use std::path::PathBuf;
use thiserror::Error;

/// Main exporter error type
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Missing or invalid settings, fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Target URL rejected before any network activity
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Cancellation fired while waiting for a rate limiter token
    #[error("Rate limit wait: cancelled while waiting for a request slot")]
    RateLimitWait,

    /// The shared shutdown signal fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The per-request timeout elapsed
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Response payload is not the expected JSON document
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Output path resolves outside the configured data root
    #[error("Path traversal: {} resolves outside {}", path.display(), root.display())]
    PathTraversal { path: PathBuf, root: PathBuf },

    /// Path exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Filesystem failure with the operation that caused it
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// An error annotated by an outer layer
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ExporterError>,
    },

    /// Errors collected across export cycles
    #[error("encountered {count} errors during export, first error: {first}")]
    Aggregate {
        count: usize,
        first: Box<ExporterError>,
    },
}

impl ExporterError {
    /// Wraps the error with a description of the failed operation
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ExporterError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Builds an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ExporterError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the innermost error, looking through context layers
    pub fn root(&self) -> &ExporterError {
        match self {
            ExporterError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error represents cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), ExporterError::Cancelled)
    }
}

impl From<reqwest::Error> for ExporterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExporterError::Timeout(err.to_string())
        } else {
            ExporterError::Connection(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ExporterError {
    fn from(err: toml::de::Error) -> Self {
        ExporterError::Configuration(format!("TOML parse error: {err}"))
    }
}

/// Convenience for annotating results
pub trait ResultExt<T> {
    /// Adds context to the error variant
    fn context(self, context: impl Into<String>) -> Result<T, ExporterError>;
}

impl<T> ResultExt<T> for Result<T, ExporterError> {
    fn context(self, context: impl Into<String>) -> Result<T, ExporterError> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_error_display() {
        let err = ExporterError::Configuration("rate limit must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: rate limit must be positive"
        );
    }

    #[test]
    fn test_context_preserves_kind() {
        let err = ExporterError::NotADirectory(PathBuf::from("/tmp/file"))
            .with_context("resource directory")
            .with_context("export");

        assert!(matches!(err.root(), ExporterError::NotADirectory(_)));
        assert!(err.to_string().starts_with("export: resource directory: "));
    }

    #[test]
    fn test_is_cancelled_through_context() {
        let err = ExporterError::Cancelled.with_context("fetch data");
        assert!(err.is_cancelled());
        assert!(!ExporterError::RateLimitWait.is_cancelled());
    }

    #[test]
    fn test_aggregate_message() {
        let err = ExporterError::Aggregate {
            count: 3,
            first: Box::new(ExporterError::Timeout("30s".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "encountered 3 errors during export, first error: Request timeout: 30s"
        );
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ExporterError = json_err.into();
        assert!(matches!(err, ExporterError::Decode(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ExporterError = toml_err.into();
        assert!(matches!(err, ExporterError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<(), ExporterError> = Err(ExporterError::RateLimitWait);
        let err = result.context("make request").unwrap_err();
        assert!(matches!(err.root(), ExporterError::RateLimitWait));
    }
}
