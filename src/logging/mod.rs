//! Logging
//!
//! Structured logging through `tracing`:
//! - text or JSON formatted events
//! - level from configuration, overridable with `RUST_LOG`
//! - stdout or an append-only log file, written off the hot path
//!
//! # Example
//!
//! ```no_run
//! use resource_exporter::config::LoggingConfig;
//! use resource_exporter::logging::init_logging;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging(&config).expect("Failed to initialize logging");
//!
//! tracing::info!(resource_type = "project", "Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};
