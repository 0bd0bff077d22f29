// Resource Exporter - rate-limited REST API to JSON file exporter
// Copyright (c) 2025 Resource Exporter Contributors
// Licensed under the MIT License

//! # Resource Exporter
//!
//! Polls a REST API for one resource collection under a client-side rate limit and
//! writes every resource to its own timestamped JSON file.
//!
//! ## Overview
//!
//! This library provides:
//! - **Fetching** `{entrypoint}/{resource_type}s` with bearer authentication, a token
//!   bucket rate limiter and `Retry-After` aware backoff on HTTP 429
//! - **Decoding** the `{"data": [...]}` envelope into [`domain::Resource`] values
//! - **Persisting** each resource as `{type}_{name}_{YYYYMMDDHHMMSS}.json` confined
//!   to a data root
//! - **Running** once or on an interval with graceful shutdown
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export pipeline, run orchestration, shutdown signal
//! - [`adapters`] - HTTP API client and filesystem writer
//! - [`domain`] - Resource model, errors, duration expressions
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resource_exporter::cli::commands::export::build_orchestrator;
//! use resource_exporter::config::{resolve_config, ConfigOverrides};
//! use resource_exporter::core::shutdown::ShutdownSignal;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let overrides = ConfigOverrides {
//!         resource: Some("project".to_string()),
//!         ..ConfigOverrides::default()
//!     };
//!     let config = resolve_config(None, &overrides)?;
//!
//!     let (_trigger, signal) = ShutdownSignal::new();
//!     let summary = build_orchestrator(&config)?.run(signal).await?;
//!
//!     println!("Exported {} resources", summary.files_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every layer returns [`domain::ExporterError`]. Outer layers add context without
//! changing the kind, so callers can still match on the root cause:
//!
//! ```rust
//! use resource_exporter::domain::ExporterError;
//!
//! let err = ExporterError::Cancelled.with_context("fetch data");
//! assert!(err.is_cancelled());
//! ```
//!
//! ## Logging
//!
//! Structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(resource_type = "project", "Starting export");
//! warn!(retry_after = ?std::time::Duration::from_secs(5), "too many requests");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
