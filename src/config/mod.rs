//! Configuration management.
//!
//! TOML-based configuration with environment and command-line overrides.
//!
//! # Overview
//!
//! Supports:
//! - Environment variable substitution (`${VAR_NAME}`) inside the file
//! - `EXPORTER_<SECTION>_<KEY>` environment overrides
//! - Command-line overrides through [`ConfigOverrides`]
//! - Defaults for every setting except the resource type
//!
//! The bearer token is read from `ASANA_API_TOKEN` only and kept as a
//! [`secrecy::SecretString`].
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! entrypoint = "https://app.asana.com/api/1.0"
//! resource = "project"
//! rate = 150
//! interval = "10m"
//!
//! [storage]
//! data_dir = "${EXPORT_ROOT}/asana"
//!
//! [export]
//! shutdown_timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! format = "json"
//! output = "exporter.log"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use resource_exporter::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("exporter.toml")?;
//! println!("Exporting {} from {}", config.api.resource, config.api.entrypoint);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_token, resolve_config, ConfigOverrides};
pub use schema::{
    ApiConfig, ExportConfig, ExporterConfig, LogFormat, LoggingConfig, StorageConfig,
    TOKEN_ENV_VAR,
};
