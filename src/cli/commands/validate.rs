//! Validate config command implementation
//!
//! Loads the effective configuration the same way `export` does and prints a
//! redacted summary. Nothing is sent over the network.

use crate::config::{resolve_config, ConfigOverrides, ExporterConfig, TOKEN_ENV_VAR};
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub fn execute(&self, config_path: Option<&Path>, overrides: &ConfigOverrides) -> i32 {
        match config_path {
            Some(path) => println!("🔍 Validating configuration file: {}", path.display()),
            None => println!("🔍 Validating configuration (no file, defaults and overrides)"),
        }
        println!();

        let config = match resolve_config(config_path, overrides) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return 2;
            }
        };

        println!();
        println!("{}", summary(&config));

        if config.token.is_none() {
            println!("❌ API token missing: set {TOKEN_ENV_VAR}");
            return 2;
        }
        0
    }
}

/// Human-readable summary with the token redacted
fn summary(config: &ExporterConfig) -> String {
    let interval = match config.api.interval() {
        Ok(Some(d)) => format!("{d:?}"),
        _ => "none (single run)".to_string(),
    };
    let token = if config.token.is_some() {
        "[REDACTED]"
    } else {
        "missing"
    };
    let log_output = config
        .logging
        .output_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());

    [
        "Configuration Summary:".to_string(),
        format!("  Entrypoint: {}", config.api.entrypoint),
        format!("  Resource: {}", config.api.resource),
        format!("  Rate Limit: {}/min", config.api.rate),
        format!("  Interval: {interval}"),
        format!("  Request Timeout: {}s", config.api.request_timeout_secs),
        format!("  Allow Loopback: {}", config.api.allow_loopback),
        format!("  Data Directory: {}", config.storage.data_dir.display()),
        format!("  Shutdown Timeout: {}s", config.export.shutdown_timeout_secs),
        format!(
            "  Logging: level={} format={} output={log_output}",
            config.logging.level, config.logging.format
        ),
        format!("  API Token: {token}"),
    ]
    .join("\n")
}
