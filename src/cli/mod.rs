//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use crate::config::{ConfigOverrides, LogFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Resource Exporter - rate-limited REST API to JSON file exporter
#[derive(Parser, Debug)]
#[command(name = "resource-exporter")]
#[command(version, about, long_about = None)]
#[command(author = "Resource Exporter Contributors")]
pub struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "EXPORTER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// API entrypoint, e.g. https://app.asana.com/api/1.0
    #[arg(long, global = true)]
    pub entrypoint: Option<String>,

    /// Resource type to export, e.g. project, user
    #[arg(long, global = true)]
    pub resource: Option<String>,

    /// Request rate limit per minute
    #[arg(long, global = true)]
    pub rate: Option<u32>,

    /// Interval between exports, e.g. 10s, 1m; runs once when unset
    #[arg(long, global = true)]
    pub interval: Option<String>,

    /// Directory where exported resources are stored
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable debug log messages
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log message format (text or json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// File to append log messages to; stdout when unset
    #[arg(long, global = true)]
    pub log_output: Option<String>,
}

impl SettingsArgs {
    /// Converts the flags into configuration overrides
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            entrypoint: self.entrypoint.clone(),
            resource: self.resource.clone(),
            rate: self.rate,
            interval: self.interval.clone(),
            data_dir: self.data_dir.clone(),
            debug: self.debug,
            log_format: self.log_format,
            log_output: self.log_output.clone(),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export resources once or on an interval
    Export(commands::export::ExportArgs),

    /// Validate configuration without contacting the API
    ValidateConfig(commands::validate::ValidateArgs),
}
