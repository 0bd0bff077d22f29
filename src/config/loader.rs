//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. the TOML file, after `${VAR}` substitution
//! 3. `EXPORTER_<SECTION>_<KEY>` environment variables
//! 4. command-line flags ([`ConfigOverrides`])
//!
//! The API token is never read from the file; it comes from `ASANA_API_TOKEN`.

use super::schema::{ExporterConfig, LogFormat, TOKEN_ENV_VAR};
use crate::domain::{ExporterError, Result};
use regex::Regex;
use secrecy::SecretString;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub entrypoint: Option<String>,
    pub resource: Option<String>,
    pub rate: Option<u32>,
    pub interval: Option<String>,
    pub data_dir: Option<PathBuf>,
    /// Forces the `debug` log level
    pub debug: bool,
    pub log_format: Option<LogFormat>,
    pub log_output: Option<String>,
}

impl ConfigOverrides {
    /// Applies every set value to `config`
    pub fn apply(&self, config: &mut ExporterConfig) {
        if let Some(entrypoint) = &self.entrypoint {
            config.api.entrypoint = entrypoint.clone();
        }
        if let Some(resource) = &self.resource {
            config.api.resource = resource.clone();
        }
        if let Some(rate) = self.rate {
            config.api.rate = rate;
        }
        if let Some(interval) = &self.interval {
            config.api.interval = Some(interval.clone());
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if self.debug {
            config.logging.level = "debug".to_string();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
    }
}

/// Loads and validates configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into [`ExporterConfig`]
/// 4. Applies environment variable overrides (EXPORTER_* prefix)
/// 5. Validates the configuration
///
/// The token is left unset.
///
/// # Errors
///
/// Returns [`ExporterError::Configuration`] if any step fails.
///
/// # Examples
///
/// ```no_run
/// use resource_exporter::config::loader::load_config;
///
/// let config = load_config("exporter.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let mut config = read_config_file(path.as_ref())?;
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Builds the effective configuration for a command
///
/// Uses defaults when `path` is `None`, then applies environment and CLI overrides
/// and reads the token from the environment. A missing token is not an error here;
/// commands that need it check [`ExporterConfig::token`].
///
/// # Errors
///
/// Returns [`ExporterError::Configuration`] if loading or validation fails.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<ExporterConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ExporterConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    overrides.apply(&mut config);
    config.token = load_token();

    validate(&config)?;
    Ok(config)
}

/// Reads the API token from `ASANA_API_TOKEN`; empty counts as missing
pub fn load_token() -> Option<SecretString> {
    std::env::var(TOKEN_ENV_VAR)
        .ok()
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::new)
}

fn validate(config: &ExporterConfig) -> Result<()> {
    config.validate().map_err(|e| {
        ExporterError::Configuration(format!("Configuration validation failed: {e}"))
    })
}

fn read_config_file(path: &Path) -> Result<ExporterConfig> {
    if !path.exists() {
        return Err(ExporterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExporterError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    toml::from_str(&contents)
        .map_err(|e| ExporterError::Configuration(format!("Failed to parse TOML: {e}")))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExporterError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExporterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ExporterError::Configuration(format!("Invalid value for {name}: '{value}'"))
    })
}

/// Applies environment variable overrides using the EXPORTER_* prefix
///
/// Environment variables follow the pattern: EXPORTER_<SECTION>_<KEY>
/// For example: EXPORTER_API_RATE, EXPORTER_STORAGE_DATA_DIR
fn apply_env_overrides(config: &mut ExporterConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    // API overrides
    if let Some(val) = var("EXPORTER_API_ENTRYPOINT") {
        config.api.entrypoint = val;
    }
    if let Some(val) = var("EXPORTER_API_RESOURCE") {
        config.api.resource = val;
    }
    if let Some(val) = var("EXPORTER_API_RATE") {
        config.api.rate = parse_env("EXPORTER_API_RATE", &val)?;
    }
    if let Some(val) = var("EXPORTER_API_INTERVAL") {
        config.api.interval = Some(val);
    }
    if let Some(val) = var("EXPORTER_API_REQUEST_TIMEOUT_SECS") {
        config.api.request_timeout_secs = parse_env("EXPORTER_API_REQUEST_TIMEOUT_SECS", &val)?;
    }
    if let Some(val) = var("EXPORTER_API_ALLOW_LOOPBACK") {
        config.api.allow_loopback = parse_env("EXPORTER_API_ALLOW_LOOPBACK", &val)?;
    }

    // Storage overrides
    if let Some(val) = var("EXPORTER_STORAGE_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(val);
    }

    // Export overrides
    if let Some(val) = var("EXPORTER_EXPORT_SHUTDOWN_TIMEOUT_SECS") {
        config.export.shutdown_timeout_secs =
            parse_env("EXPORTER_EXPORT_SHUTDOWN_TIMEOUT_SECS", &val)?;
    }

    // Logging overrides
    if let Some(val) = var("EXPORTER_LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = var("EXPORTER_LOGGING_FORMAT") {
        config.logging.format = val
            .parse()
            .map_err(|e| ExporterError::Configuration(format!("EXPORTER_LOGGING_FORMAT: {e}")))?;
    }
    if let Some(val) = var("EXPORTER_LOGGING_OUTPUT") {
        config.logging.output = val;
    }

    Ok(())
}
