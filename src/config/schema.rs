//! Configuration schema types
//!
//! Maps the TOML file onto typed sections. Every section has defaults, so an empty
//! file (or no file at all) yields a configuration that only lacks the resource
//! type and the API token.

use crate::adapters::api::{validate_endpoint, EndpointPolicy, DEFAULT_REQUEST_TIMEOUT};
use crate::domain::SignedDuration;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the API bearer token
pub const TOKEN_ENV_VAR: &str = "ASANA_API_TOKEN";

/// Shortest accepted export interval
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unsupported log format: {other}")),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExporterConfig {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Output location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Run behaviour
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bearer token, only ever read from the environment
    #[serde(skip)]
    pub token: Option<SecretString>,
}

impl ExporterConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.api.validate()?;
        self.storage.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Endpoint rules derived from the API section
    pub fn endpoint_policy(&self) -> EndpointPolicy {
        EndpointPolicy {
            allow_loopback: self.api.allow_loopback,
            ..EndpointPolicy::default()
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,

    /// Resource type to export, e.g. `project` or `user`
    #[serde(default)]
    pub resource: String,

    /// Request budget per minute
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// Period between export cycles (`10s`, `1m`); empty runs once
    #[serde(default)]
    pub interval: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Accept loopback hosts such as a local mock server
    #[serde(default)]
    pub allow_loopback: bool,
}

impl ApiConfig {
    fn validate(&self) -> Result<(), String> {
        if self.entrypoint.trim().is_empty() {
            return Err("api.entrypoint not provided".to_string());
        }

        let policy = EndpointPolicy {
            allow_loopback: self.allow_loopback,
            ..EndpointPolicy::default()
        };
        validate_endpoint(&self.entrypoint, policy)
            .map_err(|e| format!("api.entrypoint: {e}"))?;

        validate_resource_type(&self.resource)?;

        if self.rate < 1 {
            return Err("api.rate limit must be positive".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("api.request_timeout_secs must be > 0".to_string());
        }

        self.interval()?;
        Ok(())
    }

    /// The parsed export interval, `None` for a single run
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be parsed, is negative, or is shorter
    /// than [`MIN_INTERVAL`].
    pub fn interval(&self) -> Result<Option<Duration>, String> {
        let raw = match self.interval.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };

        let parsed: SignedDuration = raw
            .parse()
            .map_err(|e| format!("api.interval '{raw}': {e}"))?;
        if parsed.negative {
            return Err(format!("api.interval '{raw}' must not be negative"));
        }
        if parsed.magnitude < MIN_INTERVAL {
            return Err(format!(
                "api.interval '{raw}' must be at least {}s",
                MIN_INTERVAL.as_secs()
            ));
        }
        Ok(Some(parsed.magnitude))
    }

    /// The per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            entrypoint: default_entrypoint(),
            resource: String::new(),
            rate: default_rate(),
            interval: None,
            request_timeout_secs: default_request_timeout_secs(),
            allow_loopback: false,
        }
    }
}

/// Resource types become a directory name and a filename prefix
fn validate_resource_type(resource: &str) -> Result<(), String> {
    if resource.is_empty() {
        return Err("api.resource type not provided".to_string());
    }
    if resource == "." || resource == ".." {
        return Err(format!("api.resource '{resource}' is not a valid resource type"));
    }
    if resource
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control() || c.is_whitespace())
    {
        return Err(format!(
            "api.resource '{resource}' must not contain separators or whitespace"
        ));
    }
    Ok(())
}

/// Output storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for exported files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("storage.data_dir must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Graceful shutdown timeout in seconds (default: 30)
    /// Maximum time to wait for in-flight cycles once the run stops.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.shutdown_timeout_secs == 0 {
            return Err("export.shutdown_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Log file path; empty writes to stdout
    #[serde(default)]
    pub output: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(format!(
                "Invalid logging.level '{}'. Must be one of: {}",
                self.level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }

    /// The log file, if any
    pub fn output_path(&self) -> Option<PathBuf> {
        let output = self.output.trim();
        (!output.is_empty()).then(|| PathBuf::from(output))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: String::new(),
        }
    }
}

// Default value functions
fn default_entrypoint() -> String {
    "https://app.asana.com/api/1.0".to_string()
}

fn default_rate() -> u32 {
    150
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn valid_config() -> ExporterConfig {
        let mut config = ExporterConfig::default();
        config.api.resource = "project".to_string();
        config
    }

    #[test]
    fn test_default_values() {
        let config = ExporterConfig::default();
        assert_eq!(config.api.entrypoint, "https://app.asana.com/api/1.0");
        assert_eq!(config.api.rate, 150);
        assert_eq!(config.api.interval, None);
        assert_eq!(config.api.request_timeout(), Duration::from_secs(30));
        assert!(!config.api.allow_loopback);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.export.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.logging.output_path(), None);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_resource_required() {
        let err = ExporterConfig::default().validate().unwrap_err();
        assert!(err.contains("resource type not provided"));
    }

    #[test_case("../etc" ; "parent traversal")]
    #[test_case("a/b" ; "slash")]
    #[test_case("a\\b" ; "backslash")]
    #[test_case(".." ; "dot dot")]
    #[test_case("my project" ; "whitespace")]
    fn test_invalid_resource_types(resource: &str) {
        let mut config = valid_config();
        config.api.resource = resource.to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_must_be_positive() {
        let mut config = valid_config();
        config.api.rate = 0;
        assert!(config.validate().unwrap_err().contains("rate"));
    }

    #[test_case("" ; "empty")]
    #[test_case("ftp://example.com" ; "unsupported scheme")]
    #[test_case("https://localhost/api" ; "loopback")]
    fn test_invalid_entrypoints(entrypoint: &str) {
        let mut config = valid_config();
        config.api.entrypoint = entrypoint.to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_loopback_entrypoint_opt_in() {
        let mut config = valid_config();
        config.api.entrypoint = "http://127.0.0.1:8080/api".to_string();
        config.api.allow_loopback = true;
        assert!(config.validate().is_ok());
        assert!(config.endpoint_policy().allow_loopback);
    }

    #[test_case(None, Ok(None) ; "unset")]
    #[test_case(Some(""), Ok(None) ; "empty")]
    #[test_case(Some("10s"), Ok(Some(Duration::from_secs(10))) ; "seconds")]
    #[test_case(Some("1m30s"), Ok(Some(Duration::from_secs(90))) ; "compound")]
    #[test_case(Some("1s"), Ok(Some(Duration::from_secs(1))) ; "minimum")]
    fn test_interval_parsing(raw: Option<&str>, expected: Result<Option<Duration>, ()>) {
        let api = ApiConfig {
            interval: raw.map(str::to_string),
            ..ApiConfig::default()
        };
        assert_eq!(api.interval().map_err(|_| ()), expected);
    }

    #[test_case("500ms" ; "below minimum")]
    #[test_case("0" ; "zero")]
    #[test_case("0s" ; "zero with unit")]
    #[test_case("-5s" ; "negative")]
    #[test_case("often" ; "garbage")]
    #[test_case("10" ; "missing unit")]
    fn test_invalid_intervals(raw: &str) {
        let mut config = valid_config();
        config.api.interval = Some(raw.to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_level_validation() {
        let mut config = valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("logging.level"));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_deserialize_sections() {
        let config: ExporterConfig = toml::from_str(
            r#"
[api]
resource = "user"
rate = 60
interval = "5m"

[storage]
data_dir = "/var/lib/exporter"

[logging]
format = "json"
output = "exporter.log"
"#,
        )
        .unwrap();

        assert_eq!(config.api.resource, "user");
        assert_eq!(config.api.rate, 60);
        assert_eq!(config.api.interval().unwrap(), Some(Duration::from_secs(300)));
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/exporter"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.output_path(), Some(PathBuf::from("exporter.log")));
        assert_eq!(config.export.shutdown_timeout_secs, 30);
    }
}
