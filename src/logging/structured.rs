//! Structured logging setup using tracing

use crate::config::{LogFormat, LoggingConfig};
use crate::domain::{ExporterError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Permissions for a newly created log file
#[cfg(unix)]
const LOG_FILE_MODE: u32 = 0o644;

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _writer_guard: WorkerGuard,
}

/// Initialize the logging system based on configuration
///
/// # Errors
///
/// Returns a configuration error if the level is invalid, the log file cannot be
/// opened, or a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use resource_exporter::config::LoggingConfig;
/// use resource_exporter::logging::init_logging;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging(&config).expect("Failed to initialize logging");
/// // Keep _guard alive for the duration of the program
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_level = parse_log_level(&config.level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let output = config.output_path();
    let (writer, guard) = match &output {
        Some(path) => tracing_appender::non_blocking(open_log_file(path)?),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(output.is_none())
            .with_writer(writer)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| ExporterError::Configuration(format!("Failed to install logger: {e}")))?;

    tracing::debug!(
        level = %config.level,
        format = %config.format,
        output = %output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string()),
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _writer_guard: guard,
    })
}

/// Filter used when `RUST_LOG` is not set
fn default_directive(level: Level) -> String {
    format!("resource_exporter={level}")
}

/// Opens `path` for appending, creating it if needed
fn open_log_file(path: &Path) -> Result<std::fs::File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(LOG_FILE_MODE);
    }

    options.open(path).map_err(|e| {
        ExporterError::Configuration(format!(
            "Failed to open log output {}: {e}",
            path.display()
        ))
    })
}

/// Parse log level from string
///
/// # Errors
///
/// Returns a configuration error for unknown levels
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(ExporterError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_log_level_valid() {
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("error").unwrap(), Level::ERROR);
    }

    #[test]
    fn test_parse_log_level_case_insensitive() {
        assert_eq!(parse_log_level("TRACE").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("Debug").unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_parse_log_level_invalid() {
        assert!(parse_log_level("invalid").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_default_directive_targets_crate() {
        assert_eq!(default_directive(Level::DEBUG), "resource_exporter=DEBUG");
        assert!(EnvFilter::try_new(default_directive(Level::INFO)).is_ok());
    }

    #[test]
    fn test_open_log_file_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("exporter.log");
        std::fs::write(&path, "first\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            file.write_all(b"second\n").unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = open_log_file(&temp.path().join("missing").join("exporter.log")).unwrap_err();
        assert!(matches!(err, ExporterError::Configuration(_)));
    }
}
