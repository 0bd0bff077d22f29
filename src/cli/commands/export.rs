//! Export command implementation
//!
//! Wires the configured client, writer, pipeline and orchestrator together and maps
//! the run outcome to an exit code.

use crate::adapters::api::{ApiClient, ApiClientOptions, ResourceApi};
use crate::adapters::filesystem::ResourceWriter;
use crate::config::ExporterConfig;
use crate::core::export::ExportPipeline;
use crate::core::run::{RunOptions, RunOrchestrator};
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{ExporterError, Result};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Seconds to wait for running exports after a shutdown signal
    #[arg(long, value_name = "SECS")]
    pub shutdown_timeout_secs: Option<u64>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        mut config: ExporterConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        if let Some(secs) = self.shutdown_timeout_secs {
            tracing::info!(timeout_secs = secs, "Overriding shutdown timeout from CLI");
            config.export.shutdown_timeout_secs = secs;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let orchestrator = match build_orchestrator(&config) {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize export");
                eprintln!("Failed to initialize export: {e}");
                return Ok(2);
            }
        };

        tracing::info!(
            entrypoint = %config.api.entrypoint,
            resource_type = %config.api.resource,
            rate = config.api.rate,
            data_dir = %config.storage.data_dir.display(),
            "Starting export"
        );

        match orchestrator
            .run(ShutdownSignal::from_receiver(shutdown_signal))
            .await
        {
            Ok(summary) => {
                tracing::info!(
                    cycles_started = summary.cycles_started,
                    cycles_completed = summary.cycles_completed,
                    files_written = summary.files_written,
                    interrupted = summary.interrupted,
                    duration_ms = summary.duration.as_millis() as u64,
                    "Export summary"
                );
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                Ok(1)
            }
        }
    }
}

/// Builds the orchestrator described by `config`
///
/// # Errors
///
/// Returns [`ExporterError::Configuration`] when the token is missing, the interval
/// is invalid, or the HTTP client cannot be created.
pub fn build_orchestrator(config: &ExporterConfig) -> Result<RunOrchestrator> {
    let token = config.token.clone().ok_or_else(|| {
        ExporterError::Configuration(format!(
            "token not present: set {}",
            crate::config::TOKEN_ENV_VAR
        ))
    })?;

    let interval = config
        .api
        .interval()
        .map_err(ExporterError::Configuration)?;

    let client = ApiClient::new(
        token,
        ApiClientOptions {
            requests_per_minute: config.api.rate,
            request_timeout: config.api.request_timeout(),
            endpoint_policy: config.endpoint_policy(),
        },
    )?;
    let api: Arc<dyn ResourceApi> = Arc::new(client);

    let pipeline = ExportPipeline::new(
        Arc::clone(&api),
        ResourceWriter::new(&config.storage.data_dir),
        config.api.entrypoint.clone(),
        config.api.resource.clone(),
    );

    Ok(RunOrchestrator::new(
        pipeline,
        api,
        RunOptions {
            interval,
            drain_timeout: config.export.shutdown_timeout(),
        },
    ))
}
