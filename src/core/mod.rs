//! Core export logic.
//!
//! # Modules
//!
//! - [`export`] - one export cycle: fetch, rate-limit backoff, decode, persist
//! - [`run`] - one-shot and interval runs, drain on shutdown
//! - [`shutdown`] - the process-wide cancellation signal
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use resource_exporter::adapters::api::{ApiClient, ApiClientOptions, ResourceApi};
//! use resource_exporter::adapters::filesystem::ResourceWriter;
//! use resource_exporter::core::export::ExportPipeline;
//! use resource_exporter::core::run::{RunOptions, RunOrchestrator};
//! use resource_exporter::core::shutdown::ShutdownSignal;
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let token = SecretString::new("0/abcdef".to_string());
//! let api: Arc<dyn ResourceApi> = Arc::new(ApiClient::new(token, ApiClientOptions::default())?);
//! let pipeline = ExportPipeline::new(
//!     api.clone(),
//!     ResourceWriter::new("data"),
//!     "https://app.asana.com/api/1.0",
//!     "project",
//! );
//!
//! let (_trigger, signal) = ShutdownSignal::new();
//! let summary = RunOrchestrator::new(pipeline, api, RunOptions::default())
//!     .run(signal)
//!     .await?;
//!
//! println!("Files written: {}", summary.files_written);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod run;
pub mod shutdown;
