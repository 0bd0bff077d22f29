//! Export pipeline - one fetch, decode and persist cycle
//!
//! A cycle moves through explicit states:
//!
//! ```text
//! Idle -> Fetching -> (RateLimited -> Fetching)* -> Decoding -> EnsuringDir
//!      -> Writing(0..n) -> Done | Cancelled | Failed
//! ```
//!
//! The shutdown signal is checked before the first request, while waiting for the
//! rate limiter, during every backoff and before each file write. Files written
//! before cancellation stay on disk.

use super::retry::{decide, wait_backoff, RetryDecision};
use crate::adapters::api::ResourceApi;
use crate::adapters::filesystem::ResourceWriter;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{decode_resources, ExporterError, Resource, Result, ResultExt};
use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pipeline states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Request in flight (attempt number starting at 1)
    Fetching { attempt: u32 },
    /// Throttled by the server, waiting before the next attempt
    RateLimited { wait: Duration },
    /// Parsing the payload
    Decoding,
    /// Creating the resource directory
    EnsuringDir,
    /// Persisting resource `index` of `total`
    Writing { index: usize, total: usize },
    /// All resources written
    Done,
    /// Stopped by the shutdown signal
    Cancelled,
    /// Stopped by an error
    Failed,
}

impl PipelineState {
    /// Whether no further transitions follow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Cancelled | PipelineState::Failed
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Fetching { attempt } => write!(f, "fetching (attempt {attempt})"),
            PipelineState::RateLimited { wait } => write!(f, "rate limited ({wait:?})"),
            PipelineState::Decoding => write!(f, "decoding"),
            PipelineState::EnsuringDir => write!(f, "ensuring directory"),
            PipelineState::Writing { index, total } => write!(f, "writing {}/{total}", index + 1),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Cancelled => write!(f, "cancelled"),
            PipelineState::Failed => write!(f, "failed"),
        }
    }
}

/// Receives every state transition of a cycle
pub trait PipelineObserver: Send + Sync {
    /// Called synchronously on each transition
    fn on_transition(&self, state: &PipelineState);
}

/// Outcome of a successful cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Exported resource type
    pub resource_type: String,

    /// Number of requests issued, including throttled ones
    pub fetch_attempts: u32,

    /// Files written, in resource order
    pub files: Vec<PathBuf>,

    /// Wall-clock duration of the cycle
    pub duration: Duration,
}

/// Fetches one resource collection and persists each item
pub struct ExportPipeline {
    api: Arc<dyn ResourceApi>,
    writer: ResourceWriter,
    entrypoint: String,
    resource_type: String,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl ExportPipeline {
    /// Creates a pipeline for `resource_type` served under `entrypoint`
    pub fn new(
        api: Arc<dyn ResourceApi>,
        writer: ResourceWriter,
        entrypoint: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            api,
            writer,
            entrypoint: entrypoint.into(),
            resource_type: resource_type.into(),
            observer: None,
        }
    }

    /// Attaches a transition observer
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The collection URL, `{entrypoint}/{resource_type}s`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}s",
            self.entrypoint.trim_end_matches('/'),
            self.resource_type
        )
    }

    /// The configured resource type
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Runs one cycle
    ///
    /// # Errors
    ///
    /// - [`ExporterError::Cancelled`] when the signal fires at any suspend point
    /// - fetch, decode, directory and write errors with context, fail-fast
    pub async fn run(&self, signal: &ShutdownSignal) -> Result<CycleReport> {
        let started = Instant::now();
        self.transition(&PipelineState::Idle);

        match self.execute(signal, started).await {
            Ok(report) => {
                self.transition(&PipelineState::Done);
                tracing::info!(
                    resource_type = %self.resource_type,
                    files = report.files.len(),
                    attempts = report.fetch_attempts,
                    duration_ms = report.duration.as_millis() as u64,
                    "Export cycle completed"
                );
                Ok(report)
            }
            Err(e) if e.is_cancelled() => {
                self.transition(&PipelineState::Cancelled);
                Err(ExporterError::Cancelled)
            }
            Err(e) => {
                self.transition(&PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&self, signal: &ShutdownSignal, started: Instant) -> Result<CycleReport> {
        if signal.is_cancelled() {
            return Err(ExporterError::Cancelled);
        }

        let (body, fetch_attempts) = self.fetch(signal).await.context("fetch data")?;

        self.transition(&PipelineState::Decoding);
        let resources = decode_resources(&body).context("retrieve resources")?;
        tracing::debug!(count = resources.len(), "decoded resources");

        self.transition(&PipelineState::EnsuringDir);
        let dir = self
            .writer
            .confine(&self.writer.resource_dir(&self.resource_type))
            .context("resource directory")?;
        self.writer
            .ensure_dir(&dir)
            .await
            .context("resource directory")?;

        let files = self.persist(&resources, &dir, signal).await?;
        tracing::debug!("finished iterating resources");

        Ok(CycleReport {
            resource_type: self.resource_type.clone(),
            fetch_attempts,
            files,
            duration: started.elapsed(),
        })
    }

    async fn fetch(&self, signal: &ShutdownSignal) -> Result<(Vec<u8>, u32)> {
        let endpoint = self.endpoint();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.transition(&PipelineState::Fetching { attempt });

            let response = match self.api.get(&endpoint, signal).await {
                Ok(response) => response,
                Err(_) if signal.is_cancelled() => return Err(ExporterError::Cancelled),
                Err(e) => return Err(e.with_context("make request")),
            };

            match decide(response.status, response.retry_after(), Utc::now()) {
                RetryDecision::Retry(wait) => {
                    tracing::warn!(
                        retry_after = ?wait,
                        attempt,
                        endpoint = %endpoint,
                        "too many requests"
                    );
                    self.transition(&PipelineState::RateLimited { wait });
                    wait_backoff(wait, signal).await?;
                }
                RetryDecision::Proceed => {
                    if !response.status.is_success() {
                        tracing::warn!(
                            status = response.status.as_u16(),
                            endpoint = %endpoint,
                            "unexpected response status"
                        );
                    }
                    return Ok((response.body, attempt));
                }
            }
        }
    }

    async fn persist(
        &self,
        resources: &[Resource],
        dir: &Path,
        signal: &ShutdownSignal,
    ) -> Result<Vec<PathBuf>> {
        let total = resources.len();
        let mut files = Vec::with_capacity(total);

        for (index, resource) in resources.iter().enumerate() {
            if signal.is_cancelled() {
                tracing::info!(
                    written = files.len(),
                    remaining = total - index,
                    "export cancelled between writes"
                );
                return Err(ExporterError::Cancelled);
            }

            self.transition(&PipelineState::Writing { index, total });
            let path = dir.join(self.writer.file_name(&self.resource_type, resource));
            let written = self
                .writer
                .write_resource(resource, &path)
                .await
                .context(format!("store resource {}", resource.gid))?;
            files.push(written);
        }

        Ok(files)
    }

    fn transition(&self, state: &PipelineState) {
        tracing::debug!(resource_type = %self.resource_type, state = %state, "pipeline transition");
        if let Some(observer) = &self.observer {
            observer.on_transition(state);
        }
    }
}
