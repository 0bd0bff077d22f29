//! One-shot and interval export runs

use super::context::{CycleGuard, RunContext};
use crate::adapters::api::ResourceApi;
use crate::core::export::ExportPipeline;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{ExporterError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

/// Default bound on waiting for in-flight cycles at shutdown
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// How a run is driven
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Period between cycles; `None` runs a single cycle
    pub interval: Option<Duration>,

    /// How long to wait for in-flight cycles after the run stops
    pub drain_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            interval: None,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Outcome of a run without failed cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub files_written: u64,

    /// Whether the run stopped because of the shutdown signal
    pub interrupted: bool,

    pub duration: Duration,
}

/// Schedules export cycles and coordinates shutdown
pub struct RunOrchestrator {
    pipeline: Arc<ExportPipeline>,
    api: Arc<dyn ResourceApi>,
    options: RunOptions,
}

impl RunOrchestrator {
    /// Creates an orchestrator
    ///
    /// `api` is the client shared by the pipeline; its idle connections are
    /// released when the run finishes.
    pub fn new(pipeline: ExportPipeline, api: Arc<dyn ResourceApi>, options: RunOptions) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            api,
            options,
        }
    }

    /// Runs until the single cycle ends or, in interval mode, until `signal` fires
    ///
    /// Cancellation alone is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Aggregate`] when any cycle failed.
    pub async fn run(&self, signal: ShutdownSignal) -> Result<RunSummary> {
        let started = Instant::now();
        let context = RunContext::new(signal);

        match self.options.interval {
            None => {
                tracing::info!(resource_type = %self.pipeline.resource_type(), "running export once");
                let guard = context.begin_cycle();
                run_cycle(&self.pipeline, &context, guard).await;
            }
            Some(period) => {
                tracing::info!(
                    resource_type = %self.pipeline.resource_type(),
                    interval = ?period,
                    "running export on interval"
                );
                self.run_with_interval(&context, period).await;
            }
        }

        self.finish(&context, started).await
    }

    async fn run_with_interval(&self, context: &Arc<RunContext>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = context.signal().cancelled() => {
                    tracing::info!(in_flight = context.in_flight(), "stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    let guard = context.begin_cycle();
                    let pipeline = Arc::clone(&self.pipeline);
                    let context = Arc::clone(context);
                    tracing::debug!(in_flight = context.in_flight(), "launching export cycle");
                    tokio::spawn(async move {
                        run_cycle(&pipeline, &context, guard).await;
                    });
                }
            }
        }
    }

    async fn finish(&self, context: &RunContext, started: Instant) -> Result<RunSummary> {
        if context.in_flight() > 0 {
            tracing::info!(in_flight = context.in_flight(), "waiting for export cycles to finish");
            if tokio::time::timeout(self.options.drain_timeout, context.wait_drained())
                .await
                .is_err()
            {
                tracing::warn!(
                    in_flight = context.in_flight(),
                    timeout = ?self.options.drain_timeout,
                    "timed out waiting for export cycles, forcing shutdown"
                );
            }
        }

        self.api.close_idle_connections();

        let errors = context.take_errors();
        let count = errors.len();
        if let Some(first) = errors.into_iter().next() {
            return Err(ExporterError::Aggregate {
                count,
                first: Box::new(first),
            });
        }

        let summary = RunSummary {
            cycles_started: context.cycles_started(),
            cycles_completed: context.cycles_completed(),
            files_written: context.files_written(),
            interrupted: context.signal().is_cancelled(),
            duration: started.elapsed(),
        };

        if summary.interrupted {
            tracing::info!(
                cycles = summary.cycles_completed,
                files = summary.files_written,
                "graceful shutdown completed"
            );
        } else {
            tracing::info!(
                cycles = summary.cycles_completed,
                files = summary.files_written,
                "export finished"
            );
        }
        Ok(summary)
    }
}

async fn run_cycle(pipeline: &ExportPipeline, context: &RunContext, guard: CycleGuard) {
    let _guard = guard;
    match pipeline.run(context.signal()).await {
        Ok(report) => context.record_report(&report),
        Err(e) if e.is_cancelled() => {
            tracing::debug!(resource_type = %pipeline.resource_type(), "export cycle cancelled");
        }
        Err(e) => {
            tracing::error!(resource_type = %pipeline.resource_type(), error = %e, "export cycle failed");
            context.record_error(e);
        }
    }
}
