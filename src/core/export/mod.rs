//! Export cycle
//!
//! - [`pipeline`] - one fetch, decode and persist cycle as an explicit state machine
//! - [`retry`] - rate-limit backoff decisions and `Retry-After` parsing

pub mod pipeline;
pub mod retry;

pub use pipeline::{CycleReport, ExportPipeline, PipelineObserver, PipelineState};
pub use retry::{decide, parse_retry_after, wait_backoff, RetryDecision, DEFAULT_RETRY_AFTER};
