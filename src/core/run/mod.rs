//! Run orchestration
//!
//! Drives export cycles once or on an interval, tracks every cycle in a shared
//! [`RunContext`] and drains them on shutdown.

pub mod context;
pub mod orchestrator;

pub use context::{CycleGuard, RunContext};
pub use orchestrator::{RunOptions, RunOrchestrator, RunSummary, DEFAULT_DRAIN_TIMEOUT};
