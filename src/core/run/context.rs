//! State shared by all cycles of one run

use crate::core::export::CycleReport;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::ExporterError;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Run-wide bookkeeping, passed to every cycle task
///
/// Holds the shutdown signal, the in-flight cycle counter, collected errors and
/// progress counters. Nothing here is global; each run owns its own context.
#[derive(Debug)]
pub struct RunContext {
    signal: ShutdownSignal,
    in_flight: AtomicUsize,
    drained: Notify,
    errors: Mutex<Vec<ExporterError>>,
    cycles_started: AtomicU64,
    cycles_completed: AtomicU64,
    files_written: AtomicU64,
}

impl RunContext {
    /// Creates a context observing `signal`
    pub fn new(signal: ShutdownSignal) -> Arc<Self> {
        Arc::new(Self {
            signal,
            in_flight: AtomicUsize::new(0),
            drained: Notify::new(),
            errors: Mutex::new(Vec::new()),
            cycles_started: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            files_written: AtomicU64::new(0),
        })
    }

    /// The shared shutdown signal
    pub fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    /// Registers a starting cycle. The cycle counts as in flight until the guard drops.
    pub fn begin_cycle(self: &Arc<Self>) -> CycleGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
        CycleGuard {
            context: Arc::clone(self),
        }
    }

    /// Number of cycles currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Records a completed cycle
    pub fn record_report(&self, report: &CycleReport) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.files_written
            .fetch_add(report.files.len() as u64, Ordering::Relaxed);
    }

    /// Records a failed cycle
    pub fn record_error(&self, error: ExporterError) {
        self.errors().push(error);
    }

    /// Number of errors recorded so far
    pub fn error_count(&self) -> usize {
        self.errors().len()
    }

    /// Removes and returns all recorded errors in arrival order
    pub fn take_errors(&self) -> Vec<ExporterError> {
        std::mem::take(&mut *self.errors())
    }

    pub fn cycles_started(&self) -> u64 {
        self.cycles_started.load(Ordering::Relaxed)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn files_written(&self) -> u64 {
        self.files_written.load(Ordering::Relaxed)
    }

    /// Resolves once no cycle is in flight
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn errors(&self) -> MutexGuard<'_, Vec<ExporterError>> {
        match self.errors.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Marks one cycle as in flight for as long as it lives
#[derive(Debug)]
pub struct CycleGuard {
    context: Arc<RunContext>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if self.context.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.context.drained.notify_waiters();
        }
    }
}
