//! Shutdown signalling
//!
//! A one-way broadcast "stop" indicator built on a `watch` channel. Once the
//! trigger fires the value stays `true`; every clone of the signal observes it.

use tokio::sync::watch;

/// Sending half, held by the OS signal handler
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Requests shutdown; repeated calls are no-ops
    pub fn trigger(&self) {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        });
    }
}

/// Receiving half, cloned into every task that has suspend points
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Creates a connected trigger/signal pair
    pub fn new() -> (ShutdownTrigger, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, ShutdownSignal { rx })
    }

    /// Wraps an existing receiver, as produced by the CLI signal handler
    pub fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        Self { rx }
    }

    /// Whether shutdown has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. Pending forever if the trigger is gone
    /// without having fired.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
