//! Token bucket rate limiting for outbound API calls.
//!
//! Capacity and refill rate both derive from a requests-per-minute budget. Callers
//! suspend until a token is available instead of being rejected, so sustained load
//! is paced rather than failed.

use crate::core::shutdown::ShutdownSignal;
use crate::domain::{ExporterError, Result};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared by every concurrent export cycle
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Creates a full bucket allowing `requests_per_minute` sustained requests with a
    /// burst of the same size.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the rate is zero.
    pub fn per_minute(requests_per_minute: u32) -> Result<Self> {
        if requests_per_minute == 0 {
            return Err(ExporterError::Configuration(
                "rate limit must be positive".to_string(),
            ));
        }

        let capacity = f64::from(requests_per_minute);
        Ok(Self {
            capacity,
            refill_per_sec: capacity / 60.0,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    /// Burst capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Tokens added per second
    pub fn refill_per_sec(&self) -> f64 {
        self.refill_per_sec
    }

    /// Takes a token if one is available right now
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Currently available tokens
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    /// Waits for a token, or fails with [`ExporterError::RateLimitWait`] when the
    /// signal fires first.
    ///
    /// # Cancel Safety
    ///
    /// The lock is released before sleeping; dropping the future never consumes a
    /// token.
    pub async fn acquire(&self, signal: &ShutdownSignal) -> Result<Duration> {
        let mut waited = Duration::ZERO;

        loop {
            if signal.is_cancelled() {
                return Err(ExporterError::RateLimitWait);
            }

            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(waited);
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };

            trace!(wait_ms = wait.as_millis() as u64, "rate limited, waiting for token");
            tokio::select! {
                biased;
                _ = signal.cancelled() => return Err(ExporterError::RateLimitWait),
                _ = tokio::time::sleep(wait) => waited += wait,
            }
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }
}
