//! Rate-limit backoff
//!
//! Turns a `429 Too Many Requests` response into a wait duration. Only throttling
//! is handled here; every other status is passed back to the caller untouched.
//! Throttling is retried without a ceiling, bounded only by cancellation.

use crate::core::shutdown::ShutdownSignal;
use crate::domain::{ExporterError, Result, SignedDuration};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;
use std::time::Duration;

/// Wait applied when a `Retry-After` hint cannot be used
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// What to do with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the duration, then fetch again
    Retry(Duration),
    /// Hand the response to the caller
    Proceed,
}

/// Decides whether a response should be retried
///
/// Retries only rate-limit responses that carry a non-empty `Retry-After` hint.
pub fn decide(status: StatusCode, retry_after: Option<&str>, now: DateTime<Utc>) -> RetryDecision {
    if status != StatusCode::TOO_MANY_REQUESTS {
        return RetryDecision::Proceed;
    }

    match retry_after.map(str::trim).filter(|hint| !hint.is_empty()) {
        Some(hint) => RetryDecision::Retry(parse_retry_after(hint, now)),
        None => RetryDecision::Proceed,
    }
}

/// Parses a `Retry-After` value
///
/// Tried in order:
/// 1. a duration expression (`30s`, `1m`; negative means no wait)
/// 2. a non-negative integer number of seconds
/// 3. an HTTP-date, used only if it lies in the future
///
/// Falls back to [`DEFAULT_RETRY_AFTER`].
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Duration {
    let value = value.trim();

    if let Ok(duration) = value.parse::<SignedDuration>() {
        return duration.non_negative();
    }

    if let Ok(seconds) = value.parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Some(date) = parse_http_date(value) {
        if let Ok(wait) = (date - now).to_std() {
            if !wait.is_zero() {
                return wait;
            }
        }
    }

    DEFAULT_RETRY_AFTER
}

/// Parses the three HTTP-date layouts: IMF-fixdate, RFC 850 and asctime
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .map(|naive| naive.and_utc())
}

/// Sleeps for `wait` unless the signal fires first
///
/// # Errors
///
/// Returns [`ExporterError::Cancelled`] when interrupted.
pub async fn wait_backoff(wait: Duration, signal: &ShutdownSignal) -> Result<()> {
    tokio::select! {
        biased;
        _ = signal.cancelled() => Err(ExporterError::Cancelled),
        _ = tokio::time::sleep(wait) => Ok(()),
    }
}
