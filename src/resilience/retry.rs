//! Retry executor with exponential backoff.
//!
//! Failures are classified from their message text. Known permanent ERP
//! errors (bad credentials, access rules, validation) fail immediately;
//! known transient network and gateway errors are retried; anything else
//! fails immediately.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryConfig;

/// Message fragments of permanent failures. Checked before the retryable list.
pub const NON_RETRYABLE_PATTERNS: &[&str] = &[
    "invalid credentials",
    "access denied",
    "accesserror",
    "access error",
    "permission denied",
    "authentication failed",
    "unauthorized",
    "forbidden",
    "validationerror",
    "validation error",
    "invalid field",
    "unknown field",
    "missingerror",
    "does not exist",
    "usererror",
];

/// Message fragments of transient failures.
pub const RETRYABLE_PATTERNS: &[&str] = &[
    "econnreset",
    "etimedout",
    "esockettimedout",
    "econnrefused",
    "epipe",
    "enotfound",
    "eai_again",
    "socket hang up",
    "connection reset",
    "connection refused",
    "connection closed",
    "broken pipe",
    "timed out",
    "timeout",
    "internal server error",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "odoo server error",
];

/// HTTP statuses treated as transient when they appear as a separate word.
pub const RETRYABLE_STATUS_CODES: std::ops::RangeInclusive<u16> = 500..=504;

/// How a failure is treated by the retry executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Retryable,
    NonRetryable,
}

/// Classifies a failure by case-insensitive substring match on its message,
/// plus standalone 5xx status codes.
pub fn classify_error(message: &str) -> ErrorClass {
    let message = message.to_ascii_lowercase();

    if NON_RETRYABLE_PATTERNS.iter().any(|p| message.contains(p)) {
        return ErrorClass::NonRetryable;
    }
    let transient = RETRYABLE_PATTERNS.iter().any(|p| message.contains(p));
    if transient || mentions_server_status(&message) {
        return ErrorClass::Retryable;
    }
    ErrorClass::NonRetryable
}

/// True if a standalone number in `message` is a retryable 5xx status.
fn mentions_server_status(message: &str) -> bool {
    message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter_map(|word| word.parse::<u16>().ok())
        .any(|code| RETRYABLE_STATUS_CODES.contains(&code))
}

/// Delay before the retry that follows failed attempt `attempt` (1-based).
pub fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base_delay.saturating_mul(factor)
}

/// Attempt budget and backoff base for one class of upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. The last error is returned unchanged.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    let message = e.to_string();

                    if classify_error(&message) == ErrorClass::NonRetryable {
                        debug!(attempt, error = %message, "Non-retryable error, giving up");
                        return Err(e);
                    }
                    if attempt >= max_attempts {
                        warn!(attempts = attempt, error = %message, "Retries exhausted");
                        return Err(e);
                    }

                    let delay = backoff_delay(self.base_delay, attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "Retryable error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// One-off form of [`RetryPolicy::execute`].
pub async fn execute_with_retry<F, Fut, T, E>(
    operation: F,
    max_retries: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy::new(max_retries, base_delay)
        .execute(operation)
        .await
}
