//! Resilience Module
//!
//! Fault isolation for calls to the upstream ERP: a three-state circuit
//! breaker, the process-wide shared instance, and a classifying retry
//! executor.

mod circuit_breaker;
mod retry;
mod shared;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerMetrics, CircuitState, HALF_OPEN_RETRY_HINT_SECS,
};
pub use retry::{
    backoff_delay, classify_error, execute_with_retry, ErrorClass, RetryPolicy,
    NON_RETRYABLE_PATTERNS, RETRYABLE_PATTERNS, RETRYABLE_STATUS_CODES,
};
pub use shared::{SharedCircuitBreaker, SHARED_BREAKER_NAME};
