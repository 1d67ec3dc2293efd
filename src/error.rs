//! Error types for the resilience core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Failures raised by a cache backend.
///
/// These never reach callers of the cache provider. The provider logs them
/// and degrades to a miss or a no-op.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend could not be reached
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Entry could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// Stored value has a different type than the one requested
    #[error("Cache type mismatch for key: {0}")]
    TypeMismatch(String),

    /// Backend answered with an error
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Convenience Result type for cache backends.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// == Circuit Open Error ==
/// Returned when the circuit breaker refuses a call without running it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circuit breaker is OPEN. Upstream is temporarily unavailable, retry in {retry_after_secs} seconds")]
pub struct CircuitOpenError {
    /// Whole seconds until the breaker admits a trial call
    pub retry_after_secs: u64,
}

// == Breaker Error ==
/// Outcome of a failed `CircuitBreaker::execute`.
#[derive(Error, Debug)]
pub enum BreakerError<E> {
    /// The breaker rejected the call; the wrapped function never ran
    #[error(transparent)]
    Open(CircuitOpenError),

    /// The wrapped function ran and failed with this error
    #[error("{0}")]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// Returns true when the call was rejected by the breaker.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, BreakerError::Open(_))
    }

    /// Returns the wrapped function's error, if it ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Inner(e) => Some(e),
            BreakerError::Open(_) => None,
        }
    }
}

// == API Error Enum ==
/// Errors surfaced by the operator HTTP endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
