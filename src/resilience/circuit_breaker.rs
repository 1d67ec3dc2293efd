//! # Circuit Breaker
//!
//! Fault isolation for the upstream ERP connection. Three states: Closed
//! (normal operation), Open (failing fast) and HalfOpen (a bounded number of
//! trial calls decide whether to close again).
//!
//! All admission and transition logic runs under one mutex that is never held
//! across an await, so check-then-transition stays atomic on a multi-threaded
//! runtime.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::CircuitBreakerConfig;
use crate::error::{BreakerError, CircuitOpenError};

/// Retry hint given when the half-open trial quota is already taken.
pub const HALF_OPEN_RETRY_HINT_SECS: u64 = 5;

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - limited calls allowed to test system health
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        };
        f.write_str(label)
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerMetrics {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    /// Lifetime count of successful calls
    pub success_count: u64,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_state_change: DateTime<Utc>,
    pub half_open_attempts: u32,
    /// Whole seconds until a trial call is admitted; only set while Open
    pub seconds_until_half_open: Option<u64>,
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
    pub half_open_max_attempts: u32,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u64,
    last_failure: Option<Instant>,
    last_failure_time: Option<DateTime<Utc>>,
    last_state_change: DateTime<Utc>,
    half_open_attempts: u32,
    /// Bumped on every transition; ties a trial slot to its half-open period
    generation: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure: None,
            last_failure_time: None,
            last_state_change: Utc::now(),
            half_open_attempts: 0,
            generation: 0,
        }
    }

    fn transition(&mut self, to: CircuitState) {
        self.state = to;
        self.half_open_attempts = 0;
        self.last_state_change = Utc::now();
        self.generation += 1;
    }
}

/// A half-open trial admission.
///
/// Dropped before `settle`, e.g. when the caller's future is cancelled, it
/// hands the slot back so a later call can run the trial.
struct TrialSlot<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl TrialSlot<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for TrialSlot<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release_trial(self.generation);
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    (duration.as_millis() as u64).div_ceil(1000)
}

/// Circuit breaker guarding one upstream target or a whole connection pool.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_ms = config.reset_timeout.as_millis() as u64,
            half_open_max_attempts = config.half_open_max_attempts,
            "Circuit breaker initialized"
        );

        Self {
            name,
            config,
            state: Mutex::new(BreakerState::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// A rejected call never invokes `operation`. An operation error is
    /// returned untouched inside [`BreakerError::Inner`].
    pub async fn execute<F, T, E, Fut>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let trial = self.admit().map_err(BreakerError::Open)?;

        let started = Instant::now();
        let outcome = operation().await;
        if let Some(trial) = trial {
            trial.settle();
        }

        match outcome {
            Ok(value) => {
                self.record_success(started.elapsed());
                Ok(value)
            }
            Err(e) => {
                self.record_failure(started.elapsed());
                Err(BreakerError::Inner(e))
            }
        }
    }

    /// Decides whether a call may run, moving Open to HalfOpen once the
    /// reset timeout has elapsed. Half-open admissions carry a trial slot.
    fn admit(&self) -> Result<Option<TrialSlot<'_>>, CircuitOpenError> {
        let mut s = self.state.lock();

        if s.state == CircuitState::Open {
            let remaining = self.remaining_open(&s);
            if !remaining.is_zero() {
                debug!(
                    component = %self.name,
                    remaining_ms = remaining.as_millis() as u64,
                    "Circuit open, failing fast"
                );
                return Err(CircuitOpenError {
                    retry_after_secs: ceil_secs(remaining),
                });
            }
            s.transition(CircuitState::HalfOpen);
            info!(
                component = %self.name,
                half_open_max_attempts = self.config.half_open_max_attempts,
                "Circuit breaker half-open (testing recovery)"
            );
        }

        if s.state == CircuitState::HalfOpen {
            if s.half_open_attempts >= self.config.half_open_max_attempts {
                debug!(component = %self.name, "Half-open trial quota in use, failing fast");
                return Err(CircuitOpenError {
                    retry_after_secs: HALF_OPEN_RETRY_HINT_SECS,
                });
            }
            s.half_open_attempts += 1;
            return Ok(Some(TrialSlot {
                breaker: self,
                generation: s.generation,
                settled: false,
            }));
        }

        Ok(None)
    }

    /// Returns an unsettled trial slot, unless the half-open period it was
    /// taken in has already ended.
    fn release_trial(&self, generation: u64) {
        let mut s = self.state.lock();
        if s.state == CircuitState::HalfOpen && s.generation == generation {
            s.half_open_attempts = s.half_open_attempts.saturating_sub(1);
            debug!(
                component = %self.name,
                half_open_attempts = s.half_open_attempts,
                "Half-open trial abandoned, slot released"
            );
        }
    }

    fn remaining_open(&self, s: &BreakerState) -> Duration {
        match s.last_failure {
            Some(at) => self.config.reset_timeout.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    fn record_success(&self, duration: Duration) {
        let mut s = self.state.lock();
        s.success_count += 1;

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Operation succeeded"
        );

        let current = s.state;
        match current {
            CircuitState::HalfOpen => {
                s.failure_count = 0;
                s.transition(CircuitState::Closed);
                info!(
                    component = %self.name,
                    success_count = s.success_count,
                    "Circuit breaker closed (recovered)"
                );
            }
            CircuitState::Closed => {
                s.failure_count = 0;
            }
            CircuitState::Open => {
                // A call admitted before another one tripped the breaker
                debug!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    fn record_failure(&self, duration: Duration) {
        let mut s = self.state.lock();
        s.failure_count += 1;
        s.last_failure = Some(Instant::now());
        s.last_failure_time = Some(Utc::now());

        warn!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            failure_count = s.failure_count,
            "Operation failed"
        );

        let trips = match s.state {
            CircuitState::Closed => s.failure_count >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if trips {
            let from = s.state;
            s.transition(CircuitState::Open);
            error!(
                component = %self.name,
                from = %from,
                failure_count = s.failure_count,
                failure_threshold = self.config.failure_threshold,
                reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                "Circuit breaker opened (failing fast)"
            );
        }
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let s = self.state.lock();
        let seconds_until_half_open = match s.state {
            CircuitState::Open => Some(ceil_secs(self.remaining_open(&s))),
            _ => None,
        };

        CircuitBreakerMetrics {
            name: self.name.clone(),
            state: s.state,
            failure_count: s.failure_count,
            success_count: s.success_count,
            last_failure_time: s.last_failure_time,
            last_state_change: s.last_state_change,
            half_open_attempts: s.half_open_attempts,
            seconds_until_half_open,
            failure_threshold: self.config.failure_threshold,
            reset_timeout_ms: self.config.reset_timeout.as_millis() as u64,
            half_open_max_attempts: self.config.half_open_max_attempts,
        }
    }

    /// Force the circuit closed. The lifetime success count is kept.
    pub fn reset(&self) {
        let mut s = self.state.lock();
        s.failure_count = 0;
        s.transition(CircuitState::Closed);
        warn!(component = %self.name, "Circuit breaker manually reset");
    }
}
