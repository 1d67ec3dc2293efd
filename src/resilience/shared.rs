//! Shared breaker for the upstream ERP connection.
//!
//! Every ERP call site in the process goes through the same breaker, so
//! failures seen by one caller open the circuit for all of them.

use std::sync::{Arc, OnceLock};

use crate::config::CircuitBreakerConfig;
use crate::resilience::{CircuitBreaker, CircuitBreakerMetrics, CircuitState};

/// Component name the shared breaker logs under.
pub const SHARED_BREAKER_NAME: &str = "odoo";

/// Lazily created, process-wide breaker handle.
///
/// The breaker is built from `config` on first use; later calls return the
/// same instance.
#[derive(Debug)]
pub struct SharedCircuitBreaker {
    config: CircuitBreakerConfig,
    instance: OnceLock<Arc<CircuitBreaker>>,
}

impl SharedCircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            instance: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Arc<CircuitBreaker> {
        let breaker = self.instance.get_or_init(|| {
            Arc::new(CircuitBreaker::new(SHARED_BREAKER_NAME, self.config.clone()))
        });
        Arc::clone(breaker)
    }

    pub fn state(&self) -> CircuitState {
        self.get().state()
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.get().metrics()
    }

    /// Resets the breaker's state. The instance itself is kept.
    pub fn reset(&self) {
        self.get().reset();
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(30),
            half_open_max_attempts: 1,
        }
    }

    #[tokio::test]
    async fn test_same_instance_everywhere() {
        let shared = SharedCircuitBreaker::new(config());
        assert!(!shared.is_initialized());

        let first = shared.get();
        let second = shared.get();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), SHARED_BREAKER_NAME);

        let _ = first
            .execute(|| async { Err::<(), _>("ECONNREFUSED".to_string()) })
            .await;
        assert_eq!(shared.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_reset_keeps_instance() {
        let shared = SharedCircuitBreaker::new(config());
        let before = shared.get();
        let _ = before
            .execute(|| async { Err::<(), _>("ECONNREFUSED".to_string()) })
            .await;

        shared.reset();

        assert!(Arc::ptr_eq(&before, &shared.get()));
        assert_eq!(shared.metrics().state, CircuitState::Closed);
    }
}
