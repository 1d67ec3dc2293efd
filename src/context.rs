//! Resilience context
//!
//! Bundles the cache factory, the shared upstream breaker and the retry
//! policy. Built once at startup from [`Config`] and passed to whatever
//! needs it.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::cache::{CacheFactory, CacheProvider};
use crate::config::Config;
use crate::error::BreakerError;
use crate::resilience::{CircuitBreaker, RetryPolicy, SharedCircuitBreaker};

#[derive(Debug)]
pub struct ResilienceContext {
    cache: CacheFactory,
    breaker: SharedCircuitBreaker,
    retry: RetryPolicy,
}

impl ResilienceContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache: CacheFactory::new(config.cache.clone()),
            breaker: SharedCircuitBreaker::new(config.circuit_breaker.clone()),
            retry: RetryPolicy::from(&config.retry),
        }
    }

    /// The process cache, connected on first use.
    pub async fn cache(&self) -> CacheProvider {
        self.cache.get().await
    }

    pub fn cache_factory(&self) -> &CacheFactory {
        &self.cache
    }

    pub fn circuit_breaker(&self) -> Arc<CircuitBreaker> {
        self.breaker.get()
    }

    pub fn shared_breaker(&self) -> &SharedCircuitBreaker {
        &self.breaker
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Runs an upstream call through the shared breaker, retrying transient
    /// failures. A fast-fail from the breaker ends the retry loop.
    pub async fn call_upstream<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let breaker = self.breaker.get();
        self.retry
            .execute(|| breaker.execute(|| operation()))
            .await
    }
}
