//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which cache backend the factory should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// Process-local bounded LRU store
    Memory,
    /// Shared Redis store
    Redis,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

/// Cache backend selection and sizing.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub redis_url: String,
    /// Namespace prepended to every Redis key
    pub key_prefix: String,
    /// Capacity of the local store before LRU eviction
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "odoo-crm:".to_string(),
            max_entries: 500,
        }
    }
}

/// Thresholds for the shared upstream circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
    pub half_open_max_attempts: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_millis(60_000),
            half_open_max_attempts: 1,
        }
    }
}

/// Retry executor defaults.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache: CacheConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    /// HTTP port of the operator endpoints
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TYPE` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Redis connection URL (default: redis://localhost:6379)
    /// - `CACHE_KEY_PREFIX` - Redis key namespace (default: odoo-crm:)
    /// - `CACHE_MAX_ENTRIES` - Local store capacity (default: 500)
    /// - `CIRCUIT_BREAKER_FAILURE_THRESHOLD` - Failures before opening (default: 5)
    /// - `CIRCUIT_BREAKER_RESET_TIMEOUT_MS` - Open duration in ms (default: 60000)
    /// - `CIRCUIT_BREAKER_HALF_OPEN_MAX_ATTEMPTS` - Trial calls (default: 1)
    /// - `RETRY_MAX_RETRIES` - Attempts per call (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay in ms (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from an arbitrary key lookup.
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let defaults = Self::default();

        let backend = match lookup("CACHE_TYPE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to memory cache backend");
                CacheBackendKind::Memory
            }),
            None => defaults.cache.backend,
        };

        Self {
            cache: CacheConfig {
                backend,
                redis_url: lookup("REDIS_URL").unwrap_or(defaults.cache.redis_url),
                key_prefix: lookup("CACHE_KEY_PREFIX").unwrap_or(defaults.cache.key_prefix),
                max_entries: parsed("CACHE_MAX_ENTRIES")
                    .and_then(|v| usize::try_from(v).ok())
                    .unwrap_or(defaults.cache.max_entries),
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parsed("CIRCUIT_BREAKER_FAILURE_THRESHOLD")
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(defaults.circuit_breaker.failure_threshold),
                reset_timeout: parsed("CIRCUIT_BREAKER_RESET_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.circuit_breaker.reset_timeout),
                half_open_max_attempts: parsed("CIRCUIT_BREAKER_HALF_OPEN_MAX_ATTEMPTS")
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(defaults.circuit_breaker.half_open_max_attempts),
            },
            retry: RetryConfig {
                max_retries: parsed("RETRY_MAX_RETRIES")
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(defaults.retry.max_retries),
                base_delay: parsed("RETRY_BASE_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry.base_delay),
            },
            server_port: parsed("SERVER_PORT")
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: parsed("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}
