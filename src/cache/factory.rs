//! Cache Factory Module
//!
//! Builds the configured cache provider with graceful degradation: if Redis
//! is configured but cannot be reached, the local store is used instead and
//! the server still starts.

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::redis_store::redact_url;
use crate::cache::{CacheProvider, MemoryStore, RedisStore, StoreBackend};
use crate::config::{CacheBackendKind, CacheConfig};

/// Builds a provider for `config`. Never fails.
pub async fn create_cache(config: &CacheConfig) -> CacheProvider {
    match config.backend {
        CacheBackendKind::Memory => memory_cache(config),
        CacheBackendKind::Redis => {
            match RedisStore::connect(&config.redis_url, &config.key_prefix).await {
                Ok(store) => {
                    info!(
                        backend = "redis",
                        url = %redact_url(&config.redis_url),
                        prefix = %config.key_prefix,
                        "Cache provider initialized"
                    );
                    CacheProvider::new(StoreBackend::Redis(Box::new(store)))
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Failed to connect to Redis, falling back to in-memory cache"
                    );
                    memory_cache(config)
                }
            }
        }
    }
}

fn memory_cache(config: &CacheConfig) -> CacheProvider {
    info!(
        backend = "memory",
        max_entries = config.max_entries,
        "Cache provider initialized"
    );
    CacheProvider::new(StoreBackend::Memory(MemoryStore::new(config.max_entries)))
}

// == Cache Factory ==
/// Lazily builds one provider and hands out clones of it.
#[derive(Debug)]
pub struct CacheFactory {
    config: CacheConfig,
    instance: Mutex<Option<CacheProvider>>,
}

impl CacheFactory {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            instance: Mutex::new(None),
        }
    }

    /// Returns the provider, building it on first use.
    pub async fn get(&self) -> CacheProvider {
        let mut slot = self.instance.lock().await;
        if let Some(cache) = slot.as_ref() {
            return cache.clone();
        }

        let cache = create_cache(&self.config).await;
        *slot = Some(cache.clone());
        cache
    }

    /// Discards the held provider so the next `get` builds a new one.
    ///
    /// Test isolation only; clones already handed out keep working.
    pub async fn reset(&self) {
        self.instance.lock().await.take();
    }

    pub async fn is_initialized(&self) -> bool {
        self.instance.lock().await.is_some()
    }
}
