//! Cache Provider Module
//!
//! The cache contract used by the rest of the server, layered over an
//! [`EntryStore`]. Backend failures are logged and degrade to a miss or a
//! no-op; only a caller's own refresh error ever propagates.

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheMetrics, CacheStats, CacheValue, EntryStore, StoreBackend};

/// Share of the TTL after which `get_with_refresh` starts revalidating.
pub const DEFAULT_REFRESH_THRESHOLD_PERCENT: u8 = 80;

struct Shared<S> {
    store: S,
    counters: Counters,
    /// Keys with a background refresh in flight on this instance
    refreshing: Mutex<HashSet<String>>,
}

/// Removes its key from the in-flight set when dropped.
struct RefreshGuard<S: EntryStore> {
    shared: Arc<Shared<S>>,
    key: String,
}

impl<S: EntryStore> RefreshGuard<S> {
    fn acquire(shared: &Arc<Shared<S>>, key: &str) -> Option<Self> {
        if !shared.refreshing.lock().insert(key.to_string()) {
            return None;
        }
        Some(Self {
            shared: Arc::clone(shared),
            key: key.to_string(),
        })
    }
}

impl<S: EntryStore> Drop for RefreshGuard<S> {
    fn drop(&mut self) {
        self.shared.refreshing.lock().remove(&self.key);
    }
}

// == Cache Provider ==
/// Hit/miss-accounted cache with stale-while-revalidate reads.
///
/// Cloning is cheap and every clone shares the same store, counters and
/// in-flight refresh set. Build one per process and pass it around.
pub struct CacheProvider<S: EntryStore = StoreBackend> {
    shared: Arc<Shared<S>>,
}

impl<S: EntryStore> Clone for CacheProvider<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: EntryStore> std::fmt::Debug for CacheProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheProvider")
            .field("backend", &self.backend_name())
            .field("metrics", &self.metrics())
            .finish()
    }
}

impl<S: EntryStore> CacheProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                counters: Counters::default(),
                refreshing: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.shared.store.backend_name()
    }

    // == Get ==
    /// Returns the cached value, counting exactly one hit or miss.
    pub async fn get<T: CacheValue>(&self, key: &str) -> Option<T> {
        match self.shared.store.read::<T>(key).await {
            Ok(Some(entry)) => {
                self.shared.counters.record_hit();
                debug!(key, "Cache HIT");
                Some(entry.data)
            }
            Ok(None) => {
                self.shared.counters.record_miss();
                debug!(key, "Cache MISS");
                None
            }
            Err(e) => {
                self.shared.counters.record_miss();
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    // == Set ==
    /// Stores `data` for `ttl`, replacing any existing entry.
    ///
    /// Best effort: returns whether the backend accepted the write.
    pub async fn set<T: CacheValue>(&self, key: &str, data: T, ttl: Duration) -> bool {
        match self
            .shared
            .store
            .write(key, CacheEntry::new(data, ttl))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Cache write failed, value not cached");
                false
            }
        }
    }

    /// Existence check; does not touch the hit/miss counters.
    pub async fn has(&self, key: &str) -> bool {
        self.shared.store.contains(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "Cache existence check failed");
            false
        })
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.shared.store.remove(key).await.unwrap_or_else(|e| {
            warn!(key, error = %e, "Cache delete failed");
            false
        })
    }

    /// Removes every entry in this provider's namespace and zeroes the counters.
    pub async fn clear(&self) {
        if let Err(e) = self.shared.store.clear().await {
            warn!(error = %e, "Cache clear failed");
        }
        self.shared.counters.reset();
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        match self.shared.store.keys().await {
            Ok(keys) => CacheStats {
                size: keys.len(),
                keys,
            },
            Err(e) => {
                warn!(error = %e, "Cache key enumeration failed");
                CacheStats::default()
            }
        }
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.shared.counters.snapshot()
    }

    /// Zeroes hits and misses; stored entries are kept.
    pub fn reset_metrics(&self) {
        self.shared.counters.reset();
    }

    /// Drops expired entries from backends that need manual housekeeping.
    pub async fn purge_expired(&self) -> usize {
        self.shared.store.purge_expired().await.unwrap_or_else(|e| {
            warn!(error = %e, "Cache purge failed");
            0
        })
    }

    /// True while a background refresh for `key` is in flight.
    pub fn is_refreshing(&self, key: &str) -> bool {
        self.shared.refreshing.lock().contains(key)
    }

    // == Get With Refresh ==
    /// Stale-while-revalidate read with the default 80% threshold.
    pub async fn get_with_refresh<T, E, F, Fut>(
        &self,
        key: &str,
        refresh_fn: F,
        ttl: Duration,
    ) -> Result<T, E>
    where
        T: CacheValue,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.get_with_refresh_at(key, refresh_fn, ttl, DEFAULT_REFRESH_THRESHOLD_PERCENT)
            .await
    }

    /// Stale-while-revalidate read.
    ///
    /// - fresh (before `created_at + ttl * threshold_percent / 100`): cached
    ///   value, `refresh_fn` is not called
    /// - stale but unexpired: cached value, plus one detached refresh per key
    /// - missing or expired: `refresh_fn` is awaited and its value cached;
    ///   its error is returned and nothing is cached
    /// - backend failure: `refresh_fn` is awaited and caching is attempted in
    ///   the background
    pub async fn get_with_refresh_at<T, E, F, Fut>(
        &self,
        key: &str,
        refresh_fn: F,
        ttl: Duration,
        threshold_percent: u8,
    ) -> Result<T, E>
    where
        T: CacheValue,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let entry = match self.shared.store.read::<T>(key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Cache lookup failed, fetching directly");
                self.shared.counters.record_miss();
                let data = refresh_fn().await?;
                self.spawn_store(key, data.clone(), ttl);
                return Ok(data);
            }
        };

        let now = current_timestamp_ms();
        match entry {
            Some(entry) if now < entry.refresh_threshold(ttl, threshold_percent) => {
                self.shared.counters.record_hit();
                debug!(key, "Cache HIT (fresh)");
                Ok(entry.data)
            }
            Some(entry) if !entry.is_expired_at(now) => {
                self.shared.counters.record_hit();
                debug!(key, "Cache HIT (stale), revalidating in background");
                self.spawn_refresh(key, refresh_fn, ttl);
                Ok(entry.data)
            }
            _ => {
                self.shared.counters.record_miss();
                debug!(key, "Cache MISS, fetching");
                let data = refresh_fn().await?;
                self.set(key, data.clone(), ttl).await;
                Ok(data)
            }
        }
    }

    fn spawn_refresh<T, E, F, Fut>(&self, key: &str, refresh_fn: F, ttl: Duration)
    where
        T: CacheValue,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let Some(guard) = RefreshGuard::acquire(&self.shared, key) else {
            debug!(key, "Background refresh already in flight");
            return;
        };

        let provider = self.clone();
        tokio::spawn(async move {
            match refresh_fn().await {
                Ok(data) => {
                    if provider.set(&guard.key, data, ttl).await {
                        debug!(key = %guard.key, "Background refresh stored");
                    }
                }
                Err(e) => {
                    warn!(key = %guard.key, error = %e, "Background refresh failed");
                }
            }
            drop(guard);
        });
    }

    fn spawn_store<T: CacheValue>(&self, key: &str, data: T, ttl: Duration) {
        let provider = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            if provider.set(&key, data, ttl).await {
                debug!(key = %key, "Fetched value stored after lookup failure");
            }
        });
    }
}
