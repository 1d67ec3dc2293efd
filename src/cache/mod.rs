//! Cache Module
//!
//! TTL cache with stale-while-revalidate reads over two interchangeable
//! backends: a bounded in-process LRU store and a namespaced Redis store.

mod entry;
mod factory;
mod lru;
mod memory;
mod provider;
mod redis_store;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use factory::{create_cache, CacheFactory};
pub use lru::LruTracker;
pub use memory::{MemoryStore, DEFAULT_MAX_ENTRIES};
pub use provider::{CacheProvider, DEFAULT_REFRESH_THRESHOLD_PERCENT};
pub use redis_store::{reconnect_delay, RedisStore, MAX_RECONNECT_ATTEMPTS};
pub use stats::{hit_rate_percent, CacheMetrics, CacheStats};
pub use store::{CacheValue, EntryStore, StoreBackend};
