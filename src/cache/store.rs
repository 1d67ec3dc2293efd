//! Entry Store Module
//!
//! The capability contract shared by every cache backend, and the enum that
//! dispatches to the backend picked at startup.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheEntry, MemoryStore, RedisStore};
use crate::error::CacheResult;

// == Cache Value ==
/// Bound for anything that can be cached by either backend.
///
/// The local store keeps values by ownership; the networked store needs them
/// to round-trip through JSON.
pub trait CacheValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

// == Entry Store ==
/// Raw entry storage, without hit/miss accounting.
///
/// Reads apply the expiry check and lazily delete expired entries. Errors are
/// backend failures; the provider decides how to degrade on them.
pub trait EntryStore: Send + Sync + 'static {
    /// Returns the live entry for `key`, if any.
    fn read<T: CacheValue>(
        &self,
        key: &str,
    ) -> impl Future<Output = CacheResult<Option<CacheEntry<T>>>> + Send;

    /// Replaces the entry for `key`.
    fn write<T: CacheValue>(
        &self,
        key: &str,
        entry: CacheEntry<T>,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Existence check with the same expiry semantics as `read`.
    fn contains(&self, key: &str) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Removes `key`, returning whether an entry existed.
    fn remove(&self, key: &str) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Removes every entry in this store's namespace.
    fn clear(&self) -> impl Future<Output = CacheResult<()>> + Send;

    /// Live keys, without any namespace prefix.
    fn keys(&self) -> impl Future<Output = CacheResult<Vec<String>>> + Send;

    /// Drops expired entries, returning how many were removed.
    fn purge_expired(&self) -> impl Future<Output = CacheResult<usize>> + Send;

    fn backend_name(&self) -> &'static str;
}

// == Store Backend ==
/// Backend chosen by the cache factory.
#[derive(Debug)]
pub enum StoreBackend {
    Memory(MemoryStore),
    Redis(Box<RedisStore>),
}

impl EntryStore for StoreBackend {
    async fn read<T: CacheValue>(&self, key: &str) -> CacheResult<Option<CacheEntry<T>>> {
        match self {
            Self::Memory(s) => s.read(key).await,
            Self::Redis(s) => s.read(key).await,
        }
    }

    async fn write<T: CacheValue>(&self, key: &str, entry: CacheEntry<T>) -> CacheResult<()> {
        match self {
            Self::Memory(s) => s.write(key, entry).await,
            Self::Redis(s) => s.write(key, entry).await,
        }
    }

    async fn contains(&self, key: &str) -> CacheResult<bool> {
        match self {
            Self::Memory(s) => s.contains(key).await,
            Self::Redis(s) => s.contains(key).await,
        }
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        match self {
            Self::Memory(s) => s.remove(key).await,
            Self::Redis(s) => s.remove(key).await,
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        match self {
            Self::Memory(s) => s.clear().await,
            Self::Redis(s) => s.clear().await,
        }
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        match self {
            Self::Memory(s) => s.keys().await,
            Self::Redis(s) => s.keys().await,
        }
    }

    async fn purge_expired(&self) -> CacheResult<usize> {
        match self {
            Self::Memory(s) => s.purge_expired().await,
            Self::Redis(s) => s.purge_expired().await,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(s) => s.backend_name(),
            Self::Redis(s) => s.backend_name(),
        }
    }
}
