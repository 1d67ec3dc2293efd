//! Local Store Module
//!
//! In-process entry store combining HashMap storage with LRU tracking and TTL
//! expiration. Values are held by ownership, no serialization involved.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheValue, EntryStore, LruTracker};
use crate::error::{CacheError, CacheResult};

/// Default capacity of the local store.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

struct StoredEntry {
    value: Arc<dyn Any + Send + Sync>,
    created_at: u64,
    expires_at: u64,
}

impl StoredEntry {
    fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, StoredEntry>,
    lru: LruTracker,
}

impl Inner {
    fn drop_key(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Drops `key` if it has expired, returning whether a live entry remains.
    fn check_live(&mut self, key: &str, now_ms: u64) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired_at(now_ms) => {
                self.drop_key(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

// == Memory Store ==
/// Bounded in-process store with LRU eviction.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    max_entries: usize,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl EntryStore for MemoryStore {
    async fn read<T: CacheValue>(&self, key: &str) -> CacheResult<Option<CacheEntry<T>>> {
        let mut inner = self.inner.lock();
        if !inner.check_live(key, current_timestamp_ms()) {
            return Ok(None);
        }

        let entry = match inner.entries.get(key) {
            Some(stored) => match stored.value.downcast_ref::<T>() {
                Some(data) => CacheEntry {
                    data: data.clone(),
                    created_at: stored.created_at,
                    expires_at: stored.expires_at,
                },
                None => return Err(CacheError::TypeMismatch(key.to_string())),
            },
            None => return Ok(None),
        };

        inner.lru.touch(key);
        Ok(Some(entry))
    }

    async fn write<T: CacheValue>(&self, key: &str, entry: CacheEntry<T>) -> CacheResult<()> {
        let mut inner = self.inner.lock();

        // If not overwriting and at capacity, evict oldest entries
        if !inner.entries.contains_key(key) {
            while inner.entries.len() >= self.max_entries {
                match inner.lru.evict_oldest() {
                    Some(evicted) => {
                        inner.entries.remove(&evicted);
                        debug!(key = %evicted, "Evicted least recently used entry");
                    }
                    None => break,
                }
            }
        }

        inner.entries.insert(
            key.to_string(),
            StoredEntry {
                value: Arc::new(entry.data),
                created_at: entry.created_at,
                expires_at: entry.expires_at,
            },
        );
        inner.lru.touch(key);
        Ok(())
    }

    async fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.inner.lock().check_live(key, current_timestamp_ms()))
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        Ok(self.inner.lock().drop_key(key))
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.lru.clear();
        Ok(())
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        self.purge_expired().await?;
        let mut keys: Vec<String> = self.inner.lock().entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    // == Purge Expired ==
    async fn purge_expired(&self) -> CacheResult<usize> {
        let now = current_timestamp_ms();
        let mut inner = self.inner.lock();
        let expired_keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            inner.drop_key(key);
        }

        Ok(expired_keys.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
