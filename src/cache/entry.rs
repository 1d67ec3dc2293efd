//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single cached value with its creation and expiry timestamps.
///
/// Timestamps are Unix milliseconds. `expires_at >= created_at` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The stored value
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    pub fn new(data: T, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        Self {
            data,
            created_at: now,
            expires_at: now.saturating_add(ttl.as_millis() as u64),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero TTL produces an entry that is expired on arrival.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Refresh Threshold ==
    /// Timestamp after which the entry should be revalidated.
    ///
    /// Uses the caller's TTL, not the one the entry was stored with.
    pub fn refresh_threshold(&self, ttl: Duration, threshold_percent: u8) -> u64 {
        let ttl_ms = ttl.as_millis() as u64;
        let window = ttl_ms.saturating_mul(u64::from(threshold_percent)) / 100;
        self.created_at.saturating_add(window)
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    /// Converts the payload while keeping the timestamps.
    pub fn map<U, F>(self, f: F) -> CacheEntry<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheEntry {
            data: f(self.data),
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("test_value".to_string(), Duration::from_secs(60));

        assert_eq!(entry.data, "test_value");
        assert_eq!(entry.expires_at - entry.created_at, 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_zero_ttl_is_expired() {
        let entry = CacheEntry::new(1u32, Duration::ZERO);
        assert_eq!(entry.created_at, entry.expires_at);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("test_value", Duration::from_millis(100));

        assert!(!entry.is_expired());

        // Wait for expiration
        sleep(Duration::from_millis(150));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_refresh_threshold() {
        let entry = CacheEntry {
            data: (),
            created_at: 1_000,
            expires_at: 11_000,
        };

        assert_eq!(entry.refresh_threshold(Duration::from_secs(10), 80), 9_000);
        assert_eq!(entry.refresh_threshold(Duration::from_secs(10), 0), 1_000);
        assert_eq!(entry.refresh_threshold(Duration::from_secs(10), 100), 11_000);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry {
            data: "test",
            created_at: 500,
            expires_at: 1_000,
        };

        assert!(!entry.is_expired_at(999));
        assert!(entry.is_expired_at(1_000), "Entry should be expired at boundary");
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = CacheEntry {
            data: 42,
            created_at: 1,
            expires_at: 2,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"data":42,"createdAt":1,"expiresAt":2}"#);
    }
}
