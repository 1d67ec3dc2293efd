//! Cache Statistics Module
//!
//! Hit/miss counters and the snapshots reported by the provider.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Live entries visible to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

// == Cache Metrics ==
/// Request counters with the rounded hit-rate percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    /// `round(100 * hits / (hits + misses))`, 0 when there were no requests
    pub hit_rate: u64,
}

impl CacheMetrics {
    pub fn new(hits: u64, misses: u64) -> Self {
        Self {
            hits,
            misses,
            hit_rate: hit_rate_percent(hits, misses),
        }
    }
}

// == Hit Rate ==
pub fn hit_rate_percent(hits: u64, misses: u64) -> u64 {
    let total = hits + misses;
    if total == 0 {
        0
    } else {
        (100.0 * hits as f64 / total as f64).round() as u64
    }
}

/// Lock-free hit/miss counters.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheMetrics {
        CacheMetrics::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(hit_rate_percent(0, 0), 0);
    }

    #[test]
    fn test_hit_rate_rounding() {
        assert_eq!(hit_rate_percent(1, 2), 33);
        assert_eq!(hit_rate_percent(2, 1), 67);
        assert_eq!(hit_rate_percent(1, 1), 50);
        assert_eq!(hit_rate_percent(3, 0), 100);
        assert_eq!(hit_rate_percent(0, 4), 0);
    }

    #[test]
    fn test_counters_snapshot_and_reset() {
        let counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();

        assert_eq!(
            counters.snapshot(),
            CacheMetrics {
                hits: 3,
                misses: 1,
                hit_rate: 75
            }
        );

        counters.reset();
        assert_eq!(counters.snapshot(), CacheMetrics::default());
    }
}
