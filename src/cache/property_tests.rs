//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the provider contract over the local store.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{hit_rate_percent, CacheProvider, MemoryStore};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: Duration = Duration::from_secs(300);

fn provider(max_entries: usize) -> CacheProvider<MemoryStore> {
    CacheProvider::new(MemoryStore::new(max_entries))
}

// == Strategies ==
/// Generates cache keys shaped like the server's model/id keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z_.]{1,16}:[0-9]{1,6}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Has { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Has { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every get counts exactly one hit or miss; has and delete count nothing.
    #[test]
    fn prop_metrics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        tokio_test::block_on(async {
            let cache = provider(TEST_MAX_ENTRIES);
            let mut expected_hits: u64 = 0;
            let mut expected_misses: u64 = 0;

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, value, TEST_TTL).await;
                    }
                    CacheOp::Get { key } => match cache.get::<String>(&key).await {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    },
                    CacheOp::Has { key } => {
                        cache.has(&key).await;
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await;
                    }
                }
            }

            let metrics = cache.metrics();
            prop_assert_eq!(metrics.hits, expected_hits);
            prop_assert_eq!(metrics.misses, expected_misses);
            prop_assert_eq!(metrics.hit_rate, hit_rate_percent(expected_hits, expected_misses));
            Ok::<(), TestCaseError>(())
        })?;
    }

    // set followed by get returns the value and has reports it.
    #[test]
    fn prop_set_then_get(key in key_strategy(), value in value_strategy()) {
        tokio_test::block_on(async {
            let cache = provider(TEST_MAX_ENTRIES);
            cache.set(&key, value.clone(), TEST_TTL).await;

            prop_assert!(cache.has(&key).await);
            prop_assert_eq!(cache.get::<String>(&key).await, Some(value));
            Ok::<(), TestCaseError>(())
        })?;
    }

    // A second set replaces the first and leaves a single entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        tokio_test::block_on(async {
            let cache = provider(TEST_MAX_ENTRIES);
            cache.set(&key, value1, TEST_TTL).await;
            cache.set(&key, value2.clone(), TEST_TTL).await;

            prop_assert_eq!(cache.get::<String>(&key).await, Some(value2));
            prop_assert_eq!(cache.stats().await.size, 1);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // The local store never holds more than its capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        tokio_test::block_on(async {
            let max_entries = 50;
            let cache = provider(max_entries);

            for (key, value) in entries {
                cache.set(&key, value, TEST_TTL).await;
                let size = cache.stats().await.size;
                prop_assert!(size <= max_entries, "Cache size {} exceeds max {}", size, max_entries);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Filling to capacity and adding one more evicts the least recently used key.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(key_strategy(), 3..10),
        new_key in key_strategy()
    ) {
        let unique_keys: Vec<String> = initial_keys
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        tokio_test::block_on(async {
            let capacity = unique_keys.len();
            let cache = provider(capacity);

            for key in &unique_keys {
                cache.set(key, format!("value_{}", key), TEST_TTL).await;
            }
            cache.set(&new_key, "new".to_string(), TEST_TTL).await;

            let stats = cache.stats().await;
            prop_assert_eq!(stats.size, capacity);
            prop_assert!(!stats.keys.contains(&unique_keys[0]));
            prop_assert!(stats.keys.contains(&new_key));
            Ok::<(), TestCaseError>(())
        })?;
    }
}
