//! Integration tests for cache, breaker and retry working together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use odoo_crm_resilience::cache::{create_cache, CacheProvider, MemoryStore};
use odoo_crm_resilience::config::{CacheConfig, CircuitBreakerConfig, Config, RetryConfig};
use odoo_crm_resilience::error::BreakerError;
use odoo_crm_resilience::resilience::CircuitState;
use odoo_crm_resilience::ResilienceContext;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Lead {
    id: u32,
    name: String,
}

fn context(failure_threshold: u32, reset_timeout: Duration) -> Arc<ResilienceContext> {
    Arc::new(ResilienceContext::from_config(&Config {
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold,
            reset_timeout,
            half_open_max_attempts: 1,
        },
        retry: RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(5),
        },
        ..Config::default()
    }))
}

#[tokio::test]
async fn test_entry_expires_end_to_end() {
    let cache = create_cache(&CacheConfig::default()).await;

    assert!(cache.set("x", 42u32, Duration::from_millis(1000)).await);
    assert_eq!(cache.get::<u32>("x").await, Some(42));

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(cache.get::<u32>("x").await, None);
    assert!(!cache.stats().await.keys.contains(&"x".to_string()));
}

#[tokio::test]
async fn test_cached_upstream_read() {
    let ctx = context(3, Duration::from_secs(30));
    let cache = ctx.cache().await;
    let upstream_calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let ctx = Arc::clone(&ctx);
        let calls = Arc::clone(&upstream_calls);
        let lead = cache
            .get_with_refresh(
                "crm.lead:17",
                move || async move {
                    ctx.call_upstream(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(Lead {
                            id: 17,
                            name: "Big deal".to_string(),
                        })
                    })
                    .await
                },
                Duration::from_secs(300),
            )
            .await;

        assert_eq!(lead.map(|l| l.id).ok(), Some(17));
    }

    assert_eq!(upstream_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.metrics().hits, 2);
    assert_eq!(ctx.circuit_breaker().metrics().success_count, 1);
}

#[tokio::test]
async fn test_outage_opens_breaker_and_nothing_is_cached() {
    let ctx = context(2, Duration::from_secs(30));
    let cache = ctx.cache().await;
    let upstream_calls = Arc::new(AtomicUsize::new(0));

    let fetch_ctx = Arc::clone(&ctx);
    let calls = Arc::clone(&upstream_calls);
    let result = cache
        .get_with_refresh(
            "crm.lead:99",
            move || async move {
                fetch_ctx
                    .call_upstream(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err::<Lead, _>("socket hang up".to_string())
                    })
                    .await
            },
            Duration::from_secs(300),
        )
        .await;

    match result {
        Err(BreakerError::Open(e)) => assert_eq!(e.retry_after_secs, 30),
        other => panic!("expected open circuit, got {:?}", other),
    }
    assert_eq!(upstream_calls.load(Ordering::SeqCst), 2);
    assert_eq!(ctx.shared_breaker().state(), CircuitState::Open);
    assert!(!cache.has("crm.lead:99").await);
}

#[tokio::test]
async fn test_recovery_after_reset_timeout() {
    let ctx = context(1, Duration::from_millis(100));

    let result = ctx
        .call_upstream(|| async { Err::<(), _>("Invalid credentials".to_string()) })
        .await;
    assert!(matches!(result, Err(BreakerError::Inner(_))));
    assert_eq!(ctx.shared_breaker().state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let result = ctx.call_upstream(|| async { Ok::<_, String>("pong") }).await;
    assert_eq!(result.ok(), Some("pong"));
    assert_eq!(ctx.shared_breaker().state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_stale_value_served_during_outage() {
    let cache = CacheProvider::new(MemoryStore::new(10));
    let ttl = Duration::from_millis(400);
    cache
        .set(
            "crm.lead:5",
            Lead {
                id: 5,
                name: "Cached".to_string(),
            },
            ttl,
        )
        .await;

    tokio::time::sleep(Duration::from_millis(250)).await;

    let lead = cache
        .get_with_refresh_at(
            "crm.lead:5",
            || async { Err::<Lead, _>("503 Service Unavailable".to_string()) },
            ttl,
            50,
        )
        .await;
    assert_eq!(lead.map(|l| l.name).ok().as_deref(), Some("Cached"));

    // The failed background refresh leaves the stale entry in place
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!cache.is_refreshing("crm.lead:5"));
    assert!(cache.has("crm.lead:5").await);
}
