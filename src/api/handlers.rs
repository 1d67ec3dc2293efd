//! API Handlers
//!
//! HTTP request handlers for the operator endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::context::ResilienceContext;
use crate::error::{ApiError, Result};
use crate::models::{CacheStatsResponse, ClearResponse, DeleteResponse, HealthResponse};
use crate::resilience::CircuitBreakerMetrics;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ResilienceContext>,
}

impl AppState {
    pub fn new(ctx: Arc<ResilienceContext>) -> Self {
        Self { ctx }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(ResilienceContext::from_config(config)))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let cache = state.ctx.cache().await;
    let stats = cache.stats().await;

    Json(CacheStatsResponse::new(
        cache.backend_name(),
        stats,
        cache.metrics(),
    ))
}

/// Handler for POST /cache/clear
///
/// Empties the cache and zeroes the hit/miss counters.
pub async fn cache_clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cache = state.ctx.cache().await;
    let cleared = cache.stats().await.size;
    cache.clear().await;

    info!(cleared, "Cache cleared via operator endpoint");
    Json(ClearResponse::new(cleared))
}

/// Handler for DELETE /cache/:key
pub async fn cache_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let cache = state.ctx.cache().await;
    if !cache.delete(&key).await {
        return Err(ApiError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /circuit-breaker
pub async fn circuit_breaker_handler(State(state): State<AppState>) -> Json<CircuitBreakerMetrics> {
    Json(state.ctx.shared_breaker().metrics())
}

/// Handler for POST /circuit-breaker/reset
pub async fn circuit_breaker_reset_handler(
    State(state): State<AppState>,
) -> Json<CircuitBreakerMetrics> {
    let breaker = state.ctx.shared_breaker();
    breaker.reset();
    Json(breaker.metrics())
}
