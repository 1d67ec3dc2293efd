//! API Routes
//!
//! Configures the Axum router with the operator endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_clear_handler, cache_delete_handler, cache_stats_handler, circuit_breaker_handler,
    circuit_breaker_reset_handler, health_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /cache/stats` - Cache size, keys and hit rate
/// - `POST /cache/clear` - Drop every entry
/// - `DELETE /cache/:key` - Invalidate one key
/// - `GET /circuit-breaker` - Shared breaker metrics
/// - `POST /circuit-breaker/reset` - Force the breaker closed
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/clear", post(cache_clear_handler))
        .route("/cache/:key", delete(cache_delete_handler))
        .route("/circuit-breaker", get(circuit_breaker_handler))
        .route("/circuit-breaker/reset", post(circuit_breaker_reset_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
