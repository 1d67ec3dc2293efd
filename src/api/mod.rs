//! API Module
//!
//! HTTP handlers and routing for the operator REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Cache statistics
//! - `POST /cache/clear` - Clear the cache
//! - `DELETE /cache/:key` - Invalidate a key
//! - `GET /circuit-breaker` - Breaker metrics
//! - `POST /circuit-breaker/reset` - Reset the breaker

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
