//! Odoo CRM Resilience - caching and fault isolation for an ERP integration server
//!
//! Provides a TTL cache with stale-while-revalidate reads over a local or
//! Redis backend, a shared circuit breaker for the upstream ERP, and a
//! retry executor that separates transient from permanent failures.

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod resilience;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use context::ResilienceContext;
pub use tasks::spawn_cleanup_task;
