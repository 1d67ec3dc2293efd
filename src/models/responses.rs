//! Response DTOs for the operator API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheMetrics, CacheStats};

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    /// Backend in use ("memory" or "redis")
    pub backend: String,
    pub size: usize,
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    /// Integer percentage of gets that were hits
    pub hit_rate: u64,
}

impl CacheStatsResponse {
    pub fn new(backend: impl Into<String>, stats: CacheStats, metrics: CacheMetrics) -> Self {
        Self {
            backend: backend.into(),
            size: stats.size,
            keys: stats.keys,
            hits: metrics.hits,
            misses: metrics.misses,
            hit_rate: metrics.hit_rate,
        }
    }
}

/// Response body for DELETE /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for POST /cache/clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries held by the cache before the clear
    pub cleared: usize,
}

impl ClearResponse {
    pub fn new(cleared: usize) -> Self {
        Self {
            message: "Cache cleared".to_string(),
            cleared,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_flattens_stats_and_metrics() {
        let stats = CacheStats {
            size: 2,
            keys: vec!["crm.lead:1".to_string(), "crm.lead:2".to_string()],
        };
        let resp = CacheStatsResponse::new("memory", stats, CacheMetrics::new(3, 1));

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["backend"], "memory");
        assert_eq!(json["size"], 2);
        assert_eq!(json["hits"], 3);
        assert_eq!(json["hit_rate"], 75);
        assert_eq!(json["keys"][1], "crm.lead:2");
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_clear_response_serialize() {
        let json = serde_json::to_value(ClearResponse::new(4)).unwrap();
        assert_eq!(json["cleared"], 4);
        assert_eq!(json["message"], "Cache cleared");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
