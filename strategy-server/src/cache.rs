//! Caching layer for query responses.
//!
//! The timetable is loaded once and never changes while the server runs, so
//! a response depends only on the query parameters. Entries expire after a
//! TTL to bound memory rather than for freshness.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::Mtime;
use crate::graph::StationId;
use crate::web::QueryResponse;

/// Cache key: (origin, destination, start, max_time).
pub type QueryKey = (StationId, StationId, Mtime, i32);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Cache for computed query responses.
pub struct QueryCache {
    responses: MokaCache<QueryKey, Arc<QueryResponse>>,
}

impl QueryCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let responses = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { responses }
    }

    /// Get a cached response.
    pub async fn get(&self, key: &QueryKey) -> Option<Arc<QueryResponse>> {
        self.responses.get(key).await
    }

    /// Insert a response into the cache.
    pub async fn insert(&self, key: QueryKey, response: Arc<QueryResponse>) {
        self.responses.insert(key, response).await;
    }
}
