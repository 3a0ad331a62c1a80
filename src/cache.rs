use crate::models::SearchResponse;
use moka::future::Cache;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Maximum number of cached search responses.
pub const SEARCH_CACHE_CAPACITY: u64 = 10_000;

/// Search responses keyed by a SHA-256 digest of the request body.
///
/// Identical bodies within the TTL are served without contacting the index.
/// A disabled cache never stores anything.
#[derive(Clone)]
pub struct SearchCache {
    inner: Option<Cache<String, SearchResponse>>,
}

impl SearchCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        let inner = ttl.map(|ttl| {
            Cache::builder()
                .time_to_live(ttl)
                .max_capacity(SEARCH_CACHE_CAPACITY)
                .build()
        });
        Self { inner }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Hex SHA-256 of the serialized body.
    pub fn key_for(body: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub async fn get(&self, key: &str) -> Option<SearchResponse> {
        let cached = self.inner.as_ref()?.get(key).await;
        if cached.is_some() {
            tracing::debug!(key = &key[..12.min(key.len())], "Search cache hit");
        }
        cached
    }

    pub async fn insert(&self, key: String, response: SearchResponse) {
        if let Some(cache) = &self.inner {
            cache.insert(key, response).await;
        }
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
