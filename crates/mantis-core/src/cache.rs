//! Small TTL cache used for catalog reads.
//!
//! Entries expire on read: an expired entry is no longer returned by
//! [`Cache::get`] but stays available through [`Cache::get_stale`] until it
//! is overwritten or the cache is cleared, so a caller can fall back to the
//! last known value when its loader fails. There is no size bound or
//! background eviction.
//!
//! Values are stored as `serde_json::Value` so one cache instance can hold
//! differently typed catalogs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Cache interface injected into services.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fresh value for `key`, if any.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Value for `key` even if it has expired.
    async fn get_stale(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Drop every entry.
    async fn clear(&self);
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-process cache backed by a `HashMap`.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, fresh or expired.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(subsystem = "cache", cache_key = key, "Cache HIT");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(subsystem = "cache", cache_key = key, "Cache EXPIRED");
                None
            }
            None => {
                debug!(subsystem = "cache", cache_key = key, "Cache MISS");
                None
            }
        }
    }

    async fn get_stale(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).map(|e| e.value.clone())
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Cache that never stores anything (caching disabled).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn get_stale(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) {}

    async fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_fresh_value() {
        let cache = MemoryCache::new();
        cache.set("clientes", json!([1, 2]), TTL).await;
        assert_eq!(cache.get("clientes").await, Some(json!([1, 2])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_value_is_not_returned() {
        let cache = MemoryCache::new();
        cache.set("clientes", json!("v"), TTL).await;

        tokio::time::advance(TTL + Duration::from_millis(1)).await;

        assert_eq!(cache.get("clientes").await, None);
        // still reachable as a stale fallback
        assert_eq!(cache.get_stale("clientes").await, Some(json!("v")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_refreshes_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), TTL).await;
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.set("k", json!(2), TTL).await;
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get("k").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_clear_empties_everything() {
        let cache = MemoryCache::new();
        cache.set("a", json!(1), TTL).await;
        cache.set("b", json!(2), TTL).await;
        assert_eq!(cache.len().await, 2);

        cache.clear().await;

        assert!(cache.is_empty().await);
        assert_eq!(cache.get_stale("a").await, None);
    }

    #[tokio::test]
    async fn test_noop_cache_stores_nothing() {
        let cache = NoopCache;
        cache.set("a", json!(1), TTL).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get_stale("a").await, None);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.set("a", json!(true), TTL).await;
        assert_eq!(other.get("a").await, Some(json!(true)));
    }
}
