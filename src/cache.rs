//! Generic expiring key-value cache
//!
//! Backs the market-data gateway's query memoization. Entries are replaced
//! wholesale and evicted lazily on read, so there are no partial-update races.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// TTL-based in-memory cache keyed by query signature.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a value if present and not expired. Expired entries are removed.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but is stale: evict under the write lock.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_before_expiry() {
        let cache = TtlCache::new();
        cache.set("tokens", 42u64, Duration::from_secs(30)).await;
        assert_eq!(cache.get("tokens").await, Some(42));
    }

    #[tokio::test]
    async fn absent_after_expiry() {
        let cache = TtlCache::new();
        cache.set("tokens", 42u64, Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get("tokens").await, None);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache: TtlCache<String> = TtlCache::new();
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test]
    async fn replace_updates_value_and_ttl() {
        let cache = TtlCache::new();
        cache.set("k", 1u64, Duration::from_millis(10)).await;
        cache.set("k", 2u64, Duration::from_secs(30)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await, Some(2));
    }

    #[test]
    fn clear_removes_everything() {
        tokio_test::block_on(async {
            let cache = TtlCache::new();
            cache.set("a", 1u64, Duration::from_secs(30)).await;
            cache.set("b", 2u64, Duration::from_secs(30)).await;
            cache.clear().await;
            assert_eq!(cache.get("a").await, None);
            assert_eq!(cache.get("b").await, None);
        });
    }
}
