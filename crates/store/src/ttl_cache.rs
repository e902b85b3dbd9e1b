//! In-process expiring key-value cache.
//!
//! Backs the Ephemeral Cache seam with `SET key value EX seconds` / `GET key`
//! semantics. Entries expire lazily: an expired entry is removed the next
//! time its key is read. Deliberately independent of the context store — a
//! store outage never affects cache reads and vice versa.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use guildmind_core::error::CacheError;
use guildmind_core::store::EphemeralCache;

struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// An expiring key-value store held in process memory.
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EphemeralCache for TtlCache {
    fn name(&self) -> &str {
        "ttl_cache"
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: Utc::now() + ttl,
        };
        // Overwriting resets the TTL.
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Utc::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {} // expired, drop below
                None => return Ok(None),
            }
        }

        self.entries.write().await.remove(key);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get() {
        let cache = TtlCache::new();
        cache.put("k", "v", Duration::hours(24)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn never_set_is_absent() {
        let cache = TtlCache::new();
        assert!(cache.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_absent() {
        let cache = TtlCache::new();
        cache.put("k", "v", Duration::zero()).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        // And it was evicted, not just hidden.
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn overwrite_resets_ttl() {
        let cache = TtlCache::new();
        cache.put("k", "old", Duration::zero()).await.unwrap();
        cache.put("k", "new", Duration::hours(1)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn live_entry_count_skips_expired() {
        let cache = TtlCache::new();
        cache.put("live", "v", Duration::hours(1)).await.unwrap();
        cache.put("dead", "v", Duration::zero()).await.unwrap();
        assert_eq!(cache.len().await, 1);
    }
}
