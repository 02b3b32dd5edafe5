//! JSON cache over the store adapter.

use crate::metrics::CacheMetrics;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use switchboard_core::{CacheError, CacheResult};
use switchboard_store::{KeyTtl, StoreAdapter};
use tracing::{debug, warn};

const COMPONENT: &str = "cache";

/// Generic JSON get/set/delete/expire over a [`StoreAdapter`].
///
/// The plain methods are best-effort: failures are logged, counted, and
/// reported as `None` / `false`. Each has a `try_*` twin that returns the
/// underlying [`CacheError`] instead.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn StoreAdapter>,
    default_ttl_secs: u64,
}

impl CacheManager {
    /// Creates a cache manager. `default_ttl_secs` is used by [`CacheManager::set`].
    #[must_use]
    pub fn new(store: Arc<dyn StoreAdapter>, default_ttl_secs: u64) -> Self {
        Self {
            store,
            default_ttl_secs,
        }
    }

    /// Returns the underlying store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StoreAdapter> {
        &self.store
    }

    /// TTL applied by [`CacheManager::set`].
    #[must_use]
    pub const fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Serializes and stores `value`.
    ///
    /// `None` stores without expiry; `Some(0)` is rejected.
    pub async fn try_set<T>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> CacheResult<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        if ttl_secs == Some(0) {
            return Err(CacheError::InvalidTtl(0));
        }

        let json = serde_json::to_string(value)?;
        match ttl_secs {
            Some(ttl) => self.store.set_with_ttl(key, &json, ttl).await?,
            None => self.store.set(key, &json).await?,
        }

        debug!(key, ttl_secs, "Cached value");
        Ok(())
    }

    /// Reads and deserializes a value.
    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => {
                let value = serde_json::from_str(&json)?;
                CacheMetrics::hit(COMPONENT);
                debug!(key, "Cache hit");
                Ok(Some(value))
            }
            None => {
                CacheMetrics::miss(COMPONENT);
                debug!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Deletes a key. Returns `true` if it existed.
    pub async fn try_delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.store.delete(key).await?)
    }

    /// Returns `true` if the key exists.
    pub async fn try_exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.store.exists(key).await?)
    }

    /// Sets a key's TTL. Returns `false` if the key does not exist.
    pub async fn try_expire(&self, key: &str, ttl_secs: u64) -> CacheResult<bool> {
        if ttl_secs == 0 {
            return Err(CacheError::InvalidTtl(0));
        }
        Ok(self.store.expire(key, ttl_secs).await?)
    }

    /// Returns a key's remaining lifetime.
    pub async fn try_ttl(&self, key: &str) -> CacheResult<KeyTtl> {
        Ok(self.store.ttl(key).await?)
    }

    /// Stores `value` with the default TTL.
    pub async fn set<T>(&self, key: &str, value: &T) -> bool
    where
        T: Serialize + ?Sized + Sync,
    {
        self.set_with_ttl(key, value, Some(self.default_ttl_secs))
            .await
    }

    /// Stores `value` with an explicit TTL (`None` for no expiry).
    pub async fn set_with_ttl<T>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> bool
    where
        T: Serialize + ?Sized + Sync,
    {
        let result = self.try_set(key, value, ttl_secs).await;
        collapse("set", key, result).is_some()
    }

    /// Reads a value; `None` if absent or on failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let result = self.try_get(key).await;
        collapse("get", key, result).flatten()
    }

    /// Deletes a key; `false` if it was absent or on failure.
    pub async fn delete(&self, key: &str) -> bool {
        let result = self.try_delete(key).await;
        collapse("delete", key, result).unwrap_or(false)
    }

    /// Returns `true` if the key exists; `false` on failure.
    pub async fn exists(&self, key: &str) -> bool {
        let result = self.try_exists(key).await;
        collapse("exists", key, result).unwrap_or(false)
    }

    /// Sets a key's TTL; `false` if the key is absent or on failure.
    pub async fn expire(&self, key: &str, ttl_secs: u64) -> bool {
        let result = self.try_expire(key, ttl_secs).await;
        collapse("expire", key, result).unwrap_or(false)
    }

    /// Returns a key's remaining lifetime; `None` on failure.
    pub async fn ttl(&self, key: &str) -> Option<KeyTtl> {
        let result = self.try_ttl(key).await;
        collapse("ttl", key, result)
    }
}

/// Logs and counts a failure, keeping only the success value.
pub(crate) fn collapse<T>(
    operation: &'static str,
    key: &str,
    result: CacheResult<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            CacheMetrics::error(COMPONENT, operation, e.kind());
            warn!(operation, key, error = %e, "Cache operation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::time::Duration;
    use switchboard_store::MemoryStore;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        tags: Vec<String>,
        score: Option<u32>,
    }

    fn profile() -> Profile {
        Profile {
            name: "ada".to_string(),
            tags: vec!["admin".to_string(), "ops".to_string()],
            score: Some(7),
        }
    }

    fn manager() -> (Arc<MemoryStore>, CacheManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = CacheManager::new(store.clone(), 3600);
        (store, manager)
    }

    #[tokio::test]
    async fn test_set_then_get_returns_equal_value() {
        let (_, cache) = manager();
        assert!(cache.set("profile:1", &profile()).await);
        assert_eq!(cache.get::<Profile>("profile:1").await, Some(profile()));
        assert_eq!(cache.ttl("profile:1").await, Some(KeyTtl::Expires(3600)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_expires() {
        let (_, cache) = manager();
        assert!(cache.set_with_ttl("k", &"v", Some(1)).await);
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(cache.get::<String>("k").await, None);
    }

    #[tokio::test]
    async fn test_no_ttl_persists() {
        let (_, cache) = manager();
        assert!(cache.set_with_ttl("k", &1, None).await);
        assert_eq!(cache.ttl("k").await, Some(KeyTtl::Persistent));
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let (_, cache) = manager();
        assert!(matches!(
            cache.try_set("k", &1, Some(0)).await,
            Err(CacheError::InvalidTtl(0))
        ));
        assert!(!cache.set_with_ttl("k", &1, Some(0)).await);
        assert!(!cache.exists("k").await);

        cache.set("k", &1).await;
        assert!(!cache.expire("k", 0).await);
        assert!(cache.exists("k").await);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_, cache) = manager();
        cache.set("k", &1).await;
        assert!(cache.delete("k").await);
        assert!(!cache.delete("k").await);
        assert!(!cache.exists("k").await);
    }

    #[tokio::test]
    async fn test_decode_failure_is_a_miss() {
        let (store, cache) = manager();
        store.set("k", "not json").await.unwrap();
        assert_eq!(cache.get::<Profile>("k").await, None);
        assert!(matches!(
            cache.try_get::<Profile>("k").await,
            Err(CacheError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_outage_is_swallowed() {
        let (store, cache) = manager();
        cache.set("k", &1).await;
        store.set_available(false);

        assert!(!cache.set("k", &2).await);
        assert_eq!(cache.get::<i32>("k").await, None);
        assert!(!cache.delete("k").await);
        assert!(!cache.exists("k").await);
        assert!(!cache.expire("k", 10).await);
        assert_eq!(cache.ttl("k").await, None);

        let err = cache.try_get::<i32>("k").await.unwrap_err();
        assert!(err.is_store_failure());
    }
}
