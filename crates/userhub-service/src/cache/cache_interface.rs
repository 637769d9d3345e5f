//! Cache interface trait for abstracted caching operations.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;
use userhub_core::HubResult;

/// Cache interface for storing and retrieving cached data.
///
/// Uses JSON strings for type-erased storage to stay dyn-compatible.
#[async_trait]
pub trait CacheInterface: Send + Sync {
    /// Get a raw JSON value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> HubResult<Option<String>>;

    /// Set a raw JSON value in the cache with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> HubResult<()>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> HubResult<bool>;

    /// Releases the underlying connections. Later calls fail.
    async fn close(&self);
}

/// Extension trait with typed methods for convenience.
#[async_trait]
pub trait CacheExt: CacheInterface {
    /// Get a typed value from the cache.
    ///
    /// An entry that no longer deserializes as `T` is reported as a miss so
    /// the caller reloads it from the store and overwrites it.
    async fn get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> HubResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => match serde_json::from_str::<T>(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!("Discarding malformed cache entry '{}': {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache.
    async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> HubResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }

    /// Get a value or compute and cache it if not present.
    ///
    /// Cache errors propagate; nothing is swallowed.
    async fn get_or_set<T, F, Fut>(&self, key: &str, ttl: Duration, factory: F) -> HubResult<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = HubResult<T>> + Send,
    {
        if let Some(cached) = self.get::<T>(key).await? {
            return Ok(cached);
        }

        let value = factory().await?;
        self.set(key, &value, ttl).await?;

        Ok(value)
    }
}

// Blanket implementation for all CacheInterface implementations
impl<T: CacheInterface + ?Sized> CacheExt for T {}
