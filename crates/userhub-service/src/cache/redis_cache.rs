//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use std::time::Duration;
use tracing::{debug, info};
use userhub_config::RedisConfig;
use userhub_core::{HealthCheck, HealthStatus, HubError, HubResult};

/// Default TTL for cached items (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Redis-based cache service.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates the connection pool and verifies it with `PING`.
    pub async fn connect(config: &RedisConfig) -> HubResult<Self> {
        info!("Connecting to Redis at {}:{}...", config.host, config.port);

        let pool = Config::from_url(config.url())
            .builder()
            .map_err(|e| HubError::Configuration(format!("Invalid Redis config: {e}")))?
            .max_size(config.pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| HubError::Configuration(format!("Failed to create Redis pool: {e}")))?;

        let cache = Self::new(pool);
        cache.ping().await?;

        info!("Redis connection pool created successfully");
        Ok(cache)
    }

    /// Round-trips a `PING`.
    pub async fn ping(&self) -> HubResult<()> {
        let mut conn = self.get_conn().await?;
        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| HubError::Cache(format!("PING failed: {e}")))?;
        Ok(())
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> HubResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| HubError::Cache(format!("Failed to get Redis connection: {e}")))
    }
}

#[async_trait]
impl CacheInterface for RedisCache {
    async fn get_raw(&self, key: &str) -> HubResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| HubError::Cache(format!("Failed to get key '{key}': {e}")))?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> HubResult<()> {
        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| HubError::Cache(format!("Failed to set key '{key}': {e}")))?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> HubResult<bool> {
        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| HubError::Cache(format!("Failed to delete key '{key}': {e}")))?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn close(&self) {
        info!("Closing Redis connection pool...");
        self.pool.close();
        info!("Redis connection pool closed");
    }
}

#[async_trait]
impl HealthCheck for RedisCache {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthStatus {
        match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisCache")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}
