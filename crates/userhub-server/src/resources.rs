//! Long-lived connections shared by every request.

use std::sync::Arc;
use tracing::{info, warn};
use userhub_config::AppConfig;
use userhub_core::{HealthCheck, HubResult};
use userhub_repository::{DatabasePool, MySqlUserRepository};
use userhub_rest::AppState;
use userhub_security::PasswordHasher;
use userhub_service::{CacheInterface, MemoryCache, RedisCache, UserService, UserServiceImpl};

/// Store and cache handles, opened once at startup and closed on shutdown.
pub struct Resources {
    db_pool: Arc<DatabasePool>,
    cache: Arc<dyn CacheInterface>,
    cache_health: Arc<dyn HealthCheck>,
}

impl Resources {
    /// Connects the MySQL pool, applies migrations when configured and opens
    /// the cache. Redis is verified with `PING`; with Redis disabled an
    /// in-process cache is used instead.
    pub async fn connect(config: &AppConfig) -> HubResult<Self> {
        let db_pool = DatabasePool::new(&config.database).await?;

        if config.database.run_migrations {
            if let Err(e) = db_pool.run_migrations().await {
                db_pool.close().await;
                return Err(e);
            }
        }

        let (cache, cache_health) = if config.redis.enabled {
            match RedisCache::connect(&config.redis).await {
                Ok(redis) => shared(redis),
                Err(e) => {
                    db_pool.close().await;
                    return Err(e);
                }
            }
        } else {
            warn!("Redis is disabled, falling back to the in-process cache");
            shared(MemoryCache::new())
        };

        Ok(Self {
            db_pool: Arc::new(db_pool),
            cache,
            cache_health,
        })
    }

    /// Builds the user service on top of these resources.
    #[must_use]
    pub fn user_service(&self, config: &AppConfig) -> Arc<dyn UserService> {
        let repository = Arc::new(MySqlUserRepository::new(self.db_pool.clone()));
        let hasher = Arc::new(PasswordHasher::with_cost(config.security.password_hash_cost));

        Arc::new(
            UserServiceImpl::new(repository, hasher, self.cache.clone())
                .with_cache_ttl(config.cache.ttl()),
        )
    }

    /// Application state with the service and both readiness checks.
    #[must_use]
    pub fn app_state(&self, config: &AppConfig) -> AppState {
        AppState::new(self.user_service(config))
            .with_health_check(self.db_pool.clone())
            .with_health_check(self.cache_health.clone())
    }

    /// Closes the cache, then the store.
    pub async fn close(&self) {
        info!("Releasing resources...");
        self.cache.close().await;
        self.db_pool.close().await;
    }
}

fn shared<C>(cache: C) -> (Arc<dyn CacheInterface>, Arc<dyn HealthCheck>)
where
    C: CacheInterface + HealthCheck + 'static,
{
    let cache = Arc::new(cache);
    let health: Arc<dyn HealthCheck> = cache.clone();
    let cache: Arc<dyn CacheInterface> = cache;
    (cache, health)
}
