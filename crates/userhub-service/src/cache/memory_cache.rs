//! In-process cache used when Redis is disabled.

use super::CacheInterface;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use userhub_core::{HealthCheck, HealthStatus, HubError, HubResult};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// TTL-aware map behind a mutex. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    closed: AtomicBool,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    /// Returns true when no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_open(&self) -> HubResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HubError::cache("Cache is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheInterface for MemoryCache {
    async fn get_raw(&self, key: &str) -> HubResult<Option<String>> {
        self.ensure_open()?;
        let mut entries = self.entries.lock();
        let value = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> HubResult<()> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        // Keys that are never read again would otherwise stay forever.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        drop(entries);
        debug!("Cached key '{}' with TTL {}s", key, ttl.as_secs());
        Ok(())
    }

    async fn delete(&self, key: &str) -> HubResult<bool> {
        self.ensure_open()?;
        let deleted = self.entries.lock().remove(key).is_some();
        debug!("Deleted key '{}': {}", key, deleted);
        Ok(deleted)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.entries.lock().clear();
    }
}

#[async_trait]
impl HealthCheck for MemoryCache {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthStatus {
        if self.closed.load(Ordering::Acquire) {
            HealthStatus::Unhealthy("closed".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}
