//! Caching infrastructure for the service layer.
//!
//! A cache abstraction with a Redis implementation and an in-process one for
//! single-node runs and tests. Values are stored as JSON strings.

mod cache_interface;
pub mod cache_keys;
mod memory_cache;
mod redis_cache;

pub use cache_interface::{CacheExt, CacheInterface};
pub use memory_cache::MemoryCache;
pub use redis_cache::{RedisCache, DEFAULT_TTL};
