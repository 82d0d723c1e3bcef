//! Folio cache layer
//!
//! A typed cache-aside store over a pluggable key-value backend:
//!
//! - **Redis** (`redis://...`): shared by every service instance.
//! - **Memory**: in-process LRU with per-entry expiry, used when no cache URL
//!   is configured.
//!
//! ## Failure model
//!
//! The cache is a performance layer. Backend errors and timeouts are logged
//! and counted, never returned to callers: reads fall through to the
//! authoritative loader and invalidations are dropped (bounded by TTL).
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! url = "redis://127.0.0.1:6379"
//! default_ttl_seconds = 600
//! operation_timeout_ms = 250
//! memory_capacity = 1024
//! ```

mod backend;
mod config;
mod keys;
mod lock;
mod memory;
mod redis_cache;
mod store;

pub use backend::{CacheBackend, CacheError};
pub use config::{CacheBackendKind, CacheConfig};
pub use keys::{entity_key, glob_to_regex};
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use store::CacheAside;

use std::sync::Arc;

/// Build the backend selected by `config`.
///
/// Redis connections are established lazily, so an unreachable server does not
/// prevent startup.
pub fn build_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    match config.backend()? {
        CacheBackendKind::Redis(url) => Ok(Arc::new(RedisCache::new(&url)?)),
        CacheBackendKind::Memory => Ok(Arc::new(MemoryCache::new(config.memory_capacity_non_zero()))),
    }
}
