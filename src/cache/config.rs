//! Cache configuration.
//!
//! Selects the backend and the deadlines applied to every cache call.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use super::backend::CacheError;

const DEFAULT_TTL_SECONDS: u64 = 600;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 250;
const DEFAULT_MEMORY_CAPACITY: usize = 1024;

/// Cache configuration from the `[cache]` settings section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `redis://` URL; absent or `memory://` selects the in-process backend.
    pub url: Option<String>,
    /// TTL applied when a caller does not pass one.
    pub default_ttl_seconds: u64,
    /// Deadline for a single backend round-trip.
    pub operation_timeout_ms: u64,
    /// Maximum entries held by the in-process backend.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis(String),
    Memory,
}

impl CacheConfig {
    pub fn backend(&self) -> Result<CacheBackendKind, CacheError> {
        let Some(url) = self.url.as_deref().map(str::trim).filter(|url| !url.is_empty()) else {
            return Ok(CacheBackendKind::Memory);
        };

        if url.starts_with("redis://") || url.starts_with("rediss://") {
            Ok(CacheBackendKind::Redis(url.to_string()))
        } else if url.starts_with("memory://") {
            Ok(CacheBackendKind::Memory)
        } else {
            Err(CacheError::Configuration(format!(
                "unsupported cache url scheme in `{url}`"
            )))
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds.max(1))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms.max(1))
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.url, None);
        assert_eq!(config.default_ttl(), Duration::from_secs(600));
        assert_eq!(config.operation_timeout(), Duration::from_millis(250));
        assert_eq!(config.memory_capacity, 1024);
    }

    #[test]
    fn missing_url_selects_memory() {
        let config = CacheConfig::default();
        assert_eq!(config.backend().unwrap(), CacheBackendKind::Memory);

        let blank = CacheConfig {
            url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.backend().unwrap(), CacheBackendKind::Memory);
    }

    #[test]
    fn redis_url_selects_redis() {
        let config = CacheConfig {
            url: Some("redis://cache:6379/0".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.backend().unwrap(),
            CacheBackendKind::Redis("redis://cache:6379/0".to_string())
        );
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let config = CacheConfig {
            url: Some("memcached://cache".to_string()),
            ..Default::default()
        };
        assert!(config.backend().is_err());
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            memory_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.memory_capacity_non_zero().get(), 1);
    }
}
