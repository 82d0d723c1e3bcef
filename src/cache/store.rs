//! Typed cache-aside store.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::backend::{CacheBackend, CacheError};

const METRIC_CACHE_HIT: &str = "folio_cache_hit_total";
const METRIC_CACHE_MISS: &str = "folio_cache_miss_total";
const METRIC_CACHE_ERROR: &str = "folio_cache_error_total";
const METRIC_CACHE_INVALIDATION: &str = "folio_cache_invalidation_total";

/// Get-or-populate wrapper over a byte backend for values of type `T`.
///
/// Values are stored as JSON. Absent loader results are never cached, and no
/// backend failure ever reaches the caller.
pub struct CacheAside<T> {
    backend: Arc<dyn CacheBackend>,
    resource: &'static str,
    default_ttl: Duration,
    operation_timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheAside<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            resource: self.resource,
            default_ttl: self.default_ttl,
            operation_timeout: self.operation_timeout,
            _marker: PhantomData,
        }
    }
}

impl<T> CacheAside<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// `resource` labels logs and metrics for this store.
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        resource: &'static str,
        default_ttl: Duration,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            resource,
            default_ttl,
            operation_timeout,
            _marker: PhantomData,
        }
    }

    /// Return the cached value for `key`, or run `factory` and cache its result.
    ///
    /// `factory` errors propagate unchanged. An `Ok(None)` from `factory` is
    /// returned as-is and leaves the cache untouched. When the backend read
    /// fails, the factory result is returned without attempting a write.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<Duration>,
    ) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let mut degraded = false;

        match self.bounded("get", self.backend.get(key)).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HIT, "resource" => self.resource).increment(1);
                    return Ok(Some(value));
                }
                Err(err) => {
                    self.record_error("decode", key, &CacheError::from(err));
                    self.remove(key).await;
                }
            },
            Ok(None) => {}
            Err(err) => {
                self.record_error("get", key, &err);
                degraded = true;
            }
        }

        counter!(METRIC_CACHE_MISS, "resource" => self.resource).increment(1);
        let value = factory().await?;

        if let Some(found) = value.as_ref()
            && !degraded
        {
            self.store(key, found, ttl.unwrap_or(self.default_ttl)).await;
        }

        Ok(value)
    }

    /// Drop `key`. Missing keys and backend failures are not errors.
    pub async fn remove(&self, key: &str) {
        match self.bounded("delete", self.backend.delete(key)).await {
            Ok(()) => {
                counter!(METRIC_CACHE_INVALIDATION, "resource" => self.resource).increment(1);
                debug!(
                    target = "folio::cache",
                    resource = self.resource,
                    key,
                    "Invalidated cache entry"
                );
            }
            Err(err) => self.record_error("delete", key, &err),
        }
    }

    /// Drop every key matching the glob `pattern`; returns how many were deleted.
    ///
    /// Keys written while the enumeration runs may survive.
    pub async fn remove_by_pattern(&self, pattern: &str) -> usize {
        let keys = match self.bounded("keys", self.backend.keys(pattern)).await {
            Ok(keys) => keys,
            Err(err) => {
                self.record_error("keys", pattern, &err);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            match self.bounded("delete", self.backend.delete(&key)).await {
                Ok(()) => removed += 1,
                Err(err) => self.record_error("delete", &key, &err),
            }
        }

        counter!(METRIC_CACHE_INVALIDATION, "resource" => self.resource).increment(removed as u64);
        debug!(
            target = "folio::cache",
            resource = self.resource,
            pattern,
            removed,
            "Invalidated cache entries by pattern"
        );
        removed
    }

    async fn store(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.record_error("encode", key, &CacheError::from(err));
                return;
            }
        };

        if let Err(err) = self.bounded("set", self.backend.set(key, bytes, ttl)).await {
            self.record_error("set", key, &err);
        }
    }

    async fn bounded<R>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<R, CacheError>>,
    ) -> Result<R, CacheError> {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                op,
                timeout_ms: self.operation_timeout.as_millis(),
            }),
        }
    }

    fn record_error(&self, op: &'static str, key: &str, err: &CacheError) {
        counter!(METRIC_CACHE_ERROR, "resource" => self.resource, "op" => op).increment(1);
        warn!(
            target = "folio::cache",
            op,
            resource = self.resource,
            key,
            error = %err,
            "Cache operation failed; continuing without cache"
        );
    }
}
