//! In-process cache backend.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::backend::{CacheBackend, CacheError};
use super::keys::glob_to_regex;
use super::lock::{read_entries, write_entries};

const SOURCE: &str = "cache::memory";

struct Entry {
    value: Vec<u8>,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// LRU-bounded byte cache with per-entry expiry.
///
/// Expired entries are treated as absent and dropped lazily on access.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of stored entries, including ones that expired but were not yet touched.
    pub fn len(&self) -> usize {
        read_entries(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        let mut entries = write_entries(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now().checked_add(ttl);
        write_entries(&self.entries, SOURCE, "set").put(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        write_entries(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let matcher = glob_to_regex(pattern)?;
        let now = Instant::now();
        let entries = read_entries(&self.entries, SOURCE, "keys");
        Ok(entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now) && matcher.is_match(key))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn cache(capacity: usize) -> MemoryCache {
        MemoryCache::new(NonZeroUsize::new(capacity).expect("non-zero capacity"))
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let cache = cache(8);
        assert!(cache.get("article-1").await.unwrap().is_none());

        cache.set("article-1", b"{}".to_vec(), TTL).await.unwrap();
        assert_eq!(cache.get("article-1").await.unwrap(), Some(b"{}".to_vec()));

        cache.delete("article-1").await.unwrap();
        assert!(cache.get("article-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_key_is_ok() {
        let cache = cache(8);
        assert!(cache.delete("review-404").await.is_ok());
        assert!(cache.delete("review-404").await.is_ok());
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let cache = cache(8);
        cache
            .set("article-1", b"1".to_vec(), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get("article-1").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn unrepresentable_ttl_keeps_entry_without_deadline() {
        let cache = cache(8);
        cache
            .set("article-1", b"1".to_vec(), Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert_eq!(cache.get("article-1").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(cache.keys("article-*").await.unwrap(), vec!["article-1".to_string()]);
    }

    #[tokio::test]
    async fn keys_filters_by_glob() {
        let cache = cache(8);
        for key in ["article-1", "article-2", "review-1"] {
            cache.set(key, Vec::new(), TTL).await.unwrap();
        }

        let mut keys = cache.keys("article-*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["article-1".to_string(), "article-2".to_string()]);
    }

    #[tokio::test]
    async fn lru_eviction_drops_oldest_entry() {
        let cache = cache(2);
        cache.set("a", Vec::new(), TTL).await.unwrap();
        cache.set("b", Vec::new(), TTL).await.unwrap();
        cache.set("c", Vec::new(), TTL).await.unwrap();

        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.get("b").await.unwrap().is_some());
        assert!(cache.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn recovers_from_poisoned_lock() {
        let cache = cache(2);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        cache.set("a", b"x".to_vec(), TTL).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(b"x".to_vec()));
    }
}
