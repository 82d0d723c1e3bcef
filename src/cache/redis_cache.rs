//! Redis cache backend.

use std::time::Duration;

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tracing::info;

use super::backend::{CacheBackend, CacheError};

const SCAN_BATCH: usize = 250;

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::backend(err)
    }
}

/// Redis-backed cache sharing one multiplexed connection across requests.
///
/// The connection is opened on first use and re-opened after the manager is
/// dropped, so the process starts even when Redis is down.
pub struct RedisCache {
    client: Client,
    connection: Mutex<Option<ConnectionManager>>,
}

impl RedisCache {
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let mut guard = self.connection.lock().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }

        let manager = ConnectionManager::new(self.client.clone()).await?;
        info!(
            target = "folio::cache::redis",
            "Established redis connection"
        );
        *guard = Some(manager.clone());
        Ok(manager)
    }

    async fn reset_on_error<T>(&self, result: Result<T, redis::RedisError>) -> Result<T, CacheError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.is_connection_dropped() || err.is_io_error() {
                    self.connection.lock().await.take();
                }
                Err(CacheError::from(err))
            }
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection().await?;
        let result = redis::cmd("GET").arg(key).query_async(&mut conn).await;
        self.reset_on_error(result).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.connection().await?;
        let result = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await;
        self.reset_on_error(result).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let result: Result<i64, _> = redis::cmd("DEL").arg(key).query_async(&mut conn).await;
        self.reset_on_error(result).await.map(|_| ())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection().await?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let result: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await;
            let (next, batch) = self.reset_on_error(result).await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }
}
