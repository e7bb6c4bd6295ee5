//! Redis cache store.

use crate::config::RedisConfig;
use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::info;

/// Redis cache store.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to the server described by `config`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tagcache_store::*;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), CacheError> {
    ///     let store = RedisStore::new(&RedisConfig::default()).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &RedisConfig) -> CacheResult<Self> {
        config.validate()?;
        let url = config.connection_url()?;

        let client = Client::open(url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        info!(host = %config.host, port = config.port, db = config.index, "Connected to Redis");

        Ok(Self { connection })
    }

    /// Get the underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection.clone();

        // SETEX rejects zero; sub-second TTLs round up to one second
        match ttl {
            Some(ttl) => {
                let ttl_seconds = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value, ttl_seconds).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn flush(&self) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }
}
