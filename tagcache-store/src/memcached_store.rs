//! Memcached cache store.

use crate::config::MemcacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Relative expirations beyond this many seconds are read by memcached as
/// absolute unix timestamps.
const MAX_RELATIVE_EXPIRATION: u64 = 30 * 24 * 3600;

/// Memcached cache store.
///
/// Note: The `memcache` crate doesn't have native async support,
/// so we wrap it with tokio's Mutex and use spawn_blocking for operations.
#[derive(Clone)]
pub struct MemcachedStore {
    client: Arc<Mutex<memcache::Client>>,
}

impl MemcachedStore {
    /// Connect to the server described by `config`.
    pub async fn new(config: &MemcacheConfig) -> CacheResult<Self> {
        config.validate()?;
        let server_url = config.connection_url();

        let client = tokio::task::spawn_blocking(move || memcache::connect(server_url.as_str()))
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to spawn task: {}", e)))?
            .map_err(|e| CacheError::Connection(format!("Failed to connect: {}", e)))?;

        info!(host = %config.host, port = config.port, "Connected to Memcached");

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
        })
    }

    /// Convert a TTL to a memcached expiration value.
    fn expiration(ttl: Option<Duration>, now: i64) -> u32 {
        match ttl.map(|d| d.as_secs()) {
            None | Some(0) => 0,
            Some(secs) if secs <= MAX_RELATIVE_EXPIRATION => secs as u32,
            Some(secs) => {
                let absolute = (now.max(0) as u64).saturating_add(secs);
                u32::try_from(absolute).unwrap_or(u32::MAX)
            }
        }
    }

    async fn run<T, F>(&self, op: F) -> CacheResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&memcache::Client) -> Result<T, memcache::MemcacheError> + Send + 'static,
    {
        let client = self.client.clone();
        let result = tokio::task::spawn_blocking(move || {
            let client = client.blocking_lock();
            op(&client)
        })
        .await
        .map_err(|e| CacheError::Other(format!("Task join error: {}", e)))??;
        Ok(result)
    }
}

#[async_trait]
impl CacheStore for MemcachedStore {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let key = key.to_string();
        self.run(move |client| client.get::<String>(&key)).await
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let key = key.to_string();
        let expiration = Self::expiration(ttl, chrono::Utc::now().timestamp());
        self.run(move |client| client.set(&key, value, expiration))
            .await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let key = key.to_string();
        self.run(move |client| client.delete(&key)).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        // Memcached doesn't have a native "exists" command
        Ok(self.get_json(key).await?.is_some())
    }

    async fn flush(&self) -> CacheResult<()> {
        self.run(|client| client.flush()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_conversion() {
        assert_eq!(MemcachedStore::expiration(None, 1_000), 0);
        assert_eq!(MemcachedStore::expiration(Some(Duration::ZERO), 1_000), 0);
        assert_eq!(
            MemcachedStore::expiration(Some(Duration::from_secs(60)), 1_000),
            60
        );

        let long = Duration::from_secs(MAX_RELATIVE_EXPIRATION + 1);
        assert_eq!(
            MemcachedStore::expiration(Some(long), 1_000),
            (1_000 + MAX_RELATIVE_EXPIRATION + 1) as u32
        );
    }
}
