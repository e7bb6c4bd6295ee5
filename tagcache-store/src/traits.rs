//! Cache store trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Uniform key-value contract every backend implements.
///
/// Values are opaque JSON strings; typed access lives in the facade.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a JSON value from the cache.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(value))` if the key exists, `Ok(None)` if not found,
    /// or an error if the operation fails.
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a JSON value in the cache.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    /// * `value` - The JSON string value
    /// * `ttl` - Optional time-to-live duration, `None` never expires
    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete a key from the cache.
    ///
    /// Returns `true` if an entry was removed, `false` if there was none.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Check if a key exists in the cache.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Logically remove every entry.
    ///
    /// Backends without a cheaper logical wipe fall back to [`flush`](Self::flush).
    async fn clear(&self) -> CacheResult<()> {
        self.flush().await
    }

    /// Physically remove every entry, reclaiming backend memory.
    ///
    /// **Warning:** This operation may be destructive and affect all keys.
    async fn flush(&self) -> CacheResult<()>;

    // ========== Batch Operations ==========

    /// Get multiple keys concurrently.
    ///
    /// Returns a vector of `Option<String>` in the same order as the input keys.
    async fn get_many(&self, keys: &[&str]) -> CacheResult<Vec<Option<String>>> {
        use futures::future::try_join_all;

        let futures = keys.iter().map(|key| self.get_json(key));
        try_join_all(futures).await
    }

    /// Set multiple key-value pairs concurrently.
    async fn set_many(&self, items: &[(&str, String)], ttl: Option<Duration>) -> CacheResult<()> {
        use futures::future::try_join_all;

        let futures = items
            .iter()
            .map(|(key, value)| self.set_json(key, value.clone(), ttl));

        try_join_all(futures).await?;
        Ok(())
    }

    /// Delete multiple keys concurrently.
    ///
    /// Returns `true` only if every key had an entry to remove.
    async fn delete_many(&self, keys: &[&str]) -> CacheResult<bool> {
        use futures::future::try_join_all;

        let futures = keys.iter().map(|key| self.delete(key));
        let removed = try_join_all(futures).await?;
        Ok(removed.into_iter().all(|r| r))
    }
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).get_json(key).await
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        (**self).set_json(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        (**self).exists(key).await
    }

    async fn clear(&self) -> CacheResult<()> {
        (**self).clear().await
    }

    async fn flush(&self) -> CacheResult<()> {
        (**self).flush().await
    }

    async fn get_many(&self, keys: &[&str]) -> CacheResult<Vec<Option<String>>> {
        (**self).get_many(keys).await
    }

    async fn set_many(&self, items: &[(&str, String)], ttl: Option<Duration>) -> CacheResult<()> {
        (**self).set_many(items, ttl).await
    }

    async fn delete_many(&self, keys: &[&str]) -> CacheResult<bool> {
        (**self).delete_many(keys).await
    }
}
