//! Namespaced store with versioned logical wipes.

use crate::error::CacheResult;
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

const VERSION_KEY: &str = "NamespaceVersion";

/// Store decorator that prefixes every key and supports a cheap logical wipe.
///
/// Keys are addressed as `prefix:key[version]`. [`clear`](CacheStore::clear)
/// bumps the persisted version so all earlier entries become unreachable while
/// still occupying backend memory until they expire or are flushed.
///
/// The version is cached per instance; another process bumping it is only
/// observed after [`reload_version`](Self::reload_version).
pub struct NamespacedStore<S: CacheStore> {
    inner: S,
    prefix: String,
    version: RwLock<Option<u64>>,
}

impl<S: CacheStore> NamespacedStore<S> {
    /// Wrap a store, trimming `:` from both ends of the prefix.
    pub fn new(inner: S, prefix: impl AsRef<str>) -> Self {
        Self {
            inner,
            prefix: prefix.as_ref().trim_matches(':').to_string(),
            version: RwLock::new(None),
        }
    }

    /// Namespace prefix without separators.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Underlying backend.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn version_key(&self) -> String {
        if self.prefix.is_empty() {
            format!("[{}]", VERSION_KEY)
        } else {
            format!("{}:[{}]", self.prefix, VERSION_KEY)
        }
    }

    /// Current namespace version, loading it from the backend on first use.
    pub async fn version(&self) -> CacheResult<u64> {
        if let Some(version) = *self.version.read().await {
            return Ok(version);
        }

        let mut slot = self.version.write().await;
        if let Some(version) = *slot {
            return Ok(version);
        }
        let version = self.fetch_version().await?;
        *slot = Some(version);
        Ok(version)
    }

    /// Forget the cached version so the next call re-reads it.
    pub async fn reload_version(&self) {
        *self.version.write().await = None;
    }

    async fn fetch_version(&self) -> CacheResult<u64> {
        Ok(self
            .inner
            .get_json(&self.version_key())
            .await?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1))
    }

    async fn build_key(&self, key: &str) -> CacheResult<String> {
        let version = self.version().await?;
        Ok(if self.prefix.is_empty() {
            format!("{}[{}]", key, version)
        } else {
            format!("{}:{}[{}]", self.prefix, key, version)
        })
    }
}

#[async_trait]
impl<S: CacheStore> CacheStore for NamespacedStore<S> {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let key = self.build_key(key).await?;
        self.inner.get_json(&key).await
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let key = self.build_key(key).await?;
        self.inner.set_json(&key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let key = self.build_key(key).await?;
        self.inner.delete(&key).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let key = self.build_key(key).await?;
        self.inner.exists(&key).await
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut slot = self.version.write().await;
        let current = match *slot {
            Some(version) => version,
            None => self.fetch_version().await?,
        };
        let next = current + 1;
        self.inner
            .set_json(&self.version_key(), next.to_string(), None)
            .await?;
        *slot = Some(next);

        debug!(namespace = %self.prefix, version = next, "Bumped namespace version");
        Ok(())
    }

    async fn flush(&self) -> CacheResult<()> {
        self.inner.flush().await?;
        self.reload_version().await;
        Ok(())
    }

    async fn get_many(&self, keys: &[&str]) -> CacheResult<Vec<Option<String>>> {
        let mut built = Vec::with_capacity(keys.len());
        for key in keys {
            built.push(self.build_key(key).await?);
        }
        let refs: Vec<&str> = built.iter().map(String::as_str).collect();
        self.inner.get_many(&refs).await
    }

    async fn set_many(&self, items: &[(&str, String)], ttl: Option<Duration>) -> CacheResult<()> {
        let mut built = Vec::with_capacity(items.len());
        for (key, value) in items {
            built.push((self.build_key(key).await?, value.clone()));
        }
        let refs: Vec<(&str, String)> = built
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        self.inner.set_many(&refs, ttl).await
    }

    async fn delete_many(&self, keys: &[&str]) -> CacheResult<bool> {
        let mut built = Vec::with_capacity(keys.len());
        for key in keys {
            built.push(self.build_key(key).await?);
        }
        let refs: Vec<&str> = built.iter().map(String::as_str).collect();
        self.inner.delete_many(&refs).await
    }
}
