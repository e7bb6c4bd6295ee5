//! Backend selected once at construction.

use crate::error::CacheResult;
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::time::Duration;

#[cfg(feature = "memcached")]
use crate::memcached_store::MemcachedStore;
#[cfg(feature = "redis")]
use crate::redis_store::RedisStore;

/// Concrete backend chosen from configuration.
pub enum BackendStore {
    /// Local filesystem
    File(FileStore),
    /// In-process memory
    Memory(MemoryStore),
    /// Redis server
    #[cfg(feature = "redis")]
    Redis(RedisStore),
    /// Memcached server
    #[cfg(feature = "memcached")]
    Memcached(MemcachedStore),
}

impl BackendStore {
    /// Short backend name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory(_) => "memory",
            #[cfg(feature = "redis")]
            Self::Redis(_) => "redis",
            #[cfg(feature = "memcached")]
            Self::Memcached(_) => "memcached",
        }
    }

    fn store(&self) -> &dyn CacheStore {
        match self {
            Self::File(store) => store,
            Self::Memory(store) => store,
            #[cfg(feature = "redis")]
            Self::Redis(store) => store,
            #[cfg(feature = "memcached")]
            Self::Memcached(store) => store,
        }
    }
}

impl std::fmt::Debug for BackendStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BackendStore").field(&self.name()).finish()
    }
}

impl From<FileStore> for BackendStore {
    fn from(store: FileStore) -> Self {
        Self::File(store)
    }
}

impl From<MemoryStore> for BackendStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

#[cfg(feature = "redis")]
impl From<RedisStore> for BackendStore {
    fn from(store: RedisStore) -> Self {
        Self::Redis(store)
    }
}

#[cfg(feature = "memcached")]
impl From<MemcachedStore> for BackendStore {
    fn from(store: MemcachedStore) -> Self {
        Self::Memcached(store)
    }
}

#[async_trait]
impl CacheStore for BackendStore {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        self.store().get_json(key).await
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        self.store().set_json(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.store().delete(key).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.store().exists(key).await
    }

    async fn clear(&self) -> CacheResult<()> {
        self.store().clear().await
    }

    async fn flush(&self) -> CacheResult<()> {
        self.store().flush().await
    }

    async fn get_many(&self, keys: &[&str]) -> CacheResult<Vec<Option<String>>> {
        self.store().get_many(keys).await
    }

    async fn set_many(&self, items: &[(&str, String)], ttl: Option<Duration>) -> CacheResult<()> {
        self.store().set_many(items, ttl).await
    }

    async fn delete_many(&self, keys: &[&str]) -> CacheResult<bool> {
        self.store().delete_many(keys).await
    }
}
