//! Backend construction from configuration.

use crate::config::{BackendKind, CacheConfig};
use tagcache_store::{BackendStore, CacheError, CacheResult, FileStore, MemoryStore};
use tracing::{info, warn};

/// Open the store selected by `config`.
///
/// A remote backend whose driver is not compiled in falls back to the file
/// backend, which then requires `path`.
pub async fn open_backend(config: &CacheConfig) -> CacheResult<BackendStore> {
    let kind = config.effective_backend();
    if kind != config.backend {
        warn!(
            requested = %config.backend,
            "Cache driver not available, falling back to file store"
        );
    }
    config.validate()?;

    let store = match kind {
        BackendKind::File => {
            let path = config
                .path
                .clone()
                .ok_or_else(|| CacheError::Config("cache path is empty".to_string()))?;
            BackendStore::from(FileStore::with_path(path).await?)
        }
        BackendKind::Memory => BackendStore::from(MemoryStore::new()),
        #[cfg(feature = "redis")]
        BackendKind::Redis => {
            BackendStore::from(tagcache_store::RedisStore::new(&config.redis).await?)
        }
        #[cfg(feature = "memcached")]
        BackendKind::Memcache => {
            BackendStore::from(tagcache_store::MemcachedStore::new(&config.memcache).await?)
        }
        #[cfg(feature = "memcached")]
        BackendKind::Memcached => {
            BackendStore::from(tagcache_store::MemcachedStore::new(&config.memcached).await?)
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(CacheError::Config(format!(
                "cache driver {} is not available",
                other
            )));
        }
    };

    info!(backend = store.name(), namespace = config.namespace(), "Opened cache backend");
    Ok(store)
}
