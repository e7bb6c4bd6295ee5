// tagcache - Key-value caching with tag-based grouping and bulk invalidation
//
// This library groups cache entries by the tag named in their key, keeps a
// persisted registry of every tag's members, and runs over file, Redis or
// Memcached backends selected from configuration.

// Re-export the facade
pub use tagcache_core::*;

// Re-export the store layer
pub use tagcache_store;

#[cfg(feature = "redis")]
pub use tagcache_store::RedisStore;

#[cfg(feature = "memcached")]
pub use tagcache_store::MemcachedStore;

/// Prelude for common imports.
///
/// ```
/// use tagcache::prelude::*;
///
/// # tokio_test::block_on(async {
/// let cache = TagCache::with_expiry(MemoryStore::new(), ExpiryPolicy::new(0, 60));
/// cache.set("user.1", "Alice", Ttl::Temporary).await?;
/// cache.set("user.2", "Bob", Ttl::Temporary).await?;
///
/// assert_eq!(cache.tag_members("user").await?.len(), 2);
/// assert!(cache.delete("user.").await?);
/// assert!(!cache.has("user.1").await?);
/// # Ok::<(), CacheError>(())
/// # }).unwrap();
/// ```
pub mod prelude {
    pub use tagcache_core::prelude::*;
    pub use tagcache_core::{ExpiryPolicy, open_backend};
}
