//! Tag-based grouping and bulk invalidation over any tagcache store.
//!
//! Logical keys name their tag: `"article.123"` is entry `123` of tag
//! `article`. The facade keeps a registry of every tag's members so a whole
//! tag can be deleted at once, and supports explicit, caller-managed tag lists
//! on top.
//!
//! # Features
//!
//! - `redis` - Enable the Redis backend (enabled by default)
//! - `memcached` - Enable the Memcached backend (requires explicit opt-in)
//!
//! # Examples
//!
//! ```no_run
//! use tagcache_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CacheError> {
//!     let config = CacheConfig::file("/tmp/tagcache").with_prefix("myapp");
//!     let cache = TagCache::connect(&config).await?;
//!
//!     cache.set("user.1", "Alice", Ttl::Permanent).await?;
//!     cache.set("user.2", "Bob", Ttl::Seconds(300)).await?;
//!
//!     let visits = cache.increment("stats.visits", 1).await?;
//!     println!("visit #{}", visits);
//!
//!     // Every `user` entry at once
//!     cache.delete("user.").await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod explicit;
pub mod facade;
pub mod key;
pub mod registry;
pub mod stats;

pub use config::{BackendKind, CacheConfig, ExpiryPolicy, Ttl};
pub use driver::open_backend;
pub use explicit::{ExplicitTags, MAX_EXPLICIT_MEMBERS};
pub use facade::{KeyList, TagCache, TaggedWriter};
pub use key::{DEFAULT_TAG, EXPLICIT_LIST_TAG, KeyCodec, ParsedKey, REGISTRY_KEY};
pub use registry::{TagIndex, TagRegistry};
pub use stats::{CacheStats, StatsSnapshot};

pub use tagcache_store::{
    BackendStore, CacheError, CacheResult, CacheStore, FileStore, MemcacheConfig, MemoryStore,
    NamespacedStore, RedisConfig,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{BackendKind, CacheConfig, Ttl};
    pub use crate::facade::{KeyList, TagCache, TaggedWriter};
    pub use crate::key::KeyCodec;
    pub use crate::stats::StatsSnapshot;
    pub use tagcache_store::{
        BackendStore, CacheError, CacheResult, CacheStore, FileStore, MemoryStore,
        NamespacedStore,
    };
}
