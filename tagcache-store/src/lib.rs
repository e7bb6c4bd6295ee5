//! Key-value stores for tagcache.
//!
//! Every backend implements the [`CacheStore`] contract: JSON string values,
//! per-entry TTL, existence checks, deletes that report whether anything was
//! removed, a logical `clear` and a hard `flush`, plus concurrent batch
//! operations.
//!
//! # Features
//!
//! - `redis` - Enable Redis store support (enabled by default)
//! - `memcached` - Enable Memcached store support (requires explicit opt-in)
//!
//! # Examples
//!
//! ```no_run
//! use tagcache_store::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CacheError> {
//!     let files = FileStore::with_path("/tmp/tagcache").await?;
//!     let store = NamespacedStore::new(files, "myapp");
//!
//!     store.set_json("user:1", r#"{"name":"Alice"}"#.to_string(), Some(Duration::from_secs(60))).await?;
//!
//!     // Logical wipe: entries become unreachable
//!     store.clear().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod namespace;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_store;

#[cfg(feature = "memcached")]
pub mod memcached_store;

pub use backend::BackendStore;
pub use config::{FileStoreConfig, MemcacheConfig, RedisConfig};
pub use error::{CacheError, CacheResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use namespace::NamespacedStore;
pub use traits::CacheStore;

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

#[cfg(feature = "memcached")]
pub use memcached_store::MemcachedStore;
