//! Tag-aware cache facade.
//!
//! [`TagCache`] composes [`KeyCodec`], [`TagRegistry`] and a [`CacheStore`].
//! Every write files its key under the tag named by the key's prefix, so a
//! whole tag can be dropped with one `delete("tag.")`. Independently, named
//! explicit lists group arbitrary keys for [`TagCache::clear_tag`].
//!
//! ```
//! use tagcache_core::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let cache = TagCache::new(MemoryStore::new());
//!
//! cache.set("article.1", "first", Ttl::Permanent).await?;
//! cache.set("article.2", "second", Ttl::Permanent).await?;
//!
//! assert_eq!(cache.get::<String>("article.1").await?.as_deref(), Some("first"));
//!
//! // Drop every member of the `article` tag
//! assert!(cache.delete("article.").await?);
//! assert!(!cache.has("article.2").await?);
//! # Ok::<(), CacheError>(())
//! # }).unwrap();
//! ```

use crate::config::{CacheConfig, ExpiryPolicy, Ttl};
use crate::driver::open_backend;
use crate::explicit::ExplicitTags;
use crate::key::{EXPLICIT_LIST_TAG, KeyCodec, ParsedKey, REGISTRY_KEY};
use crate::registry::TagRegistry;
use crate::stats::{CacheStats, StatsSnapshot};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use tagcache_store::{BackendStore, CacheError, CacheResult, CacheStore, NamespacedStore};
use tracing::debug;

/// Keys accepted by the batch operations.
///
/// Either a comma-joined string (`"a.1,a.2"`) or a sequence of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyList {
    /// Comma-joined keys
    Joined(String),
    /// Individual keys
    Keys(Vec<String>),
}

impl KeyList {
    /// Split into individual keys.
    ///
    /// Fails with `InvalidArgument` if any element is empty.
    pub fn into_keys(self) -> CacheResult<Vec<String>> {
        let keys: Vec<String> = match self {
            Self::Joined(joined) => joined.split(',').map(|k| k.trim().to_string()).collect(),
            Self::Keys(keys) => keys.into_iter().map(|k| k.trim().to_string()).collect(),
        };
        if keys.iter().any(String::is_empty) {
            return Err(CacheError::InvalidArgument(
                "key list contains an empty key".to_string(),
            ));
        }
        Ok(keys)
    }
}

impl From<&str> for KeyList {
    fn from(joined: &str) -> Self {
        Self::Joined(joined.to_string())
    }
}

impl From<String> for KeyList {
    fn from(joined: String) -> Self {
        Self::Joined(joined)
    }
}

impl From<Vec<String>> for KeyList {
    fn from(keys: Vec<String>) -> Self {
        Self::Keys(keys)
    }
}

impl From<&[String]> for KeyList {
    fn from(keys: &[String]) -> Self {
        Self::Keys(keys.to_vec())
    }
}

impl From<Vec<&str>> for KeyList {
    fn from(keys: Vec<&str>) -> Self {
        Self::Keys(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for KeyList {
    fn from(keys: &[&str]) -> Self {
        Self::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeyList {
    fn from(keys: [&str; N]) -> Self {
        Self::Keys(keys.iter().map(|k| k.to_string()).collect())
    }
}

/// Cache facade with tag grouping and bulk invalidation.
pub struct TagCache<S: CacheStore> {
    store: Arc<S>,
    expiry: ExpiryPolicy,
    registry: TagRegistry,
    explicit: ExplicitTags,
    stats: CacheStats,
}

impl TagCache<NamespacedStore<BackendStore>> {
    /// Open the backend selected by `config` under its namespace.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tagcache_core::prelude::*;
    ///
    /// # async fn run() -> Result<(), CacheError> {
    /// let config = CacheConfig::redis("127.0.0.1", 6379).with_prefix("myapp");
    /// let cache = TagCache::connect(&config).await?;
    /// cache.set("user.1", "Alice", Ttl::Temporary).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let backend = open_backend(config).await?;
        let store = NamespacedStore::new(backend, config.namespace());
        Ok(Self::with_expiry(store, config.expiry()))
    }
}

impl<S: CacheStore> TagCache<NamespacedStore<S>> {
    /// Namespace every key of this cache lives under.
    pub fn namespace(&self) -> &str {
        self.store.prefix()
    }
}

impl<S: CacheStore> TagCache<S> {
    /// Facade over `store` with default expiry settings.
    pub fn new(store: S) -> Self {
        Self::with_expiry(store, ExpiryPolicy::default())
    }

    /// Facade over `store` with explicit expiry settings.
    pub fn with_expiry(store: S, expiry: ExpiryPolicy) -> Self {
        Self::with_store(Arc::new(store), expiry)
    }

    /// Facade over a shared store.
    pub fn with_store(store: Arc<S>, expiry: ExpiryPolicy) -> Self {
        Self {
            store,
            expiry,
            registry: TagRegistry::new(),
            explicit: ExplicitTags::new(),
            stats: CacheStats::default(),
        }
    }

    /// Cap explicit tag lists at `capacity` members.
    pub fn with_tag_capacity(mut self, capacity: usize) -> Self {
        self.explicit = ExplicitTags::with_capacity(capacity);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tag registry backing whole-tag deletes.
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Expiry settings applied to writes.
    pub fn expiry(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// Read and write counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // ========== Reads ==========

    /// Get a value, `None` on a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let parsed = parse(key)?;
        self.stats.record_read();

        match self.store.get_json(&parsed.canonical()).await? {
            Some(json) => Ok(Some(decode_value(&json)?)),
            None => Ok(None),
        }
    }

    /// Get a value, `default` on a miss.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> CacheResult<T> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Whether `key` currently has an entry.
    pub async fn has(&self, key: &str) -> CacheResult<bool> {
        let parsed = parse(key)?;
        self.store.exists(&parsed.canonical()).await
    }

    /// Read several keys; misses get `default`.
    ///
    /// The result is keyed by the keys as given.
    pub async fn get_multiple<T>(
        &self,
        keys: impl Into<KeyList>,
        default: T,
    ) -> CacheResult<BTreeMap<String, T>>
    where
        T: DeserializeOwned + Clone,
    {
        let keys = keys.into().into_keys()?;
        let canonical = keys
            .iter()
            .map(|key| parse(key).map(|parsed| parsed.canonical()))
            .collect::<CacheResult<Vec<_>>>()?;

        let refs: Vec<&str> = canonical.iter().map(String::as_str).collect();
        let values = self.store.get_many(&refs).await?;

        let mut result = BTreeMap::new();
        for (key, value) in keys.into_iter().zip(values) {
            self.stats.record_read();
            let value = match value {
                Some(json) => decode_value(&json)?,
                None => default.clone(),
            };
            result.insert(key, value);
        }
        Ok(result)
    }

    /// Get `key`, or compute, store and return it on a miss.
    pub async fn remember<T, F, Fut>(
        &self,
        key: &str,
        ttl: impl Into<Ttl>,
        factory: F,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = factory().await?;
        self.set(key, &value, ttl).await?;
        Ok(value)
    }

    // ========== Writes ==========

    /// Store `value` under `key` and file the key under its tag.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Ttl>,
    ) -> CacheResult<()> {
        let parsed = parse_entry(key)?;
        self.write(&parsed, encode_value(value)?, ttl.into()).await
    }

    /// Store several entries with one registry update.
    pub async fn set_multiple<K, T, I>(&self, items: I, ttl: impl Into<Ttl>) -> CacheResult<()>
    where
        K: AsRef<str>,
        T: Serialize,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut parsed = Vec::new();
        let mut entries = Vec::new();
        for (key, value) in items {
            let key = parse_entry(key.as_ref())?;
            entries.push((key.canonical(), encode_value(&value)?));
            parsed.push(key);
        }
        if entries.is_empty() {
            return Ok(());
        }

        self.registry
            .register_members(self.store.as_ref(), &parsed)
            .await?;

        let refs: Vec<(&str, String)> = entries
            .iter()
            .map(|(key, json)| (key.as_str(), json.clone()))
            .collect();
        self.store
            .set_many(&refs, self.expiry.resolve(ttl.into()))
            .await?;

        for _ in &entries {
            self.stats.record_write();
        }
        Ok(())
    }

    /// Add `amount` to the integer stored at `key`, seeding absent keys.
    ///
    /// Returns the new value. Not atomic across processes.
    pub async fn increment(&self, key: &str, amount: i64) -> CacheResult<i64> {
        self.adjust(key, amount).await
    }

    /// Subtract `amount` from the integer stored at `key`, seeding absent keys.
    pub async fn decrement(&self, key: &str, amount: i64) -> CacheResult<i64> {
        let delta = amount
            .checked_neg()
            .ok_or_else(|| CacheError::InvalidArgument("decrement overflows".to_string()))?;
        self.adjust(key, delta).await
    }

    async fn adjust(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let parsed = parse_entry(key)?;
        let canonical = parsed.canonical();

        let current: i64 = match self.store.get_json(&canonical).await? {
            Some(json) => decode_value(&json)?,
            None => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| CacheError::InvalidArgument(format!("counter {} overflows", key)))?;

        self.write(&parsed, next.to_string(), Ttl::Seconds(0)).await?;
        Ok(next)
    }

    async fn write(&self, parsed: &ParsedKey, json: String, ttl: Ttl) -> CacheResult<()> {
        self.registry
            .register_member(self.store.as_ref(), parsed.tag(), parsed.subkey())
            .await?;
        self.store
            .set_json(&parsed.canonical(), json, self.expiry.resolve(ttl))
            .await?;
        self.stats.record_write();
        Ok(())
    }

    // ========== Deletes ==========

    /// Delete one entry, or every member of a tag when `key` ends with a
    /// separator (`"article."`).
    ///
    /// Returns `false` if the entry or tag did not exist.
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let parsed = parse(key)?;
        self.delete_parsed(&parsed).await
    }

    /// Delete several keys; `false` if any of them was absent.
    ///
    /// Every key is validated first. Deletions already made are kept when a
    /// later one fails.
    pub async fn delete_multiple(&self, keys: impl Into<KeyList>) -> CacheResult<bool> {
        let parsed = keys
            .into()
            .into_keys()?
            .iter()
            .map(|key| parse(key))
            .collect::<CacheResult<Vec<_>>>()?;

        let mut all_removed = true;
        for key in &parsed {
            all_removed &= self.delete_parsed(key).await?;
        }
        Ok(all_removed)
    }

    async fn delete_parsed(&self, parsed: &ParsedKey) -> CacheResult<bool> {
        let store = self.store.as_ref();

        if parsed.is_whole_tag() {
            let tag = parsed.tag();
            if !self.registry.contains_tag(store, tag).await? {
                return Ok(false);
            }

            let members = self.registry.members_of(store, tag).await?;
            let keys: Vec<String> = members
                .iter()
                .map(|subkey| KeyCodec::encode(tag, subkey))
                .collect();
            let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            store.delete_many(&refs).await?;
            self.registry.clear_tag_members(store, tag).await?;

            debug!(tag, count = keys.len(), "Deleted tag members");
            return Ok(true);
        }

        self.registry
            .remove_member(store, parsed.tag(), parsed.subkey())
            .await?;
        store.delete(&parsed.canonical()).await
    }

    // ========== Explicit tags ==========

    /// Writer whose entries are also appended to the explicit list `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagcache_core::prelude::*;
    ///
    /// # tokio_test::block_on(async {
    /// let cache = TagCache::new(MemoryStore::new());
    /// cache.tag("homepage").set("widget.news", "...", Ttl::Temporary).await?;
    /// cache.tag("homepage").set("widget.weather", "...", Ttl::Temporary).await?;
    ///
    /// assert!(cache.clear_tag("homepage").await?);
    /// assert!(!cache.has("widget.news").await?);
    /// # Ok::<(), CacheError>(())
    /// # }).unwrap();
    /// ```
    pub fn tag(&self, name: impl Into<String>) -> TaggedWriter<'_, S> {
        TaggedWriter {
            cache: self,
            name: name.into(),
        }
    }

    /// Replace (`overlay`) or extend the explicit list `name` with `keys`.
    ///
    /// Merging deduplicates and keeps at most the configured number of
    /// members, evicting the oldest. Returns the resulting list of canonical
    /// keys.
    pub async fn tag_keys(
        &self,
        name: &str,
        keys: impl Into<KeyList>,
        overlay: bool,
    ) -> CacheResult<Vec<String>> {
        let name = tag_name(name)?;
        let canonical = keys
            .into()
            .into_keys()?
            .iter()
            .map(|key| parse_entry(key).map(|parsed| parsed.canonical()))
            .collect::<CacheResult<Vec<_>>>()?;

        self.explicit
            .assign(self.store.as_ref(), name, &canonical, overlay)
            .await
    }

    /// Canonical keys currently in the explicit list `name`.
    pub async fn tagged_keys(&self, name: &str) -> CacheResult<Vec<String>> {
        let name = tag_name(name)?;
        self.explicit.members(self.store.as_ref(), name).await
    }

    /// Delete every entry in the explicit list `name`, then the list.
    ///
    /// Returns `false` if `name` is empty.
    pub async fn clear_tag(&self, name: &str) -> CacheResult<bool> {
        let Ok(name) = tag_name(name) else {
            return Ok(false);
        };

        let store = self.store.as_ref();
        let cleared = self.explicit.clear(store, name).await?;
        let members: Vec<ParsedKey> = cleared.iter().map(|key| KeyCodec::decode(key)).collect();
        self.registry.remove_members(store, &members).await?;

        debug!(tag = name, count = cleared.len(), "Cleared tag");
        Ok(true)
    }

    // ========== Whole cache ==========

    /// Logically remove every entry.
    pub async fn clear(&self) -> CacheResult<()> {
        self.store.clear().await?;
        self.registry.invalidate().await;
        Ok(())
    }

    /// Hard flush of the backend.
    pub async fn flush_all(&self) -> CacheResult<()> {
        self.store.flush().await?;
        self.registry.invalidate().await;
        Ok(())
    }

    // ========== Introspection ==========

    /// Re-read the tag registry to observe writes from other instances.
    pub async fn reload_tags(&self) -> CacheResult<()> {
        self.registry.reload(self.store.as_ref()).await
    }

    /// Every tag with at least one registered member.
    pub async fn tags(&self) -> CacheResult<Vec<String>> {
        self.registry.tags(self.store.as_ref()).await
    }

    /// Subkeys registered under `tag`.
    pub async fn tag_members(&self, tag: &str) -> CacheResult<BTreeSet<String>> {
        let tag = KeyCodec::normalize(tag);
        self.registry.members_of(self.store.as_ref(), &tag).await
    }
}

impl<S: CacheStore> std::fmt::Debug for TagCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagCache")
            .field("expiry", &self.expiry)
            .field("registry", &self.registry.key())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// Writes through a [`TagCache`] and records each key in an explicit list.
///
/// Created by [`TagCache::tag`].
pub struct TaggedWriter<'a, S: CacheStore> {
    cache: &'a TagCache<S>,
    name: String,
}

impl<S: CacheStore> TaggedWriter<'_, S> {
    /// Explicit list this writer appends to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `value` under `key` and append the key to the list.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Ttl>,
    ) -> CacheResult<()> {
        let name = tag_name(&self.name)?;
        let parsed = parse_entry(key)?;

        self.cache
            .write(&parsed, encode_value(value)?, ttl.into())
            .await?;
        self.cache
            .explicit
            .append(self.cache.store.as_ref(), name, &parsed.canonical())
            .await
    }
}

fn parse(key: &str) -> CacheResult<ParsedKey> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("cache key is empty".to_string()));
    }

    let parsed = KeyCodec::decode(key);
    if parsed.tag().is_empty() {
        return Err(CacheError::InvalidArgument(format!(
            "cache key {} has an empty tag",
            key
        )));
    }
    if parsed.tag() == EXPLICIT_LIST_TAG || parsed.canonical() == REGISTRY_KEY {
        return Err(CacheError::InvalidArgument(format!(
            "cache key {} is reserved",
            key
        )));
    }
    Ok(parsed)
}

/// Parse a key that must name a single entry.
fn parse_entry(key: &str) -> CacheResult<ParsedKey> {
    let parsed = parse(key)?;
    if parsed.is_whole_tag() {
        return Err(CacheError::InvalidArgument(format!(
            "cache key {} names a whole tag",
            key
        )));
    }
    Ok(parsed)
}

fn tag_name(name: &str) -> CacheResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CacheError::InvalidArgument("tag name is empty".to_string()));
    }
    Ok(name)
}

fn encode_value<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn decode_value<T: DeserializeOwned>(json: &str) -> CacheResult<T> {
    serde_json::from_str(json).map_err(|e| CacheError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagcache_store::MemoryStore;

    fn cache() -> TagCache<MemoryStore> {
        TagCache::new(MemoryStore::new())
    }

    #[test]
    fn test_key_list_joined() {
        let keys = KeyList::from("a.1, a.2,b").into_keys().unwrap();
        assert_eq!(keys, vec!["a.1", "a.2", "b"]);
    }

    #[test]
    fn test_key_list_rejects_empty_element() {
        let err = KeyList::from("a,,b").into_keys().unwrap_err();
        assert!(err.is_invalid_argument());

        let err = KeyList::from(vec!["a", " "]).into_keys().unwrap_err();
        assert!(err.is_invalid_argument());

        assert!(KeyList::from(Vec::<String>::new()).into_keys().unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert!(parse("").unwrap_err().is_invalid_argument());
        assert!(parse(".x").unwrap_err().is_invalid_argument());
        assert!(parse("DefaultTag.AllTags").unwrap_err().is_invalid_argument());
        assert!(parse("tags.abc").unwrap_err().is_invalid_argument());
        assert!(parse("article.").unwrap().is_whole_tag());
        assert!(parse_entry("article.").unwrap_err().is_invalid_argument());
    }

    #[tokio::test]
    async fn test_set_registers_member() {
        let cache = cache();
        cache.set("article.1", &1, Ttl::Permanent).await.unwrap();
        cache.set("times", &1, Ttl::Permanent).await.unwrap();

        assert_eq!(
            cache.tag_members("article").await.unwrap(),
            BTreeSet::from(["1".to_string()])
        );
        assert_eq!(cache.tags().await.unwrap(), vec!["DefaultTag", "article"]);
        assert!(cache.store().exists("article:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_whole_tag() {
        let cache = cache();
        cache.set("t.a", "1", Ttl::Permanent).await.unwrap();
        cache.set("t.b", "2", Ttl::Permanent).await.unwrap();
        cache.set("u.a", "3", Ttl::Permanent).await.unwrap();

        assert!(cache.delete("t.").await.unwrap());
        assert!(!cache.has("t.a").await.unwrap());
        assert!(!cache.has("t.b").await.unwrap());
        assert!(cache.has("u.a").await.unwrap());
        assert!(cache.tag_members("t").await.unwrap().is_empty());

        // Unknown tag
        assert!(!cache.delete("t.").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_single_entry() {
        let cache = cache();
        cache.set("t.a", "1", Ttl::Permanent).await.unwrap();

        assert!(cache.delete("t.a").await.unwrap());
        assert!(!cache.delete("t.a").await.unwrap());
        assert!(!cache.tags().await.unwrap().contains(&"t".to_string()));
    }

    #[tokio::test]
    async fn test_delete_multiple_validates_first() {
        let cache = cache();
        cache.set("a.1", "1", Ttl::Permanent).await.unwrap();

        let err = cache.delete_multiple("a.1,").await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(cache.has("a.1").await.unwrap());

        assert!(!cache.delete_multiple(["a.1", "a.2"]).await.unwrap());
        assert!(!cache.has("a.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_counters() {
        let cache = cache();
        assert_eq!(cache.increment("times", 1).await.unwrap(), 1);
        assert_eq!(cache.increment("times", 1).await.unwrap(), 2);
        assert_eq!(cache.decrement("times", 1).await.unwrap(), 1);
        assert_eq!(cache.decrement("fresh", 3).await.unwrap(), -3);

        cache.set("big", &i64::MAX, Ttl::Permanent).await.unwrap();
        assert!(cache.increment("big", 1).await.unwrap_err().is_invalid_argument());
        assert!(cache.decrement("times", i64::MIN).await.unwrap_err().is_invalid_argument());
    }

    #[tokio::test]
    async fn test_increment_non_numeric_fails() {
        let cache = cache();
        cache.set("name", "alice", Ttl::Permanent).await.unwrap();
        let err = cache.increment("name", 1).await.unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = cache();
        cache.set("a.1", "1", Ttl::Permanent).await.unwrap();
        cache.get::<String>("a.1").await.unwrap();
        cache.get_or("a.2", String::new()).await.unwrap();
        cache.has("a.1").await.unwrap();

        assert_eq!(cache.stats(), StatsSnapshot { reads: 2, writes: 1 });
    }

    #[tokio::test]
    async fn test_tagged_writer() {
        let cache = cache();
        cache.tag("news").set("a.1", "x", Ttl::Permanent).await.unwrap();
        cache.tag("news").set("a.1", "y", Ttl::Permanent).await.unwrap();
        cache.tag("news").set("b.2", "z", Ttl::Permanent).await.unwrap();
        // Writes without the writer are not listed
        cache.set("c.3", "w", Ttl::Permanent).await.unwrap();

        assert_eq!(cache.tagged_keys("news").await.unwrap(), vec!["a:1", "b:2"]);

        let err = cache.tag("").set("d.4", "v", Ttl::Permanent).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_clear_tag() {
        let cache = cache();
        cache.set("a.1", "1", Ttl::Permanent).await.unwrap();
        cache.set("a.2", "2", Ttl::Permanent).await.unwrap();
        cache.tag_keys("group", "a.1", false).await.unwrap();

        assert!(cache.clear_tag("group").await.unwrap());
        assert!(!cache.has("a.1").await.unwrap());
        assert!(cache.has("a.2").await.unwrap());
        assert_eq!(
            cache.tag_members("a").await.unwrap(),
            BTreeSet::from(["2".to_string()])
        );
        assert!(cache.tagged_keys("group").await.unwrap().is_empty());

        assert!(!cache.clear_tag("").await.unwrap());
        assert!(!cache.clear_tag("  ").await.unwrap());
    }

    #[tokio::test]
    async fn test_explicit_lists_are_not_addressable() {
        let cache = cache();
        cache.tag("b").set("a.1", "1", Ttl::Permanent).await.unwrap();
        let list_key = KeyCodec::registry_key_for("b");

        let err = cache.tag_keys("a", list_key.as_str(), false).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(cache.delete(&list_key).await.unwrap_err().is_invalid_argument());

        assert!(cache.clear_tag("a").await.unwrap());
        assert_eq!(cache.tagged_keys("b").await.unwrap(), vec!["a:1"]);
    }

    #[tokio::test]
    async fn test_clear_drops_registry_snapshot() {
        let cache = cache();
        cache.set("a.1", "1", Ttl::Permanent).await.unwrap();
        cache.clear().await.unwrap();

        assert!(!cache.has("a.1").await.unwrap());
        assert!(cache.tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remember() {
        let cache = cache();
        let value: u32 = cache
            .remember("calc.answer", Ttl::Permanent, || async { Ok(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);

        let value: u32 = cache
            .remember("calc.answer", Ttl::Permanent, || async {
                Err(CacheError::Other("factory must not run".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }
}
