//! Persisted index of tag members.
//!
//! The registry maps each tag to the subkeys currently filed under it and is
//! stored as one JSON document under [`REGISTRY_KEY`] with no expiry. It is
//! loaded into memory once per instance and every change is written through
//! immediately. Callers that need to observe writes from other processes call
//! [`TagRegistry::reload`] first.

use crate::key::{ParsedKey, REGISTRY_KEY};
use std::collections::{BTreeMap, BTreeSet};
use tagcache_store::{CacheResult, CacheStore};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Tag name to member subkeys.
pub type TagIndex = BTreeMap<String, BTreeSet<String>>;

/// In-memory snapshot of the tag index, kept in sync with the store.
#[derive(Debug)]
pub struct TagRegistry {
    key: String,
    snapshot: RwLock<Option<TagIndex>>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRegistry {
    /// Registry persisted under [`REGISTRY_KEY`].
    pub fn new() -> Self {
        Self::with_key(REGISTRY_KEY)
    }

    /// Registry persisted under a custom store key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            snapshot: RwLock::new(None),
        }
    }

    /// Store key of the persisted index.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a snapshot is currently held in memory.
    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// Load the snapshot if it is not in memory yet.
    pub async fn ensure_loaded<S: CacheStore + ?Sized>(&self, store: &S) -> CacheResult<()> {
        if self.is_loaded().await {
            return Ok(());
        }
        let mut slot = self.snapshot.write().await;
        self.loaded(&mut slot, store).await?;
        Ok(())
    }

    /// Re-read the snapshot from the store.
    pub async fn reload<S: CacheStore + ?Sized>(&self, store: &S) -> CacheResult<()> {
        let index = self.fetch(store).await?;
        *self.snapshot.write().await = Some(index);
        Ok(())
    }

    /// Drop the snapshot; the next operation loads it again.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    /// File `subkey` under `tag`.
    ///
    /// Returns `true` if the member was new and the registry was persisted.
    pub async fn register_member<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        tag: &str,
        subkey: &str,
    ) -> CacheResult<bool> {
        let added = self
            .register_members(store, std::slice::from_ref(&ParsedKey::new(tag, subkey)))
            .await?;
        Ok(added > 0)
    }

    /// File several members with a single persist.
    ///
    /// Returns the number of members that were new.
    pub async fn register_members<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        members: &[ParsedKey],
    ) -> CacheResult<usize> {
        let mut slot = self.snapshot.write().await;
        let index = self.loaded(&mut slot, store).await?;

        let mut added = Vec::new();
        for member in members {
            if member.is_whole_tag() {
                continue;
            }
            let inserted = index
                .entry(member.tag().to_string())
                .or_default()
                .insert(member.subkey().to_string());
            if inserted {
                added.push(member);
            }
        }

        if added.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.persist(store, index).await {
            for member in &added {
                detach(index, member.tag(), member.subkey());
            }
            return Err(e);
        }

        debug!(count = added.len(), "Registered tag members");
        Ok(added.len())
    }

    /// Remove `subkey` from `tag`, dropping the tag once it has no members.
    ///
    /// Returns `true` if the member was present.
    pub async fn remove_member<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        tag: &str,
        subkey: &str,
    ) -> CacheResult<bool> {
        let removed = self
            .remove_members(store, std::slice::from_ref(&ParsedKey::new(tag, subkey)))
            .await?;
        Ok(removed > 0)
    }

    /// Remove several members with a single persist.
    pub async fn remove_members<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        members: &[ParsedKey],
    ) -> CacheResult<usize> {
        let mut slot = self.snapshot.write().await;
        let index = self.loaded(&mut slot, store).await?;

        let mut removed = Vec::new();
        for member in members {
            if detach(index, member.tag(), member.subkey()) {
                removed.push(member);
            }
        }

        if removed.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.persist(store, index).await {
            for member in &removed {
                index
                    .entry(member.tag().to_string())
                    .or_default()
                    .insert(member.subkey().to_string());
            }
            return Err(e);
        }

        Ok(removed.len())
    }

    /// Members currently filed under `tag`; empty if the tag is unknown.
    pub async fn members_of<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        tag: &str,
    ) -> CacheResult<BTreeSet<String>> {
        self.read(store, |index| index.get(tag).cloned().unwrap_or_default())
            .await
    }

    /// Whether `tag` has at least one registered member.
    pub async fn contains_tag<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        tag: &str,
    ) -> CacheResult<bool> {
        self.read(store, |index| index.contains_key(tag)).await
    }

    /// Every registered tag name.
    pub async fn tags<S: CacheStore + ?Sized>(&self, store: &S) -> CacheResult<Vec<String>> {
        self.read(store, |index| index.keys().cloned().collect())
            .await
    }

    /// Remove `tag` entirely, returning its members.
    ///
    /// Returns `None` if the tag was unknown.
    pub async fn clear_tag_members<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        tag: &str,
    ) -> CacheResult<Option<BTreeSet<String>>> {
        let mut slot = self.snapshot.write().await;
        let index = self.loaded(&mut slot, store).await?;

        let Some(members) = index.remove(tag) else {
            return Ok(None);
        };

        if let Err(e) = self.persist(store, index).await {
            index.insert(tag.to_string(), members);
            return Err(e);
        }

        debug!(tag, count = members.len(), "Cleared tag from registry");
        Ok(Some(members))
    }

    async fn read<S, R, F>(&self, store: &S, f: F) -> CacheResult<R>
    where
        S: CacheStore + ?Sized,
        F: FnOnce(&TagIndex) -> R,
    {
        {
            let slot = self.snapshot.read().await;
            if let Some(index) = slot.as_ref() {
                return Ok(f(index));
            }
        }

        let mut slot = self.snapshot.write().await;
        let index = self.loaded(&mut slot, store).await?;
        Ok(f(index))
    }

    async fn loaded<'a, S: CacheStore + ?Sized>(
        &self,
        slot: &'a mut Option<TagIndex>,
        store: &S,
    ) -> CacheResult<&'a mut TagIndex> {
        if slot.is_none() {
            *slot = Some(self.fetch(store).await?);
        }
        Ok(slot.get_or_insert_with(TagIndex::new))
    }

    async fn fetch<S: CacheStore + ?Sized>(&self, store: &S) -> CacheResult<TagIndex> {
        let Some(raw) = store.get_json(&self.key).await? else {
            return Ok(TagIndex::new());
        };

        match serde_json::from_str(&raw) {
            Ok(index) => Ok(index),
            Err(e) => {
                // The next write replaces the unreadable document
                warn!(key = %self.key, error = %e, "Discarding unreadable tag registry");
                Ok(TagIndex::new())
            }
        }
    }

    async fn persist<S: CacheStore + ?Sized>(&self, store: &S, index: &TagIndex) -> CacheResult<()> {
        let json = serde_json::to_string(index)?;
        store.set_json(&self.key, json, None).await
    }
}

fn detach(index: &mut TagIndex, tag: &str, subkey: &str) -> bool {
    let Some(members) = index.get_mut(tag) else {
        return false;
    };
    let removed = members.remove(subkey);
    if members.is_empty() {
        index.remove(tag);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tagcache_store::{CacheError, MemoryStore};

    /// Memory store whose writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl CacheStore for FlakyStore {
        async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
            self.inner.get_json(key).await
        }

        async fn set_json(
            &self,
            key: &str,
            value: String,
            ttl: Option<Duration>,
        ) -> CacheResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(CacheError::Connection("write refused".to_string()));
            }
            self.inner.set_json(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> CacheResult<bool> {
            self.inner.delete(key).await
        }

        async fn exists(&self, key: &str) -> CacheResult<bool> {
            self.inner.exists(key).await
        }

        async fn flush(&self) -> CacheResult<()> {
            self.inner.flush().await
        }
    }

    #[tokio::test]
    async fn test_register_is_idempotent_and_persisted() {
        let store = MemoryStore::new();
        let registry = TagRegistry::new();

        assert!(registry.register_member(&store, "article", "1").await.unwrap());
        assert!(!registry.register_member(&store, "article", "1").await.unwrap());
        assert!(registry.register_member(&store, "article", "2").await.unwrap());

        let raw = store.get_json(REGISTRY_KEY).await.unwrap().unwrap();
        let persisted: TagIndex = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted["article"].len(), 2);
    }

    #[tokio::test]
    async fn test_register_ignores_empty_subkey() {
        let store = MemoryStore::new();
        let registry = TagRegistry::new();

        assert!(!registry.register_member(&store, "article", "").await.unwrap());
        assert_eq!(store.get_json(REGISTRY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_drops_empty_tag() {
        let store = MemoryStore::new();
        let registry = TagRegistry::new();
        registry.register_member(&store, "t", "a").await.unwrap();

        assert!(registry.remove_member(&store, "t", "a").await.unwrap());
        assert!(!registry.remove_member(&store, "t", "a").await.unwrap());
        assert!(!registry.contains_tag(&store, "t").await.unwrap());
        assert!(registry.members_of(&store, "t").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_tag_members() {
        let store = MemoryStore::new();
        let registry = TagRegistry::new();
        registry.register_member(&store, "t", "a").await.unwrap();
        registry.register_member(&store, "t", "b").await.unwrap();
        registry.register_member(&store, "u", "a").await.unwrap();

        let members = registry.clear_tag_members(&store, "t").await.unwrap();
        assert_eq!(
            members,
            Some(BTreeSet::from(["a".to_string(), "b".to_string()]))
        );
        assert_eq!(registry.clear_tag_members(&store, "t").await.unwrap(), None);
        assert_eq!(registry.tags(&store).await.unwrap(), vec!["u".to_string()]);
    }

    #[tokio::test]
    async fn test_snapshot_is_loaded_once() {
        let store = MemoryStore::new();
        let writer = TagRegistry::new();
        let reader = TagRegistry::new();

        writer.register_member(&store, "t", "a").await.unwrap();
        reader.ensure_loaded(&store).await.unwrap();
        writer.register_member(&store, "t", "b").await.unwrap();

        // Snapshot mode: the reader keeps its first view until reloaded
        assert_eq!(reader.members_of(&store, "t").await.unwrap().len(), 1);
        reader.reload(&store).await.unwrap();
        assert_eq!(reader.members_of(&store, "t").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back_snapshot() {
        let store = FlakyStore::default();
        let registry = TagRegistry::new();
        registry.register_member(&store, "t", "a").await.unwrap();

        store.fail_writes.store(true, Ordering::SeqCst);
        let err = registry.register_member(&store, "t", "b").await.unwrap_err();
        assert!(err.is_backend_error());
        assert!(registry.remove_member(&store, "t", "a").await.is_err());
        assert!(registry.clear_tag_members(&store, "t").await.is_err());

        let members = registry.members_of(&store, "t").await.unwrap();
        assert_eq!(members, BTreeSet::from(["a".to_string()]));

        // Next successful write heals the missing member
        store.fail_writes.store(false, Ordering::SeqCst);
        assert!(registry.register_member(&store, "t", "b").await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_registry_starts_empty() {
        let store = MemoryStore::new();
        store
            .set_json(REGISTRY_KEY, "not json".to_string(), None)
            .await
            .unwrap();

        let registry = TagRegistry::new();
        assert!(registry.tags(&store).await.unwrap().is_empty());
        registry.register_member(&store, "t", "a").await.unwrap();

        let raw = store.get_json(REGISTRY_KEY).await.unwrap().unwrap();
        assert!(serde_json::from_str::<TagIndex>(&raw).is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let store = MemoryStore::new();
        let registry = TagRegistry::new();
        registry.register_member(&store, "t", "a").await.unwrap();
        assert!(registry.is_loaded().await);

        store.flush().await.unwrap();
        registry.invalidate().await;
        assert!(!registry.is_loaded().await);
        assert!(registry.tags(&store).await.unwrap().is_empty());
    }
}
