//! Explicitly assigned tag member lists.
//!
//! Separate from the automatic registry: each tag name owns an ordered list
//! of canonical keys stored under [`KeyCodec::registry_key_for`]. Clearing a
//! tag deletes exactly the keys in its current list.

use crate::key::KeyCodec;
use tagcache_store::{CacheResult, CacheStore};
use tracing::{debug, warn};

/// Default cap on list length.
pub const MAX_EXPLICIT_MEMBERS: usize = 1000;

/// Reads and writes explicit tag lists.
#[derive(Debug, Clone, Copy)]
pub struct ExplicitTags {
    capacity: usize,
}

impl Default for ExplicitTags {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplicitTags {
    pub fn new() -> Self {
        Self::with_capacity(MAX_EXPLICIT_MEMBERS)
    }

    /// Lists keep at most `capacity` members, evicting the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current members of `name`, oldest first.
    pub async fn members<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
    ) -> CacheResult<Vec<String>> {
        let key = KeyCodec::registry_key_for(name);
        let Some(raw) = store.get_json(&key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(members) => Ok(members),
            Err(e) => {
                warn!(tag = name, error = %e, "Discarding unreadable tag list");
                Ok(Vec::new())
            }
        }
    }

    /// Replace (`overlay`) or extend the list of `name` with `keys`.
    ///
    /// Only extending is capped; an overlay keeps every given key.
    /// Returns the list as persisted.
    pub async fn assign<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        keys: &[String],
        overlay: bool,
    ) -> CacheResult<Vec<String>> {
        let members = if overlay {
            merge(Vec::new(), keys.iter().cloned(), usize::MAX)
        } else {
            let existing = self.members(store, name).await?;
            merge(existing, keys.iter().cloned(), self.capacity)
        };
        self.persist(store, name, &members).await?;
        Ok(members)
    }

    /// Add one canonical key to the list of `name`.
    pub async fn append<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        canonical: &str,
    ) -> CacheResult<()> {
        let existing = self.members(store, name).await?;
        if existing.iter().any(|member| member == canonical) {
            return Ok(());
        }
        let members = merge(existing, std::iter::once(canonical.to_string()), self.capacity);
        self.persist(store, name, &members).await
    }

    /// Delete every listed entry and the list itself.
    ///
    /// Returns the keys that were listed.
    pub async fn clear<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
    ) -> CacheResult<Vec<String>> {
        let members = self.members(store, name).await?;
        if !members.is_empty() {
            let refs: Vec<&str> = members.iter().map(String::as_str).collect();
            store.delete_many(&refs).await?;
        }
        store.delete(&KeyCodec::registry_key_for(name)).await?;

        debug!(tag = name, count = members.len(), "Cleared explicit tag");
        Ok(members)
    }

    async fn persist<S: CacheStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        members: &[String],
    ) -> CacheResult<()> {
        let json = serde_json::to_string(members)?;
        store
            .set_json(&KeyCodec::registry_key_for(name), json, None)
            .await
    }
}

/// Append `incoming` to `existing`, dropping duplicates and empty names, then
/// evict from the front until at most `capacity` remain.
fn merge(
    existing: Vec<String>,
    incoming: impl IntoIterator<Item = String>,
    capacity: usize,
) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len());
    for key in existing.into_iter().chain(incoming) {
        if !key.is_empty() && !merged.contains(&key) {
            merged.push(key);
        }
    }
    if merged.len() > capacity {
        merged.drain(..merged.len() - capacity);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagcache_store::MemoryStore;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_dedupes_in_order() {
        let merged = merge(strings(&["x", "z"]), strings(&["x", "y"]), 10);
        assert_eq!(merged, strings(&["x", "z", "y"]));
    }

    #[test]
    fn test_merge_evicts_oldest() {
        let merged = merge(strings(&["a", "b", "c"]), strings(&["d"]), 3);
        assert_eq!(merged, strings(&["b", "c", "d"]));
    }

    #[test]
    fn test_merge_skips_empty() {
        let merged = merge(Vec::new(), strings(&["", "a", ""]), 10);
        assert_eq!(merged, strings(&["a"]));
    }

    #[tokio::test]
    async fn test_assign_merge_and_overlay() {
        let store = MemoryStore::new();
        let tags = ExplicitTags::new();

        tags.assign(&store, "t", &strings(&["x", "z"]), false)
            .await
            .unwrap();
        let merged = tags
            .assign(&store, "t", &strings(&["x", "y"]), false)
            .await
            .unwrap();
        let mut sorted = merged.clone();
        sorted.sort();
        assert_eq!(sorted, strings(&["x", "y", "z"]));

        let overlaid = tags
            .assign(&store, "t", &strings(&["x", "y"]), true)
            .await
            .unwrap();
        assert_eq!(overlaid, strings(&["x", "y"]));
        assert_eq!(tags.members(&store, "t").await.unwrap(), overlaid);
    }

    #[tokio::test]
    async fn test_overlay_is_not_capped() {
        let store = MemoryStore::new();
        let tags = ExplicitTags::with_capacity(2);

        let overlaid = tags
            .assign(&store, "t", &strings(&["a", "b", "c", "a"]), true)
            .await
            .unwrap();
        assert_eq!(overlaid, strings(&["a", "b", "c"]));

        // Extending an oversized list trims it back to capacity
        let merged = tags
            .assign(&store, "t", &strings(&["d"]), false)
            .await
            .unwrap();
        assert_eq!(merged, strings(&["c", "d"]));
    }

    #[tokio::test]
    async fn test_append_caps_list() {
        let store = MemoryStore::new();
        let tags = ExplicitTags::with_capacity(2);

        for key in ["a", "b", "c", "c"] {
            tags.append(&store, "t", key).await.unwrap();
        }
        assert_eq!(tags.members(&store, "t").await.unwrap(), strings(&["b", "c"]));
    }

    #[tokio::test]
    async fn test_clear_deletes_members_and_list() {
        let store = MemoryStore::new();
        let tags = ExplicitTags::new();
        store.set_json("t:a", "1".to_string(), None).await.unwrap();
        store.set_json("t:b", "2".to_string(), None).await.unwrap();
        store.set_json("t:c", "3".to_string(), None).await.unwrap();
        tags.assign(&store, "t", &strings(&["t:a", "t:b"]), false)
            .await
            .unwrap();

        let cleared = tags.clear(&store, "t").await.unwrap();
        assert_eq!(cleared, strings(&["t:a", "t:b"]));
        assert!(!store.exists("t:a").await.unwrap());
        assert!(!store.exists("t:b").await.unwrap());
        assert!(store.exists("t:c").await.unwrap());
        assert!(tags.members(&store, "t").await.unwrap().is_empty());
    }
}
