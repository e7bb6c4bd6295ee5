//! In-process cache store.

use crate::error::CacheResult;
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// In-memory cache store with per-entry expiry.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

#[derive(Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

impl MemoryStore {
    /// Create new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the store holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Drop expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut data = self.data.write().await;
        let before = data.len();
        let now = Instant::now();
        data.retain(|_, entry| entry.is_live(now));
        before - data.len()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let data = self.data.read().await;
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        let entry = MemoryEntry { value, expires_at };
        self.data.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let removed = self.data.write().await.remove(key);
        Ok(removed.is_some_and(|entry| entry.is_live(Instant::now())))
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.get_json(key).await.map(|v| v.is_some())
    }

    async fn flush(&self) -> CacheResult<()> {
        self.data.write().await.clear();
        Ok(())
    }
}
