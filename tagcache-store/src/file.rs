//! Local filesystem cache store.

use crate::config::FileStoreConfig;
use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

const ENTRY_EXTENSION: &str = "cache";

/// Filesystem cache store.
///
/// Each key lives in its own JSON file at `<dir>/<h[0..2]>/<h>.cache`, where
/// `h` is the hex SHA-256 of the key. Expired files are removed lazily when read.
#[derive(Debug)]
pub struct FileStore {
    config: FileStoreConfig,
    write_seq: AtomicU64,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    /// Unix timestamp in milliseconds.
    expires_at: Option<i64>,
    value: String,
}

impl FileEntry {
    fn is_expired(&self, now_millis: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_millis)
    }
}

impl FileStore {
    /// Create a new file store.
    pub async fn new(config: FileStoreConfig) -> CacheResult<Self> {
        if config.directory.as_os_str().is_empty() {
            return Err(CacheError::Config("cache path is empty".to_string()));
        }

        if config.create_directories {
            fs::create_dir_all(&config.directory).await.map_err(|e| {
                CacheError::Config(format!(
                    "Failed to create cache directory {:?}: {}",
                    config.directory, e
                ))
            })?;
        } else if !fs::try_exists(&config.directory).await? {
            return Err(CacheError::Config(format!(
                "cache directory {:?} does not exist",
                config.directory
            )));
        }

        info!(path = ?config.directory, "Initialized file cache store");

        Ok(Self {
            config,
            write_seq: AtomicU64::new(0),
        })
    }

    /// Create with just a directory (convenience method).
    pub async fn with_path(path: impl Into<PathBuf>) -> CacheResult<Self> {
        Self::new(FileStoreConfig::new(path)).await
    }

    /// Base directory of this store.
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        let mut path = self.config.directory.join(&digest[..2]);
        path.push(format!("{}.{}", digest, ENTRY_EXTENSION));
        path
    }

    async fn read_entry(&self, key: &str) -> CacheResult<Option<FileEntry>> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: FileEntry = serde_json::from_slice(&bytes)?;
        if entry.key != key {
            return Ok(None);
        }

        if entry.is_expired(chrono::Utc::now().timestamp_millis()) {
            debug!(key, "Removing expired cache file");
            remove_if_present(&path).await?;
            return Ok(None);
        }

        Ok(Some(entry))
    }
}

async fn remove_if_present(path: &Path) -> CacheResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn is_shard_dir(name: &str) -> bool {
    name.len() == 2 && name.chars().all(|c| c.is_ascii_hexdigit())
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.read_entry(key).await?.map(|entry| entry.value))
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|ttl| {
            let millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            chrono::Utc::now().timestamp_millis().saturating_add(millis)
        });
        let entry = FileEntry {
            key: key.to_string(),
            expires_at,
            value,
        };
        let bytes = serde_json::to_vec(&entry)?;

        let path = self.entry_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temp file and rename so readers never see a partial entry
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));
        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let existed = self.read_entry(key).await?.is_some();
        remove_if_present(&self.entry_path(key)).await?;
        Ok(existed)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.read_entry(key).await?.is_some())
    }

    async fn flush(&self) -> CacheResult<()> {
        let mut dir = match fs::read_dir(&self.config.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        // Only touch the shard directories this store created
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            if item.file_type().await?.is_dir() && name.to_str().is_some_and(is_shard_dir) {
                fs::remove_dir_all(item.path()).await?;
            }
        }

        debug!(path = ?self.config.directory, "Flushed file cache store");
        Ok(())
    }
}
