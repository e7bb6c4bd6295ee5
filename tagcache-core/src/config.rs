//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tagcache_store::{CacheError, CacheResult, MemcacheConfig, RedisConfig};

/// Backend driver selected by the `type` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local filesystem (default)
    #[default]
    File,
    /// Memcache server, configured by the `memcache` section
    Memcache,
    /// Memcache server, configured by the `memcached` section
    Memcached,
    /// Redis server
    Redis,
    /// In-process memory
    Memory,
}

impl BackendKind {
    /// Parse a backend name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "file" => Some(Self::File),
            "memcache" => Some(Self::Memcache),
            "memcached" => Some(Self::Memcached),
            "redis" => Some(Self::Redis),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memcache => "memcache",
            Self::Memcached => "memcached",
            Self::Redis => "redis",
            Self::Memory => "memory",
        }
    }

    /// Whether the driver for this backend is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            Self::File | Self::Memory => true,
            Self::Memcache | Self::Memcached => cfg!(feature = "memcached"),
            Self::Redis => cfg!(feature = "redis"),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache configuration.
///
/// Every field has a default, so partial documents deserialize:
///
/// ```
/// use tagcache_core::config::{BackendKind, CacheConfig};
///
/// let config = CacheConfig::from_json(r#"{"type": "redis", "prefix": "app"}"#).unwrap();
/// assert_eq!(config.backend, BackendKind::Redis);
/// assert_eq!(config.temp_time, 60);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend driver
    #[serde(rename = "type")]
    pub backend: BackendKind,

    /// Directory for the file backend
    pub path: Option<PathBuf>,

    /// Settings for `type = "memcache"`
    pub memcache: MemcacheConfig,

    /// Settings for `type = "memcached"`
    pub memcached: MemcacheConfig,

    /// Settings for `type = "redis"`
    pub redis: RedisConfig,

    /// Expiry in seconds for permanent writes, 0 never expires
    pub expire: u64,

    /// Expiry in seconds for temporary writes, 0 never expires
    pub temp_time: u64,

    /// Namespace prefix shared by every key
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            path: None,
            memcache: MemcacheConfig::default(),
            memcached: MemcacheConfig::default(),
            redis: RedisConfig::default(),
            expire: 0,
            temp_time: 60,
            prefix: String::new(),
        }
    }
}

impl CacheConfig {
    /// File backend rooted at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// In-process memory backend.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Default::default()
        }
    }

    /// Redis backend.
    pub fn redis(host: impl Into<String>, port: u16) -> Self {
        Self {
            backend: BackendKind::Redis,
            redis: RedisConfig::new(host, port),
            ..Default::default()
        }
    }

    /// Memcache backend using the `memcache` section.
    pub fn memcache(host: impl Into<String>, port: u16) -> Self {
        Self {
            backend: BackendKind::Memcache,
            memcache: MemcacheConfig::new(host, port),
            ..Default::default()
        }
    }

    /// Memcache backend using the `memcached` section.
    pub fn memcached(host: impl Into<String>, port: u16) -> Self {
        Self {
            backend: BackendKind::Memcached,
            memcached: MemcacheConfig::new(host, port),
            ..Default::default()
        }
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> CacheResult<Self> {
        serde_json::from_str(json).map_err(|e| CacheError::Config(e.to_string()))
    }

    /// Load configuration from `TAGCACHE_*` environment variables.
    pub fn from_env() -> CacheResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CacheResult<Self> {
        let mut config = Self::default();

        if let Some(kind) = lookup("TAGCACHE_TYPE") {
            config.backend = BackendKind::parse(&kind)
                .ok_or_else(|| CacheError::Config(format!("unknown cache type: {}", kind)))?;
        }
        if let Some(path) = lookup("TAGCACHE_PATH") {
            config.path = Some(PathBuf::from(path));
        }
        if let Some(prefix) = lookup("TAGCACHE_PREFIX") {
            config.prefix = prefix;
        }
        if let Some(expire) = lookup("TAGCACHE_EXPIRE") {
            config.expire = parse_number("TAGCACHE_EXPIRE", &expire)?;
        }
        if let Some(temp_time) = lookup("TAGCACHE_TEMP_TIME") {
            config.temp_time = parse_number("TAGCACHE_TEMP_TIME", &temp_time)?;
        }
        if let Some(host) = lookup("TAGCACHE_REDIS_HOST") {
            config.redis.host = host;
        }
        if let Some(port) = lookup("TAGCACHE_REDIS_PORT") {
            config.redis.port = parse_number("TAGCACHE_REDIS_PORT", &port)?;
        }
        if let Some(password) = lookup("TAGCACHE_REDIS_PASSWORD") {
            config.redis.password = Some(password);
        }
        if let Some(index) = lookup("TAGCACHE_REDIS_INDEX") {
            config.redis.index = parse_number("TAGCACHE_REDIS_INDEX", &index)?;
        }
        if let Some(host) = lookup("TAGCACHE_MEMCACHE_HOST") {
            config.memcache.host = host.clone();
            config.memcached.host = host;
        }
        if let Some(port) = lookup("TAGCACHE_MEMCACHE_PORT") {
            let port = parse_number("TAGCACHE_MEMCACHE_PORT", &port)?;
            config.memcache.port = port;
            config.memcached.port = port;
        }

        Ok(config)
    }

    /// Set the namespace prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the expiry of permanent writes in seconds.
    pub fn with_expire(mut self, seconds: u64) -> Self {
        self.expire = seconds;
        self
    }

    /// Set the expiry of temporary writes in seconds.
    pub fn with_temp_time(mut self, seconds: u64) -> Self {
        self.temp_time = seconds;
        self
    }

    /// Set the file backend directory.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Namespace with surrounding separators removed.
    pub fn namespace(&self) -> &str {
        self.prefix.trim_matches(':')
    }

    /// Backend actually used: remote backends whose driver is not compiled
    /// in fall back to the file backend.
    pub fn effective_backend(&self) -> BackendKind {
        if self.backend.is_available() {
            self.backend
        } else {
            BackendKind::File
        }
    }

    /// Check the options required by the effective backend.
    pub fn validate(&self) -> CacheResult<()> {
        match self.effective_backend() {
            BackendKind::File => match &self.path {
                Some(path) if !path.as_os_str().is_empty() => Ok(()),
                _ => Err(CacheError::Config("cache path is empty".to_string())),
            },
            BackendKind::Memory => Ok(()),
            BackendKind::Memcache => self.memcache.validate(),
            BackendKind::Memcached => self.memcached.validate(),
            BackendKind::Redis => self.redis.validate(),
        }
    }

    /// Expiry policy derived from `expire` and `temp_time`.
    pub fn expiry(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.expire, self.temp_time)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> CacheResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CacheError::Config(format!("{} is not a valid number: {}", name, value)))
}

/// How long a write lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the configured `expire`
    Permanent,
    /// Use the configured `temp_time`
    #[default]
    Temporary,
    /// Explicit seconds, 0 never expires
    Seconds(u64),
}

impl From<u64> for Ttl {
    fn from(seconds: u64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self::Seconds(duration.as_secs())
    }
}

/// Resolves [`Ttl`] values against configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    permanent: u64,
    temporary: u64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        CacheConfig::default().expiry()
    }
}

impl ExpiryPolicy {
    pub fn new(permanent: u64, temporary: u64) -> Self {
        Self {
            permanent,
            temporary,
        }
    }

    /// Store TTL for `ttl`; `None` never expires.
    pub fn resolve(&self, ttl: Ttl) -> Option<Duration> {
        let seconds = match ttl {
            Ttl::Permanent => self.permanent,
            Ttl::Temporary => self.temporary,
            Ttl::Seconds(seconds) => seconds,
        };
        (seconds > 0).then(|| Duration::from_secs(seconds))
    }
}
