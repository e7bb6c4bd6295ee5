//! Error types for cache operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific errors.
///
/// Misses are never errors: lookups report them as `Ok(None)` and deletes of
/// absent entries as `Ok(false)`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis-specific error
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Memcached-specific error
    #[cfg(feature = "memcached")]
    #[error("Memcached error: {0}")]
    Memcached(#[from] memcache::MemcacheError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Malformed caller input, rejected before anything is written
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem error from the file backend
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("Cache error: {0}")]
    Other(String),
}

impl CacheError {
    /// Check if this error was raised while validating configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidUrl(_))
    }

    /// Check if this error rejects caller input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this error comes from the backing store itself.
    pub fn is_backend_error(&self) -> bool {
        match self {
            #[cfg(feature = "redis")]
            Self::Redis(_) => true,
            #[cfg(feature = "memcached")]
            Self::Memcached(_) => true,
            Self::Connection(_) | Self::Io(_) | Self::Other(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Self::Deserialization(err.to_string())
        } else {
            Self::Serialization(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Connection("Failed to connect".to_string());
        assert!(err.to_string().contains("Failed to connect"));

        let err = CacheError::InvalidArgument("empty cache key".to_string());
        assert_eq!(err.to_string(), "Invalid argument: empty cache key");
    }

    #[test]
    fn test_error_classification() {
        assert!(CacheError::Config("no path".into()).is_config_error());
        assert!(CacheError::InvalidUrl("x".into()).is_config_error());
        assert!(CacheError::InvalidArgument("x".into()).is_invalid_argument());
        assert!(CacheError::Connection("refused".into()).is_backend_error());
        assert!(!CacheError::Deserialization("bad".into()).is_backend_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: CacheError = serde_json::from_str::<i64>("not a number")
            .unwrap_err()
            .into();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }
}
