//! Logical key decoding and canonical key encoding.
//!
//! A logical key like `"article.123"` names tag `article` and subkey `123`;
//! its canonical form `"article:123"` is what the store sees. Keys without
//! a separator belong to [`DEFAULT_TAG`].

use sha2::{Digest, Sha256};
use std::fmt;

/// Separator inside canonical keys.
pub const SEPARATOR: char = ':';

/// Separator accepted in logical keys.
pub const LOGICAL_SEPARATOR: char = '.';

/// Tag for keys that name no tag.
pub const DEFAULT_TAG: &str = "DefaultTag";

/// Store key holding the tag registry.
pub const REGISTRY_KEY: &str = "DefaultTag:AllTags";

/// Tag under which explicit tag lists are stored.
pub const EXPLICIT_LIST_TAG: &str = "tags";

/// A key split into its tag and subkey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParsedKey {
    tag: String,
    subkey: String,
}

impl ParsedKey {
    /// Build from parts.
    pub fn new(tag: impl Into<String>, subkey: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            subkey: subkey.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn subkey(&self) -> &str {
        &self.subkey
    }

    /// Whether this key addresses every member of its tag (`"tag."`).
    pub fn is_whole_tag(&self) -> bool {
        self.subkey.is_empty()
    }

    /// The store key for this entry.
    pub fn canonical(&self) -> String {
        KeyCodec::encode(&self.tag, &self.subkey)
    }
}

impl fmt::Display for ParsedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tag, SEPARATOR, self.subkey)
    }
}

/// Stateless key transforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCodec;

impl KeyCodec {
    /// Split a logical key into tag and subkey.
    ///
    /// A key that already contains [`SEPARATOR`] is treated as canonical and
    /// only split, so decoding is idempotent. Otherwise dots become
    /// separators and the key is split on the first one.
    ///
    /// ```
    /// use tagcache_core::key::KeyCodec;
    ///
    /// let parsed = KeyCodec::decode("test.value1.tj.log");
    /// assert_eq!(parsed.tag(), "test");
    /// assert_eq!(parsed.subkey(), "value1:tj:log");
    /// assert_eq!(KeyCodec::decode(&parsed.canonical()), parsed);
    /// ```
    pub fn decode(key: &str) -> ParsedKey {
        let normalized = Self::normalize(key);
        match normalized.split_once(SEPARATOR) {
            Some((tag, subkey)) => ParsedKey::new(tag, subkey),
            None => ParsedKey::new(DEFAULT_TAG, normalized),
        }
    }

    /// Join a tag and subkey into a canonical key.
    pub fn encode(tag: &str, subkey: &str) -> String {
        format!("{}{}{}", tag, SEPARATOR, subkey)
    }

    /// Normalize a name: dots become separators unless it is already canonical.
    pub fn normalize(name: &str) -> String {
        if name.contains(SEPARATOR) {
            name.to_string()
        } else {
            name.replace(LOGICAL_SEPARATOR, &SEPARATOR.to_string())
        }
    }

    /// Store key of the explicit member list kept for `tag`.
    pub fn registry_key_for(tag: &str) -> String {
        let digest = Sha256::digest(Self::normalize(tag).as_bytes());
        format!("{}{}{}", EXPLICIT_LIST_TAG, SEPARATOR, hex::encode(digest))
    }
}
