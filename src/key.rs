//! Key normalization for the internal store.

use sha2::{Digest, Sha256};
use std::fmt;

/// Keys longer than this many bytes are replaced by their SHA-256 digest.
pub const MAX_PLAIN_KEY_LEN: usize = 100;

/// Internal key under which an entry is stored.
///
/// Short keys are kept as-is. Long keys are hashed so that the store never has
/// to hold or compare arbitrarily long strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A key of at most [`MAX_PLAIN_KEY_LEN`] bytes.
    Plain(String),
    /// SHA-256 digest of a longer key.
    Digest([u8; 32]),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Plain(key) => f.write_str(key),
            CacheKey::Digest(digest) => write!(f, "sha256:{}", hex::encode(digest)),
        }
    }
}

/// Map a caller-supplied key to its internal [`CacheKey`].
pub fn transform_key(key: &str) -> CacheKey {
    if key.len() <= MAX_PLAIN_KEY_LEN {
        return CacheKey::Plain(key.to_string());
    }

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    CacheKey::Digest(digest)
}
