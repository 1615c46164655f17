use async_trait::async_trait;
use std::sync::Arc;

use crate::entry::Entry;
use crate::key::CacheKey;

/// A store maps internal keys to the current cache entry for that key.
///
/// Entries are handed out as `Arc`s and replaced wholesale on `set`; stores never
/// mutate an entry they hold. Implementations must not hold their own locks
/// across anything but the map operation itself.
#[async_trait]
pub trait Store<T, E>: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "hashmap"
    /// - "moka"
    fn name(&self) -> &'static str;

    /// Return the current entry for `key`, whatever its status.
    ///
    /// The response must be `None` if there is no entry.
    async fn get(&self, key: &CacheKey) -> Option<Arc<Entry<T, E>>>;

    /// Install `entry` as the current entry for `key`, replacing any previous one.
    async fn set(&self, key: CacheKey, entry: Arc<Entry<T, E>>);

    /// Removes the entry for `key`, if any.
    async fn remove(&self, key: &CacheKey);

    /// Remove every entry that is no longer grace-valid.
    ///
    /// Returns the number of entries removed.
    async fn evict_expired(&self) -> usize;

    /// Number of entries currently held, including expired ones not yet evicted.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
