use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use std::sync::Arc;
use tokio::time::Instant;

use crate::entry::Entry;
use crate::key::CacheKey;
use crate::store::Store;

/// Configuration for MokaStore.
#[derive(Debug, Clone)]
pub struct MokaStoreConfig {
    /// Maximum number of entries the cache can hold.
    pub max_capacity: u64,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        MokaStoreConfig {
            max_capacity: 10_000,
        }
    }
}

/// Bounded concurrent store using Moka.
///
/// Unlike [`HashMapStore`](crate::HashMapStore), MokaStore caps its size and
/// evicts by its own admission policy once `max_capacity` is reached. Sweeps
/// remove expired entries one at a time instead of locking the whole map; each
/// removal re-checks the entry under moka's per-key lock, which writes also
/// take, so an entry replaced during a sweep is kept.
///
/// Use this store when the key space is large or unbounded.
pub struct MokaStore<T, E> {
    cache: Cache<CacheKey, Arc<Entry<T, E>>>,
}

impl<T, E> MokaStore<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new MokaStore with the given configuration.
    ///
    /// # Example
    /// ```ignore
    /// let store: MokaStore<User, DbError> = MokaStore::new(MokaStoreConfig {
    ///     max_capacity: 100_000,
    /// });
    /// ```
    pub fn new(config: MokaStoreConfig) -> Self {
        MokaStore {
            cache: Cache::builder().max_capacity(config.max_capacity).build(),
        }
    }
}

#[async_trait]
impl<T, E> Store<T, E> for MokaStore<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "moka"
    }

    async fn get(&self, key: &CacheKey) -> Option<Arc<Entry<T, E>>> {
        self.cache.get(key).await
    }

    async fn set(&self, key: CacheKey, entry: Arc<Entry<T, E>>) {
        self.cache
            .entry(key)
            .and_upsert_with(|_| std::future::ready(entry))
            .await;
    }

    async fn remove(&self, key: &CacheKey) {
        self.cache.invalidate(key).await;
    }

    async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let candidates: Vec<Arc<CacheKey>> = self
            .cache
            .iter()
            .filter(|(_, entry)| !entry.is_grace_valid(now))
            .map(|(key, _)| key)
            .collect();

        let mut removed = 0;
        for key in &candidates {
            let outcome = self
                .cache
                .entry_by_ref(key.as_ref())
                .and_compute_with(|current| {
                    let op = match current {
                        Some(current) if !current.value().is_grace_valid(now) => Op::Remove,
                        _ => Op::Nop,
                    };
                    std::future::ready(op)
                })
                .await;
            if let CompResult::Removed(_) = outcome {
                removed += 1;
            }
        }
        self.cache.run_pending_tasks().await;

        removed
    }

    async fn len(&self) -> usize {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count() as usize
    }
}
