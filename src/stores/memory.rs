use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::entry::Entry;
use crate::key::CacheKey;
use crate::store::Store;

/// Configuration for eviction on set operations.
#[derive(Debug, Clone)]
pub struct EvictOnSetConfig {
    /// Provide a number between 0 and 1 to calculate whether eviction should run on each set.
    ///
    /// - `1.0` -> run eviction on every `set`
    /// - `0.5` -> run eviction on every 2nd `set` (on average)
    /// - `0.0` -> disable eviction
    pub frequency: f64,

    /// Remove items until the number of items in the map is lower than `max_items`.
    pub max_items: usize,
}

/// Configuration for HashMapStore.
#[derive(Debug, Clone, Default)]
pub struct HashMapStoreConfig {
    /// Also sweep entries on `set`, on top of any periodic evictor.
    pub evict_on_set: Option<EvictOnSetConfig>,
}

/// Thread-safe in-memory store using a HashMap behind a RwLock.
///
/// Lookups take the shared lock; `set`, `remove` and sweeps take the exclusive
/// lock for the duration of the map operation only.
pub struct HashMapStore<T, E> {
    state: RwLock<HashMap<CacheKey, Arc<Entry<T, E>>>>,
    evict_on_set: Option<EvictOnSetConfig>,
}

impl<T, E> HashMapStore<T, E> {
    /// Create a new HashMapStore with the given configuration.
    pub fn new(config: HashMapStoreConfig) -> Self {
        HashMapStore {
            state: RwLock::new(HashMap::new()),
            evict_on_set: config.evict_on_set,
        }
    }

    /// Run eviction if configured and random check passes.
    async fn maybe_evict(&self) {
        let Some(ref config) = self.evict_on_set else {
            return;
        };

        if config.frequency <= 0.0 {
            return;
        }

        let should_evict = config.frequency >= 1.0 || rand::random::<f64>() < config.frequency;
        if !should_evict {
            return;
        }

        let mut state = self.state.write().await;
        let now = Instant::now();

        // First delete all expired entries
        state.retain(|_, entry| entry.is_grace_valid(now));

        // If still over max_items, remove the entries that expire first
        if state.len() > config.max_items {
            let mut entries: Vec<_> = state
                .iter()
                .map(|(k, entry)| (k.clone(), entry.grace_expires_at()))
                .collect();
            entries.sort_by_key(|(_, grace_expires_at)| *grace_expires_at);

            let to_remove = state.len() - config.max_items;
            for (key, _) in entries.into_iter().take(to_remove) {
                state.remove(&key);
            }
        }
    }
}

impl<T, E> Default for HashMapStore<T, E> {
    fn default() -> Self {
        Self::new(HashMapStoreConfig::default())
    }
}

#[async_trait]
impl<T, E> Store<T, E> for HashMapStore<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "hashmap"
    }

    async fn get(&self, key: &CacheKey) -> Option<Arc<Entry<T, E>>> {
        let state = self.state.read().await;
        state.get(key).cloned()
    }

    async fn set(&self, key: CacheKey, entry: Arc<Entry<T, E>>) {
        {
            let mut state = self.state.write().await;
            state.insert(key, entry);
        }

        self.maybe_evict().await;
    }

    async fn remove(&self, key: &CacheKey) {
        let mut state = self.state.write().await;
        state.remove(key);
    }

    async fn evict_expired(&self) -> usize {
        let mut state = self.state.write().await;
        let now = Instant::now();
        let before = state.len();
        state.retain(|_, entry| entry.is_grace_valid(now));
        before - state.len()
    }

    async fn len(&self) -> usize {
        self.state.read().await.len()
    }
}
