use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::OpCacheConfig;
use crate::entry::Entry;
use crate::error::CacheError;
use crate::key::{CacheKey, transform_key};
use crate::store::Store;
use crate::stores::memory::HashMapStore;

/// Caches the results of arbitrary async operations under string keys.
///
/// Results are fresh for `result_expiration`. After that they stay usable for
/// `result_grace_expiration`: a lookup in that window returns the cached result
/// immediately and refreshes it in the background, with at most one refresh
/// running per cached entry. Past the grace window the operation is run again
/// and the caller waits for it.
///
/// Operation errors are cached like values, subject to the configured
/// [`ErrorPolicy`](crate::ErrorPolicy).
///
/// Cloning an `OpCache` is cheap; clones share the same store.
pub struct OpCache<T, E> {
    config: Arc<OpCacheConfig<E>>,
    store: Arc<dyn Store<T, E>>,
}

impl<T, E> Clone for OpCache<T, E> {
    fn clone(&self) -> Self {
        OpCache {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T, E> OpCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a cache backed by an in-memory [`HashMapStore`].
    pub fn new(config: OpCacheConfig<E>) -> Self {
        Self::with_store(config, Arc::new(HashMapStore::default()))
    }

    /// Create a cache backed by the given store.
    ///
    /// # Example
    /// ```ignore
    /// let store = Arc::new(MokaStore::new(MokaStoreConfig { max_capacity: 100_000 }));
    /// let cache: OpCache<User, DbError> = OpCache::with_store(OpCacheConfig::default(), store);
    /// ```
    pub fn with_store(config: OpCacheConfig<E>, store: Arc<dyn Store<T, E>>) -> Self {
        OpCache {
            config: Arc::new(config),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &OpCacheConfig<E> {
        &self.config
    }

    /// Get the result of an operation.
    ///
    /// - If the cached result is fresh, it is returned immediately.
    /// - If it is stale but within the grace period, it is returned immediately
    ///   and `op` is run in a background task to refresh it. Only one caller per
    ///   cached entry gets to start that task; other callers just get the stale
    ///   result.
    /// - Otherwise (not cached, or past the grace period) `op` is run, its result
    ///   is cached according to the configuration and returned.
    ///
    /// Concurrent callers that all find no usable entry each run `op`; the last
    /// one to finish wins the store.
    ///
    /// # Example
    /// ```ignore
    /// let user = cache.get("user:123", || async move {
    ///     db.get_user(123).await
    /// }).await?;
    /// ```
    pub async fn get<F, Fut>(&self, key: &str, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let key = transform_key(key);
        let cached = self.store.get(&key).await;
        let now = Instant::now();

        let Some(entry) = cached.filter(|entry| entry.is_grace_valid(now)) else {
            tracing::trace!("Cache miss: cache={}, key={}", self.config.name, key);
            return self.exec_op_and_cache(key, op).await;
        };

        if entry.is_fresh(now) {
            return entry.result().clone();
        }

        if entry.try_claim_reload() {
            tracing::debug!(
                "Scheduling background refresh: cache={}, key={}",
                self.config.name,
                key
            );
            let this = self.clone();
            tokio::spawn(async move {
                this.exec_op_and_cache(key, op).await;
            });
        }

        entry.result().clone()
    }

    /// Get the results of a multi-operation.
    ///
    /// A multi-operation produces results for several keys more efficiently than
    /// one call per key. It receives indices into `keys` and must return exactly
    /// one result per index, in the same order. Returning a different number of
    /// results panics.
    ///
    /// The returned vector matches `keys` position by position. Each element is
    /// served from the cache if it is fresh or within its grace period. Keys that
    /// are not cached or past their grace period are loaded with a single call to
    /// `multi_op`, which this method waits for. Keys served from the grace period
    /// are refreshed with a single background call to `multi_op` covering those
    /// whose refresh this call managed to claim.
    ///
    /// `multi_op` may run after this method returns, so it must own whatever it
    /// needs to map indices back to its inputs.
    ///
    /// # Example
    /// ```ignore
    /// let ids: Arc<[u64]> = Arc::from(vec![1, 2, 3]);
    /// let keys: Vec<String> = ids.iter().map(|id| format!("user:{}", id)).collect();
    /// let users = cache
    ///     .multi_get(&keys, move |indices| {
    ///         let ids = ids.clone();
    ///         async move { db.get_users(indices.iter().map(|&i| ids[i])).await }
    ///     })
    ///     .await;
    /// ```
    pub async fn multi_get<K, F, Fut>(&self, keys: &[K], multi_op: F) -> Vec<Result<T, E>>
    where
        K: AsRef<str>,
        F: Fn(Vec<usize>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Result<T, E>>> + Send + 'static,
    {
        let keys: Arc<[CacheKey]> = keys.iter().map(|key| transform_key(key.as_ref())).collect();

        let mut results: Vec<Option<Result<T, E>>> = Vec::with_capacity(keys.len());
        // Indices that must be loaded before returning
        let mut missing = Vec::new();
        // Indices served stale, with the entry whose refresh may be claimed
        let mut stale: Vec<(usize, Arc<Entry<T, E>>)> = Vec::new();

        let now = Instant::now();
        for (idx, key) in keys.iter().enumerate() {
            match self.store.get(key).await {
                Some(entry) if entry.is_fresh(now) => {
                    results.push(Some(entry.result().clone()));
                }
                Some(entry) if entry.is_grace_valid(now) => {
                    results.push(Some(entry.result().clone()));
                    stale.push((idx, entry));
                }
                _ => {
                    results.push(None);
                    missing.push(idx);
                }
            }
        }

        let multi_op = Arc::new(multi_op);

        if !missing.is_empty() {
            tracing::trace!(
                "Loading missing keys: cache={}, count={}",
                self.config.name,
                missing.len()
            );
            let loaded = self
                .exec_multi_op_and_cache(&keys, missing.clone(), multi_op.as_ref())
                .await;
            for (idx, result) in missing.into_iter().zip(loaded) {
                results[idx] = Some(result);
            }
        }

        let claimed: Vec<usize> = stale
            .into_iter()
            .filter(|(_, entry)| entry.try_claim_reload())
            .map(|(idx, _)| idx)
            .collect();

        if !claimed.is_empty() {
            tracing::debug!(
                "Scheduling background batch refresh: cache={}, count={}",
                self.config.name,
                claimed.len()
            );
            let this = self.clone();
            let keys = Arc::clone(&keys);
            tokio::spawn(async move {
                this.exec_multi_op_and_cache(&keys, claimed, multi_op.as_ref())
                    .await;
            });
        }

        results
            .into_iter()
            .map(|result| result.unwrap_or_else(|| unreachable!("every key index is filled")))
            .collect()
    }

    /// Return the cached result for `key` if it is fresh or within its grace
    /// period, without running anything or scheduling a refresh.
    pub async fn peek(&self, key: &str) -> Option<Result<T, E>> {
        let now = Instant::now();
        self.store
            .get(&transform_key(key))
            .await
            .filter(|entry| entry.is_grace_valid(now))
            .map(|entry| entry.result().clone())
    }

    /// Cache `result` for `key` as if an operation had just produced it.
    ///
    /// Returns `false` if the error policy discarded the result.
    pub async fn insert(&self, key: &str, result: Result<T, E>) -> bool {
        self.cache_result(transform_key(key), &result).await
    }

    /// Remove the cached result for `key`.
    pub async fn remove(&self, key: &str) {
        self.store.remove(&transform_key(key)).await;
    }

    /// Remove all entries that are past their grace period.
    ///
    /// Returns the number of entries removed.
    pub async fn evict(&self) -> usize {
        let removed = self.store.evict_expired().await;
        tracing::debug!(
            "Evicted expired entries: cache={}, removed={}",
            self.config.name,
            removed
        );
        removed
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    /// Run `op`, cache its result according to the configuration, and return it.
    async fn exec_op_and_cache<F, Fut>(&self, key: CacheKey, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let result = op().await;
        self.cache_result(key, &result).await;
        result
    }

    /// Run `multi_op` for `indices`, cache each result, and return them in
    /// `indices` order.
    async fn exec_multi_op_and_cache<F, Fut>(
        &self,
        keys: &[CacheKey],
        indices: Vec<usize>,
        multi_op: &F,
    ) -> Vec<Result<T, E>>
    where
        F: Fn(Vec<usize>) -> Fut,
        Fut: Future<Output = Vec<Result<T, E>>>,
    {
        let results = multi_op(indices.clone()).await;
        if results.len() != indices.len() {
            panic!(
                "{}",
                CacheError::BatchContract {
                    expected: indices.len(),
                    actual: results.len(),
                }
            );
        }

        for (&idx, result) in indices.iter().zip(&results) {
            self.cache_result(keys[idx].clone(), result).await;
        }

        results
    }

    /// Store `result` under `key` unless the error policy discards it.
    async fn cache_result(&self, key: CacheKey, result: &Result<T, E>) -> bool {
        let Some((expiration, grace_expiration)) = self.config.expirations_for(result) else {
            tracing::trace!(
                "Discarding error result: cache={}, key={}",
                self.config.name,
                key
            );
            return false;
        };

        let entry = Entry::new(result.clone(), expiration, grace_expiration);
        self.store.set(key, Arc::new(entry)).await;
        true
    }
}
