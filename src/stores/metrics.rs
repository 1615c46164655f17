//! Metrics middleware for cache stores.
//!
//! This module provides a `MetricsStore` wrapper that emits metrics for all
//! store operations (reads, writes, removes, sweeps) to a user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use op_cache::{HashMapStore, MetricsStore, OpCache, OpCacheConfig, Store};
//!
//! let sink = Arc::new(MyMetricsSink::new());
//! let inner: Arc<dyn Store<User, DbError>> = Arc::new(HashMapStore::default());
//! let store = Arc::new(MetricsStore::new(inner, sink.clone()));
//!
//! let cache = OpCache::with_store(OpCacheConfig::default(), store);
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::entry::{Entry, EntryStatus};
use crate::key::CacheKey;
use crate::store::Store;

/// Metrics emitted by the MetricsStore wrapper.
#[derive(Debug, Clone)]
pub enum CacheMetric {
    /// Emitted on every store read.
    Read {
        /// The internal key that was read.
        key: String,
        /// Whether an entry was found.
        hit: bool,
        /// Status of the entry at read time (only present when hit=true).
        status: Option<EntryStatus>,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the wrapped store (from Store::name()).
        tier: String,
    },
    /// Emitted on every store write.
    Write {
        key: String,
        latency_ms: f64,
        tier: String,
    },
    /// Emitted on every remove.
    Remove {
        key: String,
        latency_ms: f64,
        tier: String,
    },
    /// Emitted on every expired-entry sweep.
    Evict {
        /// Number of entries removed by the sweep.
        removed: usize,
        latency_ms: f64,
        tier: String,
    },
}

/// Trait for receiving cache metrics.
///
/// Implement this trait to collect metrics from `MetricsStore`.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emit a single metric.
    ///
    /// This is called synchronously in the hot path of cache operations.
    /// Implementations should be fast (e.g., buffer metrics in memory).
    fn emit(&self, metric: CacheMetric);

    /// Flush any buffered metrics.
    ///
    /// Typically called at shutdown or at periodic intervals.
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A store wrapper that emits metrics for all operations.
pub struct MetricsStore<T, E> {
    inner: Arc<dyn Store<T, E>>,
    sink: Arc<dyn MetricsSink>,
    tier_name: String,
}

impl<T, E> MetricsStore<T, E> {
    /// Create a new MetricsStore wrapping the given store.
    pub fn new(inner: Arc<dyn Store<T, E>>, sink: Arc<dyn MetricsSink>) -> Self {
        let tier_name = inner.name().to_string();
        MetricsStore {
            inner,
            sink,
            tier_name,
        }
    }

    fn elapsed_ms(start: Instant) -> f64 {
        start.elapsed().as_secs_f64() * 1000.0
    }
}

#[async_trait]
impl<T, E> Store<T, E> for MetricsStore<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn get(&self, key: &CacheKey) -> Option<Arc<Entry<T, E>>> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        let latency_ms = Self::elapsed_ms(start);

        let status = result
            .as_ref()
            .map(|entry| entry.status(tokio::time::Instant::now()));

        self.sink.emit(CacheMetric::Read {
            key: key.to_string(),
            hit: result.is_some(),
            status,
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn set(&self, key: CacheKey, entry: Arc<Entry<T, E>>) {
        let start = Instant::now();
        let key_name = key.to_string();
        self.inner.set(key, entry).await;

        self.sink.emit(CacheMetric::Write {
            key: key_name,
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });
    }

    async fn remove(&self, key: &CacheKey) {
        let start = Instant::now();
        self.inner.remove(key).await;

        self.sink.emit(CacheMetric::Remove {
            key: key.to_string(),
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });
    }

    async fn evict_expired(&self) -> usize {
        let start = Instant::now();
        let removed = self.inner.evict_expired().await;

        self.sink.emit(CacheMetric::Evict {
            removed,
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });

        removed
    }

    async fn len(&self) -> usize {
        self.inner.len().await
    }
}
