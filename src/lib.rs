//! op-cache - an in-memory operation-result cache for Rust
//!
//! This library memoizes the `Result` of arbitrary async operations with:
//! - Time-based expiration plus a grace period (stale-while-revalidate)
//! - At most one background refresh per cached entry
//! - Per-error caching policy (discard, or custom expiration)
//! - Batched lookups backed by a single multi-key operation
//! - A periodic evictor shared by any number of caches
//!
//! # Example
//!
//! ```ignore
//! use op_cache::{OpCache, OpCacheConfig, spawn_evictor};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let users: OpCache<User, DbError> = OpCache::new(
//!         OpCacheConfig::new(Duration::from_secs(60), Duration::from_secs(300))
//!             .with_name("users"),
//!     );
//!
//!     let shutdown = CancellationToken::new();
//!     spawn_evictor(Duration::from_secs(60), shutdown.clone(), vec![Arc::new(users.clone())]);
//!
//!     let user = users
//!         .get("user:123", || async move { db.get_user(123).await })
//!         .await;
//! }
//! ```

mod cache;
mod config;
mod entry;
mod error;
mod evictor;
mod key;
mod store;
pub mod stores;

// Re-export public API
pub use cache::OpCache;
pub use config::{ErrorCaching, ErrorPolicy, ExpirationSettings, OpCacheConfig};
pub use entry::{Entry, EntryStatus};
pub use error::CacheError;
pub use evictor::{Evict, run_evictor, spawn_evictor};
pub use key::{CacheKey, MAX_PLAIN_KEY_LEN, transform_key};
pub use store::Store;
pub use stores::memory::{EvictOnSetConfig, HashMapStore, HashMapStoreConfig};
pub use stores::metrics::{CacheMetric, MetricsSink, MetricsStore};
pub use stores::moka::{MokaStore, MokaStoreConfig};
