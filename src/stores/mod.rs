//! Store implementations for the cache library.

pub mod memory;
pub mod metrics;
pub mod moka;

pub use self::memory::{EvictOnSetConfig, HashMapStore, HashMapStoreConfig};
pub use self::metrics::{CacheMetric, MetricsSink, MetricsStore};
pub use self::moka::{MokaStore, MokaStoreConfig};
