//! Periodic removal of expired entries.
//!
//! Caches never drop entries on their own; an entry past its grace period is
//! simply ignored on lookup. Run an evictor to reclaim that memory:
//!
//! ```ignore
//! let shutdown = CancellationToken::new();
//! let handle = spawn_evictor(
//!     Duration::from_secs(60),
//!     shutdown.clone(),
//!     vec![Arc::new(users.clone()), Arc::new(sessions.clone())],
//! );
//!
//! // ...
//! shutdown.cancel();
//! handle.await?;
//! ```

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cache::OpCache;

/// Anything that can sweep its expired entries.
///
/// Implemented by every [`OpCache`], whatever its value and error types, so one
/// evictor can serve unrelated caches.
#[async_trait]
pub trait Evict: Send + Sync {
    /// Remove expired entries, returning how many were removed.
    async fn evict(&self) -> usize;
}

#[async_trait]
impl<T, E> Evict for OpCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    async fn evict(&self) -> usize {
        OpCache::evict(self).await
    }
}

/// Sweep `caches` every `period` until `shutdown` is cancelled.
///
/// The first sweep happens one `period` after the call. Sweeps of different
/// caches run concurrently; each cache is swept once per tick.
pub async fn run_evictor(
    period: Duration,
    shutdown: CancellationToken,
    caches: Vec<Arc<dyn Evict>>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        "Evictor started: period_ms={}, caches={}",
        period.as_millis(),
        caches.len()
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let removed: usize = join_all(caches.iter().map(|cache| cache.evict()))
            .await
            .into_iter()
            .sum();
        tracing::debug!("Evictor sweep finished: removed={}", removed);
    }

    tracing::info!("Evictor stopped");
}

/// Spawn [`run_evictor`] on the current tokio runtime.
pub fn spawn_evictor(
    period: Duration,
    shutdown: CancellationToken,
    caches: Vec<Arc<dyn Evict>>,
) -> JoinHandle<()> {
    tokio::spawn(run_evictor(period, shutdown, caches))
}
