use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Deadline used when `now + duration` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Status of a cache entry at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Before `expires_at`.
    Fresh,
    /// Between `expires_at` and `grace_expires_at`: usable, but should be refreshed.
    Stale,
    /// At or after `grace_expires_at`: must be recomputed.
    Expired,
}

/// A cached operation result and its expiration times.
///
/// Entries are never modified after construction. A refresh builds a new entry
/// and replaces the old one in the store, so a reader holding an `Arc<Entry>`
/// always sees a consistent result/deadline pair. The only mutable state is the
/// reload claim, which decides who refreshes this particular entry instance.
#[derive(Debug)]
pub struct Entry<T, E> {
    result: Result<T, E>,

    /// Before this instant the entry is fresh.
    expires_at: Instant,

    /// Before this instant the entry is still usable. Never earlier than `expires_at`.
    grace_expires_at: Instant,

    reloading: AtomicBool,
}

impl<T, E> Entry<T, E> {
    /// Create an entry that is fresh for `expiration` and usable for a further
    /// `grace_expiration`, starting now.
    pub fn new(result: Result<T, E>, expiration: Duration, grace_expiration: Duration) -> Self {
        Self::created_at(result, Instant::now(), expiration, grace_expiration)
    }

    /// Create an entry whose lifetime starts at `created`.
    pub fn created_at(
        result: Result<T, E>,
        created: Instant,
        expiration: Duration,
        grace_expiration: Duration,
    ) -> Self {
        let expires_at = deadline(created, expiration);
        let grace_expires_at = deadline(expires_at, grace_expiration);

        Entry {
            result,
            expires_at,
            grace_expires_at,
            reloading: AtomicBool::new(false),
        }
    }

    /// The cached operation result.
    pub fn result(&self) -> &Result<T, E> {
        &self.result
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn grace_expires_at(&self) -> Instant {
        self.grace_expires_at
    }

    /// Classify the entry at `now`.
    pub fn status(&self, now: Instant) -> EntryStatus {
        if now < self.expires_at {
            EntryStatus::Fresh
        } else if now < self.grace_expires_at {
            EntryStatus::Stale
        } else {
            EntryStatus::Expired
        }
    }

    /// Check if the entry is still fresh (not yet stale).
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Check if the entry is usable, fresh or stale.
    pub fn is_grace_valid(&self, now: Instant) -> bool {
        now < self.grace_expires_at
    }

    /// Check if the entry is stale but still usable.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.status(now) == EntryStatus::Stale
    }

    /// Check if the entry has expired and should not be used.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.grace_expires_at
    }

    /// Whether a refresh of this entry has been claimed.
    pub fn is_reloading(&self) -> bool {
        self.reloading.load(Ordering::Acquire)
    }

    /// Try to become the one caller allowed to refresh this entry.
    ///
    /// Returns `true` exactly once per entry instance. The plain load keeps the
    /// common "someone else is already on it" path free of contended writes.
    pub fn try_claim_reload(&self) -> bool {
        if self.reloading.load(Ordering::Acquire) {
            return false;
        }

        self.reloading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn deadline(from: Instant, after: Duration) -> Instant {
    from.checked_add(after)
        .or_else(|| from.checked_add(FAR_FUTURE))
        .unwrap_or(from)
}
