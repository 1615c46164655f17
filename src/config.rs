//! Cache configuration.
//!
//! [`OpCacheConfig`] is built in code and may carry an error policy closure.
//! [`ExpirationSettings`] is the plain-data subset that can be loaded from JSON
//! or environment variables and turned into an `OpCacheConfig`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheError;

const DEFAULT_NAME: &str = "opcache";
const DEFAULT_EXPIRATION_MS: u64 = 60_000;
const DEFAULT_GRACE_EXPIRATION_MS: u64 = 300_000;

/// Decides how the error result of a single operation execution is cached.
pub type ErrorPolicy<E> = Arc<dyn Fn(&E) -> ErrorCaching + Send + Sync>;

/// Outcome of an [`ErrorPolicy`] for one error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCaching {
    /// Do not cache this result at all; the next access runs the operation again.
    pub discard: bool,
    /// Overrides `result_expiration` for this result.
    pub expiration: Option<Duration>,
    /// Overrides `result_grace_expiration` for this result.
    pub grace_expiration: Option<Duration>,
}

impl ErrorCaching {
    /// Cache the error with the configured expirations.
    pub fn cache() -> Self {
        Self::default()
    }

    /// Do not cache the error.
    pub fn discard() -> Self {
        ErrorCaching {
            discard: true,
            ..Self::default()
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_grace_expiration(mut self, grace_expiration: Duration) -> Self {
        self.grace_expiration = Some(grace_expiration);
        self
    }
}

/// Configuration for an [`OpCache`](crate::OpCache).
pub struct OpCacheConfig<E> {
    /// Name used in logs and metrics.
    pub name: String,

    /// Operation results are fresh for this long after they are produced.
    pub result_expiration: Duration,

    /// Expired results are still served for this long after expiration, while a
    /// background refresh runs. `Duration::ZERO` disables the grace period and
    /// with it background refreshes.
    pub result_grace_expiration: Duration,

    /// Optional policy for error results. Called once per failing operation
    /// execution, never per cache read.
    pub error_policy: Option<ErrorPolicy<E>>,
}

impl<E> OpCacheConfig<E> {
    pub fn new(result_expiration: Duration, result_grace_expiration: Duration) -> Self {
        OpCacheConfig {
            name: DEFAULT_NAME.to_string(),
            result_expiration,
            result_grace_expiration,
            error_policy: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the error policy.
    ///
    /// # Example
    /// ```ignore
    /// let config = OpCacheConfig::new(Duration::from_secs(60), Duration::from_secs(300))
    ///     .with_error_policy(|err: &DbError| match err {
    ///         DbError::NotFound => ErrorCaching::cache().with_expiration(Duration::from_secs(5)),
    ///         DbError::Timeout => ErrorCaching::discard(),
    ///     });
    /// ```
    pub fn with_error_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&E) -> ErrorCaching + Send + Sync + 'static,
    {
        self.error_policy = Some(Arc::new(policy));
        self
    }

    /// Expiration and grace expiration to cache `result` with, or `None` if the
    /// result must not be cached.
    ///
    /// Runs the error policy at most once.
    pub(crate) fn expirations_for<T>(&self, result: &Result<T, E>) -> Option<(Duration, Duration)> {
        let mut expiration = self.result_expiration;
        let mut grace_expiration = self.result_grace_expiration;

        if let (Err(err), Some(policy)) = (result, &self.error_policy) {
            let caching = policy(err);
            if caching.discard {
                return None;
            }
            if let Some(exp) = caching.expiration {
                expiration = exp;
            }
            if let Some(grace) = caching.grace_expiration {
                grace_expiration = grace;
            }
        }

        Some((expiration, grace_expiration))
    }
}

impl<E> Default for OpCacheConfig<E> {
    fn default() -> Self {
        ExpirationSettings::default().into()
    }
}

impl<E> Clone for OpCacheConfig<E> {
    fn clone(&self) -> Self {
        OpCacheConfig {
            name: self.name.clone(),
            result_expiration: self.result_expiration,
            result_grace_expiration: self.result_grace_expiration,
            error_policy: self.error_policy.clone(),
        }
    }
}

impl<E> fmt::Debug for OpCacheConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpCacheConfig")
            .field("name", &self.name)
            .field("result_expiration", &self.result_expiration)
            .field("result_grace_expiration", &self.result_grace_expiration)
            .field("error_policy", &self.error_policy.is_some())
            .finish()
    }
}

/// Expiration settings that can be loaded from JSON or the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationSettings {
    /// Milliseconds a result stays fresh.
    pub result_expiration_ms: u64,
    /// Milliseconds a result stays usable after expiring.
    pub result_grace_expiration_ms: u64,
}

impl Default for ExpirationSettings {
    fn default() -> Self {
        ExpirationSettings {
            result_expiration_ms: DEFAULT_EXPIRATION_MS,
            result_grace_expiration_ms: DEFAULT_GRACE_EXPIRATION_MS,
        }
    }
}

impl ExpirationSettings {
    /// Parse settings from a JSON object. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        serde_json::from_str(json)
            .map_err(|e| CacheError::Serialization(format!("Deserialization failed: {}", e)))
    }

    /// Load settings from `{prefix}_RESULT_EXPIRATION_MS` and
    /// `{prefix}_RESULT_GRACE_EXPIRATION_MS`. Unset variables take their defaults.
    pub fn from_env(prefix: &str) -> Result<Self, CacheError> {
        Self::from_vars(prefix, |name| std::env::var(name).ok())
    }

    fn from_vars(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CacheError> {
        let defaults = Self::default();
        let read = |suffix: &str, default: u64| -> Result<u64, CacheError> {
            let name = format!("{}_{}", prefix, suffix);
            match lookup(&name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| CacheError::config(name, e.to_string())),
                None => Ok(default),
            }
        };

        Ok(ExpirationSettings {
            result_expiration_ms: read("RESULT_EXPIRATION_MS", defaults.result_expiration_ms)?,
            result_grace_expiration_ms: read(
                "RESULT_GRACE_EXPIRATION_MS",
                defaults.result_grace_expiration_ms,
            )?,
        })
    }
}

impl<E> From<ExpirationSettings> for OpCacheConfig<E> {
    fn from(settings: ExpirationSettings) -> Self {
        OpCacheConfig::new(
            Duration::from_millis(settings.result_expiration_ms),
            Duration::from_millis(settings.result_grace_expiration_ms),
        )
    }
}
