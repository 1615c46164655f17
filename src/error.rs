/// Error type for cache configuration and contract failures.
///
/// Errors returned by cached operations are not wrapped in this type: they are
/// stored and handed back to callers as the operation's own `E`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// A configuration value could not be loaded.
    #[error("invalid cache configuration for '{field}': {message}")]
    Config { field: String, message: String },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A batch operation returned a different number of results than it was
    /// given indices. This is a programming error and is raised as a panic.
    #[error("batch operation returned {actual} results for {expected} key indices")]
    BatchContract { expected: usize, actual: usize },
}

impl CacheError {
    /// Create a new configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}
