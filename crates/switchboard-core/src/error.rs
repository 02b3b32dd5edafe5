//! Error taxonomy for the state layer.
//!
//! Two levels exist:
//! - [`StoreError`] is what the backing store adapter reports. Nothing below
//!   the cache components ever swallows it.
//! - [`CacheError`] is what the cache components work with internally. Their
//!   public surface collapses it into `None` / `false` according to each
//!   component's failure policy.

use std::time::Duration;
use thiserror::Error;

/// Result type for backing store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for cache component operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by a backing store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No usable connection (refused, dropped, pool exhausted).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A command exceeded its deadline.
    #[error("Store command timed out: {0}")]
    Timeout(String),

    /// The store answered with an error reply (e.g. `WRONGTYPE`).
    #[error("Store command failed: {0}")]
    Command(String),

    /// The adapter could not be built from its configuration.
    #[error("Store configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Creates a timeout error for a command that ran past `deadline`.
    #[must_use]
    pub fn deadline_exceeded(command: &str, deadline: Duration) -> Self {
        Self::Timeout(format!("{command} exceeded {}ms", deadline.as_millis()))
    }

    /// Returns true if retrying the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Short machine-readable label, used as a metrics dimension.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Timeout(_) => "timeout",
            Self::Command(_) => "command",
            Self::Configuration(_) => "configuration",
        }
    }
}

/// Errors raised inside the cache components.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A value could not be encoded on write or decoded on read.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A TTL of zero was requested; the minimum is one second.
    #[error("Invalid TTL: {0}s (minimum is 1s)")]
    InvalidTtl(u64),

    /// A queue priority that the store cannot use as a score.
    #[error("Invalid priority: {0}")]
    InvalidPriority(f64),
}

impl CacheError {
    /// Returns true if the error came from the backing store rather than the payload.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Short machine-readable label, used as a metrics dimension.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Store(e) => e.kind(),
            Self::Serialization(_) => "serialization",
            Self::InvalidTtl(_) => "invalid_ttl",
            Self::InvalidPriority(_) => "invalid_priority",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_retryable() {
        assert!(StoreError::Unavailable("refused".into()).is_retryable());
        assert!(StoreError::Timeout("GET".into()).is_retryable());
        assert!(!StoreError::Command("WRONGTYPE".into()).is_retryable());
        assert!(!StoreError::Configuration("bad url".into()).is_retryable());
    }

    #[test]
    fn test_deadline_exceeded_message() {
        let err = StoreError::deadline_exceeded("ZPOPMAX", Duration::from_millis(250));
        let msg = err.to_string();
        assert!(msg.contains("ZPOPMAX"));
        assert!(msg.contains("250ms"));
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_cache_error_from_store_error() {
        let err = CacheError::from(StoreError::Unavailable("down".into()));
        assert!(err.is_store_failure());
        assert_eq!(err.kind(), "unavailable");
        assert!(err.to_string().contains("down"));
    }

    #[test]
    fn test_cache_error_from_serde() {
        let serde_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err = CacheError::from(serde_err);
        assert!(!err.is_store_failure());
        assert_eq!(err.kind(), "serialization");
    }

    #[test]
    fn test_invalid_ttl_display() {
        let err = CacheError::InvalidTtl(0);
        assert!(err.to_string().contains("minimum is 1s"));
    }
}
