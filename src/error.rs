//! Error types for pool operations
use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for pool operations.
///
/// Factory failures (`Factory`) are never returned from `acquire`; the pool
/// consumes them internally and re-emits them as [`PoolEvent`]s. Callers see
/// only the errors produced by the call they made.
///
/// [`PoolEvent`]: crate::events::PoolEvent
#[derive(Error, Debug)]
pub enum Error {
    /// An acquire request was not satisfied within its timeout
    #[error("acquire timed out after {timeout_ms}ms")]
    Timeout {
        /// The configured acquire timeout in milliseconds
        timeout_ms: u64,
    },

    /// A factory destroy did not finish within its timeout
    #[error("resource destroy timed out after {timeout_ms}ms")]
    DestroyTimeout {
        /// The configured destroy timeout in milliseconds
        timeout_ms: u64,
    },

    /// The waiter queue is at capacity and the pool has no spare room
    #[error("acquire queue is full: {waiters} waiting (limit {max_waiting})")]
    QueueFull {
        /// Number of waiters already queued
        waiters: usize,
        /// The configured `max_waiting_clients` limit
        max_waiting: usize,
    },

    /// The pool is shutting down and no longer accepts acquire requests
    #[error("pool is draining and cannot satisfy requests")]
    Draining,

    /// A handle was returned that has no active loan in this pool
    #[error("resource is not currently borrowed from this pool")]
    UnknownResource,

    /// A factory operation failed
    #[error("factory error: {message}")]
    Factory {
        /// The error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pool configuration is invalid
    #[error("configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },

    /// Generic internal error
    #[error("internal pool error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl Error {
    /// Create an acquire-timeout error from the configured duration.
    pub(crate) fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create a destroy-timeout error from the configured duration.
    pub(crate) fn destroy_timeout(timeout: std::time::Duration) -> Self {
        Self::DestroyTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create a factory error from a message.
    pub fn factory<S: Into<String>>(message: S) -> Self {
        Self::Factory {
            message: message.into(),
            source: None,
        }
    }

    /// Create a factory error wrapping an underlying error.
    pub fn factory_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Factory {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub(crate) fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::QueueFull { .. } | Self::DestroyTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timeout_is_retryable() {
        let err = Error::timeout(Duration::from_millis(50));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("50ms"));
    }

    #[test]
    fn queue_full_is_retryable() {
        let err = Error::QueueFull {
            waiters: 8,
            max_waiting: 8,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("8 waiting"));
    }

    #[test]
    fn draining_is_not_retryable() {
        assert!(!Error::Draining.is_retryable());
        assert!(!Error::UnknownResource.is_retryable());
        assert!(!Error::configuration("bad").is_retryable());
    }

    #[test]
    fn factory_error_carries_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::factory_with_source("connect failed", io);
        assert!(err.to_string().contains("connect failed"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn destroy_timeout_display() {
        let err = Error::destroy_timeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "resource destroy timed out after 2000ms");
    }
}
