//! Error types for dispatch operations.
//!
//! Transport-level failures (network, timeout) are always retriable and
//! absorbed by the dispatcher's retry loop. Engine-level errors cover
//! configuration and shutdown conditions.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors raised by the dispatch engine and its transport.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Network-level connectivity failure reaching a target.
    #[error("network error: {message}")]
    Network {
        /// Description of the network failure.
        message: String,
    },

    /// A send attempt exceeded its per-request timeout.
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Invalid engine configuration, fatal at construction.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A worker task panicked during shutdown.
    #[error("worker {worker_id} panicked: {message}")]
    WorkerPanic {
        /// Index of the panicked worker.
        worker_id: usize,
        /// Panic description from the join error.
        message: String,
    },

    /// Workers did not drain within the shutdown grace period.
    #[error("shutdown timed out after {timeout:?}")]
    ShutdownTimeout {
        /// The grace period that elapsed.
        timeout: Duration,
    },
}

impl DispatchError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Whether a failed send attempt with this error may be retried on
    /// another target.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_retryable() {
        assert!(DispatchError::network("connection refused").is_retryable());
        assert!(DispatchError::timeout(Duration::from_secs(5)).is_retryable());
    }

    #[test]
    fn engine_errors_are_not_retryable() {
        assert!(!DispatchError::configuration("zero workers").is_retryable());
        assert!(!DispatchError::ShutdownTimeout { timeout: Duration::from_secs(30) }
            .is_retryable());
    }

    #[test]
    fn error_display_format() {
        let error = DispatchError::network("connection refused");
        assert_eq!(error.to_string(), "network error: connection refused");
    }
}
