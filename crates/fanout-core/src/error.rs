//! Error types for registry construction and mutation.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the target registry.
///
/// Construction errors are fatal: a distributor with a malformed target set
/// refuses to start rather than silently dropping traffic.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Two targets were registered under the same name.
    #[error("duplicate target name: {name}")]
    DuplicateTarget {
        /// The conflicting target name.
        name: String,
    },

    /// A health update referenced a target that was never registered.
    #[error("unknown target: {name}")]
    UnknownTarget {
        /// The unrecognized target name.
        name: String,
    },

    /// A target was configured with a negative weight.
    #[error("target {name} has negative weight {weight}")]
    NegativeWeight {
        /// The offending target name.
        name: String,
        /// The configured weight.
        weight: f64,
    },

    /// The summed weight of all targets is not positive, so no traffic
    /// could ever be routed.
    #[error("total target weight must be positive, got {total}")]
    NonPositiveTotalWeight {
        /// The summed configured weight.
        total: f64,
    },

    /// No targets were configured at all.
    #[error("at least one target must be configured")]
    NoTargets,
}

impl CoreError {
    /// Creates a duplicate-target error.
    pub fn duplicate_target(name: impl Into<String>) -> Self {
        Self::DuplicateTarget { name: name.into() }
    }

    /// Creates an unknown-target error.
    pub fn unknown_target(name: impl Into<String>) -> Self {
        Self::UnknownTarget { name: name.into() }
    }
}
