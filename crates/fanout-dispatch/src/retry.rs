//! Retry policy with exponential backoff.
//!
//! Failed attempts wait `base_delay * 2^attempt_index` before the next
//! selection, where `attempt_index` starts at 0 for the first failure.
//! The per-request timeout is separate and applies to each attempt
//! individually, never cumulatively.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry configuration for packet dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first. Zero disables retries.
    pub retries: u32,

    /// First backoff interval; later intervals double each failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 2, base_delay: Duration::from_millis(500) }
    }
}

impl RetryPolicy {
    /// Total attempts per packet, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Backoff before the attempt following failure number `attempt_index`.
    ///
    /// The exponent is capped so large retry counts cannot overflow the
    /// multiplier.
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let multiplier = 2_u32.saturating_pow(attempt_index.min(20));
        self.base_delay * multiplier
    }
}
