//! Aggregate statistics counters for the dispatch pipeline.
//!
//! Counters are monotonic and updated with relaxed atomic increments from
//! the intake path, workers, and dispatcher. Readers assemble a
//! [`StatsSnapshot`]; cross-counter atomicity between `accepted` and
//! `depth` is not guaranteed, so the two may be observed slightly skewed.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;

/// Process-wide dispatch counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    accepted: AtomicU64,
    rejected_overload: AtomicU64,
    delivered: AtomicU64,
    failed_exhausted: AtomicU64,
    no_targets: AtomicU64,
}

impl DispatchStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a packet offered to the intake buffer.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a packet accepted into the intake buffer.
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a packet rejected because the buffer was full.
    pub fn record_rejected_overload(&self) {
        self.rejected_overload.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a packet delivered to an analyzer.
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a packet dropped after all attempts were exhausted.
    pub fn record_failed_exhausted(&self) {
        self.failed_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a packet dropped because no eligible target existed.
    pub fn record_no_targets(&self) {
        self.no_targets.fetch_add(1, Ordering::Relaxed);
    }

    /// Packets offered so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Packets accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Packets rejected for overload so far.
    pub fn rejected_overload(&self) -> u64 {
        self.rejected_overload.load(Ordering::Relaxed)
    }

    /// Packets delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Packets that exhausted all attempts so far.
    pub fn failed_exhausted(&self) -> u64 {
        self.failed_exhausted.load(Ordering::Relaxed)
    }

    /// Packets that found no eligible target so far.
    pub fn no_targets(&self) -> u64 {
        self.no_targets.load(Ordering::Relaxed)
    }
}

/// Per-target counters and health, as reported in snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetStats {
    /// Packets delivered to this target.
    pub delivered: u64,
    /// Failed attempts against this target. Retries inflate this above the
    /// process-wide `failed_exhausted` count.
    pub failed: u64,
    /// Health flag at snapshot time.
    pub healthy: bool,
}

/// Consistent read-only view of all counters for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Packets offered to the intake buffer.
    pub received: u64,
    /// Packets accepted into the buffer.
    pub accepted: u64,
    /// Packets refused because the buffer was full.
    pub rejected_overload: u64,
    /// Packets delivered to some analyzer.
    pub delivered: u64,
    /// Packets dropped after exhausting all attempts.
    pub failed_exhausted: u64,
    /// Packets dropped with no eligible target.
    pub no_targets: u64,
    /// Intake buffer occupancy at snapshot time.
    pub depth: usize,
    /// Per-target counters, keyed by target name.
    pub per_target: BTreeMap<String, TargetStats>,
}

impl StatsSnapshot {
    /// Builds a snapshot from the counters, buffer depth, and per-target
    /// statistics.
    pub fn assemble(
        stats: &DispatchStats,
        depth: usize,
        per_target: impl IntoIterator<Item = (String, TargetStats)>,
    ) -> Self {
        Self {
            received: stats.received(),
            accepted: stats.accepted(),
            rejected_overload: stats.rejected_overload(),
            delivered: stats.delivered(),
            failed_exhausted: stats.failed_exhausted(),
            no_targets: stats.no_targets(),
            depth,
            per_target: per_target.into_iter().collect(),
        }
    }
}
