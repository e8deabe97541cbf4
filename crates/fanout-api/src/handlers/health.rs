//! Service health handler.
//!
//! Reports the distributor's own health for load balancers and
//! orchestration probes: queue utilization plus the analyzer health the
//! registry currently believes. Distinct from the per-target health
//! probes the dispatch engine runs internally.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use fanout_core::TargetStats;
use fanout_dispatch::DispatchEngine;
use serde::Serialize;
use tracing::instrument;

/// Service health report.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status; the process answers, so `healthy`.
    pub status: &'static str,
    /// When the report was generated.
    pub timestamp: DateTime<Utc>,
    /// Intake buffer state.
    pub queue: QueueHealth,
    /// Analyzer target summary.
    pub targets: TargetsHealth,
    /// Service version.
    pub version: &'static str,
}

/// Intake buffer occupancy.
#[derive(Debug, Serialize)]
pub struct QueueHealth {
    /// Current depth.
    pub depth: usize,
    /// Configured capacity.
    pub capacity: usize,
    /// Depth as a fraction of capacity.
    pub utilization: f64,
}

/// Analyzer fleet summary with per-target detail.
#[derive(Debug, Serialize)]
pub struct TargetsHealth {
    /// Registered targets.
    pub total: usize,
    /// Targets currently believed healthy.
    pub healthy: usize,
    /// Targets currently believed unhealthy.
    pub unhealthy: usize,
    /// Per-target counters and health, keyed by name.
    pub detail: std::collections::BTreeMap<String, TargetStats>,
}

/// Reports service health.
#[instrument(name = "health_check", skip(engine))]
pub async fn health_check(State(engine): State<Arc<DispatchEngine>>) -> Response {
    let snapshot = engine.stats_snapshot().await;

    let total = snapshot.per_target.len();
    let healthy = snapshot.per_target.values().filter(|t| t.healthy).count();
    let capacity = engine.capacity();

    let response = HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        queue: QueueHealth {
            depth: snapshot.depth,
            capacity,
            utilization: snapshot.depth as f64 / capacity as f64,
        },
        targets: TargetsHealth {
            total,
            healthy,
            unhealthy: total - healthy,
            detail: snapshot.per_target,
        },
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(response)).into_response()
}
