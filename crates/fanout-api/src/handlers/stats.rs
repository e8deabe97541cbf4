//! Statistics reporting handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use fanout_core::StatsSnapshot;
use fanout_dispatch::DispatchEngine;
use tracing::instrument;

/// Returns the current statistics snapshot.
///
/// Used by the demo harness to validate weight distribution and by
/// monitoring to watch intake and delivery counters.
#[instrument(name = "stats_snapshot", skip(engine))]
pub async fn stats_snapshot(State(engine): State<Arc<DispatchEngine>>) -> Json<StatsSnapshot> {
    Json(engine.stats_snapshot().await)
}
