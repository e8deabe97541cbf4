//! Packet ingestion handler.
//!
//! Accepts log packets from agents and offers them to the intake buffer
//! without waiting. The buffer's verdict maps directly onto HTTP: `202`
//! for accepted, `503` for overload so agents treat it as retryable
//! backpressure rather than data loss.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fanout_core::Packet;
use fanout_dispatch::{DispatchEngine, OfferOutcome};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// A log packet as submitted by an agent.
///
/// The dispatch core never inspects the message batch; it travels as an
/// opaque body. Validation here is limited to what the protocol promises:
/// a non-empty identifier and at least one message.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Unique identifier for this packet.
    pub packet_id: String,
    /// Identifier of the agent that collected the batch.
    pub agent_id: String,
    /// Batched log messages, opaque to the distributor.
    pub messages: Vec<serde_json::Value>,
}

/// Response for an accepted packet.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Always `accepted`.
    pub status: &'static str,
    /// Echo of the submitted packet id.
    pub packet_id: String,
    /// Number of messages queued for distribution.
    pub messages: usize,
}

/// Error payload for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable rejection reason.
    pub error: String,
}

fn reject(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

/// Ingests one log packet for distribution.
#[instrument(
    name = "ingest_packet",
    skip(engine, request),
    fields(packet_id = %request.packet_id, agent_id = %request.agent_id)
)]
pub async fn ingest_packet(
    State(engine): State<Arc<DispatchEngine>>,
    Json(request): Json<IngestRequest>,
) -> Response {
    if request.packet_id.is_empty() {
        return reject(StatusCode::UNPROCESSABLE_ENTITY, "packet_id must not be empty");
    }
    if request.messages.is_empty() {
        return reject(StatusCode::UNPROCESSABLE_ENTITY, "messages must not be empty");
    }

    let body = match serde_json::to_vec(&request) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "failed to re-serialize packet");
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "internal serialization failure");
        },
    };

    let message_count = request.messages.len();
    let packet = Packet::new(request.packet_id.clone(), body);

    match engine.offer(packet).await {
        OfferOutcome::Accepted => {
            info!(messages = message_count, "packet accepted");
            (
                StatusCode::ACCEPTED,
                Json(IngestResponse {
                    status: "accepted",
                    packet_id: request.packet_id,
                    messages: message_count,
                }),
            )
                .into_response()
        },
        OfferOutcome::Overloaded => {
            // Expected under load; the agent retries with backoff.
            warn!("intake buffer full, rejecting packet");
            reject(StatusCode::SERVICE_UNAVAILABLE, "intake buffer full, retry later")
        },
        OfferOutcome::Closed => {
            reject(StatusCode::SERVICE_UNAVAILABLE, "service is shutting down")
        },
    }
}
