//! Packet model for the distribution pipeline.
//!
//! The core treats packets as opaque: an identifier for logging and tracing
//! plus a byte payload handed verbatim to the transport. Payload schema is
//! the ingestion boundary's concern.

use bytes::Bytes;

/// A batched log packet flowing through the distributor.
///
/// Packets are owned by exactly one worker at a time: created at the
/// ingestion boundary, queued in the intake buffer, taken by a single
/// worker, dispatched once (possibly across several attempts), then
/// dropped. They are never shared between workers.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Identifier used for logging and tracing only. Not interpreted.
    pub id: String,

    /// Opaque payload forwarded verbatim to the selected analyzer.
    pub body: Bytes,
}

impl Packet {
    /// Creates a new packet from an identifier and payload.
    pub fn new(id: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { id: id.into(), body: body.into() }
    }

    /// Payload size in bytes.
    pub fn payload_size(&self) -> usize {
        self.body.len()
    }
}
