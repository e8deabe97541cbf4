//! Dispatch worker: the consuming end of the intake buffer.
//!
//! Each worker loops taking one packet at a time and handing it to the
//! dispatcher. Dispatch outcomes are absorbed here: a packet leaves as
//! delivered, exhausted, or no-targets, and none of those crosses the
//! worker boundary as an error. Workers exit when the buffer is closed and
//! drained, or immediately on cancellation.

use std::sync::Arc;

use fanout_core::{DispatchStats, Packet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    dispatcher::{DispatchOutcome, Dispatcher},
    queue::IntakeQueue,
};

/// One long-lived dispatch worker.
pub struct DispatchWorker {
    id: usize,
    queue: Arc<IntakeQueue>,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<DispatchStats>,
    cancel: CancellationToken,
}

impl DispatchWorker {
    /// Creates a worker with the given identity and shared components.
    pub fn new(
        id: usize,
        queue: Arc<IntakeQueue>,
        dispatcher: Arc<Dispatcher>,
        stats: Arc<DispatchStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self { id, queue, dispatcher, stats, cancel }
    }

    /// Main worker loop; runs until the buffer closes or cancellation.
    pub async fn run(&self) {
        debug!(worker_id = self.id, "dispatch worker starting");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!(worker_id = self.id, "dispatch worker cancelled");
                    break;
                }
                taken = self.queue.take() => {
                    let Some(packet) = taken else {
                        debug!(worker_id = self.id, "intake buffer closed and drained");
                        break;
                    };
                    self.process(packet).await;
                }
            }
        }

        info!(worker_id = self.id, "dispatch worker stopped");
    }

    /// Dispatches one packet and records its terminal outcome.
    async fn process(&self, packet: Packet) {
        match self.dispatcher.dispatch(&packet).await {
            DispatchOutcome::Delivered { target } => {
                self.stats.record_delivered();
                debug!(
                    worker_id = self.id,
                    packet_id = %packet.id,
                    target = %target,
                    "packet delivered"
                );
            },
            DispatchOutcome::Exhausted { target, reason } => {
                self.stats.record_failed_exhausted();
                warn!(
                    worker_id = self.id,
                    packet_id = %packet.id,
                    target = target.as_deref().unwrap_or("-"),
                    reason = %reason,
                    "packet dropped after exhausting attempts"
                );
            },
            DispatchOutcome::NoTargets => {
                self.stats.record_no_targets();
                warn!(
                    worker_id = self.id,
                    packet_id = %packet.id,
                    "packet dropped, no eligible target"
                );
            },
        }
    }
}
