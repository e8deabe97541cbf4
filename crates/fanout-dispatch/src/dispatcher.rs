//! Packet dispatch with retry, exclusion, and backoff.
//!
//! One dispatch places one packet with one analyzer, re-selecting a
//! different target on retriable failure. Every attempt works against a
//! fresh registry snapshot, so a target that just turned unhealthy drops
//! out of selection without any coordination with the health monitor.

use std::{sync::Arc, time::Duration};

use fanout_core::{Clock, Packet, TargetRegistry, TargetView};
use tracing::{debug, warn};

use crate::{retry::RetryPolicy, selector::pick_target, transport::Transport};

/// Terminal outcome of one packet dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The packet was accepted by a target.
    Delivered {
        /// Name of the target that accepted the packet.
        target: Arc<str>,
    },
    /// All attempts were spent without a successful delivery.
    Exhausted {
        /// The last target attempted, if any send went out.
        target: Option<Arc<str>>,
        /// Why the dispatch gave up.
        reason: ExhaustReason,
    },
    /// No healthy, positive-weight target existed; nothing was sent.
    NoTargets,
}

/// Why a dispatch terminated without delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    /// The target rejected the payload with a non-retriable status;
    /// retrying elsewhere cannot help a defective payload.
    ClientError,
    /// Every allowed attempt failed with a retriable error.
    RetriesExhausted,
}

impl std::fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientError => write!(f, "client_error"),
            Self::RetriesExhausted => write!(f, "retries_exhausted"),
        }
    }
}

/// Statuses that justify another attempt on a different target.
///
/// 408 and 429 are transient by convention; other 4xx mean the payload
/// itself was rejected.
fn is_retriable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Places packets with analyzers, retrying across targets with
/// exponential backoff.
pub struct Dispatcher {
    registry: Arc<TargetRegistry>,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    send_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given registry and transport.
    pub fn new(
        registry: Arc<TargetRegistry>,
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
        send_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { registry, transport, policy, send_timeout, clock }
    }

    /// Dispatches one packet, attempting up to `retries + 1` sends.
    ///
    /// Each attempt selects from a fresh snapshot minus the targets that
    /// already failed for this packet. When the exclusion set saturates the
    /// eligible set before attempts run out, exclusions are reset and a
    /// previously failed target may be reused; `NoTargets` is reserved for
    /// the case where no eligible target exists at all.
    pub async fn dispatch(&self, packet: &Packet) -> DispatchOutcome {
        let max_attempts = self.policy.max_attempts();
        let mut excluded: Vec<Arc<str>> = Vec::new();
        let mut last_target: Option<Arc<str>> = None;

        for attempt in 0..max_attempts {
            let snapshot = self.registry.snapshot().await;

            let picked = {
                // The thread-local rng must not be held across an await.
                let mut rng = rand::rng();
                match pick_target(&mut rng, &snapshot.targets, &excluded) {
                    Some(target) => Some(target.clone()),
                    None if snapshot.has_eligible_target() => {
                        excluded.clear();
                        pick_target(&mut rng, &snapshot.targets, &excluded).cloned()
                    },
                    None => None,
                }
            };

            let Some(target) = picked else {
                debug!(packet_id = %packet.id, "no eligible target");
                return DispatchOutcome::NoTargets;
            };

            match self.attempt(packet, &target, attempt, max_attempts).await {
                AttemptOutcome::Delivered => {
                    return DispatchOutcome::Delivered { target: target.name };
                },
                AttemptOutcome::Permanent => {
                    return DispatchOutcome::Exhausted {
                        target: Some(target.name),
                        reason: ExhaustReason::ClientError,
                    };
                },
                AttemptOutcome::Retriable => {
                    last_target = Some(target.name.clone());
                    excluded.push(target.name);
                },
            }

            if attempt + 1 < max_attempts {
                self.clock.sleep(self.policy.backoff_delay(attempt)).await;
            }
        }

        DispatchOutcome::Exhausted { target: last_target, reason: ExhaustReason::RetriesExhausted }
    }

    /// Performs one send and classifies the result.
    async fn attempt(
        &self,
        packet: &Packet,
        target: &TargetView,
        attempt: u32,
        max_attempts: u32,
    ) -> AttemptOutcome {
        let result =
            self.transport.send(&target.url, packet.body.clone(), self.send_timeout).await;

        match result {
            Ok(response) if response.is_success() => {
                self.registry.record_delivered(&target.name).await;
                debug!(
                    packet_id = %packet.id,
                    target = %target.name,
                    status = response.status,
                    attempt = attempt + 1,
                    "packet delivered"
                );
                AttemptOutcome::Delivered
            },
            Ok(response) if is_retriable_status(response.status) => {
                self.registry.record_failed(&target.name).await;
                warn!(
                    packet_id = %packet.id,
                    target = %target.name,
                    status = response.status,
                    attempt = attempt + 1,
                    max_attempts,
                    "retriable failure"
                );
                AttemptOutcome::Retriable
            },
            Ok(response) => {
                self.registry.record_failed(&target.name).await;
                warn!(
                    packet_id = %packet.id,
                    target = %target.name,
                    status = response.status,
                    "client error, not retrying"
                );
                AttemptOutcome::Permanent
            },
            Err(error) => {
                self.registry.record_failed(&target.name).await;
                warn!(
                    packet_id = %packet.id,
                    target = %target.name,
                    error = %error,
                    attempt = attempt + 1,
                    max_attempts,
                    "transport failure"
                );
                AttemptOutcome::Retriable
            },
        }
    }
}

enum AttemptOutcome {
    Delivered,
    Retriable,
    Permanent,
}

