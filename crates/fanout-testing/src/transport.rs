//! Scripted in-memory transport for failure injection.
//!
//! Implements the dispatch [`Transport`] trait without sockets. Each
//! target URL can be scripted with a fixed status, a status sequence, or a
//! connection failure; probes are controlled independently. Send counts
//! are recorded per URL so tests can assert attempt placement.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use fanout_dispatch::{DispatchError, SendResponse, Transport};

#[derive(Debug)]
enum SendPlan {
    Status(u16),
    Sequence { queue: VecDeque<u16>, then: u16 },
    NetworkError,
    TimeoutError,
}

/// In-memory transport with per-URL scripted behavior.
///
/// URLs without a script accept everything with a 200.
#[derive(Debug, Default)]
pub struct MockTransport {
    plans: Mutex<HashMap<String, SendPlan>>,
    counts: Mutex<HashMap<String, u64>>,
    total_sends: AtomicU64,
    latency: Mutex<Option<Duration>>,
    probes: Mutex<HashMap<String, bool>>,
}

impl MockTransport {
    /// Creates a transport that accepts every send.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `url` to always answer with `status`.
    pub fn respond_with(&self, url: &str, status: u16) {
        self.plans.lock().expect("plans lock").insert(url.to_string(), SendPlan::Status(status));
    }

    /// Scripts `url` to answer with `statuses` in order, then `then` for
    /// every later send.
    pub fn respond_sequence(
        &self,
        url: &str,
        statuses: impl IntoIterator<Item = u16>,
        then: u16,
    ) {
        self.plans.lock().expect("plans lock").insert(url.to_string(), SendPlan::Sequence {
            queue: statuses.into_iter().collect(),
            then,
        });
    }

    /// Scripts `url` to fail with a connection error.
    pub fn fail_with_network(&self, url: &str) {
        self.plans.lock().expect("plans lock").insert(url.to_string(), SendPlan::NetworkError);
    }

    /// Scripts `url` to exceed its send timeout.
    pub fn fail_with_timeout(&self, url: &str) {
        self.plans.lock().expect("plans lock").insert(url.to_string(), SendPlan::TimeoutError);
    }

    /// Adds real latency to every send, for backpressure scenarios.
    pub fn delay_sends(&self, latency: Duration) {
        *self.latency.lock().expect("latency lock") = Some(latency);
    }

    /// Sets the probe result for a probe URL. Unset URLs probe healthy.
    pub fn set_probe_health(&self, url: &str, healthy: bool) {
        self.probes.lock().expect("probes lock").insert(url.to_string(), healthy);
    }

    /// Total sends across all URLs.
    pub fn send_count(&self) -> u64 {
        self.total_sends.load(Ordering::Relaxed)
    }

    /// Sends recorded against one URL.
    pub fn sends_to(&self, url: &str) -> u64 {
        self.counts.lock().expect("counts lock").get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        url: &str,
        _body: Bytes,
        timeout: Duration,
    ) -> Result<SendResponse, DispatchError> {
        self.total_sends.fetch_add(1, Ordering::Relaxed);
        *self.counts.lock().expect("counts lock").entry(url.to_string()).or_insert(0) += 1;

        let latency = *self.latency.lock().expect("latency lock");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let verdict = {
            let mut plans = self.plans.lock().expect("plans lock");
            match plans.get_mut(url) {
                None => Ok(200),
                Some(SendPlan::Status(status)) => Ok(*status),
                Some(SendPlan::Sequence { queue, then }) => Ok(queue.pop_front().unwrap_or(*then)),
                Some(SendPlan::NetworkError) => {
                    Err(DispatchError::network("connection refused"))
                },
                Some(SendPlan::TimeoutError) => Err(DispatchError::timeout(timeout)),
            }
        };

        verdict.map(|status| SendResponse { status, elapsed: latency.unwrap_or_default() })
    }

    async fn probe(&self, url: &str, _timeout: Duration) -> bool {
        self.probes.lock().expect("probes lock").get(url).copied().unwrap_or(true)
    }
}
