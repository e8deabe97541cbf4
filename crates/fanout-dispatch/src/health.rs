//! Periodic health monitoring of analyzer targets.
//!
//! A single background task probes every registered target each tick, in
//! parallel with a per-probe timeout, and writes the results into the
//! registry. Detection latency is bounded by the tick interval plus the
//! probe timeout; packets sent to a freshly failed target inside that
//! window are recovered by the dispatcher's retry-with-exclusion.

use std::{sync::Arc, time::Duration};

use fanout_core::{Clock, TargetRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::transport::Transport;

/// Health monitor timing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    /// Pause between probe rounds.
    pub interval: Duration,
    /// Deadline for each individual probe.
    pub probe_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(5), probe_timeout: Duration::from_secs(2) }
    }
}

/// Derives the probe URL for a target endpoint.
///
/// The deployment convention exposes liveness next to the ingest path:
/// `http://analyzer-1:8001/analyze` is probed at
/// `http://analyzer-1:8001/health`.
pub fn probe_url(target_url: &str) -> String {
    match target_url.rsplit_once('/') {
        Some((base, _segment)) if base.contains("://") => format!("{base}/health"),
        _ => format!("{}/health", target_url.trim_end_matches('/')),
    }
}

/// Background task that keeps registry health flags current.
pub struct HealthMonitor {
    registry: Arc<TargetRegistry>,
    transport: Arc<dyn Transport>,
    config: HealthConfig,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl HealthMonitor {
    /// Creates a monitor over the given registry and transport.
    pub fn new(
        registry: Arc<TargetRegistry>,
        transport: Arc<dyn Transport>,
        config: HealthConfig,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        Self { registry, transport, config, clock, cancel }
    }

    /// Monitor loop: probe all targets, sleep one interval, repeat.
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            probe_timeout_secs = self.config.probe_timeout.as_secs(),
            "health monitor started"
        );

        loop {
            self.probe_all().await;

            tokio::select! {
                () = self.clock.sleep(self.config.interval) => {}
                () = self.cancel.cancelled() => break,
            }
        }

        info!("health monitor stopped");
    }

    /// Probes every registered target concurrently and records results.
    ///
    /// Repeated same-state results are idempotent; only transitions are
    /// logged.
    pub async fn probe_all(&self) {
        let snapshot = self.registry.snapshot().await;

        let probes: Vec<_> = snapshot
            .targets
            .into_iter()
            .map(|target| {
                let transport = self.transport.clone();
                let timeout = self.config.probe_timeout;
                tokio::spawn(async move {
                    let url = probe_url(&target.url);
                    let alive = transport.probe(&url, timeout).await;
                    (target.name, alive)
                })
            })
            .collect();

        for probe in probes {
            let Ok((name, alive)) = probe.await else {
                error!("health probe task panicked");
                continue;
            };

            match self.registry.set_health(&name, alive).await {
                Ok(previous) if previous != alive => {
                    if alive {
                        info!(target = %name, "target recovered");
                    } else {
                        warn!(target = %name, "target marked unhealthy");
                    }
                },
                Ok(_unchanged) => {
                    debug!(target = %name, healthy = alive, "health unchanged");
                },
                Err(error) => {
                    error!(target = %name, error = %error, "health update failed");
                },
            }
        }
    }
}

