//! Dispatch engine facade.
//!
//! Packages the registry, intake buffer, dispatcher, worker pool, health
//! monitor, and statistics into one value constructed at startup and
//! shared by reference. There is no ambient state: the ingestion surface
//! talks to the engine it is handed.

use std::{sync::Arc, time::Duration};

use fanout_core::{
    Clock, DispatchStats, Packet, RealClock, StatsSnapshot, TargetConfig, TargetRegistry,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    dispatcher::Dispatcher,
    error::{DispatchError, Result},
    health::{HealthConfig, HealthMonitor},
    queue::{IntakeQueue, OfferOutcome},
    retry::RetryPolicy,
    transport::{ClientConfig, HttpTransport, Transport},
    worker_pool::WorkerPool,
};

/// Configuration for the dispatch engine.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of concurrent dispatch workers.
    pub workers: usize,

    /// Intake buffer capacity.
    pub capacity: usize,

    /// Retry policy applied to every packet.
    pub retry: RetryPolicy,

    /// Per-attempt transport timeout.
    pub send_timeout: Duration,

    /// Health monitor timing.
    pub health: HealthConfig,

    /// Grace period for workers to drain on shutdown.
    pub shutdown_timeout: Duration,

    /// HTTP client configuration.
    pub client: ClientConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: crate::DEFAULT_WORKER_COUNT,
            capacity: crate::DEFAULT_CAPACITY,
            retry: RetryPolicy::default(),
            send_timeout: crate::DEFAULT_SEND_TIMEOUT,
            health: HealthConfig::default(),
            shutdown_timeout: Duration::from_secs(30),
            client: ClientConfig::default(),
        }
    }
}

/// The dispatch engine: bounded intake, weighted fan-out, health tracking.
pub struct DispatchEngine {
    registry: Arc<TargetRegistry>,
    stats: Arc<DispatchStats>,
    queue: Arc<IntakeQueue>,
    dispatcher: Arc<Dispatcher>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: DispatchConfig,
    worker_cancel: CancellationToken,
    health_cancel: CancellationToken,
    worker_pool: Mutex<Option<WorkerPool>>,
    health_handle: Mutex<Option<JoinHandle<()>>>,
}

impl DispatchEngine {
    /// Creates an engine over the production HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] for an invalid target set
    /// or non-positive numeric configuration.
    pub fn new(targets: &[TargetConfig], config: DispatchConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.client.clone())?);
        Self::with_transport(targets, config, transport, Arc::new(RealClock::new()))
    }

    /// Creates an engine over an injected transport and clock.
    ///
    /// # Errors
    ///
    /// Same validation as [`new`](Self::new).
    pub fn with_transport(
        targets: &[TargetConfig],
        config: DispatchConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::validate(&config)?;

        let registry = Arc::new(
            TargetRegistry::from_configs(targets)
                .map_err(|e| DispatchError::configuration(e.to_string()))?,
        );
        let stats = Arc::new(DispatchStats::new());
        let queue = Arc::new(IntakeQueue::new(config.capacity));
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            transport.clone(),
            config.retry.clone(),
            config.send_timeout,
            clock.clone(),
        ));

        Ok(Self {
            registry,
            stats,
            queue,
            dispatcher,
            transport,
            clock,
            config,
            worker_cancel: CancellationToken::new(),
            health_cancel: CancellationToken::new(),
            worker_pool: Mutex::new(None),
            health_handle: Mutex::new(None),
        })
    }

    fn validate(config: &DispatchConfig) -> Result<()> {
        if config.workers == 0 {
            return Err(DispatchError::configuration("worker count must be positive"));
        }
        if config.capacity == 0 {
            return Err(DispatchError::configuration("intake capacity must be positive"));
        }
        if config.retry.base_delay.is_zero() {
            return Err(DispatchError::configuration("retry base delay must be positive"));
        }
        if config.send_timeout.is_zero() {
            return Err(DispatchError::configuration("send timeout must be positive"));
        }
        if config.health.interval.is_zero() {
            return Err(DispatchError::configuration("health interval must be positive"));
        }
        if config.health.probe_timeout.is_zero() {
            return Err(DispatchError::configuration("probe timeout must be positive"));
        }
        Ok(())
    }

    /// Starts the worker pool and health monitor. Idempotent.
    pub async fn start(&self) {
        let mut pool_slot = self.worker_pool.lock().await;
        if pool_slot.is_some() {
            warn!("dispatch engine already started");
            return;
        }

        info!(
            workers = self.config.workers,
            capacity = self.config.capacity,
            retries = self.config.retry.retries,
            "starting dispatch engine"
        );

        *pool_slot = Some(WorkerPool::spawn(
            self.config.workers,
            self.queue.clone(),
            self.dispatcher.clone(),
            self.stats.clone(),
            self.worker_cancel.clone(),
        ));

        let monitor = HealthMonitor::new(
            self.registry.clone(),
            self.transport.clone(),
            self.config.health.clone(),
            self.clock.clone(),
            self.health_cancel.clone(),
        );
        *self.health_handle.lock().await =
            Some(tokio::spawn(async move { monitor.run().await }));

        info!("dispatch engine started");
    }

    /// Offers a packet to the intake buffer without waiting.
    ///
    /// Updates the received/accepted/rejected counters and returns the
    /// buffer's verdict for the ingestion surface to map onto its protocol.
    pub async fn offer(&self, packet: Packet) -> OfferOutcome {
        self.stats.record_received();

        let packet_id = packet.id.clone();
        let outcome = self.queue.offer(packet).await;
        match outcome {
            OfferOutcome::Accepted => {
                self.stats.record_accepted();
            },
            OfferOutcome::Overloaded => {
                self.stats.record_rejected_overload();
                debug!(packet_id = %packet_id, "intake buffer full, packet rejected");
            },
            OfferOutcome::Closed => {
                debug!(packet_id = %packet_id, "intake buffer closed, packet rejected");
            },
        }
        outcome
    }

    /// Assembles a statistics snapshot for reporting.
    pub async fn stats_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::assemble(&self.stats, self.queue.depth(), self.registry.target_stats().await)
    }

    /// The engine's target registry.
    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    /// Current intake buffer occupancy.
    pub fn depth(&self) -> usize {
        self.queue.depth()
    }

    /// Intake buffer capacity.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Stops intake, the health monitor, and the workers, in that order.
    ///
    /// The buffer is closed first so workers drain the backlog; the grace
    /// period bounds how long draining may take.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ShutdownTimeout`] if the backlog did not
    /// drain within the grace period.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down dispatch engine");

        self.queue.close().await;

        self.health_cancel.cancel();
        if let Some(handle) = self.health_handle.lock().await.take() {
            if handle.await.is_err() {
                warn!("health monitor task panicked during shutdown");
            }
        }

        if let Some(pool) = self.worker_pool.lock().await.take() {
            pool.shutdown_graceful(self.config.shutdown_timeout).await?;
        } else {
            info!("dispatch engine was never started, nothing to stop");
        }

        info!("dispatch engine stopped");
        Ok(())
    }
}
