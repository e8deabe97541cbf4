//! Worker pool lifecycle management.
//!
//! Spawns the configured number of dispatch workers and supervises their
//! shutdown. Graceful shutdown expects the intake buffer to be closed
//! first: workers drain the remaining packets, exit on their own, and the
//! pool joins them within a grace period. Only when the grace period
//! elapses are workers cancelled outright.

use std::{sync::Arc, time::Duration};

use fanout_core::DispatchStats;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    dispatcher::Dispatcher,
    error::{DispatchError, Result},
    queue::IntakeQueue,
    worker::DispatchWorker,
};

/// Supervised pool of dispatch workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// Spawns `count` workers over the shared queue and dispatcher.
    pub fn spawn(
        count: usize,
        queue: Arc<IntakeQueue>,
        dispatcher: Arc<Dispatcher>,
        stats: Arc<DispatchStats>,
        cancel: CancellationToken,
    ) -> Self {
        info!(worker_count = count, "spawning dispatch workers");

        let handles = (0..count)
            .map(|worker_id| {
                let worker = DispatchWorker::new(
                    worker_id,
                    queue.clone(),
                    dispatcher.clone(),
                    stats.clone(),
                    cancel.clone(),
                );
                tokio::spawn(async move { worker.run().await })
            })
            .collect();

        Self { handles, cancel }
    }

    /// Waits for all workers to drain and exit.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ShutdownTimeout`] if workers are still
    /// running when the grace period elapses; they are cancelled before
    /// returning.
    pub async fn shutdown_graceful(mut self, timeout: Duration) -> Result<()> {
        info!(
            worker_count = self.handles.len(),
            timeout_secs = timeout.as_secs(),
            "waiting for dispatch workers to drain"
        );

        let handles = std::mem::take(&mut self.handles);
        let drain = async {
            let mut panics = Vec::new();
            for (worker_id, handle) in handles.into_iter().enumerate() {
                if let Err(join_error) = handle.await {
                    error!(worker_id, error = %join_error, "worker task panicked");
                    panics.push(DispatchError::WorkerPanic {
                        worker_id,
                        message: join_error.to_string(),
                    });
                }
            }
            panics
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(panics) => {
                if !panics.is_empty() {
                    warn!(panicked = panics.len(), "some workers panicked during shutdown");
                }
                info!("worker pool shutdown completed");
                Ok(())
            },
            Err(_elapsed) => {
                error!(
                    timeout_secs = timeout.as_secs(),
                    "workers did not drain in time, cancelling"
                );
                self.cancel.cancel();
                Err(DispatchError::ShutdownTimeout { timeout })
            },
        }
    }

    /// Whether any worker task is still running.
    pub fn has_active_workers(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let active = self.handles.iter().filter(|h| !h.is_finished()).count();
        if active > 0 && !self.cancel.is_cancelled() {
            warn!(
                active_workers = active,
                "worker pool dropped without shutdown, cancelling workers"
            );
            self.cancel.cancel();
        }
    }
}
