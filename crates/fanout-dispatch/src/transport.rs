//! Transport adapter for analyzer endpoints.
//!
//! Defines the [`Transport`] trait the dispatcher and health monitor send
//! through, plus the production HTTP implementation. Outcome
//! classification (which statuses retry, which abort) belongs to the
//! dispatcher; the transport only reports what happened on the wire.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{DispatchError, Result};

/// Result of one send attempt that reached the target.
#[derive(Debug, Clone)]
pub struct SendResponse {
    /// HTTP status returned by the analyzer.
    pub status: u16,
    /// Wall-clock duration of the request.
    pub elapsed: Duration,
}

impl SendResponse {
    /// Whether the analyzer accepted the packet (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends packets and health probes to analyzer endpoints.
///
/// Implementations must not retry internally; the dispatcher owns retry
/// policy and target selection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a packet body to `url`, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Timeout`] when the deadline elapses and
    /// [`DispatchError::Network`] for connection-level failures. A response
    /// with an error status is `Ok`: status classification is the caller's.
    async fn send(&self, url: &str, body: Bytes, timeout: Duration) -> Result<SendResponse>;

    /// Probes `url` for liveness, bounded by `timeout`.
    ///
    /// Returns `true` only for a 2xx response within the deadline.
    async fn probe(&self, url: &str, timeout: Duration) -> bool;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Maximum idle connections kept per analyzer host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { user_agent: "fanout-distributor/0.1".to_string(), pool_max_idle_per_host: 20 }
    }
}

/// Production transport over HTTP.
///
/// Packets go out as `POST` with a JSON content type; probes are plain
/// `GET`s. The underlying client pools connections across workers, so one
/// transport instance is shared by the whole engine.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates an HTTP transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] if the client cannot be
    /// built with these settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| DispatchError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Creates an HTTP transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] if the client cannot be
    /// built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &str, body: Bytes, timeout: Duration) -> Result<SendResponse> {
        let start = std::time::Instant::now();

        let result = self
            .client
            .post(url)
            .timeout(timeout)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await;

        let elapsed = start.elapsed();

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(url, status, elapsed_ms = elapsed.as_millis() as u64, "send completed");
                Ok(SendResponse { status, elapsed })
            },
            Err(e) if e.is_timeout() => Err(DispatchError::timeout(timeout)),
            Err(e) if e.is_connect() => {
                Err(DispatchError::network(format!("connection failed: {e}")))
            },
            Err(e) => Err(DispatchError::network(e.to_string())),
        }
    }

    async fn probe(&self, url: &str, timeout: Duration) -> bool {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url, error = %e, "health probe failed");
                false
            },
        }
    }
}
