//! Configuration management for the fanout distributor.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use fanout_core::TargetConfig;
use fanout_dispatch::{ClientConfig, DispatchConfig, HealthConfig, RetryPolicy};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// One configured analyzer target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetEntry {
    /// Stable target name, unique across the list.
    pub name: String,
    /// Analyzer ingest URL.
    pub url: String,
    /// Relative routing weight.
    pub weight: f64,
}

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// The service starts out-of-the-box against four default analyzers;
/// create `config.toml` to point it at a real deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Dispatch
    /// Number of concurrent dispatch workers.
    ///
    /// Environment variable: `WORKERS`
    #[serde(default = "default_workers", alias = "WORKERS")]
    pub workers: usize,
    /// Intake buffer capacity in packets.
    ///
    /// Environment variable: `CAPACITY`
    #[serde(default = "default_capacity", alias = "CAPACITY")]
    pub capacity: usize,

    // Retry
    /// Additional attempts after the first failed send.
    ///
    /// Environment variable: `RETRIES`
    #[serde(default = "default_retries", alias = "RETRIES")]
    pub retries: u32,
    /// Base delay for exponential backoff in milliseconds.
    ///
    /// Environment variable: `RETRY_BASE_DELAY_MS`
    #[serde(default = "default_base_delay_ms", alias = "RETRY_BASE_DELAY_MS")]
    pub retry_base_delay_ms: u64,

    // Transport
    /// Per-attempt send timeout in seconds.
    ///
    /// Environment variable: `SEND_TIMEOUT_SECONDS`
    #[serde(default = "default_send_timeout", alias = "SEND_TIMEOUT_SECONDS")]
    pub send_timeout_seconds: u64,

    // Health monitoring
    /// Health monitor tick period in seconds.
    ///
    /// Environment variable: `HEALTH_INTERVAL_SECONDS`
    #[serde(default = "default_health_interval", alias = "HEALTH_INTERVAL_SECONDS")]
    pub health_interval_seconds: u64,
    /// Per-probe timeout in seconds.
    ///
    /// Environment variable: `PROBE_TIMEOUT_SECONDS`
    #[serde(default = "default_probe_timeout", alias = "PROBE_TIMEOUT_SECONDS")]
    pub probe_timeout_seconds: u64,

    // Shutdown
    /// Grace period for workers to drain on shutdown, in seconds.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECONDS`
    #[serde(default = "default_shutdown_timeout", alias = "SHUTDOWN_TIMEOUT_SECONDS")]
    pub shutdown_timeout_seconds: u64,

    // Targets
    /// Ordered analyzer target list. Registration order is also the
    /// selector's deterministic walk order.
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetEntry>,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Loads configuration from defaults, `config.toml`, and environment
    /// variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when extraction fails or validation rejects the
    /// resulting configuration; both are fatal at startup.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Converts to the dispatch crate's configuration types.
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            workers: self.workers,
            capacity: self.capacity,
            retry: RetryPolicy {
                retries: self.retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
            send_timeout: Duration::from_secs(self.send_timeout_seconds),
            health: HealthConfig {
                interval: Duration::from_secs(self.health_interval_seconds),
                probe_timeout: Duration::from_secs(self.probe_timeout_seconds),
            },
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_seconds),
            client: ClientConfig::default(),
        }
    }

    /// Converts the target list to registry configurations.
    pub fn to_target_configs(&self) -> Vec<TargetConfig> {
        self.targets
            .iter()
            .map(|t| TargetConfig::new(t.name.clone(), t.url.clone(), t.weight))
            .collect()
    }

    /// Parses the server socket address from host and port.
    ///
    /// # Errors
    ///
    /// Returns an error for an unparseable host/port combination.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr).context("invalid server address")
    }

    /// Validates configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }
        if self.workers == 0 {
            anyhow::bail!("workers must be greater than 0");
        }
        if self.capacity == 0 {
            anyhow::bail!("capacity must be greater than 0");
        }
        if self.retry_base_delay_ms == 0 {
            anyhow::bail!("retry_base_delay_ms must be greater than 0");
        }
        if self.send_timeout_seconds == 0 {
            anyhow::bail!("send_timeout_seconds must be greater than 0");
        }
        if self.health_interval_seconds == 0 {
            anyhow::bail!("health_interval_seconds must be greater than 0");
        }
        if self.probe_timeout_seconds == 0 {
            anyhow::bail!("probe_timeout_seconds must be greater than 0");
        }
        if self.targets.is_empty() {
            anyhow::bail!("at least one target must be configured");
        }
        for (index, target) in self.targets.iter().enumerate() {
            if target.name.is_empty() {
                anyhow::bail!("target {index} has an empty name");
            }
            if target.weight < 0.0 {
                anyhow::bail!("target {} has negative weight {}", target.name, target.weight);
            }
            if self.targets[..index].iter().any(|t| t.name == target.name) {
                anyhow::bail!("duplicate target name: {}", target.name);
            }
        }
        let total_weight: f64 = self.targets.iter().map(|t| t.weight).sum();
        if total_weight <= 0.0 {
            anyhow::bail!("total target weight must be positive, got {total_weight}");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            workers: default_workers(),
            capacity: default_capacity(),
            retries: default_retries(),
            retry_base_delay_ms: default_base_delay_ms(),
            send_timeout_seconds: default_send_timeout(),
            health_interval_seconds: default_health_interval(),
            probe_timeout_seconds: default_probe_timeout(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
            targets: default_targets(),
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_workers() -> usize {
    10
}

fn default_capacity() -> usize {
    5000
}

fn default_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_send_timeout() -> u64 {
    5
}

fn default_health_interval() -> u64 {
    5
}

fn default_probe_timeout() -> u64 {
    2
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_targets() -> Vec<TargetEntry> {
    vec![
        TargetEntry {
            name: "analyzer-1".to_string(),
            url: "http://analyzer-1:8001/analyze".to_string(),
            weight: 0.4,
        },
        TargetEntry {
            name: "analyzer-2".to_string(),
            url: "http://analyzer-2:8002/analyze".to_string(),
            weight: 0.3,
        },
        TargetEntry {
            name: "analyzer-3".to_string(),
            url: "http://analyzer-3:8003/analyze".to_string(),
            weight: 0.2,
        },
        TargetEntry {
            name: "analyzer-4".to_string(),
            url: "http://analyzer-4:8004/analyze".to_string(),
            weight: 0.1,
        },
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}
