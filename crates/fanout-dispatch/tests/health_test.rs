//! Integration tests for the periodic health monitor.
//!
//! Lives outside `src/` because these tests exercise the monitor through
//! `fanout_testing::MockTransport`, and `fanout-testing` itself depends
//! on `fanout-dispatch`; running them as unit tests inside the crate
//! would build two incompatible copies of `fanout-dispatch`.

use std::sync::Arc;

use fanout_core::{RealClock, TargetConfig, TargetRegistry};
use fanout_dispatch::health::probe_url;
use fanout_dispatch::{HealthConfig, HealthMonitor};
use fanout_testing::MockTransport;
use tokio_util::sync::CancellationToken;

#[test]
fn probe_url_replaces_last_path_segment() {
    assert_eq!(probe_url("http://analyzer-1:8001/analyze"), "http://analyzer-1:8001/health");
    assert_eq!(probe_url("http://analyzer-1:8001/"), "http://analyzer-1:8001/health");
    assert_eq!(probe_url("http://analyzer-1:8001"), "http://analyzer-1:8001/health");
}

#[tokio::test]
async fn probe_round_writes_results_into_registry() {
    let configs = vec![
        TargetConfig::new("up", "http://up:8001/analyze", 0.5),
        TargetConfig::new("down", "http://down:8002/analyze", 0.5),
    ];
    let registry = Arc::new(TargetRegistry::from_configs(&configs).expect("valid configs"));

    let transport = Arc::new(MockTransport::new());
    transport.set_probe_health("http://down:8002/health", false);

    let monitor = HealthMonitor::new(
        registry.clone(),
        transport,
        HealthConfig::default(),
        Arc::new(RealClock::new()),
        CancellationToken::new(),
    );

    monitor.probe_all().await;

    let snapshot = registry.snapshot().await;
    let health: Vec<(&str, bool)> =
        snapshot.targets.iter().map(|t| (t.name.as_ref(), t.healthy)).collect();
    assert_eq!(health, [("up", true), ("down", false)]);
}

#[tokio::test]
async fn recovery_is_written_back() {
    let configs = vec![TargetConfig::new("flappy", "http://flappy:8001/analyze", 1.0)];
    let registry = Arc::new(TargetRegistry::from_configs(&configs).expect("valid configs"));

    let transport = Arc::new(MockTransport::new());
    let monitor = HealthMonitor::new(
        registry.clone(),
        transport.clone(),
        HealthConfig::default(),
        Arc::new(RealClock::new()),
        CancellationToken::new(),
    );

    transport.set_probe_health("http://flappy:8001/health", false);
    monitor.probe_all().await;
    assert!(!registry.snapshot().await.targets[0].healthy);

    transport.set_probe_health("http://flappy:8001/health", true);
    monitor.probe_all().await;
    assert!(registry.snapshot().await.targets[0].healthy);
}
