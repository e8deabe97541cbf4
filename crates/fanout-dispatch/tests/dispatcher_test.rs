//! Integration tests for packet dispatch with retry, exclusion, and backoff.
//!
//! Lives outside `src/` because these tests exercise the dispatcher
//! through `fanout_testing::MockTransport`, and `fanout-testing` itself
//! depends on `fanout-dispatch`; running them as unit tests inside the
//! crate would build two incompatible copies of `fanout-dispatch`.

use std::{sync::Arc, time::Duration};

use fanout_core::{Packet, TargetConfig, TargetRegistry};
use fanout_dispatch::{DispatchOutcome, Dispatcher, ExhaustReason, RetryPolicy};
use fanout_testing::{MockTransport, TestClock};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

fn dispatcher_with(
    targets: &[TargetConfig],
    transport: Arc<MockTransport>,
    policy: RetryPolicy,
) -> (Dispatcher, Arc<TargetRegistry>, Arc<TestClock>) {
    let registry = Arc::new(TargetRegistry::from_configs(targets).expect("valid configs"));
    let clock = Arc::new(TestClock::new());
    let dispatcher =
        Dispatcher::new(registry.clone(), transport, policy, SEND_TIMEOUT, clock.clone());
    (dispatcher, registry, clock)
}

fn single_target() -> Vec<TargetConfig> {
    vec![TargetConfig::new("analyzer-1", "http://analyzer-1:8001/analyze", 1.0)]
}

fn packet() -> Packet {
    Packet::new("packet-001", "{\"messages\":[{\"level\":\"INFO\"}]}")
}

#[tokio::test]
async fn successful_first_attempt_records_delivery() {
    let transport = Arc::new(MockTransport::new());
    let (dispatcher, registry, _clock) =
        dispatcher_with(&single_target(), transport.clone(), RetryPolicy::default());

    let outcome = dispatcher.dispatch(&packet()).await;

    assert!(matches!(outcome, DispatchOutcome::Delivered { ref target } if target.as_ref() == "analyzer-1"));
    assert_eq!(transport.send_count(), 1);

    let stats = registry.target_stats().await;
    assert_eq!(stats[0].1.delivered, 1);
    assert_eq!(stats[0].1.failed, 0);
}

#[tokio::test]
async fn retriable_failure_moves_to_a_different_target() {
    let targets = vec![
        TargetConfig::new("failing", "http://failing:8001/analyze", 0.5),
        TargetConfig::new("healthy", "http://healthy:8002/analyze", 0.5),
    ];
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("http://failing:8001/analyze", 503);

    let (dispatcher, _registry, _clock) =
        dispatcher_with(&targets, transport.clone(), RetryPolicy::default());

    let outcome = dispatcher.dispatch(&packet()).await;

    assert!(matches!(outcome, DispatchOutcome::Delivered { ref target } if target.as_ref() == "healthy"));
    assert!(
        transport.sends_to("http://failing:8001/analyze") <= 1,
        "a failed target is excluded from re-selection"
    );
}

#[tokio::test]
async fn attempts_spread_over_distinct_targets_while_any_remain() {
    let targets = vec![
        TargetConfig::new("a", "http://a:8001/analyze", 0.5),
        TargetConfig::new("b", "http://b:8002/analyze", 0.3),
        TargetConfig::new("c", "http://c:8003/analyze", 0.2),
    ];
    let transport = Arc::new(MockTransport::new());
    for url in ["http://a:8001/analyze", "http://b:8002/analyze", "http://c:8003/analyze"] {
        transport.respond_with(url, 503);
    }

    let (dispatcher, _registry, _clock) =
        dispatcher_with(&targets, transport.clone(), RetryPolicy::default());

    let outcome = dispatcher.dispatch(&packet()).await;

    assert!(matches!(
        outcome,
        DispatchOutcome::Exhausted { reason: ExhaustReason::RetriesExhausted, .. }
    ));
    assert_eq!(transport.send_count(), 3);
    for url in ["http://a:8001/analyze", "http://b:8002/analyze", "http://c:8003/analyze"] {
        assert_eq!(transport.sends_to(url), 1, "{url} attempted exactly once");
    }
}

#[tokio::test]
async fn single_target_is_reused_once_exclusions_saturate() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("http://analyzer-1:8001/analyze", 500);

    let (dispatcher, registry, _clock) =
        dispatcher_with(&single_target(), transport.clone(), RetryPolicy::default());

    let outcome = dispatcher.dispatch(&packet()).await;

    assert!(matches!(
        outcome,
        DispatchOutcome::Exhausted { reason: ExhaustReason::RetriesExhausted, .. }
    ));
    assert_eq!(transport.send_count(), 3, "retries = 2 means three attempts");

    let stats = registry.target_stats().await;
    assert_eq!(stats[0].1.failed, 3);
    assert_eq!(stats[0].1.delivered, 0);
}

#[tokio::test]
async fn client_error_short_circuits_without_retry() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("http://analyzer-1:8001/analyze", 400);

    let (dispatcher, registry, _clock) =
        dispatcher_with(&single_target(), transport.clone(), RetryPolicy::default());

    let outcome = dispatcher.dispatch(&packet()).await;

    assert!(matches!(
        outcome,
        DispatchOutcome::Exhausted { reason: ExhaustReason::ClientError, .. }
    ));
    assert_eq!(transport.send_count(), 1);

    let stats = registry.target_stats().await;
    assert_eq!(stats[0].1.failed, 1);
}

#[tokio::test]
async fn request_timeout_and_rate_limit_are_retriable() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_sequence("http://analyzer-1:8001/analyze", [408, 429], 200);

    let (dispatcher, _registry, _clock) =
        dispatcher_with(&single_target(), transport.clone(), RetryPolicy::default());

    let outcome = dispatcher.dispatch(&packet()).await;

    assert!(matches!(outcome, DispatchOutcome::Delivered { .. }));
    assert_eq!(transport.send_count(), 3);
}

#[tokio::test]
async fn network_failure_is_retried() {
    let targets = vec![
        TargetConfig::new("dead", "http://dead:8001/analyze", 0.5),
        TargetConfig::new("live", "http://live:8002/analyze", 0.5),
    ];
    let transport = Arc::new(MockTransport::new());
    transport.fail_with_network("http://dead:8001/analyze");

    let (dispatcher, _registry, _clock) =
        dispatcher_with(&targets, transport.clone(), RetryPolicy::default());

    let outcome = dispatcher.dispatch(&packet()).await;
    assert!(matches!(outcome, DispatchOutcome::Delivered { ref target } if target.as_ref() == "live"));
}

#[tokio::test]
async fn no_eligible_target_sends_nothing() {
    let transport = Arc::new(MockTransport::new());
    let (dispatcher, registry, _clock) =
        dispatcher_with(&single_target(), transport.clone(), RetryPolicy::default());

    registry.set_health("analyzer-1", false).await.expect("known target");

    let outcome = dispatcher.dispatch(&packet()).await;

    assert_eq!(outcome, DispatchOutcome::NoTargets);
    assert_eq!(transport.send_count(), 0);

    let stats = registry.target_stats().await;
    assert_eq!(stats[0].1.delivered, 0);
    assert_eq!(stats[0].1.failed, 0);
}

#[tokio::test]
async fn backoff_sleeps_follow_the_policy() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("http://analyzer-1:8001/analyze", 500);

    let policy = RetryPolicy { retries: 2, base_delay: Duration::from_millis(500) };
    let (dispatcher, _registry, clock) = dispatcher_with(&single_target(), transport, policy);

    dispatcher.dispatch(&packet()).await;

    // 500ms after the first failure, 1s after the second; none after
    // the final attempt.
    assert_eq!(clock.elapsed(), Duration::from_millis(1500));
}

#[tokio::test]
async fn zero_retries_attempts_exactly_once() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("http://analyzer-1:8001/analyze", 503);

    let policy = RetryPolicy { retries: 0, base_delay: Duration::from_millis(500) };
    let (dispatcher, _registry, clock) =
        dispatcher_with(&single_target(), transport.clone(), policy);

    let outcome = dispatcher.dispatch(&packet()).await;

    assert!(matches!(outcome, DispatchOutcome::Exhausted { .. }));
    assert_eq!(transport.send_count(), 1);
    assert_eq!(clock.elapsed(), Duration::ZERO, "no backoff after the only attempt");
}
