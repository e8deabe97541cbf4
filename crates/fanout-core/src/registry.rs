//! Target registry with lock-free selection snapshots.
//!
//! The registry is the authoritative set of analyzer targets. Configured
//! targets are written once at startup; at steady state only the health
//! flags and delivery counters mutate. Selection never reads through a
//! lock: callers take an immutable [`RegistrySnapshot`] and work against
//! that, so no lock is ever held across a network operation.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use tokio::sync::RwLock;

use crate::{
    error::{CoreError, Result},
    stats::TargetStats,
};

/// Static configuration for one analyzer target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    /// Stable identifier, unique within the registry.
    pub name: String,

    /// Endpoint URL, passed opaquely to the transport adapter.
    pub url: String,

    /// Relative routing weight. Zero is legal and means "never selected".
    pub weight: f64,
}

impl TargetConfig {
    /// Creates a target configuration.
    pub fn new(name: impl Into<String>, url: impl Into<String>, weight: f64) -> Self {
        Self { name: name.into(), url: url.into(), weight }
    }
}

/// One registered target with its mutable runtime state.
///
/// Weight and identity are immutable post-registration. The health flag is
/// mutated only through [`TargetRegistry::set_health`]; counters only
/// increase.
#[derive(Debug)]
struct TargetEntry {
    name: Arc<str>,
    url: Arc<str>,
    weight: f64,
    healthy: AtomicBool,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl TargetEntry {
    fn new(config: &TargetConfig) -> Self {
        Self {
            name: Arc::from(config.name.as_str()),
            url: Arc::from(config.url.as_str()),
            weight: config.weight,
            healthy: AtomicBool::new(true),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

/// Immutable view of one target inside a snapshot.
#[derive(Debug, Clone)]
pub struct TargetView {
    /// Target identifier.
    pub name: Arc<str>,
    /// Target endpoint URL.
    pub url: Arc<str>,
    /// Configured routing weight.
    pub weight: f64,
    /// Health flag at snapshot time.
    pub healthy: bool,
}

impl TargetView {
    /// Whether this target participates in weighted selection.
    pub fn eligible(&self) -> bool {
        self.healthy && self.weight > 0.0
    }
}

/// Point-in-time copy of the registry used for lock-free selection.
///
/// Targets appear in registration order; the selector relies on that order
/// being deterministic across snapshots.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// All registered targets in registration order.
    pub targets: Vec<TargetView>,
    /// Summed weight of healthy, positive-weight targets.
    pub healthy_weight: f64,
}

impl RegistrySnapshot {
    /// Whether any target is eligible for selection.
    pub fn has_eligible_target(&self) -> bool {
        self.healthy_weight > 0.0
    }
}

/// Thread-safe registry of analyzer targets.
///
/// Reads for selection go through [`snapshot`](Self::snapshot); health
/// writes are serialized here. Counter updates are plain atomic increments
/// and never take the write lock.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: RwLock<Vec<Arc<TargetEntry>>>,
}

impl TargetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a configured target list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the list is empty, contains a duplicate
    /// name or negative weight, or sums to a non-positive total weight.
    pub fn from_configs(configs: &[TargetConfig]) -> Result<Self> {
        if configs.is_empty() {
            return Err(CoreError::NoTargets);
        }

        let mut entries: Vec<Arc<TargetEntry>> = Vec::with_capacity(configs.len());
        for config in configs {
            if config.weight < 0.0 {
                return Err(CoreError::NegativeWeight {
                    name: config.name.clone(),
                    weight: config.weight,
                });
            }
            if entries.iter().any(|e| *e.name == *config.name) {
                return Err(CoreError::duplicate_target(&config.name));
            }
            entries.push(Arc::new(TargetEntry::new(config)));
        }

        let total: f64 = entries.iter().map(|e| e.weight).sum();
        if total <= 0.0 {
            return Err(CoreError::NonPositiveTotalWeight { total });
        }

        Ok(Self { targets: RwLock::new(entries) })
    }

    /// Registers a single target. Intended for startup and tests; steady
    /// state never adds targets.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateTarget`] if the name is taken or
    /// [`CoreError::NegativeWeight`] for a negative weight.
    pub async fn register(&self, config: TargetConfig) -> Result<()> {
        if config.weight < 0.0 {
            return Err(CoreError::NegativeWeight { name: config.name, weight: config.weight });
        }

        let mut targets = self.targets.write().await;
        if targets.iter().any(|e| *e.name == *config.name) {
            return Err(CoreError::duplicate_target(&config.name));
        }
        targets.push(Arc::new(TargetEntry::new(&config)));
        Ok(())
    }

    /// Returns an immutable snapshot of all targets in registration order.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let targets = self.targets.read().await;

        let views: Vec<TargetView> = targets
            .iter()
            .map(|entry| TargetView {
                name: entry.name.clone(),
                url: entry.url.clone(),
                weight: entry.weight,
                healthy: entry.healthy.load(Ordering::Acquire),
            })
            .collect();

        let healthy_weight = views.iter().filter(|t| t.eligible()).map(|t| t.weight).sum();

        RegistrySnapshot { targets: views, healthy_weight }
    }

    /// Sets a target's health flag and returns the previous value.
    ///
    /// A write completed here is visible to every snapshot taken afterward.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownTarget`] if no target has this name.
    pub async fn set_health(&self, name: &str, healthy: bool) -> Result<bool> {
        let targets = self.targets.read().await;
        let entry = targets
            .iter()
            .find(|e| *e.name == *name)
            .ok_or_else(|| CoreError::unknown_target(name))?;

        Ok(entry.healthy.swap(healthy, Ordering::AcqRel))
    }

    /// Increments a target's delivered counter.
    ///
    /// Unknown names are ignored: counter recording sits on the hot path
    /// and the name set is fixed after startup.
    pub async fn record_delivered(&self, name: &str) {
        let targets = self.targets.read().await;
        if let Some(entry) = targets.iter().find(|e| *e.name == *name) {
            entry.delivered.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Increments a target's failed counter. Unknown names are ignored.
    pub async fn record_failed(&self, name: &str) {
        let targets = self.targets.read().await;
        if let Some(entry) = targets.iter().find(|e| *e.name == *name) {
            entry.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Per-target statistics in registration order, for reporting.
    pub async fn target_stats(&self) -> Vec<(String, TargetStats)> {
        let targets = self.targets.read().await;
        targets
            .iter()
            .map(|entry| {
                (
                    entry.name.to_string(),
                    TargetStats {
                        delivered: entry.delivered.load(Ordering::Relaxed),
                        failed: entry.failed.load(Ordering::Relaxed),
                        healthy: entry.healthy.load(Ordering::Acquire),
                    },
                )
            })
            .collect()
    }

    /// Number of registered targets.
    pub async fn len(&self) -> usize {
        self.targets.read().await.len()
    }

    /// Whether the registry holds no targets.
    pub async fn is_empty(&self) -> bool {
        self.targets.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_targets() -> Vec<TargetConfig> {
        vec![
            TargetConfig::new("analyzer-1", "http://analyzer-1:8001/analyze", 0.4),
            TargetConfig::new("analyzer-2", "http://analyzer-2:8002/analyze", 0.3),
            TargetConfig::new("analyzer-3", "http://analyzer-3:8003/analyze", 0.2),
            TargetConfig::new("analyzer-4", "http://analyzer-4:8004/analyze", 0.1),
        ]
    }

    #[tokio::test]
    async fn snapshot_preserves_registration_order() {
        let registry = TargetRegistry::from_configs(&four_targets()).expect("valid configs");
        let snapshot = registry.snapshot().await;

        let names: Vec<&str> = snapshot.targets.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, ["analyzer-1", "analyzer-2", "analyzer-3", "analyzer-4"]);
        assert!((snapshot.healthy_weight - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn duplicate_name_rejected() {
        let configs = vec![
            TargetConfig::new("analyzer-1", "http://a:1/analyze", 0.5),
            TargetConfig::new("analyzer-1", "http://b:2/analyze", 0.5),
        ];

        let result = TargetRegistry::from_configs(&configs);
        assert!(matches!(result, Err(CoreError::DuplicateTarget { .. })));
    }

    #[tokio::test]
    async fn zero_total_weight_rejected() {
        let configs = vec![
            TargetConfig::new("analyzer-1", "http://a:1/analyze", 0.0),
            TargetConfig::new("analyzer-2", "http://b:2/analyze", 0.0),
        ];

        let result = TargetRegistry::from_configs(&configs);
        assert!(matches!(result, Err(CoreError::NonPositiveTotalWeight { .. })));
    }

    #[tokio::test]
    async fn negative_weight_rejected() {
        let configs = vec![TargetConfig::new("analyzer-1", "http://a:1/analyze", -0.1)];

        let result = TargetRegistry::from_configs(&configs);
        assert!(matches!(result, Err(CoreError::NegativeWeight { .. })));
    }

    #[tokio::test]
    async fn health_flip_visible_in_next_snapshot() {
        let registry = TargetRegistry::from_configs(&four_targets()).expect("valid configs");

        let previous = registry.set_health("analyzer-2", false).await.expect("known target");
        assert!(previous, "targets start healthy");

        let snapshot = registry.snapshot().await;
        let analyzer_2 =
            snapshot.targets.iter().find(|t| t.name.as_ref() == "analyzer-2").expect("present");
        assert!(!analyzer_2.healthy);
        assert!((snapshot.healthy_weight - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn health_round_trip_restores_snapshot() {
        let registry = TargetRegistry::from_configs(&four_targets()).expect("valid configs");
        let before = registry.snapshot().await;

        registry.set_health("analyzer-3", false).await.expect("known target");
        registry.set_health("analyzer-3", true).await.expect("known target");

        let after = registry.snapshot().await;
        assert_eq!(before.targets.len(), after.targets.len());
        for (a, b) in before.targets.iter().zip(after.targets.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.healthy, b.healthy);
        }
        assert!((before.healthy_weight - after.healthy_weight).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn set_health_on_unknown_target_fails() {
        let registry = TargetRegistry::from_configs(&four_targets()).expect("valid configs");

        let result = registry.set_health("analyzer-9", false).await;
        assert!(matches!(result, Err(CoreError::UnknownTarget { .. })));
    }

    #[tokio::test]
    async fn counters_accumulate_per_target() {
        let registry = TargetRegistry::from_configs(&four_targets()).expect("valid configs");

        registry.record_delivered("analyzer-1").await;
        registry.record_delivered("analyzer-1").await;
        registry.record_failed("analyzer-1").await;
        registry.record_failed("analyzer-4").await;

        let stats = registry.target_stats().await;
        let lookup = |name: &str| {
            stats.iter().find(|(n, _)| n == name).map(|(_, s)| s.clone()).expect("target present")
        };

        let first = lookup("analyzer-1");
        assert_eq!(first.delivered, 2);
        assert_eq!(first.failed, 1);

        let fourth = lookup("analyzer-4");
        assert_eq!(fourth.delivered, 0);
        assert_eq!(fourth.failed, 1);
    }

    #[tokio::test]
    async fn zero_weight_target_is_never_eligible() {
        let configs = vec![
            TargetConfig::new("weighted", "http://a:1/analyze", 1.0),
            TargetConfig::new("shadow", "http://b:2/analyze", 0.0),
        ];
        let registry = TargetRegistry::from_configs(&configs).expect("valid configs");

        let snapshot = registry.snapshot().await;
        let shadow =
            snapshot.targets.iter().find(|t| t.name.as_ref() == "shadow").expect("present");
        assert!(shadow.healthy);
        assert!(!shadow.eligible());
        assert!((snapshot.healthy_weight - 1.0).abs() < f64::EPSILON);
    }
}
