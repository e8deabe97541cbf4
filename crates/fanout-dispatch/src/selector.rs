//! Weighted random target selection.
//!
//! A stateless draw over a registry snapshot: no coordination between
//! workers, and the empirical distribution converges to the configured
//! weights over large sample counts. Candidates are walked in registration
//! order so the draw is deterministic given the random value.

use std::sync::Arc;

use fanout_core::TargetView;
use rand::Rng;

/// Picks one target by weighted random draw.
///
/// Candidates are targets that are healthy, carry positive weight, and are
/// not in `excluded`. Returns `None` when no candidate remains. The last
/// candidate catches residual floating-point mass, so a draw over a
/// non-empty candidate set always lands.
pub fn pick_target<'a, R: Rng>(
    rng: &mut R,
    targets: &'a [TargetView],
    excluded: &[Arc<str>],
) -> Option<&'a TargetView> {
    let candidates: Vec<&TargetView> = targets
        .iter()
        .filter(|t| t.eligible() && !excluded.iter().any(|name| *name == t.name))
        .collect();

    let total: f64 = candidates.iter().map(|t| t.weight).sum();
    if total <= 0.0 {
        return None;
    }

    let draw = rng.random_range(0.0..total);

    let mut cumulative = 0.0;
    for target in &candidates {
        cumulative += target.weight;
        if draw < cumulative {
            return Some(target);
        }
    }

    candidates.last().copied()
}
