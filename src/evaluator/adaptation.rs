//! Persona weight adaptation policies.
//!
//! The default [`GlobalAveragePolicy`] computes a single average over every
//! source's most recent score and scales every persona by it.  Feedback is
//! not attributed to individual personas.  Hosts that want different
//! behaviour plug in their own [`AdaptationPolicy`].

use std::fmt::Debug;

use super::state::EngineHistory;
use crate::config::AdaptationKind;
use crate::persona::{PersonaWeights, WeightBounds};

/// Strategy for updating persona weights from recorded scores.
///
/// The evaluator re-clamps weights into `bounds` after every call, so an
/// implementation cannot break the bounds invariant.
pub trait AdaptationPolicy: Debug + Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    fn adapt(&self, weights: &mut PersonaWeights, history: &EngineHistory, bounds: WeightBounds);
}

/// Scale every weight by the mean of the latest score of each source.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalAveragePolicy;

impl GlobalAveragePolicy {
    /// Mean of the latest score per source, or `None` with no history.
    pub fn average_latest(history: &EngineHistory) -> Option<f64> {
        let (sum, count) = history
            .latest_scores()
            .filter(|s| s.is_finite())
            .fold((0.0, 0usize), |(sum, n), s| (sum + s, n + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

impl AdaptationPolicy for GlobalAveragePolicy {
    fn name(&self) -> &'static str {
        "global_average"
    }

    fn adapt(&self, weights: &mut PersonaWeights, history: &EngineHistory, bounds: WeightBounds) {
        let Some(avg) = Self::average_latest(history) else {
            log::debug!("No score history yet; persona weights unchanged");
            return;
        };
        let personas: Vec<_> = weights.personas().collect();
        for persona in personas {
            let current = weights.get(persona);
            weights.set(persona, current * avg, bounds);
        }
        log::debug!("Scaled persona weights by average latest score {:.3}", avg);
    }
}

/// Never change weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrozenPolicy;

impl AdaptationPolicy for FrozenPolicy {
    fn name(&self) -> &'static str {
        "frozen"
    }

    fn adapt(&self, _weights: &mut PersonaWeights, _history: &EngineHistory, _bounds: WeightBounds) {}
}

/// Build the built-in policy named by configuration.
pub fn policy_for(kind: AdaptationKind) -> Box<dyn AdaptationPolicy> {
    match kind {
        AdaptationKind::GlobalAverage => Box::new(GlobalAveragePolicy),
        AdaptationKind::Frozen => Box::new(FrozenPolicy),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;

    #[test]
    fn test_no_history_leaves_weights() {
        let mut weights = PersonaWeights::default();
        GlobalAveragePolicy.adapt(&mut weights, &EngineHistory::new(), WeightBounds::default());
        assert_eq!(weights, PersonaWeights::default());
    }

    #[test]
    fn test_average_uses_latest_score_per_source() {
        let mut history = EngineHistory::new();
        history.record("a", 0.1);
        history.record("a", 0.9);
        history.record("b", 0.5);
        let avg = GlobalAveragePolicy::average_latest(&history).unwrap();
        assert!((avg - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_same_factor_for_every_persona() {
        let mut history = EngineHistory::new();
        history.record("a", 0.8);
        let mut weights = PersonaWeights::default();
        GlobalAveragePolicy.adapt(&mut weights, &history, WeightBounds::default());
        assert!((weights.get(Persona::Logical) - 0.8).abs() < 1e-9);
        assert!((weights.get(Persona::Visionary) - 0.72).abs() < 1e-9);
        assert!((weights.get(Persona::Playful) - 0.64).abs() < 1e-9);
    }

    #[test]
    fn test_low_scores_hit_the_floor() {
        let mut history = EngineHistory::new();
        history.record("a", 0.0);
        let mut weights = PersonaWeights::default();
        GlobalAveragePolicy.adapt(&mut weights, &history, WeightBounds::default());
        for (_, w) in weights.iter() {
            assert_eq!(w, 0.3);
        }
    }

    #[test]
    fn test_frozen_policy() {
        let mut history = EngineHistory::new();
        history.record("a", 0.0);
        let mut weights = PersonaWeights::default();
        policy_for(AdaptationKind::Frozen).adapt(&mut weights, &history, WeightBounds::default());
        assert_eq!(weights, PersonaWeights::default());
    }
}
