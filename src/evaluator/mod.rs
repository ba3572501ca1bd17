//! Candidate evaluation and persona adaptation.
//!
//! An [`Evaluator`] ranks candidate replies for one conversation session:
//!
//! ```text
//! Candidate ─┬─ confidence                 × 0.45
//!            ├─ persona alignment          × 0.35   (rule table × weights)
//!            ├─ novelty vs last 6 replies  × 0.15   (1 − max Jaccard)
//!            └─ contradiction penalty      × 0.10
//!                 ↓ clamp [0, 1]
//!            meta_score → stable descending sort
//! ```
//!
//! Every evaluated score is logged per source in [`EngineHistory`];
//! [`Evaluator::adapt`] feeds that history back into the persona weights.

pub mod adaptation;
pub mod candidate;
pub mod rules;
pub mod similarity;
pub mod state;

use std::cmp::Ordering;

pub use adaptation::{policy_for, AdaptationPolicy, FrozenPolicy, GlobalAveragePolicy};
pub use candidate::{Candidate, ConversationHistory, EvaluationResult, Turn, DEFAULT_CONFIDENCE};
pub use rules::{CompiledRules, PatternRule, RuleSet};
pub use state::{EngineHistory, EvaluatorState, ScoreRecord, TraceEntry};

use crate::config::EvaluatorConfig;
use crate::persona::PersonaWeights;
use similarity::{jaccard_tokens, tokenize};

/// Scores and ranks candidate replies for one conversation session.
///
/// Owns the session's [`EvaluatorState`].  Use one evaluator per
/// conversation and never share it between concurrently processed sessions.
#[derive(Debug)]
pub struct Evaluator {
    config: EvaluatorConfig,
    rules: CompiledRules,
    policy: Box<dyn AdaptationPolicy>,
    state: EvaluatorState,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

impl Evaluator {
    /// Start a fresh session with the built-in rule table.
    pub fn new(config: EvaluatorConfig) -> Self {
        Self::from_state(config, EvaluatorState::new())
    }

    /// Resume a session from previously saved state.
    ///
    /// An invalid `config` is replaced by the defaults, with a warning.
    pub fn from_state(config: EvaluatorConfig, mut state: EvaluatorState) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("Invalid evaluator config ({}), using defaults", e);
                EvaluatorConfig::default()
            }
        };
        state.weights.clamp_all(config.weight_bounds);
        Self {
            policy: policy_for(config.adaptation),
            rules: CompiledRules::default(),
            config,
            state,
        }
    }

    /// Replace the rule table.
    pub fn with_rules(mut self, rules: CompiledRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the adaptation policy.
    pub fn with_policy(mut self, policy: Box<dyn AdaptationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn state(&self) -> &EvaluatorState {
        &self.state
    }

    /// Hand the session state back, e.g. for persistence.
    pub fn into_state(self) -> EvaluatorState {
        self.state
    }

    pub fn weights(&self) -> &PersonaWeights {
        &self.state.weights
    }

    pub fn history(&self) -> &EngineHistory {
        &self.state.history
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    /// Score every candidate and return them ranked by `meta_score`.
    ///
    /// The ranking is total: nothing is dropped, and equal scores keep their
    /// input order.  Each score is appended to the history of the
    /// candidate's source.
    pub fn evaluate<H>(&mut self, candidates: &[Candidate], history: &H) -> Vec<EvaluationResult>
    where
        H: ConversationHistory + ?Sized,
    {
        let recent: Vec<Vec<String>> = history
            .recent_replies(self.config.history_window)
            .into_iter()
            .map(|reply| tokenize(reply, self.config.normalize_arabic))
            .collect();

        let mut results: Vec<EvaluationResult> = candidates
            .iter()
            .map(|c| self.score_candidate(c, &recent))
            .collect();

        for result in &results {
            if let Some(source) = result.candidate.source.as_deref() {
                self.state.history.record(source, result.meta_score);
            }
        }

        // `sort_by` is stable, which keeps ties in input order.
        results.sort_by(|a, b| {
            b.meta_score
                .partial_cmp(&a.meta_score)
                .unwrap_or(Ordering::Equal)
        });

        log::debug!(
            "Evaluated {} candidates against {} recent turns (session {})",
            results.len(),
            recent.len(),
            self.state.session_id
        );
        results
    }

    /// Score a single candidate against pre-tokenised recent replies.
    fn score_candidate(&self, candidate: &Candidate, recent: &[Vec<String>]) -> EvaluationResult {
        let arabic = self.config.normalize_arabic;
        let tokens = tokenize(&candidate.reply, arabic);

        let novelty = if recent.is_empty() {
            1.0
        } else {
            let max_sim = recent
                .iter()
                .map(|prev| jaccard_tokens(&tokens, prev))
                .fold(0.0_f64, f64::max);
            (1.0 - max_sim).clamp(0.0, 1.0)
        };

        let contradictions = self.rules.contradictions_in(&tokens, arabic);
        let persona_score = self.persona_score(&candidate.reply);
        let confidence = candidate.effective_confidence(self.config.default_confidence);

        let w = &self.config.score_weights;
        let raw = w.confidence * confidence + w.persona * persona_score + w.novelty * novelty
            - w.contradiction * f64::from(contradictions);

        let meta_score = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };

        EvaluationResult {
            candidate: candidate.clone(),
            meta_score,
            novelty,
            contradictions,
            persona_score,
        }
    }

    /// Mean over personas of `weight × heuristic score`, kept in `[0, 1]`.
    pub fn persona_score(&self, reply: &str) -> f64 {
        let weights = &self.state.weights;
        if weights.is_empty() {
            return self.rules.default_score();
        }
        let lowered = reply.to_lowercase();
        let total: f64 = weights
            .iter()
            .map(|(persona, weight)| weight * self.rules.persona_score_lowered(&lowered, persona))
            .sum();
        (total / weights.len() as f64).clamp(0.0, 1.0)
    }

    // -----------------------------------------------------------------------
    // Adaptation
    // -----------------------------------------------------------------------

    /// Update persona weights from the recorded score history.
    pub fn adapt(&mut self) {
        let bounds = self.config.weight_bounds;
        self.policy
            .adapt(&mut self.state.weights, &self.state.history, bounds);
        self.state.weights.clamp_all(bounds);
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Describe the runner-up replies and keep the line in the trace.
    ///
    /// Purely observational; it never changes ranking or output.
    pub fn inner_voice(&mut self, ranked: &[EvaluationResult]) -> String {
        let line = format_inner_voice(
            ranked.get(1).map(EvaluationResult::reply),
            ranked.get(2).map(EvaluationResult::reply),
        );
        log::debug!("{}", line);
        self.state
            .push_trace(line.clone(), self.config.trace_capacity);
        line
    }

    /// Inner-voice lines recorded so far, oldest first.
    pub fn trace(&self) -> impl Iterator<Item = &TraceEntry> {
        self.state.trace.iter()
    }

    pub fn clear_trace(&mut self) {
        self.state.trace.clear();
    }
}

fn format_inner_voice(second: Option<&str>, third: Option<&str>) -> String {
    match (second, third) {
        (Some(s), Some(t)) => format!(
            "Inner voice: I could also have said \"{}\", or maybe \"{}\".",
            s, t
        ),
        (Some(s), None) => format!("Inner voice: I could also have said \"{}\".", s),
        _ => "Inner voice: no other reply came close.".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
