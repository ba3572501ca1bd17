//! Orchestrator: candidate selection and the quality-gated render pipeline.
//!
//! ```text
//! decide:    candidates ─→ Evaluator::evaluate ─→ adapt ─→ inner_voice ─→ Decision
//!
//! generate:  dna? ─→ sanitize_profile
//!            template ─→ render ─┬─ quality ≥ threshold ─→ humanize ─→ text
//!                                └─ quality < threshold ─→ render fallback ─→ humanize ─→ text
//! ```
//!
//! One orchestrator serves one conversation session.  The gate runs once per
//! call: there are no retries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{EngineConfig, GateConfig};
use crate::evaluator::{
    Candidate, ConversationHistory, EvaluationResult, Evaluator, EvaluatorState,
};
use crate::persona::{sanitize_profile, PersonaProfile, PersonaWeights};
use crate::render::{
    humanize, redact_context, LabelsMap, RenderContext, RenderOptions, RenderReport, Renderer,
};

/// Quality assumed when the caller supplies none.
pub const MAX_QUALITY: f64 = 1.0;

// ============================================================================
// decide
// ============================================================================

/// Outcome of ranking one round of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Highest-ranked candidate, `None` only when no candidates were given.
    pub top_candidate: Option<EvaluationResult>,
    pub evaluated: Vec<EvaluationResult>,
    pub inner_voice: String,
    /// Copy of the weights after adaptation.
    pub persona_weights: PersonaWeights,
}

// ============================================================================
// generate
// ============================================================================

/// Per-call options for [`Orchestrator::generate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Upstream quality signal; absent means maximal quality.
    pub quality_score: Option<f64>,
    /// Template used when the gate trips.
    pub fallback_template: Option<String>,
    /// Concept identifier → label map for the humanizer.
    pub labels: Option<LabelsMap>,
    /// Per-key fallback text for placeholders.
    pub fallbacks: HashMap<String, String>,
    /// Raw persona profile.  Diagnostic only: it is sanitized into
    /// [`GenerateDebug::dna`] and never changes the rendered text.
    pub dna: Option<Value>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quality_score(mut self, score: f64) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn fallback_template(mut self, template: impl Into<String>) -> Self {
        self.fallback_template = Some(template.into());
        self
    }

    pub fn labels(mut self, labels: LabelsMap) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn fallback(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.fallbacks.insert(key.into(), text.into());
        self
    }

    pub fn dna(mut self, dna: Value) -> Self {
        self.dna = Some(dna);
        self
    }

    /// Quality used by the gate.  Non-finite scores count as absent.
    pub fn effective_quality(&self) -> f64 {
        self.quality_score
            .filter(|q| q.is_finite())
            .unwrap_or(MAX_QUALITY)
    }
}

/// Diagnostics from one [`Orchestrator::generate`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDebug {
    pub quality_score: f64,
    pub threshold: f64,
    pub primary: RenderReport,
    /// Present only when the fallback template was rendered.
    pub fallback: Option<RenderReport>,
    /// Context snapshot with sensitive values redacted.
    pub context: Value,
    pub dna: Option<PersonaProfile>,
}

/// Final text and how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub text: String,
    pub used_fallback: bool,
    pub debug: GenerateDebug,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Per-session facade over the evaluator, renderer and quality gate.
#[derive(Debug)]
pub struct Orchestrator {
    evaluator: Evaluator,
    renderer: Renderer,
    gate: GateConfig,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Orchestrator {
    /// Start a new session.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            evaluator: Evaluator::new(config.evaluator),
            renderer: Renderer::new(config.render),
            gate: config.gate,
        }
    }

    /// Resume a session from saved evaluator state.
    pub fn from_state(config: EngineConfig, state: EvaluatorState) -> Self {
        Self {
            evaluator: Evaluator::from_state(config.evaluator, state),
            renderer: Renderer::new(config.render),
            gate: config.gate,
        }
    }

    /// Use a custom-built evaluator (rules, policy) for this session.
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut Evaluator {
        &mut self.evaluator
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Hand the session state back, e.g. for persistence.
    pub fn into_state(self) -> EvaluatorState {
        self.evaluator.into_state()
    }

    /// Rank `candidates`, adapt persona weights and record the inner voice.
    pub fn decide<H>(&mut self, candidates: &[Candidate], history: &H) -> Decision
    where
        H: ConversationHistory + ?Sized,
    {
        let evaluated = self.evaluator.evaluate(candidates, history);
        self.evaluator.adapt();
        let inner_voice = self.evaluator.inner_voice(&evaluated);

        Decision {
            top_candidate: evaluated.first().cloned(),
            persona_weights: self.evaluator.weights().clone(),
            evaluated,
            inner_voice,
        }
    }

    /// Render `template`, falling back to a safer template when the quality
    /// signal is below the gate threshold, then humanize the result.
    pub fn generate(
        &self,
        template: &str,
        context: &RenderContext,
        options: &GenerateOptions,
    ) -> GenerateOutput {
        let dna = options.dna.as_ref().map(sanitize_profile);
        let render_options = RenderOptions {
            fallbacks: options.fallbacks.clone(),
        };

        let primary = self.renderer.render(template, context, &render_options);
        let quality = options.effective_quality();
        let threshold = self.gate.quality_threshold;

        let (raw_text, fallback_report, used_fallback) = if quality < threshold {
            let fallback_template = options
                .fallback_template
                .as_deref()
                .unwrap_or(&self.gate.default_fallback_template);
            let fallback = self
                .renderer
                .render(fallback_template, context, &render_options);
            log::info!(
                "Quality {:.2} below threshold {:.2}; using fallback template",
                quality,
                threshold
            );
            let report = RenderReport::from(&fallback);
            (fallback.rendered, Some(report), true)
        } else {
            (primary.rendered.clone(), None, false)
        };

        let text = humanize(&raw_text, options.labels.as_ref());

        GenerateOutput {
            text,
            used_fallback,
            debug: GenerateDebug {
                quality_score: quality,
                threshold,
                primary: RenderReport::from(&primary),
                fallback: fallback_report,
                context: redact_context(context, &self.renderer.config().redact_keys),
                dna,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FALLBACK_TEMPLATE;
    use crate::evaluator::Turn;
    use crate::render::{context_from_value, REDACTED};
    use serde_json::json;

    fn ctx(value: Value) -> RenderContext {
        context_from_value(&value)
    }

    #[test]
    fn test_low_quality_uses_fallback_template() {
        let orch = Orchestrator::default();
        let out = orch.generate(
            "primary {emotion_name}",
            &ctx(json!({"emotion_name": "sadness"})),
            &GenerateOptions::new()
                .quality_score(0.3)
                .fallback_template("X-{emotion_name}"),
        );
        assert!(out.used_fallback);
        assert_eq!(out.text, "X-sadness");
        assert!(out.debug.fallback.is_some());
    }

    #[test]
    fn test_missing_quality_is_treated_as_maximal() {
        let orch = Orchestrator::default();
        let out = orch.generate("hi {name}", &ctx(json!({"name": "Laila"})), &GenerateOptions::new());
        assert!(!out.used_fallback);
        assert_eq!(out.text, "hi Laila");
        assert_eq!(out.debug.quality_score, 1.0);
        assert!(out.debug.fallback.is_none());
    }

    #[test]
    fn test_threshold_is_inclusive_for_primary() {
        let orch = Orchestrator::default();
        let out = orch.generate("primary", &RenderContext::new(), &GenerateOptions::new().quality_score(0.6));
        assert!(!out.used_fallback);
        assert_eq!(out.text, "primary");
    }

    #[test]
    fn test_builtin_fallback_sentence() {
        let orch = Orchestrator::default();
        let out = orch.generate("primary", &RenderContext::new(), &GenerateOptions::new().quality_score(0.1));
        assert!(out.used_fallback);
        assert_eq!(out.text, DEFAULT_FALLBACK_TEMPLATE);
    }

    #[test]
    fn test_nan_quality_counts_as_absent() {
        let orch = Orchestrator::default();
        let out = orch.generate("primary", &RenderContext::new(), &GenerateOptions::new().quality_score(f64::NAN));
        assert!(!out.used_fallback);
    }

    #[test]
    fn test_output_is_humanized() {
        let labels: LabelsMap = [("depression_symptom".to_string(), "الاكتئاب".to_string())].into();
        let orch = Orchestrator::default();
        let out = orch.generate(
            "{concept} مش depression_symptomatic",
            &ctx(json!({"concept": "depression_symptom"})),
            &GenerateOptions::new().labels(labels),
        );
        assert_eq!(out.text, "الاكتئاب مش depression_symptomatic");
    }

    #[test]
    fn test_fallback_is_humanized_too() {
        let labels: LabelsMap = [("low_mood".to_string(), "ضيق".to_string())].into();
        let orch = Orchestrator::default();
        let out = orch.generate(
            "primary",
            &ctx(json!({"c": "low_mood"})),
            &GenerateOptions::new()
                .quality_score(0.0)
                .fallback_template("حاسس بـ {c}؟")
                .labels(labels),
        );
        assert_eq!(out.text, "حاسس بـ ضيق؟");
    }

    #[test]
    fn test_debug_carries_diagnostics_and_redacts() {
        let orch = Orchestrator::default();
        let out = orch.generate(
            "{a} {b}",
            &ctx(json!({"a": "x", "password": "hunter2"})),
            &GenerateOptions::new().dna(json!({"warmth": "0.9"})),
        );
        assert_eq!(out.debug.primary.placeholders, vec!["a", "b"]);
        assert_eq!(out.debug.primary.missing, vec!["b"]);
        assert_eq!(out.debug.context["password"], REDACTED);
        let dna = out.debug.dna.unwrap();
        assert_eq!(dna.warmth, 0.9);
        assert_eq!(dna.name, "neutral");
        assert!(!out.text.contains("hunter2"));
    }

    #[test]
    fn test_dna_does_not_change_text() {
        let orch = Orchestrator::default();
        let context = ctx(json!({"a": "x"}));
        let plain = orch.generate("hi {a}", &context, &GenerateOptions::new());
        let with_dna = orch.generate(
            "hi {a}",
            &context,
            &GenerateOptions::new().dna(json!({"name": "warm", "warmth": 1.0})),
        );
        assert_eq!(plain.text, with_dna.text);
        assert!(plain.debug.dna.is_none());
        assert_eq!(with_dna.debug.dna.unwrap().name, "warm");
    }

    #[test]
    fn test_fallbacks_option_reaches_renderer() {
        let orch = Orchestrator::default();
        let out = orch.generate(
            "hi {name}",
            &RenderContext::new(),
            &GenerateOptions::new().fallback("name", "friend"),
        );
        assert_eq!(out.text, "hi friend");
        assert!(out.debug.primary.missing.is_empty());
    }

    #[test]
    fn test_options_deserialize_from_json() {
        let options: GenerateOptions = serde_json::from_value(json!({
            "qualityScore": 0.2,
            "fallbackTemplate": "X",
            "labels": {"a_b": "AB"},
            "dna": {"name": "calm"},
        }))
        .unwrap();
        assert_eq!(options.effective_quality(), 0.2);
        assert_eq!(options.fallback_template.as_deref(), Some("X"));
        assert!(options.fallbacks.is_empty());
    }

    #[test]
    fn test_decide_returns_top_and_weight_snapshot() {
        let mut orch = Orchestrator::default();
        let history = vec![Turn::new("I'm here for you")];
        let candidates = vec![
            Candidate::new("ok").with_confidence(0.3).with_source("rules"),
            Candidate::new("I hear you, that sounds hard").with_confidence(0.9).with_source("llm"),
            Candidate::new("I'm here for you").with_confidence(0.5).with_source("cache"),
        ];
        let mut decision = orch.decide(&candidates, &history);

        let top = decision.top_candidate.clone().unwrap();
        assert_eq!(top.reply(), "I hear you, that sounds hard");
        assert_eq!(decision.evaluated.len(), 3);
        assert!(decision.inner_voice.contains("\""));
        assert_eq!(orch.evaluator().trace().count(), 1);

        // The snapshot is a copy: changing it leaves the session untouched.
        let before = orch.evaluator().weights().clone();
        decision.persona_weights = PersonaWeights::new();
        assert_eq!(orch.evaluator().weights(), &before);
        assert_ne!(before, PersonaWeights::default());
    }

    #[test]
    fn test_decide_with_no_candidates() {
        let mut orch = Orchestrator::default();
        let decision = orch.decide(&[], &Vec::<Turn>::new());
        assert!(decision.top_candidate.is_none());
        assert!(decision.evaluated.is_empty());
        assert_eq!(decision.persona_weights, PersonaWeights::default());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut a = Orchestrator::default();
        let b = Orchestrator::default();
        a.decide(&[Candidate::new("x").with_source("s").with_confidence(0.0)], &Vec::<Turn>::new());
        assert_ne!(a.evaluator().weights(), b.evaluator().weights());
        assert!(b.evaluator().history().is_empty());
    }
}
