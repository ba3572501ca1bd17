//! Engine configuration.
//!
//! Every field has a default, so a partial YAML/JSON document (or none at
//! all) yields a working engine.  `EngineConfig::default()` reproduces the
//! built-in constants exactly.
//!
//! # Example YAML
//!
//! ```yaml
//! evaluator:
//!   history_window: 6
//!   weight_bounds: { min: 0.3, max: 1.2 }
//!   adaptation: global_average
//! render:
//!   missing_marker: "[…]"
//! gate:
//!   quality_threshold: 0.6
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::evaluator::DEFAULT_CONFIDENCE;
use crate::persona::WeightBounds;

/// Visible marker substituted for placeholders that cannot be resolved.
pub const DEFAULT_MISSING_MARKER: &str = "[…]";

/// Built-in fallback sentence used when the gate trips and no fallback
/// template was supplied.
pub const DEFAULT_FALLBACK_TEMPLATE: &str =
    "معلش، مش متأكد إني فهمتك كويس. ممكن تحكيلي أكتر عن اللي حاسس بيه؟";

/// Top-level configuration for the evaluator, renderer and quality gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub evaluator: EvaluatorConfig,
    pub render: RenderConfig,
    pub gate: GateConfig,
}

impl EngineConfig {
    /// Parse and validate a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a YAML file on disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evaluator.validate()?;
        self.gate.validate()
    }
}

// ============================================================================
// Evaluator section
// ============================================================================

/// Which adaptation policy a freshly built evaluator uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationKind {
    /// One average over every source's latest score, applied to all personas.
    #[default]
    GlobalAverage,
    /// Weights never move.
    Frozen,
}

/// Coefficients of the composite `meta_score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub confidence: f64,
    pub persona: f64,
    pub novelty: f64,
    pub contradiction: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            confidence: 0.45,
            persona: 0.35,
            novelty: 0.15,
            contradiction: 0.10,
        }
    }
}

/// Settings for candidate scoring and weight adaptation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Number of most recent turns consulted for novelty.
    pub history_window: usize,
    /// Confidence assumed for candidates that carry none.
    pub default_confidence: f64,
    pub score_weights: ScoreWeights,
    pub weight_bounds: WeightBounds,
    /// Apply Arabic orthographic normalisation before tokenising.
    pub normalize_arabic: bool,
    pub adaptation: AdaptationKind,
    /// Maximum number of inner-voice entries kept in memory.
    pub trace_capacity: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            default_confidence: DEFAULT_CONFIDENCE,
            score_weights: ScoreWeights::default(),
            weight_bounds: WeightBounds::default(),
            normalize_arabic: true,
            adaptation: AdaptationKind::default(),
            trace_capacity: 64,
        }
    }
}

impl EvaluatorConfig {
    /// Check scoring and adaptation settings for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_window == 0 {
            return Err(ConfigError::Validation(
                "evaluator.history_window must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ConfigError::Validation(format!(
                "evaluator.default_confidence must be within [0, 1], got {}",
                self.default_confidence
            )));
        }
        let w = &self.score_weights;
        for (name, value) in [
            ("confidence", w.confidence),
            ("persona", w.persona),
            ("novelty", w.novelty),
            ("contradiction", w.contradiction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "evaluator.score_weights.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        let b = &self.weight_bounds;
        if !(b.min.is_finite() && b.max.is_finite()) || b.min <= 0.0 || b.min > b.max {
            return Err(ConfigError::Validation(format!(
                "evaluator.weight_bounds must satisfy 0 < min <= max, got [{}, {}]",
                b.min, b.max
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Render section
// ============================================================================

/// Settings for placeholder substitution and debug snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Text substituted for unresolved placeholders.
    pub missing_marker: String,
    /// Case-insensitive key fragments whose values are hidden in snapshots.
    pub redact_keys: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            missing_marker: DEFAULT_MISSING_MARKER.to_string(),
            redact_keys: ["password", "secret", "token", "api_key", "apikey", "auth"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ============================================================================
// Gate section
// ============================================================================

/// Settings for the primary/fallback quality gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Scores strictly below this use the fallback template.
    pub quality_threshold: f64,
    pub default_fallback_template: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 0.6,
            default_fallback_template: DEFAULT_FALLBACK_TEMPLATE.to_string(),
        }
    }
}

impl GateConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(ConfigError::Validation(format!(
                "gate.quality_threshold must be within [0, 1], got {}",
                self.quality_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
