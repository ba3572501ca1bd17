//! Data-driven lexical rules: per-persona cue patterns and contradiction
//! pairs.
//!
//! Rules are plain data ([`RuleSet`]) so they can be localised or tuned from
//! YAML without touching scoring code, then compiled once into
//! [`CompiledRules`].
//!
//! # Example YAML
//!
//! ```yaml
//! default_score: 0.5
//! personas:
//!   empathic:
//!     - { pattern: "\\b(i hear you|i understand)\\b", score: 0.95 }
//! contradictions:
//!   - ["always", "never"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::similarity::{contains_phrase, tokenize};
use crate::error::ConfigError;
use crate::persona::Persona;

/// Score returned when no cue of a persona matches.
pub const DEFAULT_PERSONA_SCORE: f64 = 0.5;

/// One lexical cue and the score it awards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub score: f64,
}

impl PatternRule {
    pub fn new(pattern: impl Into<String>, score: f64) -> Self {
        Self {
            pattern: pattern.into(),
            score,
        }
    }
}

/// Uncompiled rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub default_score: f64,
    /// Ordered cues per persona; the first match wins.
    pub personas: BTreeMap<Persona, Vec<PatternRule>>,
    /// Phrase pairs that should never appear in the same reply.
    pub contradictions: Vec<(String, String)>,
}

impl Default for RuleSet {
    fn default() -> Self {
        let mut personas = BTreeMap::new();
        personas.insert(
            Persona::Logical,
            vec![
                PatternRule::new(r"\b(because|therefore|hence|evidence|logically|the reason)\b", 0.9),
                PatternRule::new(r"(لأن|لان|عشان|بسبب|منطقي)", 0.85),
                PatternRule::new(r"\b(if|then|so)\b", 0.7),
            ],
        );
        personas.insert(
            Persona::Empathic,
            vec![
                PatternRule::new(
                    r"\b(i hear you|i understand|that sounds (hard|painful|heavy)|i'm sorry|feel(s|ing)?)\b",
                    0.95,
                ),
                PatternRule::new(r"(حاسس|حاسة|فاهمك|معاك|مشاعرك|ربنا يصبرك)", 0.9),
            ],
        );
        personas.insert(
            Persona::Visionary,
            vec![
                PatternRule::new(r"\b(imagine|future|vision|possibilit(y|ies)|someday|dream)\b", 0.85),
                PatternRule::new(r"(تخيل|المستقبل|حلم|يوم ما)", 0.85),
            ],
        );
        personas.insert(
            Persona::Pragmatic,
            vec![
                PatternRule::new(r"\b(step|plan|try|start|first|next|practical)\b", 0.8),
                PatternRule::new(r"(خطوة|خطوه|جرب|ابدأ|أول حاجة|اول حاجه)", 0.8),
            ],
        );
        personas.insert(
            Persona::Playful,
            vec![
                PatternRule::new(r"(haha|lol|😄|😂|😉)", 0.8),
                PatternRule::new(r"(ههه|😅)", 0.8),
                PatternRule::new(r"\b(fun|joke|silly)\b", 0.7),
            ],
        );

        let contradictions = [
            ("always", "never"),
            ("agree", "disagree"),
            ("possible", "impossible"),
            ("yes", "no"),
            ("دايما", "ابدا"),
            ("ممكن", "مستحيل"),
            ("صح", "غلط"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        Self {
            default_score: DEFAULT_PERSONA_SCORE,
            personas,
            contradictions,
        }
    }
}

impl RuleSet {
    /// Parse a rule table from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a rule table from a YAML file on disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Compile every pattern, validating scores along the way.
    pub fn compile(&self) -> Result<CompiledRules, ConfigError> {
        CompiledRules::compile(self)
    }
}

/// A compiled cue.
#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    score: f64,
}

/// Rule table ready for scoring.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    default_score: f64,
    personas: BTreeMap<Persona, Vec<CompiledRule>>,
    contradictions: Vec<(String, String)>,
}

static BUILTIN_RULES: Lazy<CompiledRules> = Lazy::new(|| {
    CompiledRules::compile(&RuleSet::default()).expect("built-in rule table compiles")
});

impl Default for CompiledRules {
    fn default() -> Self {
        BUILTIN_RULES.clone()
    }
}

impl CompiledRules {
    pub fn compile(rules: &RuleSet) -> Result<Self, ConfigError> {
        check_unit_score("default_score", rules.default_score)?;

        let mut personas = BTreeMap::new();
        for (persona, cues) in &rules.personas {
            let mut compiled = Vec::with_capacity(cues.len());
            for cue in cues {
                check_unit_score(&format!("personas.{}", persona), cue.score)?;
                let regex = RegexBuilder::new(&cue.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern {
                        persona: persona.to_string(),
                        pattern: cue.pattern.clone(),
                        source,
                    })?;
                compiled.push(CompiledRule {
                    regex,
                    score: cue.score,
                });
            }
            personas.insert(*persona, compiled);
        }

        Ok(Self {
            default_score: rules.default_score,
            personas,
            contradictions: rules.contradictions.clone(),
        })
    }

    /// Heuristic alignment of `reply` with `persona`.
    ///
    /// The reply is lower-cased, then the persona's cues are tried in order;
    /// the first match decides the score.  No match yields the default.
    pub fn persona_score(&self, reply: &str, persona: Persona) -> f64 {
        let lowered = reply.to_lowercase();
        self.persona_score_lowered(&lowered, persona)
    }

    pub(crate) fn persona_score_lowered(&self, lowered: &str, persona: Persona) -> f64 {
        self.personas
            .get(&persona)
            .and_then(|cues| cues.iter().find(|c| c.regex.is_match(lowered)))
            .map(|c| c.score)
            .unwrap_or(self.default_score)
    }

    /// 1 if the reply contains both sides of any contradiction pair, else 0.
    pub fn contradictions(&self, reply: &str, arabic: bool) -> u8 {
        let tokens = tokenize(reply, arabic);
        self.contradictions_in(&tokens, arabic)
    }

    pub(crate) fn contradictions_in(&self, tokens: &[String], arabic: bool) -> u8 {
        let hit = self.contradictions.iter().any(|(a, b)| {
            contains_phrase(tokens, &tokenize(a, arabic))
                && contains_phrase(tokens, &tokenize(b, arabic))
        });
        u8::from(hit)
    }

    pub fn default_score(&self) -> f64 {
        self.default_score
    }
}

fn check_unit_score(field: &str, score: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{} score must be within [0, 1], got {}",
            field, score
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
