//! Candidate replies, evaluation results and the history accessor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Confidence assumed for candidates that do not report one.
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// One proposed reply competing for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub reply: String,
    /// Upstream confidence in `[0, 1]`; `None` means "use the default".
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Identifier of the generator that produced the reply.
    #[serde(default)]
    pub source: Option<String>,
}

impl Candidate {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            confidence: None,
            source: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Build a candidate from an arbitrary JSON value.
    ///
    /// A non-string `reply` becomes the empty string, a non-numeric
    /// `confidence` is dropped and a non-string `source` is ignored.
    pub fn from_value(value: &Value) -> Self {
        let reply = value
            .get("reply")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite());
        let source = value
            .get("source")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self {
            reply,
            confidence,
            source,
        }
    }

    /// Confidence clamped into `[0, 1]`, falling back to `default`.
    pub fn effective_confidence(&self, default: f64) -> f64 {
        match self.confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => default,
        }
    }
}

/// Scores computed for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub candidate: Candidate,
    pub meta_score: f64,
    pub novelty: f64,
    pub contradictions: u8,
    pub persona_score: f64,
}

impl EvaluationResult {
    pub fn reply(&self) -> &str {
        &self.candidate.reply
    }
}

/// One prior exchange in the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// What the user said, if recorded.
    #[serde(default)]
    pub user: Option<String>,
    /// What the agent replied.
    #[serde(default)]
    pub reply: String,
}

impl Turn {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            user: None,
            reply: reply.into(),
        }
    }
}

/// Read access to the conversation so far, most recent turn last.
///
/// Implemented by whatever tracks the conversation; the evaluator only
/// reads the last few prior replies, borrowed.
pub trait ConversationHistory {
    /// Up to `n` most recent replies, oldest first.
    fn recent_replies(&self, n: usize) -> Vec<&str>;
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

impl ConversationHistory for [Turn] {
    fn recent_replies(&self, n: usize) -> Vec<&str> {
        tail(self, n).iter().map(|t| t.reply.as_str()).collect()
    }
}

impl ConversationHistory for Vec<Turn> {
    fn recent_replies(&self, n: usize) -> Vec<&str> {
        self.as_slice().recent_replies(n)
    }
}

impl ConversationHistory for [&str] {
    fn recent_replies(&self, n: usize) -> Vec<&str> {
        tail(self, n).to_vec()
    }
}

// ============================================================================
// Tests
// ============================================================================
