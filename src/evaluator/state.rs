//! Per-session evaluator state.
//!
//! Everything the evaluator mutates across turns lives in one explicit,
//! serialisable value.  The caller owns it for the lifetime of a
//! conversation and may persist it between turns; nothing is global.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persona::PersonaWeights;

/// One recorded meta score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Append-only score log, keyed by candidate source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineHistory(BTreeMap<String, Vec<ScoreRecord>>);

impl EngineHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a score for `source`, stamped with the current time.
    pub fn record(&mut self, source: &str, score: f64) {
        self.0
            .entry(source.to_string())
            .or_default()
            .push(ScoreRecord {
                score,
                timestamp: Utc::now(),
            });
    }

    pub fn get(&self, source: &str) -> &[ScoreRecord] {
        self.0.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Most recent score of every source that has one.
    pub fn latest_scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().filter_map(|records| records.last().map(|r| r.score))
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Total number of recorded scores across all sources.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// One inner-voice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Mutable state of one conversation's evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorState {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub weights: PersonaWeights,
    pub history: EngineHistory,
    #[serde(default)]
    pub trace: VecDeque<TraceEntry>,
}

impl Default for EvaluatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorState {
    /// Fresh state for a new session, with the default persona weights.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            weights: PersonaWeights::default(),
            history: EngineHistory::new(),
            trace: VecDeque::new(),
        }
    }

    /// Append a trace line, dropping the oldest beyond `capacity`.
    pub(crate) fn push_trace(&mut self, text: String, capacity: usize) {
        self.trace.push_back(TraceEntry {
            text,
            timestamp: Utc::now(),
        });
        while self.trace.len() > capacity {
            self.trace.pop_front();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
