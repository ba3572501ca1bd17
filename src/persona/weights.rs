//! Persona names and their adaptive weights.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named response style that candidates are scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Logical,
    Empathic,
    Visionary,
    Pragmatic,
    Playful,
}

impl Persona {
    /// Every persona, in canonical order.
    pub const ALL: [Persona; 5] = [
        Persona::Logical,
        Persona::Empathic,
        Persona::Visionary,
        Persona::Pragmatic,
        Persona::Playful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Logical => "logical",
            Persona::Empathic => "empathic",
            Persona::Visionary => "visionary",
            Persona::Pragmatic => "pragmatic",
            Persona::Playful => "playful",
        }
    }

    /// Weight a fresh session starts with.
    pub fn default_weight(&self) -> f64 {
        match self {
            Persona::Logical => 1.0,
            Persona::Empathic => 1.0,
            Persona::Visionary => 0.9,
            Persona::Pragmatic => 1.0,
            Persona::Playful => 0.8,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range every persona weight is kept within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self { min: 0.3, max: 1.2 }
    }
}

impl WeightBounds {
    /// Clamp `value` into the bounds.  Non-finite values collapse to the
    /// lower bound.
    ///
    /// Never panics: inverted bounds are read in ascending order and a
    /// non-finite bound is replaced by its default.
    pub fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = self.ordered();
        if value.is_finite() {
            value.clamp(lo, hi)
        } else {
            lo
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = self.ordered();
        value >= lo && value <= hi
    }

    /// `(lower, upper)` with both finite and `lower <= upper`.
    pub fn ordered(&self) -> (f64, f64) {
        let defaults = Self::default();
        let min = if self.min.is_finite() { self.min } else { defaults.min };
        let max = if self.max.is_finite() { self.max } else { defaults.max };
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }
}

/// Per-persona weights for one conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaWeights(BTreeMap<Persona, f64>);

impl Default for PersonaWeights {
    fn default() -> Self {
        Self(
            Persona::ALL
                .iter()
                .map(|p| (*p, p.default_weight()))
                .collect(),
        )
    }
}

impl PersonaWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current weight of `persona`, or its default if it was never set.
    pub fn get(&self, persona: Persona) -> f64 {
        self.0
            .get(&persona)
            .copied()
            .unwrap_or_else(|| persona.default_weight())
    }

    /// Set a weight, clamped into `bounds`.
    pub fn set(&mut self, persona: Persona, weight: f64, bounds: WeightBounds) {
        self.0.insert(persona, bounds.clamp(weight));
    }

    /// Re-clamp every weight into `bounds`.
    pub fn clamp_all(&mut self, bounds: WeightBounds) {
        for w in self.0.values_mut() {
            *w = bounds.clamp(*w);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Persona, f64)> + '_ {
        self.0.iter().map(|(p, w)| (*p, *w))
    }

    pub fn personas(&self) -> impl Iterator<Item = Persona> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
