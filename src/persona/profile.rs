//! Persona "DNA" profile and its sanitizer.
//!
//! Upstream producers hand over profile objects of any shape: numbers as
//! strings, missing fields, `null`, sometimes not an object at all.
//! [`sanitize_profile`] turns whatever arrives into a fully populated
//! [`PersonaProfile`] with finite numbers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name used when the input carries no usable name.
pub const DEFAULT_PROFILE_NAME: &str = "neutral";

pub const DEFAULT_WARMTH: f64 = 0.6;
pub const DEFAULT_RHYTHM: f64 = 0.5;
pub const DEFAULT_ABSTRACTION: f64 = 0.4;
pub const DEFAULT_LEXICAL_DENSITY: f64 = 0.5;
pub const DEFAULT_DIRECTNESS: f64 = 0.5;
pub const DEFAULT_IMAGERY_SCORE: f64 = 0.3;
pub const DEFAULT_POLITENESS: f64 = 0.7;

/// Stylistic profile of the speaking persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaProfile {
    pub name: String,
    pub warmth: f64,
    pub rhythm: f64,
    pub abstraction: f64,
    pub lexical_density: f64,
    pub directness: f64,
    pub imagery_score: f64,
    pub politeness: f64,
}

impl Default for PersonaProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            warmth: DEFAULT_WARMTH,
            rhythm: DEFAULT_RHYTHM,
            abstraction: DEFAULT_ABSTRACTION,
            lexical_density: DEFAULT_LEXICAL_DENSITY,
            directness: DEFAULT_DIRECTNESS,
            imagery_score: DEFAULT_IMAGERY_SCORE,
            politeness: DEFAULT_POLITENESS,
        }
    }
}

/// Normalize an arbitrary value into a complete [`PersonaProfile`].
///
/// Numeric fields accept numbers, numeric strings and booleans; both the
/// camelCase and snake_case spellings of multi-word keys are recognised.
/// Anything that does not parse to a finite number takes the field's
/// default.  Never panics.
pub fn sanitize_profile(input: &Value) -> PersonaProfile {
    let defaults = PersonaProfile::default();
    let Some(obj) = input.as_object() else {
        return defaults;
    };

    let field = |keys: &[&str], default: f64| -> f64 {
        keys.iter()
            .filter_map(|k| obj.get(*k))
            .find_map(coerce_number)
            .unwrap_or(default)
    };

    let name = match obj.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => defaults.name,
    };

    PersonaProfile {
        name,
        warmth: field(&["warmth"], DEFAULT_WARMTH),
        rhythm: field(&["rhythm"], DEFAULT_RHYTHM),
        abstraction: field(&["abstraction"], DEFAULT_ABSTRACTION),
        lexical_density: field(&["lexicalDensity", "lexical_density"], DEFAULT_LEXICAL_DENSITY),
        directness: field(&["directness"], DEFAULT_DIRECTNESS),
        imagery_score: field(&["imageryScore", "imagery_score"], DEFAULT_IMAGERY_SCORE),
        politeness: field(&["politeness"], DEFAULT_POLITENESS),
    }
}

/// Parse a JSON value as a finite number.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_gives_defaults() {
        let p = sanitize_profile(&json!({}));
        assert_eq!(p.name, "neutral");
        assert_eq!(p.warmth, DEFAULT_WARMTH);
        assert_eq!(p.rhythm, DEFAULT_RHYTHM);
        assert_eq!(p.abstraction, DEFAULT_ABSTRACTION);
        assert_eq!(p.lexical_density, DEFAULT_LEXICAL_DENSITY);
        assert_eq!(p.directness, DEFAULT_DIRECTNESS);
        assert_eq!(p.imagery_score, DEFAULT_IMAGERY_SCORE);
        assert_eq!(p.politeness, DEFAULT_POLITENESS);
    }

    #[test]
    fn test_non_object_inputs_give_defaults() {
        for input in [json!(null), json!(42), json!("dna"), json!([1, 2, 3])] {
            assert_eq!(sanitize_profile(&input), PersonaProfile::default());
        }
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let p = sanitize_profile(&json!({
            "name": "Sara",
            "warmth": "0.9",
            "lexicalDensity": " 0.25 ",
            "imagery_score": 0.8,
            "directness": true,
        }));
        assert_eq!(p.name, "Sara");
        assert_eq!(p.warmth, 0.9);
        assert_eq!(p.lexical_density, 0.25);
        assert_eq!(p.imagery_score, 0.8);
        assert_eq!(p.directness, 1.0);
    }

    #[test]
    fn test_garbage_fields_fall_back() {
        let p = sanitize_profile(&json!({
            "name": "   ",
            "warmth": "warm",
            "rhythm": null,
            "abstraction": {"deep": true},
            "politeness": "NaN",
            "directness": "inf",
        }));
        assert_eq!(p.name, "neutral");
        assert_eq!(p.warmth, DEFAULT_WARMTH);
        assert_eq!(p.rhythm, DEFAULT_RHYTHM);
        assert_eq!(p.abstraction, DEFAULT_ABSTRACTION);
        assert_eq!(p.politeness, DEFAULT_POLITENESS);
        assert_eq!(p.directness, DEFAULT_DIRECTNESS);
    }

    #[test]
    fn test_non_string_name_falls_back() {
        let p = sanitize_profile(&json!({"name": 7}));
        assert_eq!(p.name, "neutral");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(PersonaProfile::default()).unwrap();
        assert!(json.get("lexicalDensity").is_some());
        assert!(json.get("imageryScore").is_some());
    }
}
