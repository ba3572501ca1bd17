//! Replace internal concept identifiers with user-facing labels.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Concept identifier → display label.
pub type LabelsMap = HashMap<String, String>;

static CONCEPT_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b").unwrap());

/// Read a labels map from JSON, keeping only string labels.
///
/// Returns `None` when `value` is not an object.
pub fn labels_from_value(value: &Value) -> Option<LabelsMap> {
    let obj = value.as_object()?;
    Some(
        obj.iter()
            .filter_map(|(k, v)| v.as_str().map(|label| (k.clone(), label.to_string())))
            .collect(),
    )
}

/// Lower-case, underscore-separated tokens in `text`, first occurrence order.
pub fn find_concept_identifiers(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in CONCEPT_IDENTIFIER.find_iter(text) {
        if !found.iter().any(|f| f == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

/// Replace whole-word occurrences of every label key in `text`.
///
/// Matching respects word boundaries, so `depression_symptom` is replaced
/// but `depression_symptomatic` is not.  Keys that start or end with
/// punctuation (`#mood`) only need a boundary on their word-character edges.  All keys are substituted in one
/// pass; a label that itself looks like a key is never rewritten again.
/// With no labels the text is returned unchanged; an empty map additionally
/// logs any identifiers still present.
pub fn humanize(text: &str, labels: Option<&LabelsMap>) -> String {
    let Some(labels) = labels else {
        return text.to_string();
    };
    if text.is_empty() {
        return String::new();
    }

    if labels.is_empty() {
        let leftover = find_concept_identifiers(text);
        if !leftover.is_empty() {
            log::warn!(
                "No labels supplied but text still contains concept identifiers: {}",
                leftover.join(", ")
            );
        }
        return text.to_string();
    }

    let mut keys: Vec<&str> = labels
        .keys()
        .map(String::as_str)
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return text.to_string();
    }
    // Longest first so overlapping alternatives prefer the fuller key.
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = match Regex::new(&alternation) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("Could not build label pattern, leaving text unchanged: {}", e);
            return text.to_string();
        }
    };

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    while let Some(m) = pattern.find_at(text, pos) {
        let start = m.start();
        match keys.iter().find(|k| matches_whole_key(text, start, k)) {
            Some(key) => {
                out.push_str(&text[copied..start]);
                out.push_str(&labels[*key]);
                copied = start + key.len();
                pos = copied;
            }
            None => {
                pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
            }
        }
        if pos >= text.len() {
            break;
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `key` occurs at `start` and is not glued to neighbouring word characters.
///
/// Only edges of the key that are themselves word characters need a
/// boundary, so keys such as `#mood` still match after a space or letter.
fn matches_whole_key(text: &str, start: usize, key: &str) -> bool {
    if !text[start..].starts_with(key) {
        return false;
    }
    let end = start + key.len();
    let starts_word = key.chars().next().is_some_and(is_word_char);
    let ends_word = key.chars().next_back().is_some_and(is_word_char);
    let before_ok = !starts_word || !text[..start].chars().next_back().is_some_and(is_word_char);
    let after_ok = !ends_word || !text[end..].chars().next().is_some_and(is_word_char);
    before_ok && after_ok
}

// ============================================================================
// Tests
// ============================================================================
