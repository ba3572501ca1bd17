//! Tokenisation and token-set similarity.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static HARAKAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{064B}-\u{0652}\u{0640}]").unwrap());
static GENERAL_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{2000}-\u{206F}\u{2E00}-\u{2E7F}]+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Fold Arabic orthographic variants so spelling noise does not count as
/// novelty.
///
/// Strips harakat and tatweel, unifies alef/yaa/waw/taa-marbuta forms and
/// collapses general punctuation and whitespace runs.
pub fn normalize_arabic(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = HARAKAT.replace_all(text, "");
    let folded: String = stripped
        .chars()
        .map(|c| match c {
            'إ' | 'أ' | 'آ' => 'ا',
            'ى' | 'ئ' => 'ي',
            'ؤ' => 'و',
            'ة' => 'ه',
            other => other,
        })
        .collect();
    let spaced = GENERAL_PUNCTUATION.replace_all(&folded, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Split text into lower-cased word tokens.
///
/// A token is a run of letters, digits, underscores and apostrophes, so
/// `don't` stays one token and `disagree` never yields `agree`.
pub fn tokenize(text: &str, arabic: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    let source = if arabic {
        normalize_arabic(&lowered)
    } else {
        lowered
    };
    source
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\'' || c == '’'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '’'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of two token lists, treated as sets.
///
/// Returns 0.0 when either side is empty.
pub fn jaccard_tokens(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// Jaccard similarity of two texts.
pub fn jaccard_similarity(a: &str, b: &str, arabic: bool) -> f64 {
    jaccard_tokens(&tokenize(a, arabic), &tokenize(b, arabic))
}

/// Whether `phrase` occurs in `tokens` as a contiguous token run.
pub fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return false;
    }
    tokens.windows(phrase.len()).any(|w| w == phrase)
}

// ============================================================================
// Tests
// ============================================================================
