//! Template rendering.
//!
//! Templates contain `{key}` placeholders (ASCII letters, digits and
//! underscore).  Each key resolves, in order, from:
//!
//! 1. the context, except that a numeric `0` with a `<key>_str` sibling
//!    takes the sibling's value, since upstream producers sometimes put a
//!    zeroed number where a string belongs;
//! 2. the per-key fallback table in [`RenderOptions`];
//! 3. the visible missing marker, with the key recorded in `missing`.
//!
//! A value that carries another key's marker is expanded as well, so no
//! `{key}` of the template survives.  Rendering never fails.

pub mod humanize;
pub mod value;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use humanize::{find_concept_identifiers, humanize, labels_from_value, LabelsMap};
pub use value::{context_from_value, redact_context, stringify, RenderContext, REDACTED};

use crate::config::RenderConfig;
use value::is_numeric_zero;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());

/// Per-call rendering options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Text to use for a key the context cannot supply.
    pub fallbacks: HashMap<String, String>,
}

impl RenderOptions {
    pub fn with_fallback(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.fallbacks.insert(key.into(), text.into());
        self
    }
}

/// Result of one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub rendered: String,
    /// Distinct placeholder keys, in first-occurrence order.
    pub placeholders: Vec<String>,
    /// Keys that fell through to the missing marker.
    pub missing: Vec<String>,
    /// Redacted snapshot of the context the template was rendered against.
    pub context_used: serde_json::Value,
}

/// Placeholder diagnostics without the rendered text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub placeholders: Vec<String>,
    pub missing: Vec<String>,
}

impl From<&RenderOutput> for RenderReport {
    fn from(output: &RenderOutput) -> Self {
        Self {
            placeholders: output.placeholders.clone(),
            missing: output.missing.clone(),
        }
    }
}

/// Distinct placeholder keys in `template`, first occurrence first.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for cap in PLACEHOLDER.captures_iter(template) {
        let key = &cap[1];
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Substitutes context values into templates.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn missing_marker(&self) -> &str {
        &self.config.missing_marker
    }

    /// Render `template` against `context`.
    pub fn render(
        &self,
        template: &str,
        context: &RenderContext,
        options: &RenderOptions,
    ) -> RenderOutput {
        let placeholders = extract_placeholders(template);
        let mut missing = Vec::new();
        let mut resolved: HashMap<String, String> = HashMap::with_capacity(placeholders.len());

        for key in &placeholders {
            let text = match self.resolve(key, context, options) {
                Some(text) => text,
                None => {
                    missing.push(key.clone());
                    self.config.missing_marker.clone()
                }
            };
            resolved.insert(key.clone(), text);
        }

        let rendered = if placeholders.is_empty() {
            template.to_string()
        } else {
            self.substitute(template, &resolved, placeholders.len())
        };

        if !missing.is_empty() {
            log::debug!("Template rendered with missing keys: {}", missing.join(", "));
        }

        RenderOutput {
            rendered,
            placeholders,
            missing,
            context_used: redact_context(context, &self.config.redact_keys),
        }
    }

    /// Replace every `{key}` of `resolved` in `template`.
    ///
    /// Values may themselves contain markers of other keys, so substitution
    /// repeats up to `max_passes` times.  Markers still left after that
    /// (only possible with cyclic values) become the missing marker.
    fn substitute(
        &self,
        template: &str,
        resolved: &HashMap<String, String>,
        max_passes: usize,
    ) -> String {
        let has_marker = |text: &str| {
            PLACEHOLDER
                .captures_iter(text)
                .any(|caps| resolved.contains_key(&caps[1]))
        };

        let mut text = template.to_string();
        for _ in 0..max_passes.max(1) {
            if !has_marker(&text) {
                return text;
            }
            text = PLACEHOLDER
                .replace_all(&text, |caps: &regex::Captures| {
                    resolved
                        .get(&caps[1])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned();
        }

        if has_marker(&text) {
            log::warn!("Placeholder values refer to each other cyclically; masking the rest");
            text = PLACEHOLDER
                .replace_all(&text, |caps: &regex::Captures| {
                    if resolved.contains_key(&caps[1]) {
                        self.config.missing_marker.clone()
                    } else {
                        caps[0].to_string()
                    }
                })
                .into_owned();
        }
        text
    }

    fn resolve(&self, key: &str, context: &RenderContext, options: &RenderOptions) -> Option<String> {
        if let Some(value) = context.get(key).filter(|v| !v.is_null()) {
            if is_numeric_zero(value) {
                let sibling = context
                    .get(&format!("{}_str", key))
                    .and_then(stringify);
                if sibling.is_some() {
                    return sibling;
                }
            }
            if let Some(text) = stringify(value) {
                return Some(text);
            }
        }
        options.fallbacks.get(key).cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MISSING_MARKER;
    use serde_json::json;

    fn ctx(value: serde_json::Value) -> RenderContext {
        context_from_value(&value)
    }

    #[test]
    fn test_missing_key_uses_marker() {
        let out = Renderer::default().render(
            "حاسس إن {emotion_name} واخد مساحة جواك.",
            &ctx(json!({"emotion_score": 1})),
            &RenderOptions::default(),
        );
        assert_eq!(out.missing, vec!["emotion_name"]);
        assert!(out.rendered.contains(DEFAULT_MISSING_MARKER));
        assert!(!out.rendered.contains("{emotion_name}"));
    }

    #[test]
    fn test_zero_prefers_str_sibling() {
        let out = Renderer::default().render(
            "... {emotion_name} ...",
            &ctx(json!({"emotion_name": 0, "emotion_name_str": "الحزن"})),
            &RenderOptions::default(),
        );
        assert!(out.rendered.contains("الحزن"));
        assert!(!out.rendered.contains('0'));
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_zero_without_sibling_renders_zero() {
        let out = Renderer::default().render(
            "score {s}",
            &ctx(json!({"s": 0})),
            &RenderOptions::default(),
        );
        assert_eq!(out.rendered, "score 0");
    }

    #[test]
    fn test_nonzero_ignores_str_sibling() {
        let out = Renderer::default().render(
            "{n}",
            &ctx(json!({"n": 2, "n_str": "two"})),
            &RenderOptions::default(),
        );
        assert_eq!(out.rendered, "2");
    }

    #[test]
    fn test_fallback_table_beats_marker() {
        let options = RenderOptions::default().with_fallback("name", "صديقي");
        let out = Renderer::default().render("أهلا {name}", &ctx(json!({"name": null})), &options);
        assert_eq!(out.rendered, "أهلا صديقي");
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_context_beats_fallback_table() {
        let options = RenderOptions::default().with_fallback("name", "friend");
        let out = Renderer::default().render("hi {name}", &ctx(json!({"name": "Omar"})), &options);
        assert_eq!(out.rendered, "hi Omar");
    }

    #[test]
    fn test_placeholders_deduplicated_in_order() {
        let out = Renderer::default().render(
            "{b} {a} {b} {c}",
            &ctx(json!({"a": "A", "b": "B"})),
            &RenderOptions::default(),
        );
        assert_eq!(out.placeholders, vec!["b", "a", "c"]);
        assert_eq!(out.missing, vec!["c"]);
        assert_eq!(out.rendered, format!("B A B {}", DEFAULT_MISSING_MARKER));
    }

    #[test]
    fn test_structured_values_serialized() {
        let out = Renderer::default().render(
            "{list} {obj} {flag} {num}",
            &ctx(json!({"list": [1, 2], "obj": {"k": "v"}, "flag": true, "num": 1.5})),
            &RenderOptions::default(),
        );
        assert_eq!(out.rendered, r#"[1,2] {"k":"v"} true 1.5"#);
    }

    #[test]
    fn test_template_without_placeholders_is_unchanged() {
        let template = "no placeholders { here } or {bad-key}";
        let out = Renderer::default().render(template, &RenderContext::new(), &RenderOptions::default());
        assert_eq!(out.rendered, template);
        assert!(out.placeholders.is_empty());
    }

    #[test]
    fn test_no_placeholder_survives() {
        let out = Renderer::default().render(
            "{a}{b}{a}",
            &ctx(json!({"b": "x"})),
            &RenderOptions::default(),
        );
        for key in &out.placeholders {
            assert!(!out.rendered.contains(&format!("{{{}}}", key)));
        }
    }

    #[test]
    fn test_value_carrying_another_marker_is_expanded() {
        let out = Renderer::default().render(
            "{a} {b}",
            &ctx(json!({"a": "{b}", "b": "B"})),
            &RenderOptions::default(),
        );
        assert_eq!(out.rendered, "B B");
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_cyclic_values_leave_no_marker() {
        let out = Renderer::default().render(
            "{a} and {b}",
            &ctx(json!({"a": "{b}", "b": "{a}"})),
            &RenderOptions::default(),
        );
        for key in &out.placeholders {
            assert!(!out.rendered.contains(&format!("{{{}}}", key)));
        }
    }

    #[test]
    fn test_unrelated_braces_in_values_are_kept() {
        let out = Renderer::default().render(
            "{a}",
            &ctx(json!({"a": "set {other} aside"})),
            &RenderOptions::default(),
        );
        assert_eq!(out.rendered, "set {other} aside");
    }

    #[test]
    fn test_context_used_is_redacted() {
        let out = Renderer::default().render(
            "{user}",
            &ctx(json!({"user": "Ali", "session_token": "secret-value"})),
            &RenderOptions::default(),
        );
        assert_eq!(out.context_used["user"], "Ali");
        assert_eq!(out.context_used["session_token"], REDACTED);
    }

    #[test]
    fn test_custom_marker() {
        let renderer = Renderer::new(RenderConfig {
            missing_marker: "??".into(),
            ..RenderConfig::default()
        });
        let out = renderer.render("x {y}", &RenderContext::new(), &RenderOptions::default());
        assert_eq!(out.rendered, "x ??");
    }
}
