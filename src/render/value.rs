//! Context value helpers: stringification and redacted snapshots.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Replacement shown for redacted values in snapshots.
pub const REDACTED: &str = "[REDACTED]";

/// Key → value map a template is rendered against.
pub type RenderContext = HashMap<String, Value>;

/// Build a render context from a JSON object.  Anything else yields an
/// empty context.
pub fn context_from_value(value: &Value) -> RenderContext {
    value
        .as_object()
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// Text substituted for a context value.
///
/// Strings pass through, numbers and booleans use their JSON spelling and
/// arrays/objects are serialized to compact JSON.  `null` and values that
/// fail to serialize yield `None`.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => match serde_json::to_string(value) {
            Ok(s) => Some(s),
            Err(e) => {
                log::debug!("Could not serialize context value: {}", e);
                None
            }
        },
    }
}

/// Whether `value` is the number zero.
pub(crate) fn is_numeric_zero(value: &Value) -> bool {
    value.as_f64() == Some(0.0)
}

/// Whether a key looks like it holds a credential.
pub fn is_sensitive_key(key: &str, fragments: &[String]) -> bool {
    let lowered = key.to_lowercase();
    fragments
        .iter()
        .any(|f| !f.is_empty() && lowered.contains(&f.to_lowercase()))
}

/// JSON snapshot of `context` with sensitive values replaced, recursively.
pub fn redact_context(context: &RenderContext, fragments: &[String]) -> Value {
    let mut keys: Vec<&String> = context.keys().collect();
    keys.sort();
    let mut out = Map::new();
    for key in keys {
        let value = &context[key];
        let shown = if is_sensitive_key(key, fragments) {
            Value::String(REDACTED.to_string())
        } else {
            redact_value(value, fragments)
        };
        out.insert(key.clone(), shown);
    }
    Value::Object(out)
}

fn redact_value(value: &Value, fragments: &[String]) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| {
                    let shown = if is_sensitive_key(k, fragments) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_value(v, fragments)
                    };
                    (k.clone(), shown)
                })
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| redact_value(v, fragments)).collect())
        }
        other => other.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use serde_json::json;

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify(&json!("hi")).as_deref(), Some("hi"));
        assert_eq!(stringify(&json!(3)).as_deref(), Some("3"));
        assert_eq!(stringify(&json!(0.5)).as_deref(), Some("0.5"));
        assert_eq!(stringify(&json!(false)).as_deref(), Some("false"));
        assert_eq!(stringify(&Value::Null), None);
    }

    #[test]
    fn test_stringify_structures() {
        assert_eq!(stringify(&json!([1, "a"])).as_deref(), Some(r#"[1,"a"]"#));
        assert_eq!(stringify(&json!({"k": 1})).as_deref(), Some(r#"{"k":1}"#));
    }

    #[test]
    fn test_numeric_zero() {
        assert!(is_numeric_zero(&json!(0)));
        assert!(is_numeric_zero(&json!(0.0)));
        assert!(!is_numeric_zero(&json!("0")));
        assert!(!is_numeric_zero(&json!(1)));
    }

    #[test]
    fn test_redaction_is_recursive_and_case_insensitive() {
        let fragments = RenderConfig::default().redact_keys;
        let ctx = context_from_value(&json!({
            "user": "mona",
            "API_KEY": "sk-123",
            "nested": {"authToken": "abc", "mood": "calm"},
        }));
        let snap = redact_context(&ctx, &fragments);
        assert_eq!(snap["user"], "mona");
        assert_eq!(snap["API_KEY"], REDACTED);
        assert_eq!(snap["nested"]["authToken"], REDACTED);
        assert_eq!(snap["nested"]["mood"], "calm");
    }

    #[test]
    fn test_context_from_non_object_is_empty() {
        assert!(context_from_value(&json!([1, 2])).is_empty());
    }
}
