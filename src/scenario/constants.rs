//! `${key}` constant substitution for scenario files.
//!
//! Mirrors the reference loader's two substitution modes: a scenario
//! string that is *entirely* a `${key}` placeholder is replaced by the
//! constant's own JSON type (so a numeric constant stays a number);
//! a placeholder embedded inside a larger string is replaced in place as
//! text. Unresolved placeholders pass through unchanged.

use serde_json::{Map, Value};

/// Recursively resolve `${key}` placeholders in `value` against `constants`.
pub fn resolve(value: Value, constants: &Map<String, Value>) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, resolve(v, constants))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| resolve(v, constants)).collect()),
        Value::String(s) => resolve_string(&s, constants),
        other => other,
    }
}

fn resolve_string(s: &str, constants: &Map<String, Value>) -> Value {
    if let Some(key) = whole_placeholder_key(s) {
        return constants.get(key).cloned().unwrap_or_else(|| Value::String(s.to_string()));
    }
    Value::String(substitute_placeholders(s, constants))
}

/// If `s` is, after trimming, exactly one `${...}` placeholder, return the
/// inner key.
fn whole_placeholder_key(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    let inner = trimmed.strip_prefix("${")?.strip_suffix('}')?;
    is_valid_key(inner).then_some(inner)
}

fn is_valid_key(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn substitute_placeholders(s: &str, constants: &Map<String, Value>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i..].starts_with("${") {
            if let Some(rel_end) = s[i + 2..].find('}') {
                let key = &s[i + 2..i + 2 + rel_end];
                if is_valid_key(key) {
                    match constants.get(key) {
                        Some(value) => result.push_str(&value_to_plain_string(value)),
                        None => result.push_str(&s[i..i + 2 + rel_end + 1]),
                    }
                    i += 2 + rel_end + 1;
                    continue;
                }
            }
        }
        let ch = s[i..].chars().next().expect("i is a valid char boundary");
        result.push(ch);
        i += ch.len_utf8();
    }
    result
}

fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constants() -> Map<String, Value> {
        match json!({"rate": 0.0475, "label": "baseline", "count": 3}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn whole_string_placeholder_preserves_type() {
        let resolved = resolve(json!("${rate}"), &constants());
        assert_eq!(resolved, json!(0.0475));
    }

    #[test]
    fn embedded_placeholder_substitutes_as_text() {
        let resolved = resolve(json!("scenario-${label}-final"), &constants());
        assert_eq!(resolved, json!("scenario-baseline-final"));
    }

    #[test]
    fn unresolved_placeholder_passes_through() {
        let resolved = resolve(json!("${missing}"), &constants());
        assert_eq!(resolved, json!("${missing}"));
    }

    #[test]
    fn recurses_into_objects_and_arrays() {
        let resolved = resolve(
            json!({"a": ["${rate}", {"b": "${count} items"}]}),
            &constants(),
        );
        assert_eq!(resolved, json!({"a": [0.0475, {"b": "3 items"}]}));
    }
}
