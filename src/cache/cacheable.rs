//! Decides whether a freshly produced value may be written through.

use serde_json::Value;

/// Returns false for values that look like "not available yet".
///
/// Rejected: `null`, `[]`, `{}`, and CMS envelopes whose `data` member is
/// `null`, `[]` or `{}`. Caching those would keep serving an empty page after
/// the content shows up at the origin.
pub fn is_cacheable(value: &Value) -> bool {
    if is_empty(value) {
        return false;
    }
    match value.get("data") {
        Some(data) => !is_empty(data),
        None => true,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_shapes_are_not_cacheable() {
        assert!(!is_cacheable(&json!(null)));
        assert!(!is_cacheable(&json!([])));
        assert!(!is_cacheable(&json!({})));
        assert!(!is_cacheable(&json!({"data": []})));
        assert!(!is_cacheable(&json!({"data": null})));
        assert!(!is_cacheable(&json!({"data": {}})));
    }

    #[test]
    fn test_meaningful_values_are_cacheable() {
        assert!(is_cacheable(&json!({"data": [{"slug": "trip-report"}]})));
        assert!(is_cacheable(&json!({"data": {"id": 1}, "meta": {}})));
        assert!(is_cacheable(&json!({"title": "x"})));
        assert!(is_cacheable(&json!([1])));
        assert!(is_cacheable(&json!("text")));
        assert!(is_cacheable(&json!(0)));
        assert!(is_cacheable(&json!(false)));
    }
}
