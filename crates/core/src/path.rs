//! Dotted key-path resolution over webhook payloads.
//!
//! Paths are plain `.`-separated key names (`data.items`). Only objects are
//! descended into; arrays are returned as terminal values but never indexed.
//! A segment such as `series[0]` is looked up as the literal key
//! `"series[0]"`, not as an array index.

use serde_json::Value;

/// Path separator between key segments.
pub const PATH_SEPARATOR: char = '.';

/// Resolve `path` against `root`.
///
/// Returns `None` as soon as a segment is missing, a non-object is reached
/// before the last segment, the path is empty (or contains an empty
/// segment), or the root itself is empty.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() || is_empty_root(root) {
        return None;
    }

    let mut current = root;
    for segment in path.split(PATH_SEPARATOR) {
        if segment.is_empty() {
            return None;
        }
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Resolve `path` and keep the result only when it is an array.
pub fn resolve_array<'a>(root: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
    resolve(root, path).and_then(Value::as_array)
}

/// Resolve the first candidate path that yields an array.
pub fn resolve_first_array<'a, I, S>(root: &'a Value, candidates: I) -> Option<&'a Vec<Value>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .find_map(|path| resolve_array(root, path.as_ref()))
}

fn is_empty_root(root: &Value) -> bool {
    match root {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Render a resolved scalar for display.
///
/// Strings are returned verbatim, numbers and booleans in their JSON form.
/// `null` yields `None`; arrays and objects are rendered as compact JSON.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Interpret a value as a number: JSON numbers, or strings that parse as one.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_nested_key() {
        let v = json!({"a": {"b": 5}});
        assert_eq!(resolve(&v, "a.b"), Some(&json!(5)));
    }

    #[test]
    fn missing_key_is_not_found() {
        let v = json!({"a": {"b": 5}});
        assert_eq!(resolve(&v, "a.c"), None);
    }

    #[test]
    fn empty_root_is_not_found() {
        assert_eq!(resolve(&json!({}), "a.b"), None);
        assert_eq!(resolve(&Value::Null, "a"), None);
        assert_eq!(resolve(&json!([]), "a"), None);
    }

    #[test]
    fn empty_path_is_not_found() {
        let v = json!({"a": 1});
        assert_eq!(resolve(&v, ""), None);
        assert_eq!(resolve(&v, "   "), None);
        assert_eq!(resolve(&v, "a."), None);
        assert_eq!(resolve(&v, ".a"), None);
    }

    #[test]
    fn arrays_are_terminal_only() {
        let v = json!({"items": [{"title": "x"}]});
        assert_eq!(resolve(&v, "items"), Some(&json!([{"title": "x"}])));
        assert_eq!(resolve(&v, "items.0"), None);
        assert_eq!(resolve(&v, "items.title"), None);
    }

    #[test]
    fn bracketed_segment_is_a_literal_key() {
        let real_array = json!({"series": [{"data": [1, 2]}]});
        assert_eq!(resolve(&real_array, "series[0].data"), None);

        let literal = json!({"series[0]": {"data": [1, 2]}});
        assert_eq!(resolve(&literal, "series[0].data"), Some(&json!([1, 2])));
    }

    #[test]
    fn descending_through_scalar_is_not_found() {
        let v = json!({"a": "text"});
        assert_eq!(resolve(&v, "a.b"), None);
    }

    #[test]
    fn null_leaf_resolves_to_null() {
        let v = json!({"a": null});
        assert_eq!(resolve(&v, "a"), Some(&Value::Null));
    }

    #[test]
    fn first_array_candidate_wins() {
        let v = json!({"data": "nope", "values": [3], "revenue": [4]});
        let found = resolve_first_array(&v, ["data", "values", "revenue"]);
        assert_eq!(found, Some(&vec![json!(3)]));
    }

    #[test]
    fn display_and_numeric_helpers() {
        assert_eq!(display_value(&json!("x")), Some("x".to_string()));
        assert_eq!(display_value(&json!(2.5)), Some("2.5".to_string()));
        assert_eq!(display_value(&json!(true)), Some("true".to_string()));
        assert_eq!(display_value(&Value::Null), None);
        assert_eq!(numeric_value(&json!("12")), Some(12.0));
        assert_eq!(numeric_value(&json!("12abc")), None);
        assert_eq!(numeric_value(&json!(-3)), Some(-3.0));
    }
}
