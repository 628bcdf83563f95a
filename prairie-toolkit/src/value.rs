//! Structural helpers over `serde_json::Value`
//!
//! Records are loosely typed, so the toolkit and the engine share one notion of
//! "present", one string rendering and one merge. Truthiness and rendering follow
//! the JavaScript conventions field specifications were written against.

use serde_json::{Map, Number, Value};

/// Whether a value counts as present.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy; every array and map is truthy,
/// including empty ones.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Whether `map[key]` exists and is truthy.
pub fn has_truthy(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).map(is_truthy).unwrap_or(false)
}

/// Render a value as text.
///
/// Strings are returned raw, integral floats lose their fraction, arrays are
/// joined with `,`, `null` becomes empty and maps fall back to compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Render a number without a trailing `.0` for integral floats.
pub fn number_to_string(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

/// A short name for the JSON kind of a value, used in error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

/// Shallow merge: keys of `overlay` replace keys of `base`, other keys of `base` survive.
pub fn shallow_merge(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

/// Look up a dotted path (`a.b.0`) in a map. Numeric segments index into arrays.
pub fn get_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(inner) => inner.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Build a JSON number from an `f64`, collapsing integral values to integers.
pub fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("Green")), "Green");
        assert_eq!(stringify(&json!(9)), "9");
        assert_eq!(stringify(&json!(9.0)), "9");
        assert_eq!(stringify(&json!(1.5)), "1.5");
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!(["a", 1, null])), "a,1,");
        assert_eq!(stringify(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_shallow_merge_overlay_wins() {
        let base = json!({"a": 1, "b": {"x": 1}}).as_object().cloned().unwrap();
        let overlay = json!({"b": {"y": 2}, "c": 3}).as_object().cloned().unwrap();
        let merged = shallow_merge(base, overlay);
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": {"y": 2}, "c": 3}));
    }

    #[test]
    fn test_get_path() {
        let map = json!({"a": {"b": ["x", "y"]}, "c.d": 4})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(get_path(&map, "a.b.1"), Some(&json!("y")));
        assert_eq!(get_path(&map, "c.d"), Some(&json!(4)));
        assert_eq!(get_path(&map, "a.z"), None);
        assert_eq!(get_path(&map, "a.b.9"), None);
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(3.0), json!(3));
        assert_eq!(number_value(2.5), json!(2.5));
        assert_eq!(number_value(f64::NAN), json!(null));
    }
}
