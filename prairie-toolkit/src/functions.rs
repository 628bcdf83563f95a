//! The default function set
//!
//! String, number, collection and path functions in the lodash naming style field
//! specifications use. Each takes a single JSON argument. Functions that need more
//! than one input take a map and read named sub-arguments (`string`, `value`,
//! `pattern`, ...).

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, ToolkitError};
use crate::paths;
use crate::registry::Toolkit;
use crate::value::{is_truthy, number_value, stringify};

/// Default separator for `join` when none is given.
pub const DEFAULT_JOIN_SEPARATOR: &str = ",";

/// Default `truncate` length.
pub const DEFAULT_TRUNCATE_LENGTH: usize = 30;

/// Default `truncate` omission marker.
pub const DEFAULT_OMISSION: &str = "...";

/// Register every default function on `toolkit`.
pub fn register_defaults(toolkit: &mut Toolkit) {
    // strings
    toolkit.insert("toUpper", |v: &Value| Ok(Value::String(stringify(v).to_uppercase())));
    toolkit.insert("toLower", |v: &Value| Ok(Value::String(stringify(v).to_lowercase())));
    toolkit.insert("upperCase", |v: &Value| {
        Ok(Value::String(join_words(v, " ", |w| w.to_uppercase())))
    });
    toolkit.insert("lowerCase", |v: &Value| {
        Ok(Value::String(join_words(v, " ", |w| w.to_lowercase())))
    });
    toolkit.insert("kebabCase", |v: &Value| {
        Ok(Value::String(join_words(v, "-", |w| w.to_lowercase())))
    });
    toolkit.insert("snakeCase", |v: &Value| {
        Ok(Value::String(join_words(v, "_", |w| w.to_lowercase())))
    });
    toolkit.insert("startCase", |v: &Value| {
        Ok(Value::String(join_words(v, " ", upper_first)))
    });
    toolkit.insert("camelCase", |v: &Value| Ok(Value::String(camel_case(&stringify(v)))));
    toolkit.insert("capitalize", |v: &Value| {
        Ok(Value::String(upper_first(&stringify(v).to_lowercase())))
    });
    toolkit.insert("trim", |v: &Value| Ok(Value::String(stringify(v).trim().to_string())));
    toolkit.insert("toString", |v: &Value| Ok(Value::String(stringify(v))));
    toolkit.insert("words", |v: &Value| {
        Ok(Value::Array(
            words(&stringify(v)).into_iter().map(Value::String).collect(),
        ))
    });
    toolkit.insert("split", split);
    toolkit.insert("replace", replace);
    toolkit.insert("truncate", truncate);
    toolkit.insert("defaultTo", default_to);
    toolkit.insert("token_replace", |v: &Value| Ok(v.clone()));

    // numbers and predicates
    toolkit.insert("toNumber", to_number);
    toolkit.insert("parseInt", |v: &Value| Ok(parse_int(v)));
    toolkit.insert("isInteger", |v: &Value| {
        Ok(Value::Bool(
            v.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false),
        ))
    });
    toolkit.insert("isNumber", |v: &Value| Ok(Value::Bool(v.is_number())));
    toolkit.insert("isString", |v: &Value| Ok(Value::Bool(v.is_string())));
    toolkit.insert("isEmpty", |v: &Value| Ok(Value::Bool(is_empty(v))));

    // collections
    toolkit.insert("first", |v: &Value| Ok(nth(v, |len| (len > 0).then_some(0))));
    toolkit.insert("last", |v: &Value| Ok(nth(v, |len| len.checked_sub(1))));
    toolkit.insert("size", |v: &Value| Ok(Value::from(size(v))));
    toolkit.insert("compact", |v: &Value| {
        let items = expect_array("compact", v)?;
        Ok(Value::Array(items.iter().filter(|i| is_truthy(i)).cloned().collect()))
    });
    toolkit.insert("uniq", |v: &Value| {
        let items = expect_array("uniq", v)?;
        let mut seen: Vec<&Value> = Vec::new();
        for item in items {
            if !seen.contains(&item) {
                seen.push(item);
            }
        }
        Ok(Value::Array(seen.into_iter().cloned().collect()))
    });
    toolkit.insert("reverse", |v: &Value| {
        let items = expect_array("reverse", v)?;
        Ok(Value::Array(items.iter().rev().cloned().collect()))
    });
    toolkit.insert("flatten", |v: &Value| {
        let items = expect_array("flatten", v)?;
        let mut flat = Vec::new();
        for item in items {
            match item {
                Value::Array(inner) => flat.extend(inner.iter().cloned()),
                other => flat.push(other.clone()),
            }
        }
        Ok(Value::Array(flat))
    });
    toolkit.insert("keys", |v: &Value| {
        Ok(Value::Array(match v {
            Value::Object(map) => map.keys().cloned().map(Value::String).collect(),
            Value::Array(items) => (0..items.len()).map(|i| Value::String(i.to_string())).collect(),
            _ => Vec::new(),
        }))
    });
    toolkit.insert("values", |v: &Value| {
        Ok(Value::Array(match v {
            Value::Object(map) => map.values().cloned().collect(),
            Value::Array(items) => items.clone(),
            _ => Vec::new(),
        }))
    });
    toolkit.insert("sum", |v: &Value| {
        let nums = numbers("sum", v)?;
        Ok(number_value(nums.iter().sum()))
    });
    toolkit.insert("min", |v: &Value| {
        let nums = numbers("min", v)?;
        Ok(nums.into_iter().reduce(f64::min).map(number_value).unwrap_or(Value::Null))
    });
    toolkit.insert("max", |v: &Value| {
        let nums = numbers("max", v)?;
        Ok(nums.into_iter().reduce(f64::max).map(number_value).unwrap_or(Value::Null))
    });
    toolkit.insert("join", |v: &Value| {
        Ok(Value::String(match v {
            Value::Array(items) => join_values(items, DEFAULT_JOIN_SEPARATOR),
            other => stringify(other),
        }))
    });

    // paths
    toolkit.insert("dirname", |v: &Value| {
        Ok(Value::String(paths::dirname(expect_str("dirname", v)?)))
    });
    toolkit.insert("basename", |v: &Value| {
        Ok(Value::String(paths::basename(expect_str("basename", v)?)))
    });
    toolkit.insert("dir_i", |v: &Value| {
        Ok(Value::Object(paths::decompose(expect_str("dir_i", v)?)))
    });
}

/// Join array items the way JavaScript `Array.prototype.join` renders them.
pub fn join_values(items: &[Value], separator: &str) -> String {
    items.iter().map(stringify).collect::<Vec<_>>().join(separator)
}

/// Split text into words on non-alphanumeric characters and case changes.
///
/// `"fooBar baz-qux"` becomes `["foo", "Bar", "baz", "qux"]`; runs of capitals
/// stay together (`"XMLHttp"` becomes `["XML", "Http"]`).
pub fn words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in text.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let (prev, cur) = (chars[i - 1], chars[i]);
            let next_lower = chars.get(i + 1).map(|c| c.is_lowercase()).unwrap_or(false);
            let boundary = (prev.is_lowercase() && cur.is_uppercase())
                || (prev.is_uppercase() && cur.is_uppercase() && next_lower);
            if boundary {
                out.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        if start < chars.len() {
            out.push(chars[start..].iter().collect());
        }
    }
    out
}

fn join_words(v: &Value, separator: &str, f: impl Fn(&str) -> String) -> String {
    words(&stringify(v))
        .iter()
        .map(|w| f(w))
        .collect::<Vec<_>>()
        .join(separator)
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn camel_case(text: &str) -> String {
    words(text)
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let lower = w.to_lowercase();
            if i == 0 {
                lower
            } else {
                upper_first(&lower)
            }
        })
        .collect()
}

fn split(v: &Value) -> Result<Value> {
    let text = expect_str("split", v)?;
    Ok(Value::Array(
        text.split(DEFAULT_JOIN_SEPARATOR)
            .map(|s| Value::String(s.to_string()))
            .collect(),
    ))
}

/// `replace {string, pattern, replacement}`: every match of the `pattern` regex is
/// replaced. A missing replacement removes the matches.
fn replace(v: &Value) -> Result<Value> {
    let args = expect_map("replace", v)?;
    let text = stringify(sub_argument("replace", args, "string")?);
    let pattern = stringify(sub_argument("replace", args, "pattern")?);
    let replacement = args.get("replacement").map(stringify).unwrap_or_default();
    let regex = Regex::new(&pattern).map_err(|e| ToolkitError::InvalidPattern {
        function: "replace".to_string(),
        message: e.to_string(),
    })?;
    Ok(Value::String(
        regex.replace_all(&text, replacement.as_str()).into_owned(),
    ))
}

/// `truncate {string, length, omission}`: the result never exceeds `length` characters.
fn truncate(v: &Value) -> Result<Value> {
    let (text, length, omission) = match v {
        Value::Object(args) => (
            stringify(sub_argument("truncate", args, "string")?),
            args.get("length")
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_TRUNCATE_LENGTH),
            args.get("omission")
                .map(stringify)
                .unwrap_or_else(|| DEFAULT_OMISSION.to_string()),
        ),
        other => (
            stringify(other),
            DEFAULT_TRUNCATE_LENGTH,
            DEFAULT_OMISSION.to_string(),
        ),
    };
    if text.chars().count() <= length {
        return Ok(Value::String(text));
    }
    let keep = length.saturating_sub(omission.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&omission);
    Ok(Value::String(out))
}

/// `defaultTo {value, default}`: `default` when `value` is null or missing.
fn default_to(v: &Value) -> Result<Value> {
    let args = expect_map("defaultTo", v)?;
    match args.get("value") {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Ok(args.get("default").cloned().unwrap_or(Value::Null)),
    }
}

fn to_number(v: &Value) -> Result<Value> {
    match v {
        Value::Number(_) => Ok(v.clone()),
        Value::Null => Ok(Value::from(0)),
        Value::Bool(b) => Ok(Value::from(u8::from(*b))),
        Value::String(s) if s.trim().is_empty() => Ok(Value::from(0)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(number_value)
            .ok_or_else(|| ToolkitError::invalid_argument("toNumber", "numeric text", v)),
        other => Err(ToolkitError::invalid_argument("toNumber", "a scalar", other)),
    }
}

/// Leading-integer parse. Yields `false` when there is no leading integer.
fn parse_int(v: &Value) -> Value {
    if let Some(f) = v.as_f64() {
        return Value::from(f.trunc() as i64);
    }
    let text = stringify(v);
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let leading: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
    match leading.parse::<i64>() {
        Ok(n) => Value::from(sign * n),
        Err(_) => Value::Bool(false),
    }
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => true,
    }
}

fn size(v: &Value) -> usize {
    match v {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

fn nth(v: &Value, pick: impl Fn(usize) -> Option<usize>) -> Value {
    match v {
        Value::Array(items) => pick(items.len())
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            pick(chars.len())
                .map(|i| Value::String(chars[i].to_string()))
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn numbers(function: &str, v: &Value) -> Result<Vec<f64>> {
    Ok(expect_array(function, v)?
        .iter()
        .filter_map(Value::as_f64)
        .collect())
}

fn expect_array<'a>(function: &str, v: &'a Value) -> Result<&'a Vec<Value>> {
    v.as_array()
        .ok_or_else(|| ToolkitError::invalid_argument(function, "an array", v))
}

fn expect_str<'a>(function: &str, v: &'a Value) -> Result<&'a str> {
    v.as_str()
        .ok_or_else(|| ToolkitError::invalid_argument(function, "a string", v))
}

fn expect_map<'a>(function: &str, v: &'a Value) -> Result<&'a Map<String, Value>> {
    v.as_object()
        .ok_or_else(|| ToolkitError::invalid_argument(function, "a map of named arguments", v))
}

fn sub_argument<'a>(function: &str, args: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    args.get(name)
        .ok_or_else(|| ToolkitError::missing_sub_argument(function, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn call(name: &str, arg: Value) -> Result<Value> {
        Toolkit::with_defaults()
            .call(name, &arg)
            .unwrap_or_else(|| panic!("no function {name}"))
    }

    #[rstest]
    #[case("toUpper", json!("Green Tree"), json!("GREEN TREE"))]
    #[case("toLower", json!("Green"), json!("green"))]
    #[case("upperCase", json!("Green, Blué"), json!("GREEN BLUÉ"))]
    #[case("lowerCase", json!("fooBar-baz"), json!("foo bar baz"))]
    #[case("kebabCase", json!("Foo Bar"), json!("foo-bar"))]
    #[case("snakeCase", json!("fooBar"), json!("foo_bar"))]
    #[case("camelCase", json!("Foo bar_baz"), json!("fooBarBaz"))]
    #[case("startCase", json!("fancy-name"), json!("Fancy Name"))]
    #[case("capitalize", json!("gREEN"), json!("Green"))]
    #[case("trim", json!("  x  "), json!("x"))]
    #[case("toString", json!(9), json!("9"))]
    fn test_string_functions(#[case] name: &str, #[case] arg: Value, #[case] expected: Value) {
        assert_eq!(call(name, arg).unwrap(), expected);
    }

    #[test]
    fn test_words_splits_case_changes() {
        assert_eq!(words("XMLHttpRequest"), vec!["XML", "Http", "Request"]);
        assert_eq!(words("char1int"), vec!["char1int"]);
        assert!(words("--").is_empty());
    }

    #[rstest]
    #[case(json!("9"), json!(9))]
    #[case(json!("42px"), json!(42))]
    #[case(json!("-3"), json!(-3))]
    #[case(json!(7.9), json!(7))]
    #[case(json!("Blué"), json!(false))]
    fn test_parse_int(#[case] arg: Value, #[case] expected: Value) {
        assert_eq!(call("parseInt", arg).unwrap(), expected);
    }

    #[test]
    fn test_predicates() {
        assert_eq!(call("isInteger", json!(9)).unwrap(), json!(true));
        assert_eq!(call("isInteger", json!(false)).unwrap(), json!(false));
        assert_eq!(call("isInteger", json!(1.5)).unwrap(), json!(false));
        assert_eq!(call("isNumber", json!("1")).unwrap(), json!(false));
        assert_eq!(call("isString", json!("1")).unwrap(), json!(true));
        assert_eq!(call("isEmpty", json!([])).unwrap(), json!(true));
        assert_eq!(call("isEmpty", json!({"a": 1})).unwrap(), json!(false));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(call("toNumber", json!(" 4.5 ")).unwrap(), json!(4.5));
        assert_eq!(call("toNumber", json!("12")).unwrap(), json!(12));
        assert_eq!(call("toNumber", json!(true)).unwrap(), json!(1));
        assert!(call("toNumber", json!("abc")).is_err());
    }

    #[test]
    fn test_first_and_last() {
        assert_eq!(call("first", json!(["Fancy Name'", "x"])).unwrap(), json!("Fancy Name'"));
        assert_eq!(call("last", json!([1, 2, 3])).unwrap(), json!(3));
        assert_eq!(call("first", json!("Blue")).unwrap(), json!("B"));
        assert_eq!(call("first", json!([])).unwrap(), json!(null));
        assert_eq!(call("last", json!(5)).unwrap(), json!(null));
    }

    #[test]
    fn test_collections() {
        assert_eq!(call("size", json!("Blué")).unwrap(), json!(4));
        assert_eq!(call("compact", json!([0, 1, "", "a", null])).unwrap(), json!([1, "a"]));
        assert_eq!(call("uniq", json!([1, 2, 1, "1"])).unwrap(), json!([1, 2, "1"]));
        assert_eq!(call("reverse", json!([1, 2])).unwrap(), json!([2, 1]));
        assert_eq!(call("flatten", json!([1, [2, [3]]])).unwrap(), json!([1, 2, [3]]));
        assert_eq!(call("keys", json!({"a": 1, "b": 2})).unwrap(), json!(["a", "b"]));
        assert_eq!(call("values", json!({"a": 1, "b": 2})).unwrap(), json!([1, 2]));
        assert!(call("reverse", json!("ab")).is_err());
    }

    #[test]
    fn test_numeric_aggregates() {
        assert_eq!(call("sum", json!([1, 2, 3.5])).unwrap(), json!(6.5));
        assert_eq!(call("min", json!([4, 2, 8, 6])).unwrap(), json!(2));
        assert_eq!(call("max", json!([4, 2, 8, 6])).unwrap(), json!(8));
        assert_eq!(call("min", json!([])).unwrap(), json!(null));
        assert!(call("sum", json!(3)).is_err());
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(call("join", json!(["Green", "Blué"])).unwrap(), json!("Green,Blué"));
        assert_eq!(call("join", json!("solo")).unwrap(), json!("solo"));
        assert_eq!(call("split", json!("a,b")).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_replace_named_arguments() {
        let out = call(
            "replace",
            json!({"string": "Green Tree", "pattern": "e+", "replacement": "E"}),
        )
        .unwrap();
        assert_eq!(out, json!("GrEn TrE"));

        let err = call("replace", json!({"string": "x"})).unwrap_err();
        assert_eq!(err, ToolkitError::missing_sub_argument("replace", "pattern"));

        let err = call("replace", json!({"string": "x", "pattern": "("})).unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidPattern { .. }));
    }

    #[test]
    fn test_truncate() {
        let out = call("truncate", json!({"string": "hi-diddly-ho there", "length": 10})).unwrap();
        assert_eq!(out, json!("hi-didd..."));
        assert_eq!(call("truncate", json!("short")).unwrap(), json!("short"));
    }

    #[test]
    fn test_default_to() {
        assert_eq!(call("defaultTo", json!({"value": null, "default": 1})).unwrap(), json!(1));
        assert_eq!(call("defaultTo", json!({"value": 0, "default": 1})).unwrap(), json!(0));
        assert!(call("defaultTo", json!("x")).is_err());
    }

    #[test]
    fn test_path_functions() {
        assert_eq!(call("dirname", json!("one/folder/two/leaf")).unwrap(), json!("one/folder/two"));
        assert_eq!(call("basename", json!("one/leaf")).unwrap(), json!("leaf"));
        assert_eq!(
            call("dir_i", json!("one/two")).unwrap(),
            json!({"dirsplit": ["one", "two"], "dir1": "one", "dir2": "two"})
        );
        assert!(call("dirname", json!(5)).is_err());
    }
}
