//! Typed field rules.
//!
//! Specifications arrive as loosely shaped JSON/YAML. They are normalized once, at
//! load time, into [`FieldRule`] values so the engine matches over a closed set of
//! forms instead of re-inspecting raw shapes on every record.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use prairie_toolkit::value::kind_of;
use prairie_toolkit::{is_truthy, stringify};

use crate::error::{FieldsError, Result};

/// A record: the string-keyed map fields are grown on.
pub type Record = Map<String, Value>;

/// Keys naming the function to call. The first is canonical, the rest are legacy aliases.
pub const FUNCTION_KEYS: [&str; 2] = ["function", "func"];
/// Keys carrying an inline argument.
pub const ARGUMENT_KEYS: [&str; 2] = ["argument", "arg"];
/// Keys naming a record field whose value becomes the argument.
pub const ARGUMENT_FIELD_KEYS: [&str; 2] = ["argument_field", "arg_field"];
/// Keys selecting the output mode.
pub const OUTPUT_MODE_KEYS: [&str; 2] = ["outputMode", "app"];
/// Separator used when joining an array argument.
pub const JOIN_WITH_KEY: &str = "join_with";
/// Legacy control keys that are dropped without meaning anything.
pub const STRIPPED_KEYS: [&str; 1] = ["map"];

/// What to do with a function's result. Only `Map` stores it; other modes are
/// reserved and fall back to the literal overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Map,
    Other(String),
}

impl OutputMode {
    pub fn parse(raw: &str) -> Self {
        if raw == "map" {
            OutputMode::Map
        } else {
            OutputMode::Other(raw.to_string())
        }
    }
}

/// Where a call's argument comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ArgumentSource {
    /// No argument given.
    #[default]
    None,
    /// Written in the rule, or carried in from the previous pipeline stage. A string
    /// naming a present record field, or a map whose `string` / `value` sub-field
    /// names one, is replaced by that field's value.
    Inline(Value),
    /// The value of the named record field. Missing or falsy skips the rule.
    Field(String),
}

/// A call to a toolkit function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallDescriptor {
    /// Function name; the target field name when absent.
    pub function: Option<String>,
    pub argument: ArgumentSource,
    pub output_mode: OutputMode,
    /// Separator for `join` over an array argument.
    pub join_with: Option<String>,
    /// Every non-control key of the rule, in order. This is the literal overlay
    /// stored when no function matches.
    pub extra: Map<String, Value>,
}

impl CallDescriptor {
    /// A call to `function` with no argument.
    pub fn named(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Self::default()
        }
    }

    /// Replace the argument source.
    pub fn with_argument(mut self, argument: ArgumentSource) -> Self {
        self.argument = argument;
        self
    }

    /// Normalize a rule map. Canonical keys win over their legacy aliases.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let function = first_present(map, &FUNCTION_KEYS).map(|v| match v {
            Value::String(s) => s.clone(),
            other => stringify(other),
        });

        let argument = match first_present(map, &ARGUMENT_FIELD_KEYS) {
            Some(field) if is_truthy(field) => ArgumentSource::Field(stringify(field)),
            _ => match first_present(map, &ARGUMENT_KEYS) {
                Some(arg) => ArgumentSource::Inline(arg.clone()),
                None => ArgumentSource::None,
            },
        };

        let output_mode = first_present(map, &OUTPUT_MODE_KEYS)
            .map(|v| OutputMode::parse(&stringify(v)))
            .unwrap_or_default();

        let join_with = map
            .get(JOIN_WITH_KEY)
            .filter(|v| !v.is_null())
            .map(stringify);

        let extra = map
            .iter()
            .filter(|(key, _)| !is_control_key(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            function,
            argument,
            output_mode,
            join_with,
            extra,
        }
    }

    /// The function to call for `target`.
    pub fn function_for<'a>(&'a self, target: &'a str) -> &'a str {
        self.function.as_deref().unwrap_or(target)
    }
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

/// Whether a rule key controls the call rather than being overlay content.
pub fn is_control_key(key: &str) -> bool {
    FUNCTION_KEYS.contains(&key)
        || ARGUMENT_KEYS.contains(&key)
        || ARGUMENT_FIELD_KEYS.contains(&key)
        || OUTPUT_MODE_KEYS.contains(&key)
        || STRIPPED_KEYS.contains(&key)
        || key == JOIN_WITH_KEY
}

/// One step after the head of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Call(CallDescriptor),
    /// A stage of a shape the engine cannot run (number, boolean, nested list, null).
    Unsupported(Value),
}

impl From<&Value> for Stage {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(name) => Stage::Call(CallDescriptor::named(name.clone())),
            Value::Object(map) => Stage::Call(CallDescriptor::from_map(map)),
            other => Stage::Unsupported(other.clone()),
        }
    }
}

/// A list rule: the head seeds the field, each stage then transforms it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub head: Box<FieldRule>,
    pub stages: Vec<Stage>,
}

/// How one target field is computed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum FieldRule {
    /// `true`: call the function named after the field on the identity key's value.
    Derive,
    /// A `{token}` template expanded against the record.
    Template(String),
    /// Stored verbatim.
    Number(Number),
    Pipeline(Pipeline),
    Call(CallDescriptor),
    /// `false`, `null` or an empty list. Does nothing.
    Skip,
}

impl From<&Value> for FieldRule {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(true) => FieldRule::Derive,
            Value::Bool(false) | Value::Null => FieldRule::Skip,
            Value::String(template) => FieldRule::Template(template.clone()),
            Value::Number(n) => FieldRule::Number(n.clone()),
            Value::Array(items) => match items.split_first() {
                None => FieldRule::Skip,
                Some((head, rest)) => FieldRule::Pipeline(Pipeline {
                    head: Box::new(FieldRule::from(head)),
                    stages: rest.iter().map(Stage::from).collect(),
                }),
            },
            Value::Object(map) => FieldRule::Call(CallDescriptor::from_map(map)),
        }
    }
}

impl From<Value> for FieldRule {
    fn from(value: Value) -> Self {
        FieldRule::from(&value)
    }
}

/// A field specification: target field name to rule, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldSpec {
    rules: IndexMap<String, FieldRule>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a dynamic specification. Fails only when it is not a map.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| FieldsError::SpecNotAMap {
            found: kind_of(value).to_string(),
        })?;
        Ok(Self {
            rules: map
                .iter()
                .map(|(field, rule)| (field.clone(), FieldRule::from(rule)))
                .collect(),
        })
    }

    /// Add a rule, builder style.
    pub fn rule(mut self, field: impl Into<String>, rule: impl Into<FieldRule>) -> Self {
        self.insert(field, rule);
        self
    }

    /// Add or replace a rule. Replacing keeps the field's original position.
    pub fn insert(&mut self, field: impl Into<String>, rule: impl Into<FieldRule>) -> Option<FieldRule> {
        self.rules.insert(field.into(), rule.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldRule> {
        self.rules.shift_remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literal_shapes_normalize() {
        assert_eq!(FieldRule::from(json!(true)), FieldRule::Derive);
        assert_eq!(FieldRule::from(json!(false)), FieldRule::Skip);
        assert_eq!(FieldRule::from(json!(null)), FieldRule::Skip);
        assert_eq!(FieldRule::from(json!([])), FieldRule::Skip);
        assert_eq!(
            FieldRule::from(json!("{color}")),
            FieldRule::Template("{color}".into())
        );
        assert_eq!(FieldRule::from(json!(42)), FieldRule::Number(42.into()));
    }

    #[test]
    fn call_descriptor_reads_canonical_keys() {
        let rule = FieldRule::from(json!({
            "function": "join",
            "argument": "names",
            "join_with": ", ",
            "outputMode": "map"
        }));
        let FieldRule::Call(call) = rule else {
            panic!("expected a call");
        };
        assert_eq!(call.function.as_deref(), Some("join"));
        assert_eq!(call.argument, ArgumentSource::Inline(json!("names")));
        assert_eq!(call.join_with.as_deref(), Some(", "));
        assert_eq!(call.output_mode, OutputMode::Map);
        assert!(call.extra.is_empty());
    }

    #[test]
    fn call_descriptor_accepts_legacy_aliases() {
        let call = CallDescriptor::from_map(
            json!({"func": "toUpper", "arg_field": "name", "app": "reduce", "map": true})
                .as_object()
                .unwrap(),
        );
        assert_eq!(call.function.as_deref(), Some("toUpper"));
        assert_eq!(call.argument, ArgumentSource::Field("name".into()));
        assert_eq!(call.output_mode, OutputMode::Other("reduce".into()));
        assert!(call.extra.is_empty());
    }

    #[test]
    fn argument_field_wins_over_argument() {
        let call = CallDescriptor::from_map(
            json!({"argument": "x", "argument_field": "y"}).as_object().unwrap(),
        );
        assert_eq!(call.argument, ArgumentSource::Field("y".into()));
    }

    #[test]
    fn falsy_argument_field_falls_back_to_argument() {
        for blank in [json!(""), json!(false), json!(null)] {
            let call = CallDescriptor::from_map(
                json!({"argument": "x", "argument_field": blank}).as_object().unwrap(),
            );
            assert_eq!(call.argument, ArgumentSource::Inline(json!("x")));
        }

        let call = CallDescriptor::from_map(json!({"arg_field": ""}).as_object().unwrap());
        assert_eq!(call.argument, ArgumentSource::None);
    }

    #[test]
    fn non_control_keys_become_overlay() {
        let call = CallDescriptor::from_map(
            json!({"bar": "{color}", "function": "nope", "size": 2})
                .as_object()
                .unwrap(),
        );
        assert_eq!(call.function_for("target"), "nope");
        assert_eq!(Value::Object(call.extra), json!({"bar": "{color}", "size": 2}));
        assert_eq!(CallDescriptor::default().function_for("target"), "target");
    }

    #[test]
    fn pipeline_normalizes_stages() {
        let rule = FieldRule::from(json!(["{color}", "toUpper", {"function": "trim"}, 5]));
        let FieldRule::Pipeline(pipeline) = rule else {
            panic!("expected a pipeline");
        };
        assert_eq!(*pipeline.head, FieldRule::Template("{color}".into()));
        assert_eq!(
            pipeline.stages,
            vec![
                Stage::Call(CallDescriptor::named("toUpper")),
                Stage::Call(CallDescriptor::named("trim")),
                Stage::Unsupported(json!(5)),
            ]
        );
    }

    #[test]
    fn spec_from_value_keeps_order() {
        let spec = FieldSpec::from_value(&json!({"b": 1, "a": 2, "c": "{b}"})).unwrap();
        let order: Vec<&str> = spec.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn spec_from_value_rejects_non_map() {
        let err = FieldSpec::from_value(&json!(["a"])).unwrap_err();
        assert!(matches!(err, FieldsError::SpecNotAMap { ref found } if found == "array"));
    }

    #[test]
    fn spec_deserializes_from_json() {
        let spec: FieldSpec =
            serde_json::from_str(r#"{"title": "{name}", "n": 3, "dir_i": true}"#).unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.get("dir_i"), Some(&FieldRule::Derive));
    }

    #[test]
    fn spec_builder_and_remove() {
        let mut spec = FieldSpec::new()
            .rule("a", json!(1))
            .rule("b", FieldRule::Template("{a}".into()));
        assert!(spec.contains("a"));
        assert_eq!(spec.remove("a"), Some(FieldRule::Number(1.into())));
        assert_eq!(spec.len(), 1);
        assert!(!spec.is_empty());
    }
}
