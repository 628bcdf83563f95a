//! FieldGrower — main API surface for growing fields on records.
//!
//! A growth run walks a [`FieldSpec`] in order and writes one target field per
//! rule. Later rules see the fields earlier rules wrote. Nothing here returns an
//! error: a rule that cannot be applied is recorded as a [`Diagnostic`] and the
//! run moves on to the next rule.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use prairie_toolkit::functions::{join_values, DEFAULT_JOIN_SEPARATOR};
use prairie_toolkit::value::{has_truthy, is_truthy, shallow_merge, stringify};
use prairie_toolkit::{paths, token_replace, token_replace_value, Toolkit};

use crate::diagnostics::{Diagnostic, Diagnostics, Growth};
use crate::options::GrowOptions;
use crate::types::{ArgumentSource, CallDescriptor, FieldRule, FieldSpec, OutputMode, Pipeline, Record, Stage};

/// Function expanded against the whole record rather than called.
pub const TOKEN_REPLACE: &str = "token_replace";
/// Function that joins an array argument with `join_with`.
pub const JOIN: &str = "join";
/// Field holding the directory derived from the identity key.
pub const DIRNAME_FIELD: &str = "dirname";
/// Sub-argument replaced by the value a pipeline has produced so far.
pub const STRING_SENTINEL: &str = "string";
/// Alternative sub-argument honored when `GrowOptions::value_sentinel` is set.
pub const VALUE_SENTINEL: &str = "value";
/// Overlay key for a resolved argument.
const ARGUMENT_OVERLAY_KEY: &str = "argument";
/// Overlay key for the join separator.
const JOIN_WITH_OVERLAY_KEY: &str = "join_with";

/// Grows fields on records according to a field specification.
///
/// ```rust
/// use prairie_fields::{FieldGrower, FieldSpec};
/// use serde_json::json;
///
/// let grower = FieldGrower::default();
/// let spec = FieldSpec::from_value(&json!({"label": "{color} {kind}"})).unwrap();
/// let record = json!({"color": "Green", "kind": "Tree"}).as_object().cloned().unwrap();
///
/// let growth = grower.grow(record, &spec, None);
/// assert_eq!(growth.record["label"], json!("Green Tree"));
/// assert!(growth.is_clean());
/// ```
#[derive(Debug)]
pub struct FieldGrower {
    toolkit: Toolkit,
    options: GrowOptions,
}

impl FieldGrower {
    /// A grower over `toolkit` with default options.
    pub fn new(toolkit: Toolkit) -> Self {
        Self::with_options(toolkit, GrowOptions::default())
    }

    pub fn with_options(toolkit: Toolkit, options: GrowOptions) -> Self {
        Self {
            toolkit,
            options,
        }
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    pub fn options(&self) -> &GrowOptions {
        &self.options
    }

    /// Grow every field of `spec` on `record`.
    ///
    /// `identity_key` names the record field used as the default argument source and
    /// for directory decomposition. When `None`, the configured identity keys are
    /// probed in order and the first truthy one is used.
    pub fn grow(&self, record: Record, spec: &FieldSpec, identity_key: Option<&str>) -> Growth<Record> {
        let identity = match identity_key {
            Some(key) => Some(key.to_string()),
            None => self.find_identity_key(&record),
        };
        debug!(rules = spec.len(), identity = ?identity, "growing fields");

        let mut run = Run {
            grower: self,
            record,
            identity,
            diagnostics: Diagnostics::default(),
        };

        let handled = run.apply_dir_directive(spec);
        for (field, rule) in spec.iter() {
            if handled.contains(&field) {
                continue;
            }
            run.seed(field, rule);
        }

        Growth {
            record: run.record,
            diagnostics: run.diagnostics.into_vec(),
        }
    }

    /// Grow fields on a dynamic record with a dynamic specification.
    ///
    /// A record that is not a map, or a specification that is not a map, is returned
    /// unchanged with nothing to report.
    pub fn grow_value(&self, record: Value, spec: &Value, identity_key: Option<&str>) -> Growth<Value> {
        let map = match record {
            Value::Object(map) => map,
            other => {
                trace!("record is not a map; passing through");
                return Growth::clean(other);
            }
        };
        match FieldSpec::from_value(spec) {
            Ok(spec) => self.grow(map, &spec, identity_key).map(Value::Object),
            Err(error) => {
                trace!(%error, "specification is not a map; passing through");
                Growth::clean(Value::Object(map))
            }
        }
    }

    /// Grow the same specification over many records. One record's diagnostics
    /// never affect another.
    pub fn grow_all<I>(&self, records: I, spec: &FieldSpec, identity_key: Option<&str>) -> Vec<Growth<Record>>
    where
        I: IntoIterator<Item = Record>,
    {
        records
            .into_iter()
            .map(|record| self.grow(record, spec, identity_key))
            .collect()
    }

    /// First configured identity key whose value on `record` is truthy.
    pub fn find_identity_key(&self, record: &Record) -> Option<String> {
        self.options
            .identity_keys
            .iter()
            .find(|key| has_truthy(record, key))
            .cloned()
    }
}

impl Default for FieldGrower {
    fn default() -> Self {
        Self::new(Toolkit::with_defaults())
    }
}

/// Grow fields with the default toolkit and options, discarding diagnostics
/// (they are still logged).
pub fn grow_fields(record: Value, spec: &Value, identity_key: Option<&str>) -> Value {
    FieldGrower::default()
        .grow_value(record, spec, identity_key)
        .into_record()
}

/// State of one growth run.
struct Run<'g> {
    grower: &'g FieldGrower,
    record: Record,
    identity: Option<String>,
    diagnostics: Diagnostics,
}

impl Run<'_> {
    /// Derive `dirname`, `dirsplit` and `dirN` from the identity key when the
    /// specification asks for it. Returns the rules that no longer need evaluating:
    /// the directive itself, plus a `dirname: true` rule when this run derived it.
    fn apply_dir_directive<'s>(&mut self, spec: &'s FieldSpec) -> Vec<&'s str> {
        let directive = self.grower.options.dir_directive.as_str();
        let Some((directive, FieldRule::Derive)) = spec.iter().find(|(field, _)| *field == directive) else {
            return Vec::new();
        };
        let Some(key) = self.identity.clone() else {
            return Vec::new();
        };
        if !has_truthy(&self.record, &key) {
            return Vec::new();
        }

        let mut handled = vec![directive];
        if !has_truthy(&self.record, DIRNAME_FIELD) {
            if spec.get(DIRNAME_FIELD) == Some(&FieldRule::Derive) {
                handled.extend(spec.iter().map(|(field, _)| field).find(|f| *f == DIRNAME_FIELD));
            }
            let Some(path) = self.record.get(&key).and_then(Value::as_str) else {
                self.diagnostics
                    .record(Diagnostic::NonStringIdentity { key });
                return handled;
            };
            let dir = paths::dirname(path);
            trace!(key = %key, dirname = %dir, "derived dirname");
            self.record
                .insert(DIRNAME_FIELD.to_string(), Value::String(dir));
        }

        let dir = self
            .record
            .get(DIRNAME_FIELD)
            .map(stringify)
            .unwrap_or_default();
        for (field, value) in paths::decompose(&dir) {
            self.record.insert(field, value);
        }
        handled
    }

    /// Apply one rule to `field`.
    fn seed(&mut self, field: &str, rule: &FieldRule) {
        match rule {
            FieldRule::Derive => {
                let key = self
                    .identity
                    .clone()
                    .filter(|_| self.grower.toolkit.contains(field));
                match key {
                    Some(key) => {
                        let call = CallDescriptor::named(field)
                            .with_argument(ArgumentSource::Field(key));
                        self.call(field, &call);
                    }
                    None => trace!(field, "nothing to derive"),
                }
            }
            FieldRule::Template(template) => {
                let expanded = token_replace(template, &self.record);
                self.set(field, Value::String(expanded));
            }
            FieldRule::Number(n) => self.set(field, Value::Number(n.clone())),
            FieldRule::Pipeline(pipeline) => self.pipeline(field, pipeline),
            FieldRule::Call(call) => self.call(field, call),
            FieldRule::Skip => trace!(field, "skip rule"),
        }
    }

    /// Seed `field` from the head, then feed it through each stage in turn.
    fn pipeline(&mut self, field: &str, pipeline: &Pipeline) {
        self.seed(field, &pipeline.head);
        for stage in &pipeline.stages {
            match stage {
                Stage::Call(call) => {
                    let call = self.carry_current(field, call);
                    self.call(field, &call);
                }
                Stage::Unsupported(found) => self.diagnostics.record(Diagnostic::UnsupportedRule {
                    field: field.to_string(),
                    found: found.to_string(),
                }),
            }
        }
    }

    /// Point a stage at the value the pipeline has produced so far: as the whole
    /// argument when the stage has none, or in place of a `true` sentinel sub-argument.
    /// The rewritten argument is inline, so it still goes through field lookup.
    fn carry_current(&self, field: &str, call: &CallDescriptor) -> CallDescriptor {
        let current = self.record.get(field).cloned();
        match &call.argument {
            ArgumentSource::None => match current {
                Some(value) => call.clone().with_argument(ArgumentSource::Inline(value)),
                None => call.clone(),
            },
            ArgumentSource::Inline(Value::Object(args)) => {
                let sentinel = [STRING_SENTINEL, VALUE_SENTINEL]
                    .into_iter()
                    .filter(|name| *name == STRING_SENTINEL || self.grower.options.value_sentinel)
                    .find(|name| args.get(*name) == Some(&Value::Bool(true)));
                match sentinel {
                    Some(name) => {
                        let mut args = args.clone();
                        args.insert(name.to_string(), current.unwrap_or(Value::Null));
                        call.clone()
                            .with_argument(ArgumentSource::Inline(Value::Object(args)))
                    }
                    None => call.clone(),
                }
            }
            _ => call.clone(),
        }
    }

    /// Evaluate a call and store its result on `field`.
    fn call(&mut self, field: &str, call: &CallDescriptor) {
        let grower = self.grower;
        let argument = match self.resolve_argument(field, &call.argument) {
            Ok(argument) => argument,
            Err(diagnostic) => {
                self.diagnostics.record(diagnostic);
                return;
            }
        };

        let function = call.function_for(field);
        if let OutputMode::Other(mode) = &call.output_mode {
            self.diagnostics.record(Diagnostic::UnsupportedOutputMode {
                field: field.to_string(),
                mode: mode.clone(),
            });
            self.overlay(field, call, argument);
            return;
        }

        let Some(f) = grower.toolkit.get(function) else {
            self.diagnostics.record(Diagnostic::UnknownFunction {
                field: field.to_string(),
                function: function.to_string(),
            });
            self.overlay(field, call, argument);
            return;
        };

        trace!(field, function, "calling toolkit function");
        let argument = argument.unwrap_or(Value::Null);
        let result = match (function, &argument) {
            (TOKEN_REPLACE, _) => Ok(token_replace_value(&argument, &self.record)),
            (JOIN, Value::Array(items)) => {
                let separator = call.join_with.as_deref().unwrap_or(DEFAULT_JOIN_SEPARATOR);
                Ok(Value::String(join_values(items, separator)))
            }
            _ => f(&argument),
        };

        match result {
            Ok(value) => self.set(field, value),
            Err(error) => self.diagnostics.record(Diagnostic::FunctionFailed {
                field: field.to_string(),
                function: function.to_string(),
                message: error.to_string(),
            }),
        }
    }

    /// Turn an argument source into the value handed to the function.
    fn resolve_argument(&self, field: &str, source: &ArgumentSource) -> Result<Option<Value>, Diagnostic> {
        match source {
            ArgumentSource::None => Ok(None),
            ArgumentSource::Field(name) => match self.record.get(name) {
                Some(value) if is_truthy(value) => Ok(Some(value.clone())),
                _ => Err(Diagnostic::MissingArgumentField {
                    field: field.to_string(),
                    argument_field: name.clone(),
                }),
            },
            ArgumentSource::Inline(value) => Ok(Some(self.resolve_inline(value))),
        }
    }

    /// A string naming a present field becomes that field's value. So does the
    /// `string` (or `value`) sub-argument of a map.
    fn resolve_inline(&self, value: &Value) -> Value {
        match value {
            Value::String(name) if has_truthy(&self.record, name) => self.record[name.as_str()].clone(),
            Value::Object(args) => {
                let mut names = vec![STRING_SENTINEL];
                if self.grower.options.value_sentinel {
                    names.push(VALUE_SENTINEL);
                }
                for name in names {
                    if let Some(Value::String(referenced)) = args.get(name) {
                        if has_truthy(&self.record, referenced) {
                            let mut args = args.clone();
                            args.insert(name.to_string(), self.record[referenced.as_str()].clone());
                            return Value::Object(args);
                        }
                    }
                }
                value.clone()
            }
            other => other.clone(),
        }
    }

    /// Store the rule's literal content on `field`, expanding tokens in its strings.
    /// An existing map value is merged into; anything else is replaced.
    fn overlay(&mut self, field: &str, call: &CallDescriptor, argument: Option<Value>) {
        let mut overlay = call.extra.clone();
        if let Some(argument) = argument {
            overlay.insert(ARGUMENT_OVERLAY_KEY.to_string(), argument);
        }
        if let Some(separator) = &call.join_with {
            overlay.insert(JOIN_WITH_OVERLAY_KEY.to_string(), Value::String(separator.clone()));
        }

        let overlay: Map<String, Value> = overlay
            .into_iter()
            .map(|(key, value)| {
                let expanded = token_replace_value(&value, &self.record);
                (key, expanded)
            })
            .collect();

        let merged = match self.record.get(field) {
            Some(Value::Object(existing)) => shallow_merge(existing.clone(), overlay),
            _ => overlay,
        };
        self.set(field, Value::Object(merged));
    }

    fn set(&mut self, field: &str, value: Value) {
        self.record.insert(field.to_string(), value);
    }
}
