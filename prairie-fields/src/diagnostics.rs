//! Diagnostics recorded while growing fields.
//!
//! A bad rule never stops a growth run. Whatever went wrong is recorded here,
//! logged through `tracing`, and handed back next to the record.

use std::fmt;

use tracing::warn;

/// Something that went wrong with one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `argument_field` named a field that is missing or falsy. The rule was skipped.
    MissingArgumentField {
        field: String,
        argument_field: String,
    },
    /// No toolkit function had this name. The literal overlay was stored instead.
    UnknownFunction { field: String, function: String },
    /// An output mode other than `map`. The literal overlay was stored instead.
    UnsupportedOutputMode { field: String, mode: String },
    /// The toolkit function returned an error. The field was left unchanged.
    FunctionFailed {
        field: String,
        function: String,
        message: String,
    },
    /// A pipeline stage that is neither a function name nor a call map.
    UnsupportedRule { field: String, found: String },
    /// The identity key's value is not a string, so no directory was derived.
    NonStringIdentity { key: String },
}

impl Diagnostic {
    /// The target field the diagnostic concerns, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Diagnostic::MissingArgumentField { field, .. }
            | Diagnostic::UnknownFunction { field, .. }
            | Diagnostic::UnsupportedOutputMode { field, .. }
            | Diagnostic::FunctionFailed { field, .. }
            | Diagnostic::UnsupportedRule { field, .. } => Some(field),
            Diagnostic::NonStringIdentity { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingArgumentField {
                field,
                argument_field,
            } => write!(
                f,
                "error finding field '{argument_field}' for '{field}'; rule skipped"
            ),
            Diagnostic::UnknownFunction { field, function } => {
                write!(f, "did not find function '{function}' for '{field}'")
            }
            Diagnostic::UnsupportedOutputMode { field, mode } => {
                write!(f, "unsupported output mode '{mode}' for '{field}'")
            }
            Diagnostic::FunctionFailed {
                field,
                function,
                message,
            } => write!(f, "function '{function}' failed for '{field}': {message}"),
            Diagnostic::UnsupportedRule { field, found } => {
                write!(f, "unsupported pipeline stage for '{field}': {found}")
            }
            Diagnostic::NonStringIdentity { key } => {
                write!(f, "identity key '{key}' is not a string; no directory derived")
            }
        }
    }
}

/// Collects diagnostics for one growth run.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        warn!(field = diagnostic.field().unwrap_or_default(), "{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// The result of a growth run: the record plus everything that went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Growth<T> {
    pub record: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Growth<T> {
    /// A growth with nothing to report.
    pub fn clean(record: T) -> Self {
        Self {
            record,
            diagnostics: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_record(self) -> T {
        self.record
    }

    /// Convert the record, keeping the diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Growth<U> {
        Growth {
            record: f(self.record),
            diagnostics: self.diagnostics,
        }
    }
}
