//! Token substitution for field templates
//!
//! Replaces `{token}` placeholders with the value of the same-named record field.
//!
//! Supports patterns:
//! - `{name}` - Replace with the rendered value of `record["name"]`
//! - `{a.b}` - Replace with a nested value (dotted path, numeric segments index arrays)
//!
//! Placeholders that do not resolve are left exactly as written, so a template can be
//! expanded again later once the field it needs exists.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Result, ToolkitError};
use crate::value::{get_path, stringify};

/// Token substitution processor
#[derive(Debug)]
pub struct TokenReplacer {
    /// Compiled regex for matching `{token}` placeholders
    token_regex: Regex,
}

impl TokenReplacer {
    /// Regex pattern for tokens.
    /// A token is any run of non-space characters without braces.
    const TOKEN_PATTERN: &'static str = r"\{([^{}\s]+)\}";

    /// Create new replacer with compiled regex
    ///
    /// # Errors
    /// Returns [`ToolkitError::InvalidPattern`] if the token regex fails to compile.
    pub fn new() -> Result<Self> {
        let token_regex = Regex::new(Self::TOKEN_PATTERN).map_err(|e| ToolkitError::InvalidPattern {
            function: "token_replace".to_string(),
            message: format!("failed to compile token regex: {e}"),
        })?;
        Ok(Self { token_regex })
    }

    /// Expand every placeholder in `template` against `record`.
    ///
    /// # Example
    /// ```rust
    /// use prairie_toolkit::template::TokenReplacer;
    /// use serde_json::json;
    ///
    /// let record = json!({"color": "Green", "kind": "Tree"});
    /// let replacer = TokenReplacer::new().unwrap();
    /// let out = replacer.expand_str("{color} {kind}", record.as_object().unwrap());
    /// assert_eq!(out, "Green Tree");
    /// ```
    pub fn expand_str(&self, template: &str, record: &Map<String, Value>) -> String {
        self.token_regex
            .replace_all(template, |caps: &regex::Captures| {
                let token = &caps[1];
                match get_path(record, token) {
                    Some(value) => {
                        trace!(token, "token substitution");
                        stringify(value)
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Expand placeholders in every string leaf of `value`.
    ///
    /// Arrays and maps are walked recursively; numbers, booleans and null pass through.
    pub fn expand_value(&self, value: &Value, record: &Map<String, Value>) -> Value {
        match value {
            Value::String(s) => Value::String(self.expand_str(s, record)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.expand_value(item, record))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.expand_value(v, record)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Check if string contains token placeholders
    pub fn contains_tokens(&self, s: &str) -> bool {
        self.token_regex.is_match(s)
    }
}

thread_local! {
    static REPLACER: TokenReplacer = TokenReplacer::new()
        .expect("Failed to initialize token replacer");
}

/// Expand `template` against `record` using the shared replacer.
pub fn token_replace(template: &str, record: &Map<String, Value>) -> String {
    REPLACER.with(|replacer| replacer.expand_str(template, record))
}

/// Expand every string leaf of `value` against `record` using the shared replacer.
pub fn token_replace_value(value: &Value, record: &Map<String, Value>) -> Value {
    REPLACER.with(|replacer| replacer.expand_value(value, record))
}

/// Check if a string contains `{token}` placeholders.
pub fn contains_tokens(s: &str) -> bool {
    REPLACER.with(|replacer| replacer.contains_tokens(s))
}
