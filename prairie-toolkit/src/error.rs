//! Error types for toolkit functions

use thiserror::Error;

/// Result type for toolkit operations
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// Errors a toolkit function can report instead of producing a value
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolkitError {
    /// The argument had a shape the function cannot work with
    #[error("{function} expected {expected}, got {found}")]
    InvalidArgument {
        function: String,
        expected: String,
        found: String,
    },

    /// A named sub-argument was missing from a map argument
    #[error("{function} requires the '{name}' sub-argument")]
    MissingSubArgument { function: String, name: String },

    /// A pattern argument was not a valid regular expression
    #[error("invalid pattern for {function}: {message}")]
    InvalidPattern { function: String, message: String },
}

impl ToolkitError {
    /// Build an `InvalidArgument` error, describing the offending value by its JSON kind.
    pub fn invalid_argument(
        function: impl Into<String>,
        expected: impl Into<String>,
        found: &serde_json::Value,
    ) -> Self {
        ToolkitError::InvalidArgument {
            function: function.into(),
            expected: expected.into(),
            found: crate::value::kind_of(found).to_string(),
        }
    }

    /// Build a `MissingSubArgument` error.
    pub fn missing_sub_argument(function: impl Into<String>, name: impl Into<String>) -> Self {
        ToolkitError::MissingSubArgument {
            function: function.into(),
            name: name.into(),
        }
    }
}
