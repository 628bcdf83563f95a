//! Error types for loading field specifications and engine options
//!
//! Growing fields never fails; these errors only surface at the load boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for fields operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur while loading specifications or options
#[derive(Debug, Error)]
pub enum FieldsError {
    /// A field specification must be a map of target field to rule
    #[error("field specification must be a map, got {found}")]
    SpecNotAMap { found: String },

    /// Options file does not exist
    #[error("options file not found: {path}")]
    OptionsNotFound { path: PathBuf },

    /// Options file extension is not one of yaml, yml, json, toml
    #[error("unsupported options format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Options could not be parsed or extracted
    #[error("failed to load options: {0}")]
    Options(#[from] Box<figment::Error>),
}

impl From<figment::Error> for FieldsError {
    fn from(error: figment::Error) -> Self {
        FieldsError::Options(Box::new(error))
    }
}
