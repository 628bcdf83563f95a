//! Named value functions for field growth
//!
//! `prairie-toolkit` is the function namespace field specifications call into,
//! plus the small set of structural helpers the growth engine leans on.
//!
//! # Architecture
//!
//! - **Explicit registry**: [`Toolkit`] maps names to single-argument functions over
//!   `serde_json::Value`; engines receive one instead of consulting a global
//! - **Token templates**: `{field}` placeholders expanded against a record
//! - **Paths**: `dirname`, `basename` and directory decomposition (`dir_i`)
//! - **JS-flavoured values**: truthiness and string rendering match what
//!   specification authors expect from the JavaScript tooling they came from

pub mod error;
pub mod functions;
pub mod paths;
pub mod registry;
pub mod template;
pub mod value;

pub use error::{Result, ToolkitError};
pub use paths::{basename, decompose, dirname};
pub use registry::{Toolkit, ToolkitFn};
pub use template::{token_replace, token_replace_value, TokenReplacer};
pub use value::{is_truthy, shallow_merge, stringify};
