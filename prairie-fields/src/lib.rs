//! Declarative field growth
//!
//! `prairie-fields` computes derived fields on a record from a field specification:
//! a map from target field name to a rule saying how to compute it.
//!
//! # Architecture
//!
//! - **Typed rules**: specifications are normalized once into [`FieldRule`] values
//!   (templates, numbers, pipelines, calls) at the load boundary
//! - **Injected toolkit**: calls dispatch into an explicit [`prairie_toolkit::Toolkit`]
//! - **Never aborts**: a rule that cannot be applied becomes a [`Diagnostic`]
//!   returned next to the record, and the run carries on
//! - **Stateless**: specifications are borrowed, never mutated, and can be reused
//!   across any number of records

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod options;
pub mod types;

pub use diagnostics::{Diagnostic, Growth};
pub use engine::{grow_fields, FieldGrower};
pub use error::{FieldsError, Result};
pub use options::GrowOptions;
pub use types::{ArgumentSource, CallDescriptor, FieldRule, FieldSpec, OutputMode, Pipeline, Record, Stage};
