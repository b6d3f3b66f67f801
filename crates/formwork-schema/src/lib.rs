//! Schemas and validation for formwork
//!
//! This crate provides the pure, non-reactive half of the form engine:
//!
//! - [`path`] — get/set values addressed by `a.b[0].c` path strings
//! - [`Validator`] — a single-field predicate with optional transform and
//!   static message
//! - [`Schema`] — a nested mapping of field names to validators, child
//!   schemas, array schemas, or declarative rule sets
//! - [`RuleTable`] — the named-rule registry (`oneOf`, `min`, `regex`, …)
//!   evaluated against a [`RuleContext`]
//! - [`Validation`] — the structured result of validating a value
//!
//! Everything here is deterministic and side-effect-free on the document:
//! validating never mutates the value being validated.

pub mod error;
pub mod path;
pub mod rules;
pub mod schema;
pub mod validation;
pub mod validator;

pub use error::{PathError, SchemaError};
pub use rules::{RuleContext, RuleTable};
pub use schema::Schema;
pub use validation::Validation;
pub use validator::Validator;
