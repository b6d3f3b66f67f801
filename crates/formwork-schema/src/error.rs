//! Error types for path access and schema evaluation.

use crate::validation::Validation;

/// Errors from the path accessor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
	/// The path was empty after tokenizing; writes need at least one
	/// segment to address.
	#[error("field name must be a non-empty string")]
	EmptyPath,
}

/// Errors from schema evaluation.
///
/// These are schema-authoring bugs, not data problems: data problems are
/// reported as [`Validation`] values, never as `Err`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
	/// A declarative rule set referenced a rule name that is not
	/// registered in the [`RuleTable`](crate::RuleTable).
	#[error("unknown validation rule: {0}")]
	UnknownRule(String),
	/// Raised by the fail-fast `assert` variants when validation does
	/// not pass.
	#[error("{}", .0.message())]
	Invalid(Validation),
}
