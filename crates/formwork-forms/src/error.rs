//! Error types for form operations.

use formwork_schema::SchemaError;

/// Failures of form-instance operations.
///
/// Argument-shape problems fail loudly here; validation failures never
/// do, they become [`ErrorRecord`](crate::ErrorRecord)s instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
	/// `replace_doc` was handed a scalar; documents are objects (or
	/// arrays, for array-rooted forms).
	#[error("document is invalid, please pass an object")]
	DocumentNotObject,
	/// A field operation was handed an empty path.
	#[error("field name must be a non-empty string")]
	EmptyFieldName,
	/// Schema evaluation itself failed (e.g. an unknown rule name).
	#[error(transparent)]
	Schema(#[from] SchemaError),
}
