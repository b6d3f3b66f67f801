//! Structured validation results.

use indexmap::IndexMap;

/// The outcome of validating one value against a validator or schema.
///
/// Mirrors the shapes a validator can produce: pass, bare failure,
/// failure with a message, or an aggregate keyed by field name or array
/// index.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
	/// The value passed.
	Valid,
	/// The value failed with no message of its own.
	Invalid,
	/// The value failed with an explicit message.
	Message(String),
	/// Per-field failures of an object schema. Only failing fields appear.
	Fields(IndexMap<String, Validation>),
	/// Per-element failures of an array schema. Only failing indices appear.
	Items(Vec<(usize, Validation)>),
}

impl Validation {
	/// Build a result from a plain predicate outcome.
	pub fn from_bool(ok: bool) -> Self {
		if ok { Self::Valid } else { Self::Invalid }
	}

	pub fn is_valid(&self) -> bool {
		matches!(self, Self::Valid)
	}

	/// The user-facing message for this result.
	///
	/// Bare failures read `"invalid"`; aggregates read
	/// `"some fields are invalid"` / `"some items are invalid"`.
	pub fn message(&self) -> &str {
		match self {
			Self::Valid => "valid",
			Self::Invalid => "invalid",
			Self::Message(message) => message,
			Self::Fields(_) => "some fields are invalid",
			Self::Items(_) => "some items are invalid",
		}
	}

	/// Flatten into `(path, message)` pairs for error reporting.
	///
	/// Nested aggregates produce dotted/bracketed paths relative to
	/// `prefix`; a leaf failure at the root produces a single pair with
	/// the prefix itself.
	///
	/// # Examples
	///
	/// ```
	/// use formwork_schema::Validation;
	/// use indexmap::IndexMap;
	///
	/// let mut fields = IndexMap::new();
	/// fields.insert("name".to_string(), Validation::Message("too short".into()));
	/// let result = Validation::Fields(fields);
	///
	/// assert_eq!(
	///     result.flatten("profile"),
	///     vec![("profile.name".to_string(), "too short".to_string())]
	/// );
	/// ```
	pub fn flatten(&self, prefix: &str) -> Vec<(String, String)> {
		let mut out = Vec::new();
		self.flatten_into(prefix, &mut out);
		out
	}

	fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, String)>) {
		match self {
			Self::Valid => {}
			Self::Invalid | Self::Message(_) => {
				out.push((prefix.to_string(), self.message().to_string()));
			}
			Self::Fields(fields) => {
				for (name, child) in fields {
					let path = if prefix.is_empty() {
						name.clone()
					} else {
						format!("{prefix}.{name}")
					};
					child.flatten_into(&path, out);
				}
			}
			Self::Items(items) => {
				for (index, child) in items {
					child.flatten_into(&format!("{prefix}[{index}]"), out);
				}
			}
		}
	}
}
