//! Composable document schemas.
//!
//! A [`Schema`] mirrors the shape of the documents it validates: leaves are
//! [`Validator`]s or declarative rule sets, objects map field names to child
//! schemas, and arrays apply one child schema to every element. Validation
//! never errors on bad data (failures come back as [`Validation`] values);
//! schema-authoring mistakes such as an unknown rule name surface as
//! [`SchemaError`].

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SchemaError;
use crate::path::{self, Segment};
use crate::rules::{RuleContext, RuleTable};
use crate::validation::Validation;
use crate::validator::Validator;

/// A validation tree matching the document's shape.
///
/// # Examples
///
/// ```
/// use formwork_schema::{RuleTable, Schema, Validation};
/// use serde_json::json;
///
/// let schema = Schema::object([
///     ("name", Schema::rules([("type", json!("string"))])),
///     ("age", Schema::rules([("min", json!(0))])),
/// ]);
///
/// let table = RuleTable::builtin();
/// let doc = json!({"name": "Ada", "age": 36});
/// assert!(schema.validate(&doc, &table, &doc).unwrap().is_valid());
/// ```
#[derive(Debug, Clone)]
pub enum Schema {
	/// A leaf validated by a single [`Validator`].
	Validator(Validator),
	/// A leaf validated by named rules from the [`RuleTable`], in
	/// declaration order, with an optional static failure message.
	Rules {
		rules: IndexMap<String, Value>,
		message: Option<String>,
	},
	/// An object whose fields each carry their own child schema.
	Object(IndexMap<String, Schema>),
	/// An array whose every element is validated by one child schema.
	Array(Box<Schema>),
}

impl Schema {
	pub fn validator(validator: Validator) -> Self {
		Self::Validator(validator)
	}

	/// A leaf rule set, e.g. `Schema::rules([("minLength", json!(3))])`.
	pub fn rules<K, I>(rules: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		Self::Rules {
			rules: rules.into_iter().map(|(k, v)| (k.into(), v)).collect(),
			message: None,
		}
	}

	pub fn object<K, I>(fields: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Schema)>,
	{
		Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}

	pub fn array(element: Schema) -> Self {
		Self::Array(Box::new(element))
	}

	/// Replace the failure message of a rule-set leaf. No-op on other
	/// variants.
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		if let Self::Rules { message: slot, .. } = &mut self {
			*slot = Some(message.into());
		}
		self
	}

	/// The child schema one path segment deeper, if this schema has one.
	///
	/// Objects resolve field segments by name; arrays resolve any index
	/// segment to their element schema. Leaves have no children.
	pub fn child(&self, segment: &Segment) -> Option<&Schema> {
		match (self, segment) {
			(Self::Object(fields), Segment::Field(name)) => fields.get(name.as_str()),
			(Self::Array(element), Segment::Index(_)) => Some(element),
			_ => None,
		}
	}

	/// The schema addressing `path`, walking [`Schema::child`] per segment.
	pub fn descendant(&self, path: &str) -> Option<&Schema> {
		let mut current = self;
		for segment in path::tokenize(path) {
			current = current.child(&segment)?;
		}
		Some(current)
	}

	/// Validate `value` against this schema.
	///
	/// `siblings` is the document the value came from; rules like `before`
	/// read other fields out of it. Object schemas validate every declared
	/// field (missing fields validate as `null`) and collect the failures
	/// into [`Validation::Fields`]; array schemas accept null wholesale,
	/// reject non-arrays, and collect per-element failures into
	/// [`Validation::Items`].
	pub fn validate(
		&self,
		value: &Value,
		table: &RuleTable,
		siblings: &Value,
	) -> Result<Validation, SchemaError> {
		self.validate_field(value, table, siblings, "")
	}

	fn validate_field(
		&self,
		value: &Value,
		table: &RuleTable,
		siblings: &Value,
		field_name: &str,
	) -> Result<Validation, SchemaError> {
		match self {
			Self::Validator(validator) => Ok(validator.validate(value)),
			Self::Rules { rules, message } => {
				for (name, options) in rules {
					let ctx = RuleContext {
						value,
						options,
						field_name,
						values: siblings,
						table,
					};
					if !table.evaluate(name, &ctx)? {
						return Ok(match message {
							Some(message) => Validation::Message(message.clone()),
							None => Validation::Invalid,
						});
					}
				}
				Ok(Validation::Valid)
			}
			Self::Object(fields) => {
				let mut failures = IndexMap::new();
				for (name, child) in fields {
					let child_value = value.get(name.as_str()).unwrap_or(&Value::Null);
					let result = child.validate_field(child_value, table, value, name)?;
					if !result.is_valid() {
						failures.insert(name.clone(), result);
					}
				}
				Ok(if failures.is_empty() {
					Validation::Valid
				} else {
					Validation::Fields(failures)
				})
			}
			Self::Array(element) => {
				// An absent collection is not a collection of bad items.
				if value.is_null() {
					return Ok(Validation::Valid);
				}
				let Some(items) = value.as_array() else {
					return Ok(Validation::Message("not an array".into()));
				};
				let mut failures = Vec::new();
				for (index, item) in items.iter().enumerate() {
					let result = element.validate_field(item, table, siblings, field_name)?;
					if !result.is_valid() {
						failures.push((index, result));
					}
				}
				Ok(if failures.is_empty() {
					Validation::Valid
				} else {
					Validation::Items(failures)
				})
			}
		}
	}

	/// Fail-fast variant of [`Schema::validate`].
	pub fn assert(&self, value: &Value, table: &RuleTable) -> Result<(), SchemaError> {
		match self.validate(value, table, value)? {
			Validation::Valid => Ok(()),
			failure => Err(SchemaError::Invalid(failure)),
		}
	}
}

impl From<Validator> for Schema {
	fn from(validator: Validator) -> Self {
		Self::Validator(validator)
	}
}
