//! The form instance: the document/schema/errors state machine.

use std::rc::Rc;

use formwork_reactive::{Signal, flush, untracked};
use formwork_schema::path::{self, Segment};
use formwork_schema::{Schema, Validation};
use serde_json::Value;
use tracing::debug;

use crate::config::FormConfig;
use crate::error::FormError;
use crate::events::{Changes, Lifecycle, SourceEvent};
use crate::store::{ErrorRecord, ErrorStore};

/// The per-form state machine.
///
/// Three independently reactive cells (the working document, the schema
/// and the [`ErrorStore`]) plus `original`, the last document handed in
/// from outside, kept for [`FormInstance::reset`]. All cells are
/// initialized eagerly at construction.
///
/// `change`, `invalidate`, `validate` and `submit` each merge or record
/// state and return the lifecycle event the operation produced, or `None`
/// when a supplied [`SourceEvent`] was already default-prevented (or,
/// for `validate`, when nothing failed). Callers that hold a
/// [`FormScope`](crate::FormScope) normally let the scope run these and
/// dispatch the results; calling them directly leaves dispatch to the
/// caller.
///
/// Clones share state: a `FormInstance` is a handle, cheap to capture in
/// event handlers.
///
/// # Examples
///
/// ```
/// use formwork_forms::{FormConfig, FormInstance};
/// use serde_json::json;
///
/// let form = FormInstance::new(FormConfig::new().with_doc(json!({"name": "joe"})));
/// form.set("name", json!("will")).unwrap();
/// assert_eq!(form.get("name"), Some(json!("will")));
/// ```
#[derive(Clone)]
pub struct FormInstance {
	doc: Signal<Value>,
	original: Signal<Value>,
	schema: Signal<Option<Rc<Schema>>>,
	errors: ErrorStore,
	rules: Rc<formwork_schema::RuleTable>,
	config: FormConfig,
}

impl FormInstance {
	pub fn new(config: FormConfig) -> Self {
		Self {
			doc: Signal::new(config.doc.clone()),
			original: Signal::new(config.doc.clone()),
			schema: Signal::new(config.schema.clone()),
			errors: ErrorStore::new(),
			rules: config.rules.clone(),
			config,
		}
	}

	pub fn config(&self) -> &FormConfig {
		&self.config
	}

	/// The whole working document. Reactive read.
	pub fn doc(&self) -> Value {
		self.doc.get()
	}

	pub fn doc_untracked(&self) -> Value {
		self.doc.get_untracked()
	}

	/// The document the form started from (or was last re-seeded with).
	pub fn original(&self) -> Value {
		self.original.get()
	}

	/// Read one field by path. Reactive read; `None` when the path misses.
	pub fn get(&self, field: &str) -> Option<Value> {
		self.doc.with(|doc| path::get(doc, field).cloned())
	}

	/// Replace the whole document.
	pub fn replace_doc(&self, doc: Value) -> Result<(), FormError> {
		if !(doc.is_object() || doc.is_array()) {
			return Err(FormError::DocumentNotObject);
		}
		self.doc.set(doc);
		flush();
		Ok(())
	}

	/// Write one field by path, preserving the rest of the document.
	///
	/// Intermediate containers are created as the path requires; a null
	/// or scalar document is re-seeded as an empty object first.
	pub fn set(&self, field: &str, value: Value) -> Result<(), FormError> {
		let mut doc = self.doc.get_untracked();
		if !(doc.is_object() || doc.is_array()) {
			doc = Value::Object(serde_json::Map::new());
		}
		path::set(&mut doc, field, value).map_err(|_| FormError::EmptyFieldName)?;
		self.doc.set(doc);
		flush();
		Ok(())
	}

	/// The whole schema. Reactive read.
	pub fn schema(&self) -> Option<Rc<Schema>> {
		self.schema.get()
	}

	/// The child schema addressing `field`, if the schema has one.
	/// Reactive read.
	pub fn schema_child(&self, field: &str) -> Option<Schema> {
		self.schema
			.with(|schema| schema.as_deref().and_then(|s| s.descendant(field)).cloned())
	}

	pub fn replace_schema(&self, schema: Option<Rc<Schema>>) {
		self.schema.set(schema);
		flush();
	}

	pub fn errors(&self) -> &ErrorStore {
		&self.errors
	}

	/// Merge one or more field writes into the document.
	///
	/// Every field name is checked up front, so a malformed batch errors
	/// without touching the document. Short-circuits when `source` is
	/// already default-prevented, and marks it prevented otherwise so
	/// enclosing scopes do not re-run the merge. Returns the
	/// `documentChange` event carrying the updated document and the
	/// changes map.
	pub fn change(
		&self,
		changes: Changes,
		source: Option<&SourceEvent>,
	) -> Result<Option<Lifecycle>, FormError> {
		if changes.keys().any(|field| field.is_empty()) {
			return Err(FormError::EmptyFieldName);
		}
		if !consume_default(source) {
			return Ok(None);
		}
		for (field, value) in &changes {
			self.set(field, value.clone())?;
		}
		debug!(fields = changes.len(), "document changed");
		Ok(Some(Lifecycle::DocumentChange {
			doc: self.doc.get_untracked(),
			changes,
		}))
	}

	/// Single-field convenience over [`FormInstance::change`].
	pub fn change_field(
		&self,
		field: &str,
		value: Value,
		source: Option<&SourceEvent>,
	) -> Result<Option<Lifecycle>, FormError> {
		let mut changes = Changes::new();
		changes.insert(field.to_string(), value);
		self.change(changes, source)
	}

	/// Record externally-supplied errors for the whole document.
	pub fn invalidate(
		&self,
		errors: Vec<ErrorRecord>,
		source: Option<&SourceEvent>,
	) -> Option<Lifecycle> {
		if !consume_default(source) {
			return None;
		}
		self.errors.replace_all(errors);
		flush();
		Some(Lifecycle::DocumentInvalid {
			doc: self.doc.get_untracked(),
			errors: untracked(|| self.errors.all()),
		})
	}

	/// Record externally-supplied errors for one field.
	pub fn invalidate_field(
		&self,
		field: &str,
		errors: Vec<ErrorRecord>,
		source: Option<&SourceEvent>,
	) -> Result<Option<Lifecycle>, FormError> {
		if field.is_empty() {
			return Err(FormError::EmptyFieldName);
		}
		if !consume_default(source) {
			return Ok(None);
		}
		self.errors.replace_field(field, errors);
		flush();
		Ok(Some(Lifecycle::PropertyInvalid {
			doc: self.doc.get_untracked(),
			errors: untracked(|| self.errors.for_field(field)),
		}))
	}

	/// Run the schema over the whole document, replacing the error store
	/// with the outcome.
	///
	/// Returns `None` when everything passed, else the `documentInvalid`
	/// event carrying the document and the fresh error list.
	pub fn validate(&self, source: Option<&SourceEvent>) -> Result<Option<Lifecycle>, FormError> {
		if !consume_default(source) {
			return Ok(None);
		}
		let records = self.collect_errors(None)?;
		debug!(errors = records.len(), "document validated");
		self.errors.replace_all(records.clone());
		flush();
		if records.is_empty() {
			Ok(None)
		} else {
			Ok(Some(Lifecycle::DocumentInvalid {
				doc: self.doc.get_untracked(),
				errors: records,
			}))
		}
	}

	/// Run the schema for one field, replacing only that field's errors.
	///
	/// A field the schema does not cover validates clean.
	pub fn validate_field(
		&self,
		field: &str,
		source: Option<&SourceEvent>,
	) -> Result<Option<Lifecycle>, FormError> {
		if field.is_empty() {
			return Err(FormError::EmptyFieldName);
		}
		if !consume_default(source) {
			return Ok(None);
		}
		let records = self.collect_errors(Some(field))?;
		self.errors.replace_field(field, records.clone());
		flush();
		if records.is_empty() {
			Ok(None)
		} else {
			Ok(Some(Lifecycle::PropertyInvalid {
				doc: self.doc.get_untracked(),
				errors: untracked(|| self.errors.for_field(field)),
			}))
		}
	}

	/// Validate the whole document, then resolve the submission.
	///
	/// The valid and invalid paths are mutually exclusive and exhaustive:
	/// a non-empty error store yields `documentInvalid`, an empty one
	/// yields `documentSubmit`.
	pub fn submit(&self, source: Option<&SourceEvent>) -> Result<Option<Lifecycle>, FormError> {
		if !consume_default(source) {
			return Ok(None);
		}
		self.validate(None)?;
		let doc = self.doc.get_untracked();
		let errors = untracked(|| self.errors.all());
		if errors.is_empty() {
			debug!("document submitted");
			Ok(Some(Lifecycle::DocumentSubmit { doc }))
		} else {
			debug!(errors = errors.len(), "submission rejected");
			Ok(Some(Lifecycle::DocumentInvalid { doc, errors }))
		}
	}

	/// Empty the document and drop all errors.
	pub fn clear(&self) {
		self.doc.set(Value::Object(serde_json::Map::new()));
		self.errors.clear();
		flush();
	}

	/// Put the document back to the last externally-seeded value and drop
	/// all errors.
	pub fn reset(&self) {
		self.doc.set(self.original.get_untracked());
		self.errors.clear();
		flush();
	}

	/// The first error record, for `field` or for the whole form.
	pub fn error(&self, field: Option<&str>) -> Option<ErrorRecord> {
		match field {
			Some(field) => self.errors.first_for(field),
			None => self.errors.first(),
		}
	}

	/// The first error message, for `field` or for the whole form.
	pub fn error_message(&self, field: Option<&str>) -> Option<String> {
		self.error(field).map(|record| record.message)
	}

	pub fn is_valid(&self, field: Option<&str>) -> bool {
		self.error(field).is_none()
	}

	pub fn is_invalid(&self, field: Option<&str>) -> bool {
		!self.is_valid(field)
	}

	/// Re-seed document, original and schema from an enclosing data
	/// context, dropping stale errors. A context switch supersedes prior
	/// state wholesale.
	pub(crate) fn reseed(&self, doc: Value, schema: Option<Rc<Schema>>) {
		self.original.set(doc.clone());
		self.schema.set(schema);
		self.doc.set(doc);
		self.errors.clear();
	}

	fn collect_errors(&self, field: Option<&str>) -> Result<Vec<ErrorRecord>, FormError> {
		let doc = self.doc.get_untracked();
		let Some(schema) = self.schema.get_untracked() else {
			return Ok(Vec::new());
		};
		let result = match field {
			None => schema.validate(&doc, &self.rules, &doc)?,
			Some(field) => {
				let Some(child) = schema.descendant(field) else {
					return Ok(Vec::new());
				};
				let value = path::get(&doc, field).cloned().unwrap_or(Value::Null);
				let siblings = enclosing(&doc, field);
				child.validate(&value, &self.rules, &siblings)?
			}
		};
		Ok(to_records(result, field.unwrap_or("")))
	}
}

impl std::fmt::Debug for FormInstance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormInstance")
			.field("doc", &self.doc.get_untracked())
			.field("errors", &self.errors)
			.finish()
	}
}

/// Apply the default-prevented short-circuit: a prevented source skips
/// the operation; an unprevented one is marked prevented so the same
/// source cannot trigger the operation twice.
fn consume_default(source: Option<&SourceEvent>) -> bool {
	match source {
		Some(source) => {
			if source.is_default_prevented() {
				false
			} else {
				source.prevent_default();
				true
			}
		}
		None => true,
	}
}

fn to_records(result: Validation, prefix: &str) -> Vec<ErrorRecord> {
	result
		.flatten(prefix)
		.into_iter()
		.map(|(name, message)| ErrorRecord::new(name, message))
		.collect()
}

/// The container enclosing `field`, used as the sibling document for
/// rules like `before`/`after`.
fn enclosing(doc: &Value, field: &str) -> Value {
	let segments = path::tokenize(field);
	let mut current = doc;
	for segment in &segments[..segments.len().saturating_sub(1)] {
		let next = match segment {
			Segment::Field(name) => current.get(name.as_str()),
			Segment::Index(index) => current.get(*index),
		};
		match next {
			Some(next) => current = next,
			None => return Value::Null,
		}
	}
	current.clone()
}
