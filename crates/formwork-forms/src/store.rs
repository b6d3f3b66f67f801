//! The reactive error store.

use formwork_reactive::Signal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One reported validation failure, tagged with the field it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
	/// The dotted/bracketed path of the failing field.
	pub name: String,
	/// The user-facing message.
	pub message: String,
	/// Extra payload a custom validator attached, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

impl ErrorRecord {
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			message: message.into(),
			details: None,
		}
	}

	pub fn with_details(mut self, details: Value) -> Self {
		self.details = Some(details);
		self
	}
}

/// A reactive, queryable set of per-field error records.
///
/// Backed by a single [`Signal`], so reading inside an effect subscribes
/// that effect to every subsequent replacement. Records keep insertion
/// order; replacing one field's records leaves every other field's
/// untouched.
///
/// # Examples
///
/// ```
/// use formwork_forms::{ErrorRecord, ErrorStore};
///
/// let store = ErrorStore::new();
/// store.replace_field("name", vec![ErrorRecord::new("name", "too short")]);
/// assert_eq!(store.first_for("name").unwrap().message, "too short");
/// assert!(store.first_for("age").is_none());
/// ```
#[derive(Clone)]
pub struct ErrorStore {
	records: Signal<Vec<ErrorRecord>>,
}

impl ErrorStore {
	pub fn new() -> Self {
		Self {
			records: Signal::new(Vec::new()),
		}
	}

	/// Every record, in insertion order. Reactive read.
	pub fn all(&self) -> Vec<ErrorRecord> {
		self.records.get()
	}

	/// The records for one field, including any path beneath it. Reactive
	/// read.
	pub fn for_field(&self, name: &str) -> Vec<ErrorRecord> {
		self.records.with(|records| {
			records.iter().filter(|r| within(&r.name, name)).cloned().collect()
		})
	}

	/// Replace the whole store.
	pub fn replace_all(&self, records: Vec<ErrorRecord>) {
		self.records.set(records);
	}

	/// Replace the records for `name` and every path beneath it, leaving
	/// other fields alone.
	///
	/// An incoming record keeps its `name` when it already sits under the
	/// field path (a nested failure such as `profile.name` under
	/// `profile`); any other name is forced to `name`, so callers can pass
	/// records built elsewhere without re-tagging them first.
	pub fn replace_field(&self, name: &str, records: Vec<ErrorRecord>) {
		self.records.update(|current| {
			current.retain(|r| !within(&r.name, name));
			current.extend(records.into_iter().map(|mut record| {
				if !within(&record.name, name) {
					record.name = name.to_string();
				}
				record
			}));
		});
	}

	/// The first record in the store, if any. Reactive read.
	pub fn first(&self) -> Option<ErrorRecord> {
		self.records.with(|records| records.first().cloned())
	}

	/// The first record for `name` or any path beneath it. Reactive read.
	pub fn first_for(&self, name: &str) -> Option<ErrorRecord> {
		self.records
			.with(|records| records.iter().find(|r| within(&r.name, name)).cloned())
	}

	pub fn is_empty(&self) -> bool {
		self.records.with(Vec::is_empty)
	}

	pub fn len(&self) -> usize {
		self.records.with(Vec::len)
	}

	pub fn clear(&self) {
		self.records.set(Vec::new());
	}
}

/// Whether `path` is `base` itself or a path nested under it
/// (`profile.name` or `emails[0]` under `profile` / `emails`, but not
/// `profiled`).
fn within(path: &str, base: &str) -> bool {
	match path.strip_prefix(base) {
		Some("") => true,
		Some(rest) => rest.starts_with('.') || rest.starts_with('['),
		None => false,
	}
}

impl Default for ErrorStore {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for ErrorStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ErrorStore")
			.field("records", &self.records.get_untracked())
			.finish()
	}
}
