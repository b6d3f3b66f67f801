//! The reactive data context a form mirrors.
//!
//! Templates hand a form its document and schema through an enclosing
//! data context. [`DataContext::attach`] installs an effect that re-seeds
//! the form whenever the context changes: the new document supersedes the
//! working document wholesale, the schema follows it, and stale errors
//! are dropped: a context switch starts a fresh editing session.

use std::rc::Rc;

use formwork_reactive::{Effect, Signal, flush};
use formwork_schema::Schema;
use serde_json::Value;

use crate::form::FormInstance;

/// The `{doc?, schema?}` pair an enclosing template supplies.
#[derive(Clone, Default)]
pub struct ContextData {
	pub doc: Option<Value>,
	pub schema: Option<Rc<Schema>>,
}

/// A reactive holder for the current template data.
///
/// # Examples
///
/// ```
/// use formwork_forms::{ContextData, DataContext, FormConfig, FormInstance};
/// use serde_json::json;
///
/// let context = DataContext::new();
/// let form = FormInstance::new(FormConfig::new());
/// let _binding = context.attach(&form);
///
/// context.set(ContextData { doc: Some(json!({"name": "joe"})), schema: None });
/// assert_eq!(form.get("name"), Some(json!("joe")));
/// ```
#[derive(Clone)]
pub struct DataContext {
	current: Signal<ContextData>,
}

impl DataContext {
	pub fn new() -> Self {
		Self {
			current: Signal::new(ContextData::default()),
		}
	}

	/// Replace the context value and flush dependents.
	pub fn set(&self, data: ContextData) {
		self.current.set(data);
		flush();
	}

	pub fn get(&self) -> ContextData {
		self.current.get()
	}

	/// Keep `form` seeded from this context.
	///
	/// Runs once immediately and again on every context change. A context
	/// without a `doc` or `schema` falls back to the form's configured
	/// defaults. The returned [`Effect`] is the binding's lifetime:
	/// drop it to detach the form from the context.
	#[must_use]
	pub fn attach(&self, form: &FormInstance) -> Effect {
		let current = self.current.clone();
		let form = form.clone();
		Effect::new(move || {
			let data = current.get();
			let doc = data.doc.unwrap_or_else(|| form.config().doc.clone());
			let schema = data.schema.or_else(|| form.config().schema.clone());
			form.reseed(doc, schema);
		})
	}
}

impl Default for DataContext {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::FormConfig;
	use crate::store::ErrorRecord;
	use serde_json::json;
	use serial_test::serial;

	#[test]
	#[serial]
	fn attach_seeds_immediately_from_defaults() {
		let context = DataContext::new();
		let form = FormInstance::new(FormConfig::new().with_doc(json!({"name": "default"})));
		let _binding = context.attach(&form);

		assert_eq!(form.get("name"), Some(json!("default")));
	}

	#[test]
	#[serial]
	fn context_switch_supersedes_doc_and_clears_errors() {
		let context = DataContext::new();
		let form = FormInstance::new(FormConfig::new());
		let _binding = context.attach(&form);

		form.set("name", json!("edited")).unwrap();
		form.invalidate(vec![ErrorRecord::new("name", "stale")], None);

		context.set(ContextData {
			doc: Some(json!({"name": "fresh"})),
			schema: None,
		});

		assert_eq!(form.doc(), json!({"name": "fresh"}));
		assert_eq!(form.original(), json!({"name": "fresh"}));
		assert!(form.errors().is_empty());
	}

	#[test]
	#[serial]
	fn detached_form_stops_following() {
		let context = DataContext::new();
		let form = FormInstance::new(FormConfig::new());
		let binding = context.attach(&form);
		drop(binding);

		context.set(ContextData {
			doc: Some(json!({"name": "later"})),
			schema: None,
		});

		assert_eq!(form.doc(), json!({}));
	}
}
