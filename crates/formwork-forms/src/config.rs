//! Per-instance configuration.

use std::rc::Rc;

use formwork_schema::{RuleTable, Schema};
use serde_json::{Map, Value};

/// Options recognized when a form instance is created.
///
/// `doc` and `schema` are the defaults used until (and unless) a reactive
/// data context supplies its own. The rule table is injected here rather
/// than read from any shared registry, so overriding a rule affects only
/// the instances configured with that table.
#[derive(Clone)]
pub struct FormConfig {
	/// Expose the read helpers to the template layer. Adapters consult
	/// this; the engine itself always answers helper calls.
	pub helpers: bool,
	/// Run the default event cascade (merge on change, submit on submit).
	/// When off, scopes deliver events to handlers but take no action.
	pub events: bool,
	/// The starting document.
	pub doc: Value,
	/// The starting schema, if any.
	pub schema: Option<Rc<Schema>>,
	/// The rule table declarative schemas evaluate against.
	pub rules: Rc<RuleTable>,
}

impl FormConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_doc(mut self, doc: Value) -> Self {
		self.doc = doc;
		self
	}

	pub fn with_schema(mut self, schema: Schema) -> Self {
		self.schema = Some(Rc::new(schema));
		self
	}

	pub fn with_rules(mut self, rules: RuleTable) -> Self {
		self.rules = Rc::new(rules);
		self
	}

	pub fn with_events(mut self, events: bool) -> Self {
		self.events = events;
		self
	}

	pub fn with_helpers(mut self, helpers: bool) -> Self {
		self.helpers = helpers;
		self
	}
}

impl Default for FormConfig {
	fn default() -> Self {
		Self {
			helpers: true,
			events: true,
			doc: Value::Object(Map::new()),
			schema: None,
			rules: Rc::new(RuleTable::builtin()),
		}
	}
}

impl std::fmt::Debug for FormConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormConfig")
			.field("helpers", &self.helpers)
			.field("events", &self.events)
			.field("doc", &self.doc)
			.field("schema", &self.schema.is_some())
			.finish()
	}
}
