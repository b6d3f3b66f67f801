//! Scoped event dispatch: handlers, defaults and upward merge.
//!
//! A [`FormScope`] wraps one [`FormInstance`] and knows, explicitly, where
//! it is mounted in an enclosing scope's document (a named field or an
//! array index). Events dispatched in a scope run that scope's handlers,
//! then the default cascade, then travel to the parent, merging a child's
//! `documentChange` into the parent document at the mount point and
//! re-tagging the payload so every ancestor sees its own slice as current.
//! Sibling scopes never hear each other's events.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use formwork_reactive::untracked;
use serde_json::Value;
use tracing::warn;

use crate::config::FormConfig;
use crate::error::FormError;
use crate::events::{BridgeEvent, Changes, Lifecycle};
use crate::form::FormInstance;

/// Where a child scope's document lives inside its parent's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
	/// A named sub-document field.
	Field(String),
	/// An array element.
	Item(usize),
}

impl Mount {
	/// The path of this mount within the parent document.
	pub fn path(&self) -> String {
		match self {
			Self::Field(name) => name.clone(),
			Self::Item(index) => format!("[{index}]"),
		}
	}

	/// Prefix a child-relative field path with this mount.
	pub fn join(&self, key: &str) -> String {
		let base = self.path();
		if key.is_empty() {
			base
		} else if key.starts_with('[') {
			format!("{base}{key}")
		} else {
			format!("{base}.{key}")
		}
	}
}

type Handler = Rc<dyn Fn(&BridgeEvent, &FormInstance)>;

struct ScopeInner {
	form: FormInstance,
	parent: Option<(Weak<ScopeInner>, Mount)>,
	handlers: RefCell<Vec<(String, Handler)>>,
}

/// One level of the form scope tree.
///
/// The root scope owns the outer form; [`FormScope::child_field`] and
/// [`FormScope::child_item`] create nested scopes editing a slice of the
/// parent's document through their own [`FormInstance`].
///
/// # Examples
///
/// ```
/// use formwork_forms::{FormConfig, FormScope};
/// use serde_json::json;
///
/// let scope = FormScope::new(FormConfig::new().with_doc(json!({"name": "joe"})));
/// scope.input_change("name", json!("will"));
/// assert_eq!(scope.form().get("name"), Some(json!("will")));
/// ```
#[derive(Clone)]
pub struct FormScope {
	inner: Rc<ScopeInner>,
}

impl FormScope {
	/// A root scope with a fresh form instance.
	pub fn new(config: FormConfig) -> Self {
		Self::with_form(FormInstance::new(config))
	}

	/// A root scope around an existing form instance.
	pub fn with_form(form: FormInstance) -> Self {
		Self {
			inner: Rc::new(ScopeInner {
				form,
				parent: None,
				handlers: RefCell::new(Vec::new()),
			}),
		}
	}

	pub fn form(&self) -> &FormInstance {
		&self.inner.form
	}

	/// A child scope editing the sub-document at `name`.
	///
	/// The child's document starts as a copy of the parent slice and its
	/// schema is the parent schema's child for `name`; changes flow back
	/// through `documentChange` merge, never by shared mutation.
	pub fn child_field(&self, name: &str) -> FormScope {
		self.child(Mount::Field(name.to_string()))
	}

	/// A child scope editing the array element at `index`.
	pub fn child_item(&self, index: usize) -> FormScope {
		self.child(Mount::Item(index))
	}

	fn child(&self, mount: Mount) -> FormScope {
		let parent = &self.inner.form;
		let path = mount.path();
		let doc = untracked(|| parent.get(&path))
			.unwrap_or(Value::Object(serde_json::Map::new()));
		let schema = untracked(|| parent.schema_child(&path)).map(Rc::new);
		let config = FormConfig {
			helpers: parent.config().helpers,
			events: parent.config().events,
			doc,
			schema,
			rules: parent.config().rules.clone(),
		};
		FormScope {
			inner: Rc::new(ScopeInner {
				form: FormInstance::new(config),
				parent: Some((Rc::downgrade(&self.inner), mount)),
				handlers: RefCell::new(Vec::new()),
			}),
		}
	}

	/// Register a handler for a named lifecycle event
	/// (`"propertyChange"`, `"documentChange"`, …).
	///
	/// Handlers run in registration order, before the default cascade, and
	/// may call `prevent_default` to cancel it or `stop_propagation` to
	/// keep the event from enclosing scopes.
	pub fn on(&self, name: &str, handler: impl Fn(&BridgeEvent, &FormInstance) + 'static) {
		self.inner
			.handlers
			.borrow_mut()
			.push((name.to_string(), Rc::new(handler)));
	}

	/// Feed a user-entered field change into the scope.
	///
	/// Mirrors a native change interception: an empty field name is
	/// ignored, and a value identical to the current one is deduplicated.
	/// Otherwise a `propertyChange` event is dispatched; its default
	/// handler merges the change and raises `documentChange`.
	pub fn input_change(&self, field: &str, value: Value) -> Option<BridgeEvent> {
		if field.is_empty() {
			return None;
		}
		if untracked(|| self.inner.form.get(field)).as_ref() == Some(&value) {
			return None;
		}
		let mut changes = Changes::new();
		changes.insert(field.to_string(), value);
		Some(self.trigger(Lifecycle::PropertyChange { changes }))
	}

	/// Checkbox convenience over [`FormScope::input_change`].
	pub fn input_toggle(&self, field: &str, checked: bool) -> Option<BridgeEvent> {
		self.input_change(field, Value::Bool(checked))
	}

	/// Feed a form submission into the scope.
	///
	/// Runs the form's submit transition and dispatches the resulting
	/// `documentSubmit` or `documentInvalid` event.
	pub fn submit(&self) -> Result<Option<BridgeEvent>, FormError> {
		match self.inner.form.submit(None)? {
			Some(event) => Ok(Some(self.trigger(event))),
			None => Ok(None),
		}
	}

	/// Dispatch a lifecycle event in this scope, returning it after
	/// delivery so callers can inspect the final payload and flags.
	pub fn trigger(&self, event: Lifecycle) -> BridgeEvent {
		let event = BridgeEvent::new(event);
		self.deliver(&event);
		event
	}

	fn deliver(&self, event: &BridgeEvent) {
		let handlers: Vec<Handler> = self
			.inner
			.handlers
			.borrow()
			.iter()
			.filter(|(name, _)| name == event.name())
			.map(|(_, handler)| handler.clone())
			.collect();
		for handler in handlers {
			handler(event, &self.inner.form);
			if event.is_propagation_stopped() {
				break;
			}
		}

		// Stopping propagation only cancels the bubble; the local default
		// cascade answers to prevent_default alone.

		if self.inner.form.config().events && !event.is_default_prevented() {
			self.run_default(event);
		}

		if event.is_propagation_stopped() {
			return;
		}
		if let Some((parent, mount)) = &self.inner.parent {
			if let Some(parent) = parent.upgrade() {
				let parent = FormScope { inner: parent };
				parent.absorb(event, mount);
				parent.deliver(event);
			}
		}
	}

	/// The default cascade for one event at this scope.
	fn run_default(&self, event: &BridgeEvent) {
		match event.payload() {
			Lifecycle::PropertyChange { changes } => {
				match self.inner.form.change(changes, Some(event.source())) {
					Ok(Some(next)) => {
						self.trigger(next);
					}
					Ok(None) => {}
					Err(err) => warn!(error = %err, "change failed"),
				}
			}
			Lifecycle::DocumentChange { doc, .. } => {
				if let Err(err) = self.inner.form.replace_doc(doc) {
					warn!(error = %err, "document replacement failed");
				}
			}
			// Invalid and submit events have no default action.
			_ => {}
		}
	}

	/// Merge a child's `documentChange` into this scope's document at the
	/// mount point, then re-tag the payload with the merged document and
	/// mount-prefixed change paths.
	fn absorb(&self, event: &BridgeEvent, mount: &Mount) {
		if event.is_default_prevented() || event.name() != "documentChange" {
			return;
		}
		let Some(doc) = event.doc() else { return };
		if let Err(err) = self.inner.form.set(&mount.path(), doc) {
			warn!(error = %err, "sub-document merge failed");
			return;
		}
		let merged = self.inner.form.doc_untracked();
		event.retag(|payload| {
			if let Lifecycle::DocumentChange { doc, changes } = payload {
				*doc = merged;
				let inner = std::mem::take(changes);
				for (key, value) in inner {
					changes.insert(mount.join(&key), value);
				}
			}
		});
	}
}

impl std::fmt::Debug for FormScope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormScope")
			.field("form", &self.inner.form)
			.field("mounted", &self.inner.parent.as_ref().map(|(_, m)| m.clone()))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use serial_test::serial;

	#[rstest]
	#[case(Mount::Field("profile".into()), "name", "profile.name")]
	#[case(Mount::Field("emails".into()), "[0].address", "emails[0].address")]
	#[case(Mount::Item(2), "name", "[2].name")]
	#[case(Mount::Item(2), "", "[2]")]
	fn mount_paths_join_cleanly(#[case] mount: Mount, #[case] key: &str, #[case] expected: &str) {
		assert_eq!(mount.join(key), expected);
	}

	#[test]
	#[serial]
	fn input_change_merges_and_raises_document_change() {
		let scope = FormScope::new(FormConfig::new().with_doc(json!({"name": "joe"})));
		let seen = Rc::new(RefCell::new(Vec::new()));

		let seen2 = seen.clone();
		scope.on("documentChange", move |e, _| {
			seen2.borrow_mut().push(e.payload());
		});

		scope.input_change("name", json!("will"));

		assert_eq!(scope.form().get("name"), Some(json!("will")));
		let events = seen.borrow();
		assert_eq!(events.len(), 1);
		let Lifecycle::DocumentChange { doc, changes } = &events[0] else {
			panic!("wrong event");
		};
		assert_eq!(*doc, json!({"name": "will"}));
		assert_eq!(changes["name"], json!("will"));
	}

	#[test]
	#[serial]
	fn input_change_dedups_identical_values() {
		let scope = FormScope::new(FormConfig::new().with_doc(json!({"name": "joe"})));
		assert!(scope.input_change("name", json!("joe")).is_none());
		assert!(scope.input_change("", json!("x")).is_none());
	}

	#[test]
	#[serial]
	fn prevented_property_change_mutates_nothing() {
		let scope = FormScope::new(FormConfig::new().with_doc(json!({"name": "joe"})));
		let fired = Rc::new(RefCell::new(false));

		scope.on("propertyChange", |e, _| e.prevent_default());
		let fired2 = fired.clone();
		scope.on("documentChange", move |_, _| *fired2.borrow_mut() = true);

		scope.input_change("name", json!("will"));

		assert_eq!(scope.form().get("name"), Some(json!("joe")));
		assert!(!*fired.borrow());
	}

	#[test]
	#[serial]
	fn events_disabled_leaves_handlers_but_no_defaults() {
		let scope = FormScope::new(
			FormConfig::new().with_doc(json!({"name": "joe"})).with_events(false),
		);
		let seen = Rc::new(RefCell::new(0));

		let seen2 = seen.clone();
		scope.on("propertyChange", move |_, _| *seen2.borrow_mut() += 1);

		scope.input_change("name", json!("will"));

		assert_eq!(*seen.borrow(), 1);
		assert_eq!(scope.form().get("name"), Some(json!("joe")));
	}

	#[test]
	#[serial]
	fn stop_propagation_keeps_event_from_parent() {
		let outer = FormScope::new(FormConfig::new().with_doc(json!({"profile": {"name": "joe"}})));
		let inner = outer.child_field("profile");
		let outer_saw = Rc::new(RefCell::new(false));

		let outer_saw2 = outer_saw.clone();
		outer.on("documentChange", move |_, _| *outer_saw2.borrow_mut() = true);
		inner.on("documentChange", |e, _| e.stop_propagation());

		inner.input_change("name", json!("will"));

		// The change landed in the inner document, but the merge never
		// reached the outer scope.
		assert_eq!(inner.form().get("name"), Some(json!("will")));
		assert!(!*outer_saw.borrow());
		assert_eq!(outer.form().get("profile.name"), Some(json!("joe")));
	}

	#[test]
	#[serial]
	fn stop_propagation_cancels_bubbling_not_the_default() {
		let outer = FormScope::new(FormConfig::new().with_doc(json!({"profile": {"name": "joe"}})));
		let inner = outer.child_field("profile");
		let outer_saw = Rc::new(RefCell::new(false));

		let outer_saw2 = outer_saw.clone();
		outer.on("propertyChange", move |_, _| *outer_saw2.borrow_mut() = true);
		inner.on("propertyChange", |e, _| e.stop_propagation());

		inner.input_change("name", json!("will"));

		// The local merge still ran; only the propertyChange bubble was
		// cancelled. The documentChange it raised is a fresh event and
		// reaches the outer scope as usual.
		assert_eq!(inner.form().get("name"), Some(json!("will")));
		assert!(!*outer_saw.borrow());
		assert_eq!(outer.form().get("profile.name"), Some(json!("will")));
	}

	#[test]
	#[serial]
	fn child_scope_inherits_schema_slice() {
		use formwork_schema::Schema;
		let schema = Schema::object([(
			"profile",
			Schema::object([("name", Schema::rules([("type", json!("string"))]))]),
		)]);
		let outer = FormScope::new(
			FormConfig::new()
				.with_doc(json!({"profile": {"name": 7}}))
				.with_schema(schema),
		);
		let inner = outer.child_field("profile");

		let event = inner.form().validate(None).unwrap().unwrap();
		assert_eq!(event.name(), "documentInvalid");
		assert_eq!(inner.form().error(Some("name")).unwrap().message, "invalid");
	}
}
