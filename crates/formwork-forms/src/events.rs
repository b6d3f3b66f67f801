//! Lifecycle events and the source-event control surface.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use serde_json::Value;

use crate::store::ErrorRecord;

/// The map of just-changed fields attached to change events, keyed by
/// field path.
pub type Changes = IndexMap<String, Value>;

/// The cancellation flags of an originating UI event.
///
/// Mirrors the subset of a native event the engine cares about:
/// `prevent_default` skips the default merge/validate/submit cascade,
/// `stop_propagation` stops the event from reaching enclosing scopes.
#[derive(Debug, Default)]
pub struct SourceEvent {
	default_prevented: Cell<bool>,
	propagation_stopped: Cell<bool>,
}

impl SourceEvent {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	pub fn is_default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	pub fn is_propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}
}

/// A lifecycle event raised by a form operation.
///
/// The wire names ([`Lifecycle::name`]) are part of the public contract;
/// handlers are registered against them.
#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle {
	/// A user-entered field change, before it is merged into the document.
	PropertyChange { changes: Changes },
	/// The document changed; carries the updated whole document and the
	/// map of just-changed fields.
	DocumentChange { doc: Value, changes: Changes },
	/// One field was validated (or invalidated) and has errors.
	PropertyInvalid { doc: Value, errors: Vec<ErrorRecord> },
	/// The document was validated (or invalidated) and has errors.
	DocumentInvalid { doc: Value, errors: Vec<ErrorRecord> },
	/// The document was submitted and is valid.
	DocumentSubmit { doc: Value },
}

impl Lifecycle {
	pub fn name(&self) -> &'static str {
		match self {
			Self::PropertyChange { .. } => "propertyChange",
			Self::DocumentChange { .. } => "documentChange",
			Self::PropertyInvalid { .. } => "propertyInvalid",
			Self::DocumentInvalid { .. } => "documentInvalid",
			Self::DocumentSubmit { .. } => "documentSubmit",
		}
	}
}

/// A dispatched event: a [`Lifecycle`] payload plus the cancellation
/// flags handlers use to steer the default cascade.
///
/// The payload sits behind a `RefCell` because sub-document scopes re-tag
/// a bubbling `documentChange` with their own merged document before
/// passing it on.
#[derive(Debug)]
pub struct BridgeEvent {
	payload: RefCell<Lifecycle>,
	source: SourceEvent,
}

impl BridgeEvent {
	pub fn new(payload: Lifecycle) -> Self {
		Self::with_source(payload, SourceEvent::new())
	}

	pub fn with_source(payload: Lifecycle, source: SourceEvent) -> Self {
		Self {
			payload: RefCell::new(payload),
			source,
		}
	}

	pub fn name(&self) -> &'static str {
		self.payload.borrow().name()
	}

	/// A clone of the current payload.
	pub fn payload(&self) -> Lifecycle {
		self.payload.borrow().clone()
	}

	/// The document attached to the payload, if the event carries one.
	pub fn doc(&self) -> Option<Value> {
		match &*self.payload.borrow() {
			Lifecycle::PropertyChange { .. } => None,
			Lifecycle::DocumentChange { doc, .. }
			| Lifecycle::PropertyInvalid { doc, .. }
			| Lifecycle::DocumentInvalid { doc, .. }
			| Lifecycle::DocumentSubmit { doc } => Some(doc.clone()),
		}
	}

	/// The changes map, for change events.
	pub fn changes(&self) -> Option<Changes> {
		match &*self.payload.borrow() {
			Lifecycle::PropertyChange { changes } | Lifecycle::DocumentChange { changes, .. } => {
				Some(changes.clone())
			}
			_ => None,
		}
	}

	/// The error records, for invalid events.
	pub fn errors(&self) -> Option<Vec<ErrorRecord>> {
		match &*self.payload.borrow() {
			Lifecycle::PropertyInvalid { errors, .. } | Lifecycle::DocumentInvalid { errors, .. } => {
				Some(errors.clone())
			}
			_ => None,
		}
	}

	pub fn source(&self) -> &SourceEvent {
		&self.source
	}

	pub fn prevent_default(&self) {
		self.source.prevent_default();
	}

	pub fn is_default_prevented(&self) -> bool {
		self.source.is_default_prevented()
	}

	pub fn stop_propagation(&self) {
		self.source.stop_propagation();
	}

	pub fn is_propagation_stopped(&self) -> bool {
		self.source.is_propagation_stopped()
	}

	pub(crate) fn retag(&self, f: impl FnOnce(&mut Lifecycle)) {
		f(&mut self.payload.borrow_mut());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn lifecycle_names_are_stable() {
		let changes = Changes::new();
		assert_eq!(Lifecycle::PropertyChange { changes: changes.clone() }.name(), "propertyChange");
		assert_eq!(
			Lifecycle::DocumentChange { doc: json!({}), changes }.name(),
			"documentChange"
		);
		assert_eq!(
			Lifecycle::PropertyInvalid { doc: json!({}), errors: vec![] }.name(),
			"propertyInvalid"
		);
		assert_eq!(
			Lifecycle::DocumentInvalid { doc: json!({}), errors: vec![] }.name(),
			"documentInvalid"
		);
		assert_eq!(Lifecycle::DocumentSubmit { doc: json!({}) }.name(), "documentSubmit");
	}

	#[test]
	fn source_flags_start_clear() {
		let source = SourceEvent::new();
		assert!(!source.is_default_prevented());
		assert!(!source.is_propagation_stopped());
		source.prevent_default();
		source.stop_propagation();
		assert!(source.is_default_prevented());
		assert!(source.is_propagation_stopped());
	}

	#[test]
	fn bridge_event_exposes_payload_parts() {
		let mut changes = Changes::new();
		changes.insert("name".into(), json!("will"));
		let event = BridgeEvent::new(Lifecycle::DocumentChange {
			doc: json!({"name": "will"}),
			changes,
		});

		assert_eq!(event.name(), "documentChange");
		assert_eq!(event.doc(), Some(json!({"name": "will"})));
		assert_eq!(event.changes().unwrap()["name"], json!("will"));
		assert_eq!(event.errors(), None);
	}

	#[test]
	fn retag_replaces_the_payload_in_place() {
		let event = BridgeEvent::new(Lifecycle::DocumentChange {
			doc: json!({"inner": true}),
			changes: Changes::new(),
		});
		event.retag(|payload| {
			if let Lifecycle::DocumentChange { doc, .. } = payload {
				*doc = json!({"outer": {"inner": true}});
			}
		});
		assert_eq!(event.doc(), Some(json!({"outer": {"inner": true}})));
	}
}
