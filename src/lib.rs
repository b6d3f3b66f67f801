//! # Formwork
//!
//! A reactive form-state and validation engine.
//!
//! Formwork tracks a document's current value, merges user-entered field
//! changes into it, runs a declarative schema over it, and raises a
//! sequence of lifecycle events (`propertyChange`, `documentChange`,
//! `propertyInvalid`, `documentInvalid`, `documentSubmit`) that an
//! embedding UI layer handles. Rendering, widgets and transport are out of
//! scope: the engine only needs a data context to read, events to receive,
//! and events to emit.
//!
//! ## Crates
//!
//! - [`reactive`] — `Signal`/`Effect` cells with deferred, ordered flushes
//! - [`schema`] — path access, validators, schemas and the rule table
//! - [`forms`] — the form instance, error store, scopes and data context
//!
//! ## Quick start
//!
//! ```
//! use formwork::{FormConfig, FormScope, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::object([
//!     ("name", Schema::rules([("type", json!("string")), ("minLength", json!(2))])),
//! ]);
//! let scope = FormScope::new(
//!     FormConfig::new().with_doc(json!({"name": "joe"})).with_schema(schema),
//! );
//!
//! scope.on("documentSubmit", |event, _form| {
//!     println!("saving {:?}", event.doc());
//! });
//!
//! scope.input_change("name", json!("will"));
//! scope.submit().unwrap();
//! ```

pub use formwork_forms as forms;
pub use formwork_reactive as reactive;
pub use formwork_schema as schema;

pub use formwork_forms::{
	BridgeEvent, Changes, ContextData, DataContext, ErrorRecord, ErrorStore, FormConfig,
	FormError, FormInstance, FormScope, Lifecycle, Mount, SourceEvent,
};
pub use formwork_reactive::{Effect, Signal, flush, untracked};
pub use formwork_schema::{
	PathError, RuleContext, RuleTable, Schema, SchemaError, Validation, Validator, path,
};
