//! End-to-end flows: change, validation, submit and sub-document merge.

use std::cell::RefCell;
use std::rc::Rc;

use formwork_forms::{
	ErrorRecord, FormConfig, FormScope, Lifecycle,
};
use formwork_reactive::Effect;
use formwork_schema::{Schema, Validation, Validator};
use serde_json::{Value, json};
use serial_test::serial;

fn recorded(scope: &FormScope, name: &str) -> Rc<RefCell<Vec<Lifecycle>>> {
	let seen = Rc::new(RefCell::new(Vec::new()));
	let sink = seen.clone();
	scope.on(name, move |event, _| {
		sink.borrow_mut().push(event.payload());
	});
	seen
}

#[test]
#[serial]
fn changing_a_field_updates_doc_and_raises_document_change() {
	let scope = FormScope::new(FormConfig::new().with_doc(json!({"name": "joe"})));
	let seen = recorded(&scope, "documentChange");

	scope.input_change("name", json!("will"));

	assert_eq!(scope.form().get("name"), Some(json!("will")));
	let events = seen.borrow();
	assert_eq!(events.len(), 1);
	let Lifecycle::DocumentChange { doc, changes } = &events[0] else {
		panic!("expected documentChange");
	};
	assert_eq!(*doc, json!({"name": "will"}));
	assert_eq!(changes.len(), 1);
	assert_eq!(changes["name"], json!("will"));
}

#[test]
#[serial]
fn failing_predicate_submits_as_document_invalid() {
	let schema = Schema::object([("name", Schema::validator(Validator::from_predicate(|_| false)))]);
	let scope = FormScope::new(
		FormConfig::new().with_doc(json!({"name": "joe"})).with_schema(schema),
	);
	let invalid = recorded(&scope, "documentInvalid");
	let submitted = recorded(&scope, "documentSubmit");

	scope.submit().unwrap();

	assert!(submitted.borrow().is_empty());
	let events = invalid.borrow();
	assert_eq!(events.len(), 1);
	let Lifecycle::DocumentInvalid { doc, errors } = &events[0] else {
		panic!("expected documentInvalid");
	};
	assert_eq!(*doc, json!({"name": "joe"}));
	assert_eq!(errors.as_slice(), &[ErrorRecord::new("name", "invalid")]);
}

#[test]
#[serial]
fn validator_message_reaches_the_error_record() {
	let schema = Schema::object([(
		"name",
		Schema::validator(Validator::new(|_| Validation::Message("not valid".into()))),
	)]);
	let scope = FormScope::new(
		FormConfig::new().with_doc(json!({"name": "joe"})).with_schema(schema),
	);

	scope.submit().unwrap();

	let record = scope.form().error(Some("name")).unwrap();
	assert_eq!(record.message, "not valid");
}

#[test]
#[serial]
fn sub_document_change_merges_into_the_outer_scope() {
	let outer = FormScope::new(
		FormConfig::new().with_doc(json!({"profile": {"name": "joe"}, "email": "j@x"})),
	);
	let inner = outer.child_field("profile");
	let seen = recorded(&outer, "documentChange");

	inner.input_change("name", json!("newval"));

	// The outer document gained the change without disturbing siblings.
	assert_eq!(
		outer.form().doc(),
		json!({"profile": {"name": "newval"}, "email": "j@x"})
	);
	let events = seen.borrow();
	assert_eq!(events.len(), 1);
	let Lifecycle::DocumentChange { doc, changes } = &events[0] else {
		panic!("expected documentChange");
	};
	assert_eq!(*doc, json!({"profile": {"name": "newval"}, "email": "j@x"}));
	assert_eq!(changes["profile.name"], json!("newval"));
}

#[test]
#[serial]
fn deep_path_set_then_get_round_trips() {
	let scope = FormScope::new(FormConfig::new());
	scope
		.form()
		.set("profile.emails[0].address", json!("x"))
		.unwrap();

	assert_eq!(
		scope.form().doc(),
		json!({"profile": {"emails": [{"address": "x"}]}})
	);
	assert_eq!(scope.form().get("profile.emails[0].address"), Some(json!("x")));
}

#[test]
#[serial]
fn prevent_default_on_property_change_blocks_the_cascade() {
	let scope = FormScope::new(FormConfig::new().with_doc(json!({"name": "joe"})));
	let changed = recorded(&scope, "documentChange");
	scope.on("propertyChange", |event, _| event.prevent_default());

	scope.input_change("name", json!("will"));

	assert_eq!(scope.form().get("name"), Some(json!("joe")));
	assert!(changed.borrow().is_empty());
}

#[test]
#[serial]
fn valid_submission_fires_document_submit_only() {
	let schema = Schema::object([("name", Schema::rules([("type", json!("string"))]))]);
	let scope = FormScope::new(
		FormConfig::new().with_doc(json!({"name": "joe"})).with_schema(schema),
	);
	let invalid = recorded(&scope, "documentInvalid");
	let submitted = recorded(&scope, "documentSubmit");

	scope.submit().unwrap();

	assert!(invalid.borrow().is_empty());
	let events = submitted.borrow();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0], Lifecycle::DocumentSubmit { doc: json!({"name": "joe"}) });
}

#[test]
#[serial]
fn inner_scope_handlers_run_before_outer_ones() {
	let outer = FormScope::new(FormConfig::new().with_doc(json!({"profile": {}})));
	let inner = outer.child_field("profile");
	let order = Rc::new(RefCell::new(Vec::new()));

	let inner_order = order.clone();
	inner.on("documentChange", move |_, _| inner_order.borrow_mut().push("inner"));
	let outer_order = order.clone();
	outer.on("documentChange", move |_, _| outer_order.borrow_mut().push("outer"));

	inner.input_change("name", json!("x"));

	assert_eq!(*order.borrow(), vec!["inner", "outer"]);
}

#[test]
#[serial]
fn sibling_scopes_are_isolated() {
	let outer = FormScope::new(
		FormConfig::new().with_doc(json!({"profile": {}, "settings": {}})),
	);
	let profile = outer.child_field("profile");
	let settings = outer.child_field("settings");
	let settings_saw = recorded(&settings, "documentChange");

	profile.input_change("name", json!("x"));

	assert!(settings_saw.borrow().is_empty());
	assert_eq!(outer.form().get("settings"), Some(json!({})));
}

#[test]
#[serial]
fn array_item_change_merges_with_indexed_paths() {
	let outer = FormScope::new(
		FormConfig::new().with_doc(json!({"emails": [{"address": "old"}, {"address": "keep"}]})),
	);
	let emails = outer.child_field("emails");
	let first = emails.child_item(0);
	let seen = recorded(&outer, "documentChange");

	first.input_change("address", json!("new"));

	assert_eq!(
		outer.form().doc(),
		json!({"emails": [{"address": "new"}, {"address": "keep"}]})
	);
	let events = seen.borrow();
	let Lifecycle::DocumentChange { changes, .. } = &events[0] else {
		panic!("expected documentChange");
	};
	assert_eq!(changes["emails[0].address"], json!("new"));
}

#[test]
#[serial]
fn checkbox_changes_carry_booleans() {
	let scope = FormScope::new(FormConfig::new().with_doc(json!({"subscribed": false})));
	scope.input_toggle("subscribed", true);
	assert_eq!(scope.form().get("subscribed"), Some(json!(true)));
}

#[test]
#[serial]
fn error_store_is_reactively_observable() {
	let schema = Schema::object([(
		"name",
		Schema::validator(Validator::from_predicate(|v| v.as_str().is_some())),
	)]);
	let scope = FormScope::new(
		FormConfig::new().with_doc(json!({"name": 5})).with_schema(schema),
	);

	let messages = Rc::new(RefCell::new(Vec::<usize>::new()));
	let store = scope.form().errors().clone();
	let sink = messages.clone();
	let _watch = Effect::new(move || {
		sink.borrow_mut().push(store.all().len());
	});

	scope.form().validate(None).unwrap();
	scope.form().set("name", json!("joe")).unwrap();
	scope.form().validate(None).unwrap();

	// Initial run, then one failing and one passing validation.
	assert_eq!(*messages.borrow(), vec![0, 1, 0]);
}

#[test]
#[serial]
fn declarative_rules_validate_nested_arrays() {
	let schema = Schema::object([(
		"emails",
		Schema::array(Schema::object([(
			"address",
			Schema::rules([("regex", json!("@"))]).with_message("not an email"),
		)])),
	)]);
	let scope = FormScope::new(
		FormConfig::new()
			.with_doc(json!({"emails": [{"address": "a@b"}, {"address": "nope"}]}))
			.with_schema(schema),
	);

	scope.submit().unwrap();

	let record = scope.form().error(None).unwrap();
	assert_eq!(record.name, "emails[1].address");
	assert_eq!(record.message, "not an email");
}

#[test]
#[serial]
fn whole_document_replacement_requires_an_object() {
	let scope = FormScope::new(FormConfig::new());
	assert!(scope.form().replace_doc(Value::String("nope".into())).is_err());
	assert!(scope.form().replace_doc(json!({"ok": 1})).is_ok());
}
