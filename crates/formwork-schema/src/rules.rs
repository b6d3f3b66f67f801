//! Named, composable validation rules.
//!
//! Rules are looked up by schema-data strings (`"oneOf"`, `"minLength"`, …)
//! in a [`RuleTable`] and evaluated against a [`RuleContext`]. The table is
//! an explicit value injected per form instance, so overrides stay local
//! instead of living in a shared mutable registry.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::DateTime;
use regex::RegexBuilder;
use serde_json::Value;

use crate::error::SchemaError;
use crate::path;

/// Everything a rule may inspect: the value under test, the rule's
/// options, the field's name, the sibling document, and the table itself
/// (for rules that recurse, like `type` over array elements).
pub struct RuleContext<'a> {
	pub value: &'a Value,
	pub options: &'a Value,
	pub field_name: &'a str,
	/// The document the field belongs to; `before`/`after` read sibling
	/// fields out of it.
	pub values: &'a Value,
	pub table: &'a RuleTable,
}

type RuleFn = Rc<dyn Fn(&RuleContext) -> bool>;

/// Registry of named rules.
///
/// [`RuleTable::builtin`] carries the stock rule set; [`RuleTable::register`]
/// adds or replaces entries on a per-table basis.
///
/// # Examples
///
/// ```
/// use formwork_schema::{RuleContext, RuleTable};
/// use serde_json::json;
///
/// let table = RuleTable::builtin();
/// let doc = json!({});
/// let value = json!(3);
/// let options = json!(5);
/// let ctx = RuleContext {
///     value: &value,
///     options: &options,
///     field_name: "age",
///     values: &doc,
///     table: &table,
/// };
/// assert_eq!(table.evaluate("min", &ctx), Ok(false));
/// assert!(table.evaluate("bogus", &ctx).is_err());
/// ```
#[derive(Clone)]
pub struct RuleTable {
	rules: HashMap<String, RuleFn>,
}

impl RuleTable {
	/// An empty table with no rules registered.
	pub fn empty() -> Self {
		Self {
			rules: HashMap::new(),
		}
	}

	/// The stock rule set.
	pub fn builtin() -> Self {
		let mut table = Self::empty();
		table.register("oneOf", one_of);
		table.register("min", min);
		table.register("max", max);
		table.register("type", type_of);
		table.register("minLength", min_length);
		table.register("maxLength", max_length);
		table.register("minCount", min_count);
		table.register("maxCount", max_count);
		table.register("regex", regex_rule);
		table.register("before", before);
		table.register("after", after);
		table
	}

	/// Add or replace a rule.
	pub fn register<F>(&mut self, name: impl Into<String>, rule: F)
	where
		F: Fn(&RuleContext) -> bool + 'static,
	{
		self.rules.insert(name.into(), Rc::new(rule));
	}

	pub fn contains(&self, name: &str) -> bool {
		self.rules.contains_key(name)
	}

	/// Evaluate one rule by name.
	///
	/// An unregistered name is a schema-authoring bug and fails loudly.
	pub fn evaluate(&self, name: &str, ctx: &RuleContext) -> Result<bool, SchemaError> {
		match self.rules.get(name) {
			Some(rule) => Ok(rule(ctx)),
			None => Err(SchemaError::UnknownRule(name.to_string())),
		}
	}
}

impl Default for RuleTable {
	fn default() -> Self {
		Self::builtin()
	}
}

impl std::fmt::Debug for RuleTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
		names.sort_unstable();
		f.debug_struct("RuleTable").field("rules", &names).finish()
	}
}

fn one_of(ctx: &RuleContext) -> bool {
	ctx.options
		.as_array()
		.is_some_and(|options| options.contains(ctx.value))
}

fn min(ctx: &RuleContext) -> bool {
	match (ctx.value.as_f64(), ctx.options.as_f64()) {
		(Some(value), Some(bound)) => value >= bound,
		_ => false,
	}
}

fn max(ctx: &RuleContext) -> bool {
	match (ctx.value.as_f64(), ctx.options.as_f64()) {
		(Some(value), Some(bound)) => value <= bound,
		_ => false,
	}
}

/// `type` markers: `"string"`, `"number"`, `"boolean"`, `"date"` (an
/// RFC 3339 string), `"object"`, or `[marker]` for array-of, checked
/// per element.
fn type_of(ctx: &RuleContext) -> bool {
	match ctx.options {
		Value::String(kind) => match kind.as_str() {
			"string" => ctx.value.is_string(),
			"number" => ctx.value.is_number(),
			"boolean" => ctx.value.is_boolean(),
			"date" => ctx
				.value
				.as_str()
				.is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
			"object" => ctx.value.is_object(),
			"array" => ctx.value.is_array(),
			_ => false,
		},
		Value::Array(inner) => match inner.first() {
			Some(element_kind) => ctx.value.as_array().is_some_and(|items| {
				items.iter().all(|item| {
					type_of(&RuleContext {
						value: item,
						options: element_kind,
						field_name: ctx.field_name,
						values: ctx.values,
						table: ctx.table,
					})
				})
			}),
			None => false,
		},
		_ => false,
	}
}

fn min_length(ctx: &RuleContext) -> bool {
	match (ctx.value.as_str(), ctx.options.as_u64()) {
		(Some(value), Some(bound)) => value.chars().count() as u64 >= bound,
		_ => false,
	}
}

fn max_length(ctx: &RuleContext) -> bool {
	match (ctx.value.as_str(), ctx.options.as_u64()) {
		(Some(value), Some(bound)) => value.chars().count() as u64 <= bound,
		_ => false,
	}
}

fn min_count(ctx: &RuleContext) -> bool {
	match (ctx.value.as_array(), ctx.options.as_u64()) {
		(Some(items), Some(bound)) => items.len() as u64 >= bound,
		_ => false,
	}
}

fn max_count(ctx: &RuleContext) -> bool {
	match (ctx.value.as_array(), ctx.options.as_u64()) {
		(Some(items), Some(bound)) => items.len() as u64 <= bound,
		_ => false,
	}
}

/// `regex` options: a pattern string, a `{"pattern", "flags"}` object, or
/// an array of either. The array form requires the value to match every
/// pattern.
fn regex_rule(ctx: &RuleContext) -> bool {
	let Some(value) = ctx.value.as_str() else {
		return false;
	};
	match ctx.options {
		Value::Array(patterns) => patterns.iter().all(|p| pattern_matches(p, value)),
		single => pattern_matches(single, value),
	}
}

fn pattern_matches(options: &Value, value: &str) -> bool {
	let (pattern, flags) = match options {
		Value::String(pattern) => (pattern.as_str(), ""),
		Value::Object(map) => {
			let Some(pattern) = map.get("pattern").and_then(Value::as_str) else {
				return false;
			};
			(pattern, map.get("flags").and_then(Value::as_str).unwrap_or(""))
		}
		_ => return false,
	};

	let mut builder = RegexBuilder::new(pattern);
	builder
		.case_insensitive(flags.contains('i'))
		.multi_line(flags.contains('m'))
		.dot_matches_new_line(flags.contains('s'));
	match builder.build() {
		Ok(regex) => regex.is_match(value),
		// A pattern that does not compile can never match.
		Err(_) => false,
	}
}

fn before(ctx: &RuleContext) -> bool {
	match sibling_pair(ctx) {
		Some((value, other)) => value < other,
		None => false,
	}
}

fn after(ctx: &RuleContext) -> bool {
	match sibling_pair(ctx) {
		Some((value, other)) => value > other,
		None => false,
	}
}

/// Resolve the value under test and the named sibling field to a common
/// comparable form (number, or RFC 3339 date as epoch milliseconds).
fn sibling_pair(ctx: &RuleContext) -> Option<(f64, f64)> {
	let sibling_name = ctx.options.as_str()?;
	let other = path::get(ctx.values, sibling_name)?;
	Some((comparable(ctx.value)?, comparable(other)?))
}

fn comparable(value: &Value) -> Option<f64> {
	if let Some(number) = value.as_f64() {
		return Some(number);
	}
	let text = value.as_str()?;
	let date = DateTime::parse_from_rfc3339(text).ok()?;
	Some(date.timestamp_millis() as f64)
}
