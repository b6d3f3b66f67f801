//! Dotted/bracketed path access into nested documents.
//!
//! Paths are the addressing mini-language of the form engine: dot-separated
//! field names with bracketed numeric indices, e.g. `profile.emails[0].address`.
//! The tokenizer is tolerant: empty segments, consecutive separators and
//! stray brackets are skipped rather than rejected, so a malformed path
//! misses its target instead of erroring.

use serde_json::{Map, Value};

use crate::error::PathError;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// A named field, addressing an object member.
	Field(String),
	/// A numeric index, addressing an array element.
	Index(usize),
}

/// Split a path string into segments.
///
/// Dot-delimited tokens become [`Segment::Field`]; bracketed tokens become
/// [`Segment::Index`] when numeric and fall back to fields otherwise.
/// Empty tokens are dropped.
///
/// # Examples
///
/// ```
/// use formwork_schema::path::{Segment, tokenize};
///
/// assert_eq!(
///     tokenize("a.b[0].c"),
///     vec![
///         Segment::Field("a".into()),
///         Segment::Field("b".into()),
///         Segment::Index(0),
///         Segment::Field("c".into()),
///     ]
/// );
/// ```
pub fn tokenize(path: &str) -> Vec<Segment> {
	let mut segments = Vec::new();
	let mut buf = String::new();
	let mut chars = path.chars();

	let flush = |buf: &mut String, segments: &mut Vec<Segment>| {
		if !buf.is_empty() {
			segments.push(Segment::Field(std::mem::take(buf)));
		}
	};

	while let Some(c) = chars.next() {
		match c {
			'.' | ']' => flush(&mut buf, &mut segments),
			'[' => {
				flush(&mut buf, &mut segments);
				let mut inner = String::new();
				for d in chars.by_ref() {
					if d == ']' {
						break;
					}
					inner.push(d);
				}
				if !inner.is_empty() {
					match inner.parse::<usize>() {
						Ok(index) => segments.push(Segment::Index(index)),
						Err(_) => segments.push(Segment::Field(inner)),
					}
				}
			}
			_ => buf.push(c),
		}
	}
	flush(&mut buf, &mut segments);

	segments
}

/// Read the value at `path`, or `None` as soon as any intermediate segment
/// is missing, nullish, or of the wrong container kind.
///
/// An empty path addresses the container itself.
///
/// # Examples
///
/// ```
/// use formwork_schema::path::get;
/// use serde_json::json;
///
/// let doc = json!({"profile": {"emails": [{"address": "x"}]}});
/// assert_eq!(get(&doc, "profile.emails[0].address"), Some(&json!("x")));
/// assert_eq!(get(&doc, "profile.phone"), None);
/// ```
pub fn get<'a>(container: &'a Value, path: &str) -> Option<&'a Value> {
	let mut current = container;
	for segment in tokenize(path) {
		current = match &segment {
			Segment::Field(name) => current.get(name.as_str())?,
			Segment::Index(index) => current.get(*index)?,
		};
	}
	Some(current)
}

/// Write `value` at `path`, creating intermediate containers as needed.
///
/// A missing (or wrong-kind) intermediate becomes an object when the next
/// segment is a field and an array when it is an index; arrays are padded
/// with `null` up to the addressed element. The terminal slot is assigned
/// directly, with no merge.
///
/// # Examples
///
/// ```
/// use formwork_schema::path::{get, set};
/// use serde_json::json;
///
/// let mut doc = json!({});
/// set(&mut doc, "profile.emails[0].address", json!("x")).unwrap();
/// assert_eq!(doc, json!({"profile": {"emails": [{"address": "x"}]}}));
/// assert_eq!(get(&doc, "profile.emails[0].address"), Some(&json!("x")));
/// ```
pub fn set(container: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
	let segments = tokenize(path);
	if segments.is_empty() {
		return Err(PathError::EmptyPath);
	}
	set_segments(container, &segments, value);
	Ok(())
}

fn set_segments(current: &mut Value, segments: &[Segment], value: Value) {
	match segments {
		[terminal] => assign(current, terminal, value),
		[head, rest @ ..] => {
			let child = descend(current, head, &rest[0]);
			set_segments(child, rest, value);
		}
		[] => {}
	}
}

/// Assign `value` into the slot addressed by one terminal segment,
/// coercing `current` into the right container kind first.
fn assign(current: &mut Value, segment: &Segment, value: Value) {
	match segment {
		Segment::Field(name) => {
			if !current.is_object() {
				*current = Value::Object(Map::new());
			}
			if let Value::Object(map) = current {
				map.insert(name.clone(), value);
			}
		}
		Segment::Index(index) => {
			if !current.is_array() {
				*current = Value::Array(Vec::new());
			}
			if let Value::Array(items) = current {
				while items.len() <= *index {
					items.push(Value::Null);
				}
				items[*index] = value;
			}
		}
	}
}

/// Walk one segment deeper, creating the child container whose kind is
/// inferred from the *next* segment.
fn descend<'a>(current: &'a mut Value, segment: &Segment, next: &Segment) -> &'a mut Value {
	let slot = match segment {
		Segment::Field(name) => {
			if !current.is_object() {
				*current = Value::Object(Map::new());
			}
			let Value::Object(map) = current else {
				unreachable!()
			};
			map.entry(name.clone()).or_insert(Value::Null)
		}
		Segment::Index(index) => {
			if !current.is_array() {
				*current = Value::Array(Vec::new());
			}
			let Value::Array(items) = current else {
				unreachable!()
			};
			while items.len() <= *index {
				items.push(Value::Null);
			}
			&mut items[*index]
		}
	};

	match next {
		Segment::Field(_) if !slot.is_object() => *slot = Value::Object(Map::new()),
		Segment::Index(_) if !slot.is_array() => *slot = Value::Array(Vec::new()),
		_ => {}
	}
	slot
}
