//! Single-field validators.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::SchemaError;
use crate::validation::Validation;

type ValidateFn = Rc<dyn Fn(&Value) -> Validation>;
type TransformFn = Rc<dyn Fn(Value) -> Value>;

/// A stateless single-field validation unit: a predicate, an optional
/// transform applied before the predicate, and an optional static message
/// used when the predicate fails without a message of its own.
///
/// The predicate receives the transformed value and must not mutate it
/// (enforced here by taking `&Value`).
///
/// # Examples
///
/// ```
/// use formwork_schema::{Validation, Validator};
/// use serde_json::json;
///
/// let validator = Validator::from_predicate(|v| v.as_str().is_some())
///     .with_message("expected a string");
///
/// assert!(validator.validate(&json!("ok")).is_valid());
/// assert_eq!(
///     validator.validate(&json!(1)),
///     Validation::Message("expected a string".into())
/// );
/// ```
#[derive(Clone)]
pub struct Validator {
	validate: ValidateFn,
	transform: Option<TransformFn>,
	message: Option<String>,
}

impl Validator {
	/// Build a validator from a function returning a [`Validation`].
	pub fn new<F>(validate: F) -> Self
	where
		F: Fn(&Value) -> Validation + 'static,
	{
		Self {
			validate: Rc::new(validate),
			transform: None,
			message: None,
		}
	}

	/// Build a validator from a boolean predicate.
	pub fn from_predicate<F>(predicate: F) -> Self
	where
		F: Fn(&Value) -> bool + 'static,
	{
		Self::new(move |value| Validation::from_bool(predicate(value)))
	}

	/// Apply `transform` to the value before the predicate sees it.
	pub fn with_transform<F>(mut self, transform: F) -> Self
	where
		F: Fn(Value) -> Value + 'static,
	{
		self.transform = Some(Rc::new(transform));
		self
	}

	/// Use `message` when the predicate fails without its own message.
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	/// The transformed value the predicate would be given.
	pub fn transform(&self, value: Value) -> Value {
		match &self.transform {
			Some(transform) => transform(value),
			None => value,
		}
	}

	/// Transform, then run the predicate.
	///
	/// A bare [`Validation::Invalid`] is upgraded to the static message
	/// when one was set; an explicit message from the predicate wins.
	pub fn validate(&self, value: &Value) -> Validation {
		let transformed = self.transform(value.clone());
		match (self.validate)(&transformed) {
			Validation::Invalid => match &self.message {
				Some(message) => Validation::Message(message.clone()),
				None => Validation::Invalid,
			},
			other => other,
		}
	}

	/// Fail-fast variant of [`Validator::validate`].
	pub fn assert(&self, value: &Value) -> Result<(), SchemaError> {
		match self.validate(value) {
			Validation::Valid => Ok(()),
			failure => Err(SchemaError::Invalid(failure)),
		}
	}
}

impl fmt::Debug for Validator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Validator")
			.field("transform", &self.transform.is_some())
			.field("message", &self.message)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn predicate_true_is_valid() {
		let validator = Validator::from_predicate(|_| true);
		assert_eq!(validator.validate(&json!("anything")), Validation::Valid);
	}

	#[test]
	fn predicate_false_without_message_is_invalid() {
		let validator = Validator::from_predicate(|_| false);
		assert_eq!(validator.validate(&json!(1)), Validation::Invalid);
	}

	#[test]
	fn static_message_fills_in_for_bare_failures() {
		let validator = Validator::from_predicate(|_| false).with_message("not valid");
		assert_eq!(
			validator.validate(&json!(1)),
			Validation::Message("not valid".into())
		);
	}

	#[test]
	fn explicit_message_wins_over_static() {
		let validator =
			Validator::new(|_| Validation::Message("from predicate".into())).with_message("static");
		assert_eq!(
			validator.validate(&json!(1)),
			Validation::Message("from predicate".into())
		);
	}

	#[test]
	fn transform_runs_before_predicate() {
		let validator = Validator::from_predicate(|v| v.as_str() == Some("HELLO"))
			.with_transform(|v| match v.as_str() {
				Some(s) => Value::String(s.to_uppercase()),
				None => v,
			});
		assert!(validator.validate(&json!("hello")).is_valid());
		assert_eq!(validator.transform(json!("hi")), json!("HI"));
	}

	#[test]
	fn assert_raises_the_failure() {
		let validator = Validator::from_predicate(|_| false).with_message("bad");
		let err = validator.assert(&json!(1)).unwrap_err();
		assert_eq!(
			err,
			SchemaError::Invalid(Validation::Message("bad".into()))
		);
		assert!(validator.assert(&json!(1)).is_err());

		let ok = Validator::from_predicate(|_| true);
		assert!(ok.assert(&json!(1)).is_ok());
	}
}
