//! Reactive keyed objects.
//!
//! Stored values are tagged up front as [`Scalar`] or nested [`Object`], so
//! deep wrapping is decided by the tag rather than by inspecting the value.
//! Nested objects are wrapped only when read.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::Rc;

use crate::Runtime;

#[derive(Clone, Debug)]
pub enum Scalar {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Rc<str>),
}

/// Same-value comparison: `NaN` equals itself, `0.0` and `-0.0` differ.
impl PartialEq for Scalar {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Scalar::Null, Scalar::Null) => true,
			(Scalar::Bool(a), Scalar::Bool(b)) => a == b,
			(Scalar::Int(a), Scalar::Int(b)) => a == b,
			(Scalar::Float(a), Scalar::Float(b)) => {
				a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
			}
			(Scalar::Str(a), Scalar::Str(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Scalar {}

/// A raw value as stored in an [`Object`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
	Scalar(Scalar),
	Object(Object),
}

/// A plain keyed object. Compared by identity.
#[derive(Clone, Default)]
pub struct Object {
	fields: Rc<RefCell<BTreeMap<String, Value>>>,
}

impl Object {
	pub fn new() -> Self {
		Self::default()
	}

	/// Writes without notifying anyone.
	pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.fields.borrow_mut().insert(key.into(), value.into())
	}

	/// Reads without tracking.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.fields.borrow().get(key).cloned()
	}

	pub fn len(&self) -> usize {
		self.fields.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.borrow().is_empty()
	}

	pub fn ptr_eq(&self, other: &Object) -> bool {
		Rc::ptr_eq(&self.fields, &other.fields)
	}
}

impl PartialEq for Object {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for Object {}

impl Debug for Object {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_map().entries(self.fields.borrow().iter()).finish()
	}
}

impl<K, V> FromIterator<(K, V)> for Object
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let object = Object::new();
		for (key, value) in iter {
			object.insert(key, value);
		}
		object
	}
}

/// Read/write capability of a reactive wrapper.
pub trait Access {
	/// Reads `key`, subscribing the running effect to it.
	fn get(&self, key: &str) -> Option<Field>;

	/// Writes `key`. Returns `true` and notifies subscribers only if the
	/// stored value changed.
	fn set(&self, key: &str, value: Value) -> bool;
}

/// What a tracked read yields.
#[derive(Clone, Debug)]
pub enum Field {
	Scalar(Scalar),
	Nested(Reactive),
}

impl Field {
	pub fn as_scalar(&self) -> Option<&Scalar> {
		match self {
			Field::Scalar(scalar) => Some(scalar),
			Field::Nested(_) => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Field::Scalar(Scalar::Int(value)) => Some(*value),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Field::Scalar(Scalar::Float(value)) => Some(*value),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Field::Scalar(Scalar::Bool(value)) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Field::Scalar(Scalar::Str(value)) => Some(value.as_ref()),
			_ => None,
		}
	}

	pub fn as_reactive(&self) -> Option<&Reactive> {
		match self {
			Field::Nested(reactive) => Some(reactive),
			Field::Scalar(_) => None,
		}
	}

	pub fn into_reactive(self) -> Option<Reactive> {
		match self {
			Field::Nested(reactive) => Some(reactive),
			Field::Scalar(_) => None,
		}
	}
}

/// An [`Object`] whose reads track and whose writes trigger.
#[derive(Clone)]
pub struct Reactive {
	runtime: Runtime,
	target: Object,
}

impl Reactive {
	pub fn new(runtime: &Runtime, target: Object) -> Self {
		Reactive {
			runtime: runtime.clone(),
			target,
		}
	}

	/// The wrapped object. Access through it is not observed.
	pub fn raw(&self) -> &Object {
		&self.target
	}

	pub fn get_int(&self, key: &str) -> Option<i64> {
		self.get(key)?.as_int()
	}

	/// Tracked membership test.
	pub fn has(&self, key: &str) -> bool {
		let present = self.target.fields.borrow().contains_key(key);
		self.runtime.track(&self.target.fields, key);
		present
	}

	/// Removes `key`, notifying subscribers if it was present.
	pub fn remove(&self, key: &str) -> Option<Value> {
		let removed = self.target.fields.borrow_mut().remove(key);
		if removed.is_some() {
			self.runtime.trigger(&self.target.fields, key);
		}
		removed
	}

	pub fn insert(&self, key: &str, value: impl Into<Value>) -> bool {
		self.set(key, value.into())
	}

	fn wrap(&self, value: Value) -> Field {
		match value {
			Value::Scalar(scalar) => Field::Scalar(scalar),
			Value::Object(object) => Field::Nested(Reactive::new(&self.runtime, object)),
		}
	}
}

impl Access for Reactive {
	fn get(&self, key: &str) -> Option<Field> {
		let value = self.target.get(key);
		self.runtime.track(&self.target.fields, key);
		value.map(|value| self.wrap(value))
	}

	fn set(&self, key: &str, value: Value) -> bool {
		let changed = {
			let mut fields = self.target.fields.borrow_mut();
			if fields.get(key).is_some_and(|old| *old == value) {
				false
			} else {
				fields.insert(key.to_owned(), value);
				true
			}
		};

		if changed {
			self.runtime.trigger(&self.target.fields, key);
		}
		changed
	}
}

impl Debug for Reactive {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Reactive").field(&self.target).finish()
	}
}

impl From<Scalar> for Value {
	fn from(scalar: Scalar) -> Self {
		Value::Scalar(scalar)
	}
}

impl From<Object> for Value {
	fn from(object: Object) -> Self {
		Value::Object(object)
	}
}

impl From<()> for Value {
	fn from(_: ()) -> Self {
		Value::Scalar(Scalar::Null)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Scalar(Scalar::Bool(value))
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Scalar(Scalar::Int(value.into()))
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Scalar(Scalar::Int(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Scalar(Scalar::Float(value))
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Scalar(Scalar::Str(value.into()))
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Scalar(Scalar::Str(value.into()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_value_equality() {
		assert_eq!(Scalar::Float(f64::NAN), Scalar::Float(f64::NAN));
		assert_ne!(Scalar::Float(0.0), Scalar::Float(-0.0));
		assert_ne!(Scalar::Int(1), Scalar::Float(1.0));
		assert_eq!(Value::from("a"), Value::from(String::from("a")));
	}

	#[test]
	fn objects_compare_by_identity() {
		let a: Object = [("x", 1)].into_iter().collect();
		let b: Object = [("x", 1)].into_iter().collect();

		assert_ne!(Value::from(a.clone()), Value::from(b));
		assert_eq!(Value::from(a.clone()), Value::from(a));
	}

	#[test]
	fn writes_report_changes() {
		let runtime = Runtime::new();
		let state = runtime.reactive([("a", 1)].into_iter().collect());

		assert!(!state.insert("a", 1));
		assert!(state.insert("a", 2));
		assert!(state.insert("b", ()));
		assert!(!state.insert("b", ()));
		assert_eq!(state.raw().len(), 2);

		assert!(state.remove("b").is_some());
		assert!(state.remove("b").is_none());
	}

	#[test]
	fn nested_objects_are_wrapped_on_read() {
		let runtime = Runtime::new();
		let inner: Object = [("n", 1)].into_iter().collect();
		let outer: Object = [("inner", inner.clone())].into_iter().collect();
		let state = runtime.reactive(outer);

		let field = state.get("inner").and_then(Field::into_reactive);
		let nested = field.expect("nested object");
		assert!(nested.raw().ptr_eq(&inner));
		assert_eq!(nested.get_int("n"), Some(1));
	}
}
