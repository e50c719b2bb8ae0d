use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use crate::computed::VALUE;
use crate::{Computed, Runtime};

/// A single reactive value, tracked under the key `"value"`.
pub struct Var<T> {
	runtime: Runtime,
	body: Rc<RefCell<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			runtime: self.runtime.clone(),
			body: self.body.clone(),
		}
	}
}

pub trait Toggle {
	fn toggle(&mut self);
}

impl Toggle for bool {
	fn toggle(&mut self) {
		*self = !*self
	}
}

impl<T> Var<T>
where
	T: 'static,
{
	pub fn new(runtime: &Runtime, value: T) -> Self {
		Var {
			runtime: runtime.clone(),
			body: Rc::new(RefCell::new(value)),
		}
	}

	pub fn map<F, R>(&self, func: F) -> Computed<R>
	where
		F: Fn(&T) -> R + 'static,
		R: 'static,
	{
		let this = self.clone();
		Computed::new(&self.runtime, move || this.with(&func))
	}

	#[inline]
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.with(T::clone)
	}

	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		self.runtime.track(&self.body, VALUE);
		func(&*self.body.borrow())
	}

	/// Reads without subscribing the running effect.
	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.borrow()
	}

	#[inline]
	pub fn set(&self, value: T)
	where
		T: PartialEq,
	{
		let _ = self.replace(value);
	}

	/// Stores `value` and returns the previous one. Equal values do not
	/// notify.
	pub fn replace(&self, value: T) -> T
	where
		T: PartialEq,
	{
		let changed = *self.body.borrow() != value;
		let old = std::mem::replace(&mut *self.body.borrow_mut(), value);
		if changed {
			self.runtime.trigger(&self.body, VALUE);
		}

		old
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Clone + PartialEq,
	{
		let changed = {
			let mut value = self.body.borrow_mut();
			let before = value.clone();
			func(&mut value);
			*value != before
		};

		if changed {
			self.runtime.trigger(&self.body, VALUE);
		}
	}

	#[inline]
	pub fn toggle(&self)
	where
		T: Toggle + Clone + PartialEq,
	{
		self.update(T::toggle)
	}
}

impl<T> Debug for Var<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}
