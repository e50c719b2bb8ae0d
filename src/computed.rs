use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::addr::WeakAddr;
use crate::graph::TargetRef;
use crate::{Effect, EffectOptions, Runtime};

/// Key a computed is tracked under.
pub const VALUE: &str = "value";

/// A cached derived value.
///
/// The getter runs lazily: a change upstream only marks the cache dirty and
/// notifies whoever read the computed. The next read recomputes.
pub struct Computed<T> {
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

struct ComputedBody<T> {
	runtime: Runtime,
	effect: Effect<T>,
	value: RefCell<Option<T>>,
	dirty: Cell<bool>,
	unnotified: Cell<bool>,
	this: TargetRef,
}

impl<T: 'static> Computed<T> {
	pub fn new(runtime: &Runtime, getter: impl Fn() -> T + 'static) -> Self {
		Computed {
			body: Rc::new_cyclic(|this: &Weak<ComputedBody<T>>| {
				let scheduler = {
					let this = this.clone();
					move |_: crate::Job| {
						if let Some(body) = this.upgrade() {
							body.invalidate()
						}
					}
				};

				ComputedBody {
					runtime: runtime.clone(),
					effect: Effect::with_options(
						runtime,
						getter,
						EffectOptions::default()
							.lazy()
							.name("computed")
							.scheduler(scheduler),
					),
					value: RefCell::new(None),
					dirty: Cell::new(true),
					unnotified: Cell::new(false),
					this: WeakAddr::new(this.clone() as Weak<dyn Any>),
				}
			}),
		}
	}

	/// Reads the value, recomputing it first if it is stale.
	pub fn value(&self) -> T
	where
		T: Clone,
	{
		self.with(T::clone)
	}

	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		let value = self.body.get();
		func(&*value)
	}

	/// Reads without subscribing the running effect.
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.refresh()
	}

	pub fn is_dirty(&self) -> bool {
		self.body.dirty.get()
	}

	/// How many times the getter has run.
	pub fn compute_count(&self) -> usize {
		self.body.effect.run_count()
	}
}

impl<T: 'static> ComputedBody<T> {
	fn get(&self) -> Ref<'_, T> {
		let value = self.refresh();
		self.runtime.track_ref(&self.this, VALUE);
		value
	}

	fn refresh(&self) -> Ref<'_, T> {
		if self.dirty.get() {
			let value = self.effect.run();
			*self.value.borrow_mut() = Some(value);
			self.dirty.set(false);
			self.unnotified.set(false);
		}

		Ref::map(self.value.borrow(), |value| {
			value.as_ref().expect("computed value is set once clean")
		})
	}

	/// Marks the cache stale and tells readers once. If the only reader was
	/// the running effect it was left out, so the next invalidation tells
	/// readers again instead of being absorbed.
	fn invalidate(&self) {
		let was_dirty = self.dirty.replace(true);
		if !was_dirty || self.unnotified.get() {
			let skipped = self.runtime.trigger_ref(&self.this, VALUE);
			self.unnotified.set(skipped);
		}
	}
}

impl<T> Debug for Computed<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Computed")
			.field("dirty", &self.body.dirty.get())
			.field("value", &self.body.value.borrow())
			.finish()
	}
}
