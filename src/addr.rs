use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Identity of an allocation, compared by its thin address.
///
/// Fat pointers to the same value may carry different vtables, so only the
/// data half takes part in comparisons.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Addr(usize);

impl Addr {
	pub fn of<T: ?Sized>(value: &T) -> Self {
		Addr(value as *const T as *const () as usize)
	}

	pub fn of_rc<T: ?Sized>(ptr: &Rc<T>) -> Self {
		Addr(Rc::as_ptr(ptr) as *const () as usize)
	}

	pub fn of_weak<T: ?Sized>(ptr: &Weak<T>) -> Self {
		Addr(Weak::as_ptr(ptr) as *const () as usize)
	}
}

/// A weak pointer that is ordered and hashed by the address it points to.
///
/// Holding the `Weak` keeps the allocation reserved, so the address cannot be
/// handed out to another value while the `WeakAddr` exists.
#[derive(Debug)]
pub struct WeakAddr<T: ?Sized> {
	addr: Addr,
	ptr: Weak<T>,
}

impl<T: ?Sized> WeakAddr<T> {
	pub fn new(ptr: Weak<T>) -> Self {
		WeakAddr {
			addr: Addr::of_weak(&ptr),
			ptr,
		}
	}

	pub fn is_dead(&self) -> bool {
		self.ptr.strong_count() == 0
	}
}

impl<T: ?Sized> Clone for WeakAddr<T> {
	fn clone(&self) -> Self {
		WeakAddr {
			addr: self.addr,
			ptr: self.ptr.clone(),
		}
	}
}

impl<T: ?Sized> Deref for WeakAddr<T> {
	type Target = Weak<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for WeakAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.addr == other.addr
	}
}

impl<T: ?Sized> Eq for WeakAddr<T> {}

impl<T: ?Sized> Hash for WeakAddr<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr.hash(state)
	}
}

impl<T: ?Sized> Ord for WeakAddr<T> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.addr.cmp(&other.addr)
	}
}

impl<T: ?Sized> PartialOrd for WeakAddr<T> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

#[cfg(test)]
mod tests {
	use std::any::Any;

	use super::*;

	#[test]
	fn same_allocation_through_different_types() {
		let value = Rc::new(5_u32);
		let erased: Rc<dyn Any> = value.clone();

		assert_eq!(Addr::of_rc(&value), Addr::of_rc(&erased));
		assert_eq!(Addr::of(&*value), Addr::of_rc(&value));
		assert_eq!(
			WeakAddr::new(Rc::downgrade(&erased)),
			WeakAddr::new(Rc::downgrade(&erased))
		);
	}

	#[test]
	fn dead_after_drop() {
		let value = Rc::new(String::from("target"));
		let weak = WeakAddr::new(Rc::downgrade(&value));
		assert!(!weak.is_dead());

		std::mem::drop(value);
		assert!(weak.is_dead());
	}
}
