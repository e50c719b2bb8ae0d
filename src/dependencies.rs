use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::addr::Addr;
use crate::effect::Subscriber;

/// Subscribers of a single (target, key) pair.
///
/// Shared between the graph and every effect that is a member, so an effect
/// can leave the set without going through the graph.
pub(crate) type Dep = Rc<RefCell<Dependents>>;

#[derive(Default)]
pub(crate) struct Dependents {
	subscribers: BTreeMap<Addr, Weak<dyn Subscriber>>,
}

impl Dependents {
	pub fn new() -> Dep {
		Rc::new(RefCell::new(Dependents::default()))
	}

	/// Returns `false` when the subscriber was already a member.
	pub fn insert(&mut self, subscriber: &Rc<dyn Subscriber>) -> bool {
		let addr = Addr::of_rc(subscriber);
		if self.subscribers.contains_key(&addr) {
			return false;
		}

		self.subscribers.insert(addr, Rc::downgrade(subscriber));
		true
	}

	pub fn remove(&mut self, addr: &Addr) {
		self.subscribers.remove(addr);
	}

	pub fn len(&self) -> usize {
		self.subscribers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.subscribers.is_empty()
	}

	pub fn snapshot(&self) -> SmallVec<[(Addr, Weak<dyn Subscriber>); 8]> {
		self.subscribers
			.iter()
			.map(|(addr, sub)| (*addr, sub.clone()))
			.collect()
	}

	/// Drops entries whose effect no longer exists.
	pub fn retain_alive(&mut self) {
		self.subscribers.retain(|_, sub| sub.strong_count() > 0);
	}
}

/// The dependency sets an effect is currently a member of.
#[derive(Default)]
pub(crate) struct Dependencies {
	member_of: SmallVec<[Dep; 4]>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self {
			member_of: SmallVec::new(),
		}
	}

	pub fn based_on(&mut self, dep: Dep) {
		self.member_of.push(dep);
	}

	pub fn len(&self) -> usize {
		self.member_of.len()
	}

	/// Leaves every set and forgets them.
	pub fn clear(&mut self, subscriber: Addr) {
		for dep in self.member_of.drain(..) {
			dep.borrow_mut().remove(&subscriber);
		}
	}
}
