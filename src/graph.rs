use std::any::Any;

use fxhash::FxHashMap;

use crate::addr::WeakAddr;
use crate::dependencies::{Dep, Dependents};

/// A property identifier scoped to one target.
pub(crate) type Key = std::borrow::Cow<'static, str>;

pub(crate) type TargetRef = WeakAddr<dyn Any>;

/// Target -> key -> dependency set.
///
/// Targets are held weakly. Entries for targets that were dropped stay until
/// [`Graph::prune`] runs; nothing can trigger them in the meantime.
#[derive(Default)]
pub(crate) struct Graph {
	targets: FxHashMap<TargetRef, FxHashMap<Key, Dep>>,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the set for `(target, key)`, creating it when absent.
	pub fn dep(&mut self, target: &TargetRef, key: &str) -> Dep {
		let keys = self.targets.entry(target.clone()).or_default();
		if let Some(dep) = keys.get(key) {
			return dep.clone();
		}

		let dep = Dependents::new();
		keys.insert(Key::Owned(key.to_owned()), dep.clone());
		dep
	}

	pub fn get(&self, target: &TargetRef, key: &str) -> Option<Dep> {
		self.targets.get(target)?.get(key).cloned()
	}

	pub fn target_count(&self) -> usize {
		self.targets.len()
	}

	/// Removes dead targets, dead subscribers and the empty sets they leave.
	/// Returns how many dependency sets were dropped.
	pub fn prune(&mut self) -> usize {
		let mut removed = 0;

		self.targets.retain(|target, keys| {
			if target.is_dead() {
				removed += keys.len();
				return false;
			}

			keys.retain(|_, dep| {
				let mut dep = dep.borrow_mut();
				dep.retain_alive();
				if dep.is_empty() {
					removed += 1;
					false
				} else {
					true
				}
			});

			!keys.is_empty()
		});

		removed
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;

	fn target_of<T: Any>(value: &Rc<T>) -> TargetRef {
		WeakAddr::new(Rc::downgrade(value) as std::rc::Weak<dyn Any>)
	}

	#[test]
	fn dep_is_created_once() {
		let mut graph = Graph::new();
		let target = Rc::new(());
		let target = target_of(&target);

		assert!(graph.get(&target, "a").is_none());

		let first = graph.dep(&target, "a");
		let second = graph.dep(&target, "a");
		assert!(Rc::ptr_eq(&first, &second));
		assert!(graph.get(&target, "b").is_none());
		assert_eq!(graph.target_count(), 1);
	}

	#[test]
	fn prune_drops_dead_targets_and_empty_sets() {
		let mut graph = Graph::new();
		let alive = Rc::new(1);
		let dead = Rc::new(2);

		graph.dep(&target_of(&alive), "a");
		graph.dep(&target_of(&dead), "a");
		graph.dep(&target_of(&dead), "b");
		std::mem::drop(dead);

		// every set is empty, so the live target goes too
		assert_eq!(graph.prune(), 3);
		assert_eq!(graph.target_count(), 0);
	}
}
