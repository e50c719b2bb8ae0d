use std::rc::{Rc, Weak};

use fxhash::FxHashSet;

use crate::addr::Addr;
use crate::effect::{Job, Subscriber};

/// Host hook that runs a task after the current synchronous extent.
///
/// A runtime without one flushes only on explicit
/// [`Runtime::drain`](crate::Runtime::drain) calls.
pub trait Defer {
	fn defer(&self, task: Box<dyn FnOnce()>);
}

/// Pending jobs, deduplicated by effect.
///
/// Effects are held weakly: an effect dropped by its owner before the flush
/// does not run, and a runtime dropped with pending work frees it.
#[derive(Default)]
pub(crate) struct Queue {
	jobs: Vec<Weak<dyn Subscriber>>,
	queued: FxHashSet<Addr>,
	scheduled: bool,
	flushing: bool,
}

impl Queue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` when this call is the one that has to request a flush.
	pub fn push(&mut self, job: Job) -> bool {
		if self.queued.insert(job.addr()) {
			self.jobs.push(Rc::downgrade(&job.subscriber));
		}

		if self.scheduled {
			false
		} else {
			self.scheduled = true;
			true
		}
	}

	/// Takes the live jobs of the current cycle. Jobs pushed afterwards form
	/// the next one.
	pub fn take(&mut self) -> Vec<Job> {
		self.queued.clear();
		std::mem::take(&mut self.jobs)
			.into_iter()
			.filter_map(|subscriber| subscriber.upgrade())
			.map(|subscriber| Job { subscriber })
			.collect()
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_scheduled(&self) -> bool {
		self.scheduled
	}

	/// Returns `false` if a flush is already running or nothing is scheduled.
	pub fn begin_flush(&mut self) -> bool {
		if self.flushing || !self.scheduled {
			return false;
		}

		self.flushing = true;
		true
	}

	pub fn end_flush(&mut self) {
		self.flushing = false;
		self.scheduled = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{EffectOptions, Runtime};

	#[test]
	fn dedups_and_requests_flush_once() {
		let runtime = Runtime::new();
		let a = runtime.effect_with(|| (), EffectOptions::default().lazy());
		let b = runtime.effect_with(|| (), EffectOptions::default().lazy());

		let mut queue = Queue::new();
		assert!(queue.push(a.job()));
		assert!(!queue.push(a.job()));
		assert!(!queue.push(b.job()));
		assert_eq!(queue.len(), 2);

		assert!(queue.begin_flush());
		assert!(!queue.begin_flush());

		let cycle = queue.take();
		assert_eq!(cycle, vec![a.job(), b.job()]);

		// a job taken out may be queued again for the next cycle
		assert!(!queue.push(a.job()));
		assert_eq!(queue.len(), 1);

		queue.end_flush();
		assert!(!queue.is_scheduled());
	}

	#[test]
	fn dropped_effects_are_skipped() {
		let runtime = Runtime::new();
		let kept = runtime.effect_with(|| (), EffectOptions::default().lazy());
		let dropped = runtime.effect_with(|| (), EffectOptions::default().lazy());

		let mut queue = Queue::new();
		queue.push(dropped.job());
		queue.push(kept.job());
		std::mem::drop(dropped);

		assert_eq!(queue.take(), vec![kept.job()]);
	}

	#[test]
	fn nothing_to_flush() {
		let mut queue = Queue::new();
		assert!(!queue.begin_flush());
	}
}
