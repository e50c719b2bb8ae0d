use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::addr::{Addr, WeakAddr};
use crate::context::Context;
use crate::graph::{Graph, TargetRef};
use crate::reactive::{Object, Reactive};
use crate::scheduler::{Defer, Queue};
use crate::{Computed, Effect, EffectOptions, Job, Var};

/// Cycles a single [`Runtime::drain`] runs before giving up.
pub const MAX_FLUSH_CYCLES: usize = 100;

/// Owner of the dependency graph, the active-effect stack and the job queue.
///
/// Everything reactive is created against a runtime, and runtimes do not see
/// each other. The handle is cheap to clone and is neither `Send` nor `Sync`.
#[derive(Clone)]
pub struct Runtime {
	inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
	graph: RefCell<Graph>,
	context: Context,
	queue: RefCell<Queue>,
	defer: Option<Box<dyn Defer>>,
}

impl Default for Runtime {
	fn default() -> Self {
		Runtime::new()
	}
}

impl Runtime {
	/// A runtime that flushes on explicit [`Runtime::drain`] calls.
	pub fn new() -> Self {
		Self::build(None)
	}

	/// A runtime that asks `defer` to drain once per batch of writes.
	pub fn with_defer(defer: impl Defer + 'static) -> Self {
		Self::build(Some(Box::new(defer)))
	}

	fn build(defer: Option<Box<dyn Defer>>) -> Self {
		Runtime {
			inner: Rc::new(RuntimeInner {
				graph: RefCell::new(Graph::new()),
				context: Context::new(),
				queue: RefCell::new(Queue::new()),
				defer,
			}),
		}
	}

	pub(crate) fn context(&self) -> &Context {
		&self.inner.context
	}

	/// Subscribes the running effect, if any, to `(target, key)`.
	pub fn track<T: Any>(&self, target: &Rc<T>, key: &str) {
		self.track_ref(&target_ref(target), key)
	}

	/// Notifies the subscribers of `(target, key)`.
	pub fn trigger<T: Any>(&self, target: &Rc<T>, key: &str) {
		self.trigger_ref(&target_ref(target), key);
	}

	pub(crate) fn track_ref(&self, target: &TargetRef, key: &str) {
		let Some(active) = self.inner.context.active() else {
			return;
		};

		let dep = self.inner.graph.borrow_mut().dep(target, key);
		if dep.borrow_mut().insert(&active) {
			tracing::trace!(effect = active.name(), key, "track");
			active.depends_on(dep);
		}
	}

	/// Returns `true` if the running effect was among the subscribers and
	/// was left out.
	pub(crate) fn trigger_ref(&self, target: &TargetRef, key: &str) -> bool {
		let Some(dep) = self.inner.graph.borrow().get(target, key) else {
			return false;
		};

		// Running or scheduling a subscriber may change the live set.
		let subscribers = dep.borrow().snapshot();
		std::mem::drop(dep);

		tracing::trace!(key, subscribers = subscribers.len(), "trigger");

		let mut skipped = false;
		for (addr, subscriber) in subscribers {
			// An effect writing what it reads must not queue itself.
			if self.inner.context.is_active(addr) {
				skipped = true;
				continue;
			}

			if let Some(subscriber) = subscriber.upgrade() {
				subscriber.notify();
			}
		}

		skipped
	}

	/// Runs `func` with tracking suspended.
	pub fn untracked<R>(&self, func: impl FnOnce() -> R) -> R {
		let _guard = self.inner.context.enter(None);
		func()
	}

	/// Whether an effect is running right now.
	pub fn is_tracking(&self) -> bool {
		self.inner.context.active().is_some()
	}

	pub(crate) fn enqueue(&self, job: Job) {
		let request = self.inner.queue.borrow_mut().push(job);
		if !request {
			return;
		}

		tracing::trace!("flush requested");
		if let Some(defer) = &self.inner.defer {
			let weak: Weak<RuntimeInner> = Rc::downgrade(&self.inner);
			defer.defer(Box::new(move || {
				if let Some(inner) = weak.upgrade() {
					Runtime { inner }.drain()
				}
			}));
		}
	}

	/// Runs every pending job.
	///
	/// Jobs queued while the flush is running are picked up in a following
	/// cycle of the same call. A job that panics does not stop the others;
	/// once the queue is empty the first panic is resumed here. Calling
	/// `drain` from inside a job does nothing.
	///
	/// Effects that keep re-queueing each other are cut off after
	/// [`MAX_FLUSH_CYCLES`] cycles; the jobs still pending are dropped.
	pub fn drain(&self) {
		if !self.inner.queue.borrow_mut().begin_flush() {
			return;
		}

		let _flush = FlushGuard { runtime: self };
		let mut failure = None;
		let mut cycles = 0;
		let mut ran = 0;

		loop {
			let jobs = self.inner.queue.borrow_mut().take();
			if jobs.is_empty() {
				break;
			}

			if cycles == MAX_FLUSH_CYCLES {
				tracing::error!(
					cycles,
					dropped = jobs.len(),
					"flush did not settle, effects are re-queueing each other"
				);
				break;
			}

			cycles += 1;
			for job in jobs {
				ran += 1;
				if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
					tracing::error!(effect = job.name(), "effect panicked during flush");
					failure.get_or_insert(payload);
				}
			}
		}

		std::mem::drop(_flush);
		tracing::debug!(cycles, ran, "flush complete");

		if let Some(payload) = failure {
			panic::resume_unwind(payload);
		}
	}

	pub fn is_flush_scheduled(&self) -> bool {
		self.inner.queue.borrow().is_scheduled()
	}

	pub fn pending_jobs(&self) -> usize {
		self.inner.queue.borrow().len()
	}

	/// Drops graph entries of targets and effects that no longer exist.
	pub fn prune(&self) -> usize {
		let removed = self.inner.graph.borrow_mut().prune();
		tracing::debug!(removed, "pruned dependency graph");
		removed
	}

	/// Number of live effects subscribed to `(target, key)`.
	pub fn subscriber_count<T: Any>(&self, target: &Rc<T>, key: &str) -> usize {
		let Some(dep) = self.inner.graph.borrow().get(&target_ref(target), key) else {
			return 0;
		};

		let mut dep = dep.borrow_mut();
		dep.retain_alive();
		dep.len()
	}

	pub fn tracked_targets(&self) -> usize {
		self.inner.graph.borrow().target_count()
	}

	pub fn effect<R: 'static>(&self, func: impl Fn() -> R + 'static) -> Effect<R> {
		Effect::new(self, func)
	}

	pub fn effect_with<R: 'static>(
		&self,
		func: impl Fn() -> R + 'static,
		options: EffectOptions,
	) -> Effect<R> {
		Effect::with_options(self, func, options)
	}

	pub fn computed<T: 'static>(&self, getter: impl Fn() -> T + 'static) -> Computed<T> {
		Computed::new(self, getter)
	}

	pub fn var<T: 'static>(&self, value: T) -> Var<T> {
		Var::new(self, value)
	}

	pub fn reactive(&self, target: Object) -> Reactive {
		Reactive::new(self, target)
	}
}

fn target_ref<T: Any>(target: &Rc<T>) -> TargetRef {
	WeakAddr::new(Rc::downgrade(target) as Weak<dyn Any>)
}

/// Clears the flush state even if the loop is left by a panic that escaped
/// the per-job guard.
struct FlushGuard<'a> {
	runtime: &'a Runtime,
}

impl Drop for FlushGuard<'_> {
	fn drop(&mut self) {
		self.runtime.inner.queue.borrow_mut().end_flush();
	}
}

impl std::fmt::Debug for Runtime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Runtime")
			.field("address", &Addr::of_rc(&self.inner))
			.field("tracked_targets", &self.tracked_targets())
			.field("pending_jobs", &self.pending_jobs())
			.finish()
	}
}
