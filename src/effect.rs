use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use crate::addr::Addr;
use crate::dependencies::{Dep, Dependencies};
use crate::Runtime;

/// Dispatch hook that replaces the default batched queue for one effect.
pub type Scheduler = Rc<dyn Fn(Job)>;

/// Type-erased view of an effect used by the graph, the context and the queue.
pub(crate) trait Subscriber: 'static {
	fn name(&self) -> &'static str;

	/// Called by `trigger` when one of the dependencies changed.
	fn notify(self: Rc<Self>);

	/// Re-runs the effect, discarding its result.
	fn execute(self: Rc<Self>);

	fn depends_on(&self, dep: Dep);
}

#[derive(Clone)]
pub struct EffectOptions {
	pub lazy: bool,
	pub scheduler: Option<Scheduler>,
	pub name: &'static str,
}

impl Default for EffectOptions {
	fn default() -> Self {
		EffectOptions {
			lazy: false,
			scheduler: None,
			name: "<unnamed>",
		}
	}
}

impl EffectOptions {
	/// Skip the first run at construction.
	pub fn lazy(mut self) -> Self {
		self.lazy = true;
		self
	}

	pub fn scheduler(mut self, scheduler: impl Fn(Job) + 'static) -> Self {
		self.scheduler = Some(Rc::new(scheduler));
		self
	}

	pub fn name(mut self, name: &'static str) -> Self {
		self.name = name;
		self
	}
}

/// A computation that records what it reads and can be re-run.
///
/// Each run first leaves every dependency set of the previous run, so after a
/// run the effect is subscribed to exactly what that run read.
pub struct Effect<R = ()> {
	body: Rc<EffectBody<R>>,
}

impl<R> Clone for Effect<R> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub(crate) struct EffectBody<R> {
	runtime: Runtime,
	name: &'static str,
	func: Box<dyn Fn() -> R>,
	scheduler: Option<Scheduler>,
	dependencies: RefCell<Dependencies>,
	runs: Cell<usize>,
}

impl<R> Drop for EffectBody<R> {
	fn drop(&mut self) {
		let addr = Addr::of(&*self);
		self.dependencies.get_mut().clear(addr);
	}
}

impl<R: 'static> Effect<R> {
	/// Creates an effect and runs it once.
	pub fn new(runtime: &Runtime, func: impl Fn() -> R + 'static) -> Self {
		Self::with_options(runtime, func, EffectOptions::default())
	}

	pub fn with_options(
		runtime: &Runtime,
		func: impl Fn() -> R + 'static,
		options: EffectOptions,
	) -> Self {
		let effect = Effect {
			body: Rc::new(EffectBody {
				runtime: runtime.clone(),
				name: options.name,
				func: Box::new(func),
				scheduler: options.scheduler,
				dependencies: RefCell::new(Dependencies::new()),
				runs: Cell::new(0),
			}),
		};

		if !options.lazy {
			effect.run();
		}

		effect
	}

	/// Re-runs the computation and returns its result.
	///
	/// A panic inside the function propagates to the caller; the active
	/// effect is restored either way.
	pub fn run(&self) -> R {
		self.body.run()
	}

	/// A handle that re-runs this effect, as passed to schedulers.
	pub fn job(&self) -> Job {
		Job {
			subscriber: self.body.clone(),
		}
	}

	pub fn name(&self) -> &'static str {
		self.body.name
	}

	/// Number of dependency sets the last run subscribed to.
	pub fn dependency_count(&self) -> usize {
		self.body.dependencies.borrow().len()
	}

	/// How many times the function has been entered.
	pub fn run_count(&self) -> usize {
		self.body.runs.get()
	}
}

impl<R: 'static> EffectBody<R> {
	fn run(self: &Rc<Self>) -> R {
		self.cleanup();

		let _span = tracing::trace_span!("effect", name = self.name).entered();
		self.runs.set(self.runs.get() + 1);

		let runtime = self.runtime.clone();
		let _guard = runtime
			.context()
			.enter(Some(self.clone() as Rc<dyn Subscriber>));

		(self.func)()
	}

	fn cleanup(&self) {
		let addr = Addr::of(self);
		self.dependencies.borrow_mut().clear(addr);
	}
}

impl<R: 'static> Subscriber for EffectBody<R> {
	fn name(&self) -> &'static str {
		self.name
	}

	fn notify(self: Rc<Self>) {
		match &self.scheduler {
			Some(scheduler) => {
				let scheduler = scheduler.clone();
				scheduler(Job { subscriber: self })
			}
			None => {
				let runtime = self.runtime.clone();
				runtime.enqueue(Job { subscriber: self })
			}
		}
	}

	fn execute(self: Rc<Self>) {
		let _ = self.run();
	}

	fn depends_on(&self, dep: Dep) {
		self.dependencies.borrow_mut().based_on(dep);
	}
}

/// A pending re-run of an effect.
///
/// Jobs compare by the effect they belong to; the default queue keeps at most
/// one job per effect.
#[derive(Clone)]
pub struct Job {
	pub(crate) subscriber: Rc<dyn Subscriber>,
}

impl Job {
	pub fn run(&self) {
		self.subscriber.clone().execute()
	}

	pub fn name(&self) -> &'static str {
		self.subscriber.name()
	}

	pub(crate) fn addr(&self) -> Addr {
		Addr::of_rc(&self.subscriber)
	}
}

impl PartialEq for Job {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl Eq for Job {}

impl Debug for Job {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Job").field("name", &self.name()).finish()
	}
}

impl<R> Debug for Effect<R> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Effect")
			.field("name", &self.body.name)
			.finish()
	}
}
