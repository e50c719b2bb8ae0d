//! Fine-grained reactive dependency tracking.
//!
//! Reads made while an [`Effect`] runs subscribe it to the `(target, key)`
//! pairs it read. Writes notify the subscribers of the pair written, and the
//! affected effects are re-run once per batch when the [`Runtime`] drains.
//! [`Computed`] values are cached and recomputed lazily on read.
//!
//! ```
//! use reactivity::Runtime;
//!
//! let runtime = Runtime::new();
//! let state = runtime.reactive([("a", 1), ("b", 2)].into_iter().collect());
//!
//! let sum = runtime.var(0);
//! let _effect = runtime.effect({
//! 	let (state, sum) = (state.clone(), sum.clone());
//! 	move || sum.set(state.get_int("a").unwrap_or(0) + state.get_int("b").unwrap_or(0))
//! });
//! assert_eq!(*sum.get_once(), 3);
//!
//! state.insert("a", 5);
//! assert_eq!(*sum.get_once(), 3);
//!
//! runtime.drain();
//! assert_eq!(*sum.get_once(), 7);
//! ```

pub mod macros;

mod addr;
mod computed;
mod context;
mod dependencies;
mod effect;
mod graph;
mod microtask;
mod reactive;
mod runtime;
mod scheduler;
mod var;

pub use computed::{Computed, VALUE};
pub use effect::{Effect, EffectOptions, Job, Scheduler};
pub use reactive::{Access, Field, Object, Reactive, Scalar, Value};
pub use runtime::{Runtime, MAX_FLUSH_CYCLES};
pub use scheduler::Defer;
pub use var::{Toggle, Var};

#[cfg(target_arch = "wasm32")]
pub use microtask::Microtask;
