//! Active-effect context.
//!
//! A stack of running effects. The top frame is the effect that reads get
//! attributed to; a `None` frame suspends tracking (see
//! [`Runtime::untracked`](crate::Runtime::untracked)).

use std::cell::RefCell;
use std::rc::Rc;

use crate::addr::Addr;
use crate::effect::Subscriber;

#[derive(Default)]
pub(crate) struct Context {
	stack: RefCell<Vec<Option<Rc<dyn Subscriber>>>>,
}

impl Context {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn active(&self) -> Option<Rc<dyn Subscriber>> {
		self.stack.borrow().last().cloned().flatten()
	}

	pub fn is_active(&self, addr: Addr) -> bool {
		match self.stack.borrow().last() {
			Some(Some(active)) => Addr::of_rc(active) == addr,
			_ => false,
		}
	}

	/// Pushes a frame. It is popped when the guard drops, which includes
	/// unwinding out of the effect function.
	pub fn enter(&self, frame: Option<Rc<dyn Subscriber>>) -> ContextGuard<'_> {
		let mut stack = self.stack.borrow_mut();
		stack.push(frame);
		ContextGuard {
			context: self,
			depth: stack.len(),
		}
	}
}

pub(crate) struct ContextGuard<'a> {
	context: &'a Context,
	depth: usize,
}

impl Drop for ContextGuard<'_> {
	fn drop(&mut self) {
		let mut stack = self.context.stack.borrow_mut();
		debug_assert_eq!(
			stack.len(),
			self.depth,
			"active effect stack was left unbalanced"
		);
		let frame = stack.pop();
		std::mem::drop(stack);
		std::mem::drop(frame);
	}
}
