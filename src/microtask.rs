#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;

use crate::Defer;

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_name = queueMicrotask)]
	fn queue_microtask(closure: &JsValue);
}

/// Drains after the current task through the host microtask queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct Microtask;

impl Defer for Microtask {
	fn defer(&self, task: Box<dyn FnOnce()>) {
		queue_microtask(&Closure::once_into_js(move || task()));
	}
}
