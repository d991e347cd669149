//! Depth-indexed access to the current matched chain.
//!
//! A [`RouterView`] at depth `n` exposes the `n`-th record of the current
//! location, so nested layouts each render their own level.

use super::core::Router;
use crate::record::{RouteRecord, ViewBinding};
use std::rc::Rc;

/// The record rendered at one nesting level.
#[derive(Debug, Clone)]
pub struct RouterView {
	router: Router,
	depth: usize,
}

impl RouterView {
	/// The outermost view.
	pub fn new(router: Router) -> Self {
		Self { router, depth: 0 }
	}

	/// The view one level deeper.
	pub fn nested(&self) -> Self {
		Self {
			router: self.router.clone(),
			depth: self.depth + 1,
		}
	}

	/// Nesting level, `0` for the outermost view.
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Record active at this depth.
	pub fn record(&self) -> Option<Rc<RouteRecord>> {
		self.router
			.current_route_signal()
			.with(|route| route.matched().get(self.depth).cloned())
	}

	/// View bound to the active record.
	pub fn component(&self) -> Option<ViewBinding> {
		self.record().and_then(|record| record.component().cloned())
	}

	/// Calls `render` with the bound view when it is a `T`.
	pub fn render<T: 'static, R>(&self, render: impl FnOnce(&T) -> R) -> Option<R> {
		let component = self.component()?;
		component.downcast_ref::<T>().map(render)
	}
}
