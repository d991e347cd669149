//! Router configuration.

use crate::history::RouterHistory;
use crate::record::RouteDef;
use crate::router::RouteLocation;
use crate::scroll::{ScrollBehavior, ScrollPosition};
use futures::future::LocalBoxFuture;
use std::fmt;
use std::rc::Rc;

/// Drives navigations the router starts on its own (browser back/forward).
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// Default number of consecutive redirects tolerated in one navigation.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Options for [`Router::new`](crate::Router::new).
///
/// # Example
///
/// ```
/// use reinhardt_navigation::{RouteDef, RouterOptions};
/// use reinhardt_navigation::context::{BrowsingContext, MemoryContext};
/// use reinhardt_navigation::history::create_web_history;
/// use std::rc::Rc;
///
/// let context: Rc<dyn BrowsingContext> = Rc::new(MemoryContext::new("/"));
/// let options = RouterOptions::new(create_web_history(context, "/").unwrap())
/// 	.route(RouteDef::new("/").name("Home"))
/// 	.route(RouteDef::new("/about").name("About"))
/// 	.max_redirects(5);
/// assert_eq!(options.route_count(), 2);
/// ```
pub struct RouterOptions {
	pub(crate) history: RouterHistory,
	pub(crate) routes: Vec<RouteDef>,
	pub(crate) spawner: Option<Spawner>,
	pub(crate) max_redirects: usize,
	pub(crate) scroll_behavior: Option<ScrollBehavior>,
}

impl fmt::Debug for RouterOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterOptions")
			.field("history", &self.history)
			.field("routes", &self.routes)
			.field("has_spawner", &self.spawner.is_some())
			.field("max_redirects", &self.max_redirects)
			.field("has_scroll_behavior", &self.scroll_behavior.is_some())
			.finish()
	}
}

impl RouterOptions {
	/// Creates options around a history adapter.
	pub fn new(history: RouterHistory) -> Self {
		Self {
			history,
			routes: Vec::new(),
			spawner: default_spawner(),
			max_redirects: DEFAULT_MAX_REDIRECTS,
			scroll_behavior: None,
		}
	}

	/// Adds a top-level route.
	pub fn route(mut self, route: RouteDef) -> Self {
		self.routes.push(route);
		self
	}

	/// Adds several top-level routes.
	pub fn routes(mut self, routes: impl IntoIterator<Item = RouteDef>) -> Self {
		self.routes.extend(routes);
		self
	}

	/// Sets the spawner for browser-initiated navigations.
	pub fn spawner(mut self, spawner: impl Fn(LocalBoxFuture<'static, ()>) + 'static) -> Self {
		self.spawner = Some(Rc::new(spawner));
		self
	}

	/// Sets how many consecutive redirects a navigation may follow.
	pub fn max_redirects(mut self, max_redirects: usize) -> Self {
		self.max_redirects = max_redirects;
		self
	}

	/// Sets the hook deciding where to scroll after each commit.
	pub fn scroll_behavior<F>(mut self, behavior: F) -> Self
	where
		F: Fn(&RouteLocation, &RouteLocation, Option<ScrollPosition>) -> Option<ScrollPosition>
			+ 'static,
	{
		self.scroll_behavior = Some(Rc::new(behavior));
		self
	}

	/// Number of top-level routes.
	pub fn route_count(&self) -> usize {
		self.routes.len()
	}
}

#[cfg(target_arch = "wasm32")]
fn default_spawner() -> Option<Spawner> {
	Some(Rc::new(|future: LocalBoxFuture<'static, ()>| {
		wasm_bindgen_futures::spawn_local(future)
	}))
}

#[cfg(not(target_arch = "wasm32"))]
fn default_spawner() -> Option<Spawner> {
	None
}
