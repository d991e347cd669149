//! History adapter.
//!
//! [`RouterHistory`] keeps the router's view of session history in sync with
//! a [`BrowsingContext`]. Every entry it writes carries a [`HistoryEntry`]
//! whose `position` lets popstate handlers tell back from forward.
//!
//! Two strategies share the same adapter:
//!
//! - [`create_web_history`]: clean paths under a base (`/app/about`).
//! - [`create_web_hash_history`]: paths inside the fragment
//!   (`/index.html#/about`).

mod entry;

pub use entry::{HistoryConfig, HistoryEntry, HistoryMode, NavigationDirection, NavigationInfo};

use crate::context::BrowsingContext;
use crate::error::HistoryError;
use crate::location::{self, normalize_base};
use crate::scroll::{SavedScrollPositions, ScrollPosition};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Observer of browser-initiated transitions, called with the new
/// location, the previous one and the movement details.
pub type HistoryListener = Rc<dyn Fn(&str, &str, NavigationInfo)>;

/// Handle returned by [`RouterHistory::listen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct HistoryInner {
	context: Rc<dyn BrowsingContext>,
	base: String,
	mode: HistoryMode,
	location: RefCell<String>,
	state: RefCell<HistoryEntry>,
	listeners: RefCell<Vec<(ListenerId, HistoryListener)>>,
	next_listener: Cell<u64>,
	// Location at the time listeners were paused.
	paused_at: RefCell<Option<String>>,
	saved_scroll: SavedScrollPositions,
}

/// Session-history adapter shared by the router and the popstate handler.
#[derive(Clone)]
pub struct RouterHistory {
	inner: Rc<HistoryInner>,
}

impl fmt::Debug for RouterHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterHistory")
			.field("base", &self.inner.base)
			.field("mode", &self.inner.mode)
			.field("location", &*self.inner.location.borrow())
			.field("state", &*self.inner.state.borrow())
			.finish_non_exhaustive()
	}
}

impl RouterHistory {
	/// Creates an adapter over `context`.
	///
	/// `base` must already be normalized. When the current entry carries no
	/// router state, one is written for the current location.
	pub fn new(
		context: Rc<dyn BrowsingContext>,
		base: String,
		mode: HistoryMode,
	) -> Result<Self, HistoryError> {
		let current = location::current_location(&base, &context.url());
		let stored = match context.history_state() {
			Ok(state) => state,
			Err(HistoryError::StateDecode(reason)) => {
				tracing::warn!(%reason, "ignoring undecodable history state");
				None
			}
			Err(err) => return Err(err),
		};

		let (state, bootstrap) = match stored {
			Some(state) => (state, false),
			None => {
				let position = context.history_length().saturating_sub(1) as i64;
				(
					HistoryEntry::new(None, current.clone(), None, true, None, position),
					true,
				)
			}
		};

		let history = Self {
			inner: Rc::new(HistoryInner {
				context,
				base,
				mode,
				location: RefCell::new(current.clone()),
				state: RefCell::new(state.clone()),
				listeners: RefCell::new(Vec::new()),
				next_listener: Cell::new(0),
				paused_at: RefCell::new(None),
				saved_scroll: SavedScrollPositions::default(),
			}),
		};
		if bootstrap {
			history.change_location(&current, state, true)?;
		}

		let weak: Weak<HistoryInner> = Rc::downgrade(&history.inner);
		history
			.inner
			.context
			.on_pop_state(Rc::new(move |state: Option<HistoryEntry>| {
				if let Some(inner) = weak.upgrade() {
					RouterHistory { inner }.handle_pop_state(state);
				}
			}));

		tracing::debug!(
			base = %history.inner.base,
			mode = ?mode,
			location = %current,
			"history adapter ready"
		);
		Ok(history)
	}

	/// The router's current location (`path?query#hash`).
	pub fn location(&self) -> String {
		self.inner.location.borrow().clone()
	}

	/// The entry for the current location.
	pub fn state(&self) -> HistoryEntry {
		self.inner.state.borrow().clone()
	}

	/// Normalized base.
	pub fn base(&self) -> &str {
		&self.inner.base
	}

	/// Strategy in use.
	pub fn mode(&self) -> HistoryMode {
		self.inner.mode
	}

	/// The browsing context the adapter writes to.
	pub fn context(&self) -> &Rc<dyn BrowsingContext> {
		&self.inner.context
	}

	/// The href written to session history for `location`.
	pub fn create_href(&self, location: &str) -> String {
		location::create_href(&self.inner.base, location)
	}

	/// Records a new entry for `to`.
	///
	/// The outgoing entry is rewritten first with the current scroll offset
	/// and `forward = to`.
	pub fn push(&self, to: &str, extra: Option<&Map<String, Value>>) -> Result<(), HistoryError> {
		let mut outgoing = self.state();
		outgoing.forward = Some(to.to_string());
		outgoing.scroll = Some(self.inner.context.scroll_position());
		let outgoing_location = outgoing.current.clone();
		let position = outgoing.position;
		self.change_location(&outgoing_location, outgoing, true)?;

		let back = self.location();
		let entry = HistoryEntry::new(Some(back), to, None, false, None, position + 1)
			.with_extra(extra);
		self.change_location(to, entry, false)?;
		*self.inner.location.borrow_mut() = to.to_string();
		Ok(())
	}

	/// Overwrites the current entry with `to`, keeping its stack position
	/// and neighbours. Data attached to the old entry is dropped.
	pub fn replace(&self, to: &str, extra: Option<&Map<String, Value>>) -> Result<(), HistoryError> {
		let previous = self.state();
		let entry = HistoryEntry::new(
			previous.back,
			to,
			previous.forward,
			true,
			None,
			previous.position,
		)
		.with_extra(extra);
		self.change_location(to, entry, true)?;
		*self.inner.location.borrow_mut() = to.to_string();
		Ok(())
	}

	fn change_location(&self, to: &str, entry: HistoryEntry, replace: bool) -> Result<(), HistoryError> {
		let href = self.create_href(to);
		if replace {
			self.inner.context.replace_state(&entry, &href)?;
		} else {
			self.inner.context.push_state(&entry, &href)?;
		}
		tracing::debug!(
			href = %href,
			position = entry.position,
			replace,
			"history entry written"
		);
		*self.inner.state.borrow_mut() = entry;
		Ok(())
	}

	/// Registers an observer of browser-initiated transitions.
	pub fn listen(&self, listener: HistoryListener) -> ListenerId {
		let id = ListenerId(self.inner.next_listener.get());
		self.inner.next_listener.set(id.0 + 1);
		self.inner.listeners.borrow_mut().push((id, listener));
		id
	}

	/// Removes an observer. Returns false if it was not registered.
	pub fn unlisten(&self, id: ListenerId) -> bool {
		let mut listeners = self.inner.listeners.borrow_mut();
		let before = listeners.len();
		listeners.retain(|(lid, _)| *lid != id);
		listeners.len() != before
	}

	/// Moves through session history.
	///
	/// With `trigger_listeners == false` the resulting transition updates
	/// the adapter without notifying observers. A move that would leave the
	/// stack is ignored.
	pub fn go(&self, delta: i64, trigger_listeners: bool) {
		let target = self.state().position + delta;
		let length = self.inner.context.history_length() as i64;
		if delta == 0 || target < 0 || target >= length {
			tracing::debug!(delta, target, length, "history move out of range ignored");
			return;
		}
		if !trigger_listeners {
			*self.inner.paused_at.borrow_mut() = Some(self.location());
		}
		self.inner.context.go(delta);
	}

	/// Equivalent to `go(-1, true)`.
	pub fn back(&self) {
		self.go(-1, true);
	}

	/// Equivalent to `go(1, true)`.
	pub fn forward(&self) {
		self.go(1, true);
	}

	/// Returns the scroll offset saved when the entry at `position` was left.
	pub(crate) fn take_saved_scroll(&self, position: i64) -> Option<ScrollPosition> {
		self.inner.saved_scroll.take(position)
	}

	fn handle_pop_state(&self, state: Option<HistoryEntry>) {
		let to = location::current_location(&self.inner.base, &self.inner.context.url());
		let from = self.location();
		let from_state = self.state();

		let delta = match state {
			Some(state) => {
				let delta = state.position - from_state.position;
				*self.inner.location.borrow_mut() = to.clone();
				*self.inner.state.borrow_mut() = state;

				let paused = self.inner.paused_at.borrow().as_deref() == Some(from.as_str());
				if paused {
					self.inner.paused_at.borrow_mut().take();
					tracing::debug!(to = %to, from = %from, "popstate handled silently");
					return;
				}
				delta
			}
			None => {
				// The browser appended this entry on top of the one just left.
				let entry = HistoryEntry::new(
					Some(from.clone()),
					to.clone(),
					None,
					true,
					None,
					from_state.position + 1,
				);
				if let Err(err) = self.change_location(&to, entry.clone(), true) {
					tracing::error!(to = %to, error = %err, "failed to record entry without state");
					*self.inner.state.borrow_mut() = entry;
				}
				*self.inner.location.borrow_mut() = to.clone();
				0
			}
		};

		if delta != 0 {
			self.inner
				.saved_scroll
				.save(from_state.position, self.inner.context.scroll_position());
		}

		let info = NavigationInfo::from_delta(delta);
		tracing::debug!(to = %to, from = %from, delta, "popstate");

		let listeners: Vec<HistoryListener> = self
			.inner
			.listeners
			.borrow()
			.iter()
			.map(|(_, listener)| Rc::clone(listener))
			.collect();
		for listener in listeners {
			listener(&to, &from, info);
		}
	}
}

/// Clean-path history under `base`.
pub fn create_web_history(
	context: Rc<dyn BrowsingContext>,
	base: &str,
) -> Result<RouterHistory, HistoryError> {
	RouterHistory::new(context, normalize_base(base), HistoryMode::Path)
}

/// Fragment-prefixed history.
///
/// An empty `base` defaults to the current pathname and search; a base
/// without `#` gets one appended.
pub fn create_web_hash_history(
	context: Rc<dyn BrowsingContext>,
	base: &str,
) -> Result<RouterHistory, HistoryError> {
	let mut base = if base.is_empty() {
		let parts = context.url();
		format!("{}{}", parts.pathname, parts.search)
	} else {
		base.to_string()
	};
	if !base.contains('#') {
		base.push('#');
	}
	RouterHistory::new(context, normalize_base(&base), HistoryMode::Hash)
}

/// Builds the adapter described by `config`.
pub fn create_history(
	context: Rc<dyn BrowsingContext>,
	config: &HistoryConfig,
) -> Result<RouterHistory, HistoryError> {
	match config.mode {
		HistoryMode::Path => create_web_history(context, &config.base),
		HistoryMode::Hash => create_web_hash_history(context, &config.base),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::MemoryContext;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn context() -> Rc<MemoryContext> {
		Rc::new(MemoryContext::new("/"))
	}

	fn path_history(context: &Rc<MemoryContext>) -> RouterHistory {
		create_web_history(Rc::clone(context) as Rc<dyn BrowsingContext>, "/").unwrap()
	}

	#[rstest]
	fn test_bootstrap_writes_initial_entry(context: Rc<MemoryContext>) {
		let history = path_history(&context);

		let state = context.state_at(0).unwrap();
		assert_eq!(state.current, "/");
		assert_eq!(state.position, 0);
		assert!(state.replaced);
		assert_eq!(history.location(), "/");
	}

	#[rstest]
	fn test_existing_entry_is_reused(context: Rc<MemoryContext>) {
		let _first = path_history(&context);
		let entry = HistoryEntry::new(None, "/", None, false, None, 7);
		context.replace_state(&entry, "/").unwrap();

		let second = path_history(&context);
		assert_eq!(second.state().position, 7);
	}

	#[rstest]
	fn test_push_chains_back_pointers(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		history.push("/about", None).unwrap();
		history.push("/a", None).unwrap();

		assert_eq!(context.hrefs(), vec!["/", "/about", "/a"]);
		let root = context.state_at(0).unwrap();
		let about = context.state_at(1).unwrap();
		let a = context.state_at(2).unwrap();

		assert_eq!(root.forward.as_deref(), Some("/about"));
		assert_eq!(about.back.as_deref(), Some("/"));
		assert_eq!(about.forward.as_deref(), Some("/a"));
		assert_eq!(about.position, 1);
		assert_eq!(a.back.as_deref(), Some("/about"));
		assert_eq!(a.position, 2);
		assert_eq!(history.location(), "/a");
	}

	#[rstest]
	fn test_push_snapshots_scroll(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		context.scroll_to(ScrollPosition::new(0.0, 300.0));
		history.push("/about", None).unwrap();

		assert_eq!(
			context.state_at(0).unwrap().scroll,
			Some(ScrollPosition::new(0.0, 300.0))
		);
	}

	#[rstest]
	fn test_replace_keeps_position_and_takes_new_extra(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		let mut draft = Map::new();
		draft.insert("draft".to_string(), json!(1));
		history.push("/about", Some(&draft)).unwrap();
		let mut tab = Map::new();
		tab.insert("tab".to_string(), json!("profile"));
		history.replace("/contact", Some(&tab)).unwrap();

		let state = history.state();
		assert_eq!(state.current, "/contact");
		assert_eq!(state.back.as_deref(), Some("/"));
		assert_eq!(state.position, 1);
		assert!(state.replaced);
		assert_eq!(state.extra.len(), 1);
		assert_eq!(state.extra.get("tab"), Some(&json!("profile")));
		assert_eq!(context.hrefs(), vec!["/", "/contact"]);
	}

	#[rstest]
	fn test_replace_without_extra_drops_old_data(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		let mut draft = Map::new();
		draft.insert("draft".to_string(), json!(1));
		history.push("/a", Some(&draft)).unwrap();

		history.replace("/b", None).unwrap();

		assert!(history.state().extra.is_empty());
		assert!(context.state_at(1).unwrap().extra.is_empty());
	}

	#[rstest]
	fn test_listeners_get_direction(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		history.push("/about", None).unwrap();

		let seen = Rc::new(RefCell::new(Vec::new()));
		let log = Rc::clone(&seen);
		history.listen(Rc::new(move |to: &str, from: &str, info: NavigationInfo| {
			log.borrow_mut()
				.push((to.to_string(), from.to_string(), info.is_back));
		}));

		history.back();
		history.forward();

		assert_eq!(
			*seen.borrow(),
			vec![
				("/".to_string(), "/about".to_string(), true),
				("/about".to_string(), "/".to_string(), false),
			]
		);
	}

	#[rstest]
	fn test_paused_go_skips_listeners(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		history.push("/about", None).unwrap();

		let hits = Rc::new(Cell::new(0));
		let counter = Rc::clone(&hits);
		history.listen(Rc::new(move |_: &str, _: &str, _: NavigationInfo| {
			counter.set(counter.get() + 1)
		}));

		history.go(-1, false);
		assert_eq!(hits.get(), 0);
		assert_eq!(history.location(), "/");

		history.forward();
		assert_eq!(hits.get(), 1);
	}

	#[rstest]
	fn test_unlisten(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		history.push("/about", None).unwrap();

		let hits = Rc::new(Cell::new(0));
		let counter = Rc::clone(&hits);
		let id = history.listen(Rc::new(move |_: &str, _: &str, _: NavigationInfo| {
			counter.set(counter.get() + 1)
		}));
		assert!(history.unlisten(id));

		history.back();
		assert_eq!(hits.get(), 0);
	}

	#[rstest]
	fn test_entry_without_state_is_normalized(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		let seen = Rc::new(RefCell::new(None));
		let slot = Rc::clone(&seen);
		history.listen(Rc::new(move |to: &str, _: &str, info: NavigationInfo| {
			*slot.borrow_mut() = Some((to.to_string(), info.delta));
		}));

		context.enter_url("/typed?x=1");

		assert_eq!(*seen.borrow(), Some(("/typed?x=1".to_string(), 0)));
		let state = context.state_at(1).unwrap();
		assert_eq!(state.current, "/typed?x=1");
		assert!(state.replaced);
	}

	#[rstest]
	fn test_entry_without_state_takes_next_position(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		history.push("/about", None).unwrap();
		context.enter_url("/typed");

		let typed = history.state();
		assert_eq!(typed.position, 2);
		assert_eq!(typed.back.as_deref(), Some("/about"));

		let seen = Rc::new(RefCell::new(Vec::new()));
		let log = Rc::clone(&seen);
		history.listen(Rc::new(move |to: &str, from: &str, info: NavigationInfo| {
			log.borrow_mut()
				.push((to.to_string(), from.to_string(), info.delta, info.is_back));
		}));
		context.scroll_to(ScrollPosition::new(0.0, 80.0));

		history.back();
		history.forward();

		assert_eq!(
			*seen.borrow(),
			vec![
				("/about".to_string(), "/typed".to_string(), -1, true),
				("/typed".to_string(), "/about".to_string(), 1, false),
			]
		);
		assert_eq!(
			history.take_saved_scroll(2),
			Some(ScrollPosition::new(0.0, 80.0))
		);
	}

	#[rstest]
	fn test_go_out_of_range_does_not_pause(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		history.push("/about", None).unwrap();

		let hits = Rc::new(Cell::new(0));
		let counter = Rc::clone(&hits);
		history.listen(Rc::new(move |_: &str, _: &str, _: NavigationInfo| {
			counter.set(counter.get() + 1)
		}));

		history.go(1, false);
		assert_eq!(history.location(), "/about");
		assert_eq!(context.index(), 1);

		history.back();
		assert_eq!(hits.get(), 1);
		assert_eq!(history.location(), "/");
	}

	#[rstest]
	fn test_back_saves_scroll_of_left_entry(context: Rc<MemoryContext>) {
		let history = path_history(&context);
		history.push("/about", None).unwrap();
		context.scroll_to(ScrollPosition::new(0.0, 42.0));

		history.back();

		assert_eq!(
			history.take_saved_scroll(1),
			Some(ScrollPosition::new(0.0, 42.0))
		);
	}

	#[rstest]
	fn test_base_is_stripped_and_prepended() {
		let context = Rc::new(MemoryContext::new("/app/users"));
		let history =
			create_web_history(Rc::clone(&context) as Rc<dyn BrowsingContext>, "/app/").unwrap();

		assert_eq!(history.base(), "/app");
		assert_eq!(history.location(), "/users");
		history.push("/about", None).unwrap();
		assert_eq!(context.current_href(), "/app/about");
	}

	#[rstest]
	fn test_hash_history_defaults_base_to_pathname() {
		let context = Rc::new(MemoryContext::new("/index.html"));
		let history =
			create_web_hash_history(Rc::clone(&context) as Rc<dyn BrowsingContext>, "").unwrap();

		assert_eq!(history.base(), "/index.html#");
		assert_eq!(history.mode(), HistoryMode::Hash);
		assert_eq!(history.location(), "/");

		history.push("/about", None).unwrap();
		assert_eq!(context.current_href(), "/index.html#/about");
		assert_eq!(history.create_href("/x"), "#/x");
	}

	#[rstest]
	fn test_create_history_from_config(context: Rc<MemoryContext>) {
		let history = create_history(
			Rc::clone(&context) as Rc<dyn BrowsingContext>,
			&HistoryConfig::hash("/"),
		)
		.unwrap();
		assert_eq!(history.base(), "/#");
	}
}
