//! In-memory session history.

use super::{BrowsingContext, PopStateHandler};
use crate::error::HistoryError;
use crate::history::HistoryEntry;
use crate::location::UrlParts;
use crate::scroll::ScrollPosition;
use std::cell::{Cell, RefCell};
use std::fmt;
use url::Url;

const ORIGIN: &str = "http://localhost/";

#[derive(Debug, Clone)]
struct MemoryEntry {
	url: Url,
	state: Option<HistoryEntry>,
}

/// A session-history stack held in memory.
///
/// Behaves like `window.history`: `push_state` truncates forward entries,
/// `go` moves the cursor and dispatches popstate to registered handlers.
/// Dispatch is synchronous.
pub struct MemoryContext {
	entries: RefCell<Vec<MemoryEntry>>,
	index: Cell<usize>,
	handlers: RefCell<Vec<PopStateHandler>>,
	scroll: Cell<ScrollPosition>,
}

impl fmt::Debug for MemoryContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryContext")
			.field("entries", &self.hrefs())
			.field("index", &self.index.get())
			.field("handlers", &self.handlers.borrow().len())
			.finish()
	}
}

impl Default for MemoryContext {
	fn default() -> Self {
		Self::new("/")
	}
}

impl MemoryContext {
	/// Creates a context whose only entry is `initial_url` (relative to
	/// `http://localhost/`).
	pub fn new(initial_url: &str) -> Self {
		let url = resolve(&origin(), initial_url).unwrap_or_else(|_| origin());
		Self {
			entries: RefCell::new(vec![MemoryEntry { url, state: None }]),
			index: Cell::new(0),
			handlers: RefCell::new(Vec::new()),
			scroll: Cell::new(ScrollPosition::TOP),
		}
	}

	/// Simulates the browser back button.
	pub fn back(&self) {
		self.go(-1);
	}

	/// Simulates the browser forward button.
	pub fn forward(&self) {
		self.go(1);
	}

	/// Simulates the user typing `url` into the address bar: a new entry
	/// without state is appended and popstate fires with `None`.
	pub fn enter_url(&self, url: &str) {
		let current = self.current_url();
		let url = match resolve(&current, url) {
			Ok(url) => url,
			Err(err) => {
				tracing::warn!(url, error = %err, "ignoring unparsable address");
				return;
			}
		};
		self.append(MemoryEntry { url, state: None });
		self.dispatch(None);
	}

	/// Index of the current entry.
	pub fn index(&self) -> usize {
		self.index.get()
	}

	/// Path, query and fragment of every entry, oldest first.
	pub fn hrefs(&self) -> Vec<String> {
		self.entries.borrow().iter().map(|e| href(&e.url)).collect()
	}

	/// Stored state of the entry at `index`.
	pub fn state_at(&self, index: usize) -> Option<HistoryEntry> {
		self.entries
			.borrow()
			.get(index)
			.and_then(|e| e.state.clone())
	}

	/// Path, query and fragment of the current entry.
	pub fn current_href(&self) -> String {
		href(&self.current_url())
	}

	fn current_url(&self) -> Url {
		self.entries.borrow()[self.index.get()].url.clone()
	}

	fn append(&self, entry: MemoryEntry) {
		let mut entries = self.entries.borrow_mut();
		entries.truncate(self.index.get() + 1);
		entries.push(entry);
		self.index.set(entries.len() - 1);
	}

	fn dispatch(&self, state: Option<HistoryEntry>) {
		let handlers = self.handlers.borrow().clone();
		for handler in handlers {
			handler(state.clone());
		}
	}
}

fn origin() -> Url {
	Url::parse(ORIGIN).expect("ORIGIN is a valid absolute URL")
}

fn resolve(base: &Url, url: &str) -> Result<Url, url::ParseError> {
	base.join(url)
}

fn href(url: &Url) -> String {
	let mut href = url.path().to_string();
	if let Some(query) = url.query() {
		href.push('?');
		href.push_str(query);
	}
	if let Some(fragment) = url.fragment() {
		href.push('#');
		href.push_str(fragment);
	}
	href
}

impl BrowsingContext for MemoryContext {
	fn url(&self) -> UrlParts {
		let url = self.current_url();
		UrlParts::new(
			url.path(),
			url.query().map(|q| format!("?{}", q)).unwrap_or_default(),
			url.fragment().map(|f| format!("#{}", f)).unwrap_or_default(),
		)
	}

	fn history_state(&self) -> Result<Option<HistoryEntry>, HistoryError> {
		Ok(self.entries.borrow()[self.index.get()].state.clone())
	}

	fn push_state(&self, state: &HistoryEntry, url: &str) -> Result<(), HistoryError> {
		let url = resolve(&self.current_url(), url)
			.map_err(|err| HistoryError::StateWrite(format!("{}: {}", url, err)))?;
		self.append(MemoryEntry {
			url,
			state: Some(state.clone()),
		});
		Ok(())
	}

	fn replace_state(&self, state: &HistoryEntry, url: &str) -> Result<(), HistoryError> {
		let url = resolve(&self.current_url(), url)
			.map_err(|err| HistoryError::StateWrite(format!("{}: {}", url, err)))?;
		self.entries.borrow_mut()[self.index.get()] = MemoryEntry {
			url,
			state: Some(state.clone()),
		};
		Ok(())
	}

	fn go(&self, delta: i64) {
		let len = self.entries.borrow().len() as i64;
		let target = self.index.get() as i64 + delta;
		if delta == 0 || target < 0 || target >= len {
			return;
		}
		self.index.set(target as usize);
		let state = self.entries.borrow()[target as usize].state.clone();
		self.dispatch(state);
	}

	fn history_length(&self) -> usize {
		self.entries.borrow().len()
	}

	fn scroll_position(&self) -> ScrollPosition {
		self.scroll.get()
	}

	fn scroll_to(&self, position: ScrollPosition) {
		self.scroll.set(position);
	}

	fn on_pop_state(&self, handler: PopStateHandler) {
		self.handlers.borrow_mut().push(handler);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::rc::Rc;

	fn entry(current: &str, position: i64) -> HistoryEntry {
		HistoryEntry::new(None, current, None, false, None, position)
	}

	#[rstest]
	fn test_initial_url_parts() {
		let ctx = MemoryContext::new("/app/users?page=2#top");
		assert_eq!(ctx.url(), UrlParts::new("/app/users", "?page=2", "#top"));
		assert_eq!(ctx.history_length(), 1);
		assert_eq!(ctx.history_state().unwrap(), None);
	}

	#[rstest]
	fn test_push_truncates_forward_entries() {
		let ctx = MemoryContext::new("/");
		ctx.push_state(&entry("/a", 1), "/a").unwrap();
		ctx.push_state(&entry("/b", 2), "/b").unwrap();
		ctx.go(-1);
		ctx.push_state(&entry("/c", 2), "/c").unwrap();

		assert_eq!(ctx.hrefs(), vec!["/", "/a", "/c"]);
		assert_eq!(ctx.index(), 2);
	}

	#[rstest]
	fn test_relative_fragment_url_keeps_path() {
		let ctx = MemoryContext::new("/index.html");
		ctx.push_state(&entry("/about", 1), "#/about").unwrap();
		assert_eq!(ctx.current_href(), "/index.html#/about");
	}

	#[rstest]
	fn test_go_dispatches_state() {
		let ctx = MemoryContext::new("/");
		ctx.replace_state(&entry("/", 0), "/").unwrap();
		ctx.push_state(&entry("/a", 1), "/a").unwrap();

		let seen = Rc::new(RefCell::new(Vec::new()));
		let log = Rc::clone(&seen);
		ctx.on_pop_state(Rc::new(move |state: Option<HistoryEntry>| {
			log.borrow_mut().push(state.map(|s| s.position));
		}));

		ctx.back();
		ctx.back();
		ctx.forward();

		assert_eq!(*seen.borrow(), vec![Some(0), Some(1)]);
	}

	#[rstest]
	fn test_enter_url_dispatches_none() {
		let ctx = MemoryContext::new("/");
		let seen = Rc::new(Cell::new(false));
		let flag = Rc::clone(&seen);
		ctx.on_pop_state(Rc::new(move |state: Option<HistoryEntry>| {
			flag.set(state.is_none());
		}));

		ctx.enter_url("/typed");

		assert!(seen.get());
		assert_eq!(ctx.current_href(), "/typed");
		assert_eq!(ctx.history_length(), 2);
	}
}
