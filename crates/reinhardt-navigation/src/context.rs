//! Browsing-context collaborator.
//!
//! The history adapter never touches `window` directly. It talks to a
//! [`BrowsingContext`], which provides the ambient URL, a session-history
//! store keyed by [`HistoryEntry`] values, scroll access and the popstate
//! event source.
//!
//! - [`MemoryContext`]: in-process session history, used on native targets
//!   and in tests.
//! - `WebContext` (wasm32 only): backed by `window.history`.

mod memory;
#[cfg(target_arch = "wasm32")]
mod web;

pub use memory::MemoryContext;
#[cfg(target_arch = "wasm32")]
pub use web::WebContext;

use crate::error::HistoryError;
use crate::history::HistoryEntry;
use crate::location::UrlParts;
use crate::scroll::ScrollPosition;
use std::rc::Rc;

/// Callback invoked with the state of the entry the user moved to.
///
/// The state is `None` when the entry was not written by the router, e.g.
/// after the user edited the address bar.
pub type PopStateHandler = Rc<dyn Fn(Option<HistoryEntry>)>;

/// The ambient browsing context consumed by the history adapter.
pub trait BrowsingContext {
	/// Current URL components.
	fn url(&self) -> UrlParts;

	/// State stored with the current session-history entry.
	fn history_state(&self) -> Result<Option<HistoryEntry>, HistoryError>;

	/// Appends an entry, discarding any forward entries.
	fn push_state(&self, state: &HistoryEntry, url: &str) -> Result<(), HistoryError>;

	/// Overwrites the current entry.
	fn replace_state(&self, state: &HistoryEntry, url: &str) -> Result<(), HistoryError>;

	/// Moves through session history; fires popstate when the entry changes.
	fn go(&self, delta: i64);

	/// Number of entries in session history.
	fn history_length(&self) -> usize;

	/// Current document scroll offset.
	fn scroll_position(&self) -> ScrollPosition;

	/// Scrolls the document.
	fn scroll_to(&self, position: ScrollPosition);

	/// Registers a popstate handler.
	fn on_pop_state(&self, handler: PopStateHandler);
}

/// Narrows a history move to the range `history.go` accepts.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn go_delta(delta: i64) -> Option<i32> {
	match i32::try_from(delta) {
		Ok(delta) => Some(delta),
		Err(_) => {
			tracing::warn!(delta, "history move too large; ignored");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(-1, Some(-1))]
	#[case(i64::from(i32::MAX), Some(i32::MAX))]
	#[case(i64::from(i32::MIN), Some(i32::MIN))]
	#[case(i64::from(i32::MAX) + 1, None)]
	#[case(i64::MIN, None)]
	fn test_go_delta_rejects_overflow(#[case] delta: i64, #[case] expected: Option<i32>) {
		assert_eq!(go_delta(delta), expected);
	}
}
