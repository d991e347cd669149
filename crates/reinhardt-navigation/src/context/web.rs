//! Browser session history via `window.history` (wasm32 only).

use super::{BrowsingContext, PopStateHandler, go_delta};
use crate::error::HistoryError;
use crate::history::HistoryEntry;
use crate::location::UrlParts;
use crate::scroll::ScrollPosition;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;

type PopStateClosure = Closure<dyn FnMut(web_sys::PopStateEvent)>;

/// Browsing context backed by the global `window`.
///
/// History entries are stored in `history.state` as plain JS objects.
/// States not written by the router decode to `None`.
pub struct WebContext {
	window: web_sys::Window,
	history: web_sys::History,
	// Dropping a closure detaches it from JS; keep them for the context's lifetime.
	listeners: RefCell<Vec<PopStateClosure>>,
}

impl std::fmt::Debug for WebContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WebContext")
			.field("listeners", &self.listeners.borrow().len())
			.finish_non_exhaustive()
	}
}

impl WebContext {
	/// Binds to the global window.
	pub fn new() -> Result<Self, HistoryError> {
		let window = web_sys::window()
			.ok_or_else(|| HistoryError::Unavailable("no global window".to_string()))?;
		let history = window
			.history()
			.map_err(|err| HistoryError::Unavailable(format!("{:?}", err)))?;
		Ok(Self {
			window,
			history,
			listeners: RefCell::new(Vec::new()),
		})
	}
}

fn encode(state: &HistoryEntry) -> Result<JsValue, HistoryError> {
	let json =
		serde_json::to_string(state).map_err(|err| HistoryError::StateWrite(err.to_string()))?;
	js_sys::JSON::parse(&json).map_err(|err| HistoryError::StateWrite(format!("{:?}", err)))
}

fn decode(value: &JsValue) -> Result<Option<HistoryEntry>, HistoryError> {
	if value.is_null() || value.is_undefined() {
		return Ok(None);
	}
	let json = js_sys::JSON::stringify(value)
		.map_err(|err| HistoryError::StateDecode(format!("{:?}", err)))?;
	let json = String::from(json);
	serde_json::from_str(&json)
		.map(Some)
		.map_err(|err| HistoryError::StateDecode(err.to_string()))
}

impl BrowsingContext for WebContext {
	fn url(&self) -> UrlParts {
		let location = self.window.location();
		UrlParts::new(
			location.pathname().unwrap_or_else(|_| "/".to_string()),
			location.search().unwrap_or_default(),
			location.hash().unwrap_or_default(),
		)
	}

	fn history_state(&self) -> Result<Option<HistoryEntry>, HistoryError> {
		let state = self
			.history
			.state()
			.map_err(|err| HistoryError::Unavailable(format!("{:?}", err)))?;
		decode(&state)
	}

	fn push_state(&self, state: &HistoryEntry, url: &str) -> Result<(), HistoryError> {
		self.history
			.push_state_with_url(&encode(state)?, "", Some(url))
			.map_err(|err| HistoryError::StateWrite(format!("{:?}", err)))
	}

	fn replace_state(&self, state: &HistoryEntry, url: &str) -> Result<(), HistoryError> {
		self.history
			.replace_state_with_url(&encode(state)?, "", Some(url))
			.map_err(|err| HistoryError::StateWrite(format!("{:?}", err)))
	}

	fn go(&self, delta: i64) {
		let Some(delta) = go_delta(delta) else {
			return;
		};
		if let Err(err) = self.history.go_with_delta(delta) {
			tracing::warn!(delta, error = ?err, "history.go failed");
		}
	}

	fn history_length(&self) -> usize {
		self.history.length().map(|len| len as usize).unwrap_or(1)
	}

	fn scroll_position(&self) -> ScrollPosition {
		ScrollPosition::new(
			self.window.scroll_x().unwrap_or(0.0),
			self.window.scroll_y().unwrap_or(0.0),
		)
	}

	fn scroll_to(&self, position: ScrollPosition) {
		self.window
			.scroll_to_with_x_and_y(position.left, position.top);
	}

	fn on_pop_state(&self, handler: PopStateHandler) {
		let closure = Closure::wrap(Box::new(move |event: web_sys::PopStateEvent| {
			let state = match decode(&event.state()) {
				Ok(state) => state,
				Err(err) => {
					tracing::warn!(error = %err, "ignoring foreign history state");
					None
				}
			};
			handler(state);
		}) as Box<dyn FnMut(_)>);

		if let Err(err) = self
			.window
			.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())
		{
			tracing::error!(error = ?err, "failed to attach popstate listener");
			return;
		}
		self.listeners.borrow_mut().push(closure);
	}
}
