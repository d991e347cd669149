//! Error types for route registration, history bookkeeping and navigation.
//!
//! Only [`RouterError`] and [`HistoryError`] describe real failures. A
//! navigation that does not commit is reported through [`NavigationFailure`],
//! which is returned to the caller of `push`/`replace` rather than raised.

use thiserror::Error;

/// Error type for router construction and registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
	/// A dynamically added route named a parent that is not registered.
	#[error("Parent route not found: {0}")]
	ParentNotFound(String),
	/// Two records share the same name.
	#[error("Duplicate route name: {0}")]
	DuplicateRouteName(String),
	/// A named target does not refer to any registered record.
	#[error("Unknown route name: {0}")]
	UnknownRouteName(String),
	/// The browsing context rejected a history operation.
	#[error("History error: {0}")]
	History(#[from] HistoryError),
}

/// Error type for browsing-context operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
	/// The ambient window or history object is not available.
	#[error("Browsing context unavailable: {0}")]
	Unavailable(String),
	/// `pushState`/`replaceState` failed.
	#[error("Failed to write history state: {0}")]
	StateWrite(String),
	/// The stored history state could not be decoded.
	#[error("Failed to decode history state: {0}")]
	StateDecode(String),
}

/// Why a navigation did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationFailure {
	/// A guard declined the navigation.
	#[error("Navigation aborted from \"{from}\" to \"{to}\"")]
	Aborted {
		/// Full path of the target.
		to: String,
		/// Full path of the location the navigation started from.
		from: String,
	},
	/// A newer navigation was issued before this one could commit.
	#[error("Navigation cancelled from \"{from}\" to \"{to}\" by a newer navigation")]
	Cancelled {
		/// Full path of the target.
		to: String,
		/// Full path of the location the navigation started from.
		from: String,
	},
	/// The target is already the current location.
	#[error("Avoided redundant navigation to current location: \"{0}\"")]
	Duplicated(String),
	/// Guards kept redirecting past the configured limit.
	#[error("Too many redirects ({limit}) while navigating to \"{to}\"")]
	RedirectLimit {
		/// Last requested target.
		to: String,
		/// Configured maximum.
		limit: usize,
	},
	/// A named target could not be resolved.
	#[error("Unknown route name: {0}")]
	UnknownRouteName(String),
	/// Recording the transition in session history failed.
	#[error("History error: {0}")]
	History(#[from] HistoryError),
}

impl NavigationFailure {
	/// Returns true for failures caused by a guard or a newer navigation,
	/// as opposed to errors from the browsing context.
	pub fn is_guard_outcome(&self) -> bool {
		matches!(
			self,
			Self::Aborted { .. } | Self::Cancelled { .. } | Self::RedirectLimit { .. }
		)
	}
}
