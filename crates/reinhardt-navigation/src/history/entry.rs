//! Session-history entries and history configuration.

use crate::scroll::ScrollPosition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by the router inside a stored entry.
const RESERVED_KEYS: [&str; 6] = ["back", "current", "forward", "replaced", "scroll", "position"];

/// State stored with every session-history entry written by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
	/// Location of the previous entry.
	pub back: Option<String>,
	/// Location of this entry.
	pub current: String,
	/// Location of the next entry, once known.
	pub forward: Option<String>,
	/// Whether the entry was written by a replace.
	pub replaced: bool,
	/// Scroll offset captured when leaving the entry.
	pub scroll: Option<ScrollPosition>,
	/// Stack position, used to tell back from forward.
	pub position: i64,
	/// Application data stored alongside the router's fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl HistoryEntry {
	/// Creates an entry without extra data.
	pub fn new(
		back: Option<String>,
		current: impl Into<String>,
		forward: Option<String>,
		replaced: bool,
		scroll: Option<ScrollPosition>,
		position: i64,
	) -> Self {
		Self {
			back,
			current: current.into(),
			forward,
			replaced,
			scroll,
			position,
			extra: Map::new(),
		}
	}

	/// Merges `extra` into the entry's application data.
	///
	/// Keys that collide with the router's own fields are ignored.
	pub fn with_extra(mut self, extra: Option<&Map<String, Value>>) -> Self {
		let Some(extra) = extra else {
			return self;
		};
		for (key, value) in extra {
			if RESERVED_KEYS.contains(&key.as_str()) {
				tracing::warn!(key = %key, "ignoring reserved history state key");
				continue;
			}
			self.extra.insert(key.clone(), value.clone());
		}
		self
	}
}

/// History strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
	/// Clean paths (`/app/about`).
	#[default]
	Path,
	/// Fragment-prefixed paths (`/index.html#/about`).
	Hash,
}

/// History settings, loadable from an application settings file.
///
/// ```
/// use reinhardt_navigation::history::{HistoryConfig, HistoryMode};
///
/// let config: HistoryConfig = serde_json::from_str(r#"{ "mode": "hash" }"#).unwrap();
/// assert_eq!(config.mode, HistoryMode::Hash);
/// assert_eq!(config.base, "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
	/// Strategy.
	pub mode: HistoryMode,
	/// Base prepended to every location.
	pub base: String,
}

impl HistoryConfig {
	/// Clean-path history under `base`.
	pub fn path(base: impl Into<String>) -> Self {
		Self {
			mode: HistoryMode::Path,
			base: base.into(),
		}
	}

	/// Fragment-prefixed history under `base`.
	pub fn hash(base: impl Into<String>) -> Self {
		Self {
			mode: HistoryMode::Hash,
			base: base.into(),
		}
	}
}

/// Direction of a browser-initiated transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationDirection {
	/// Towards older entries.
	Back,
	/// Towards newer entries.
	Forward,
	/// No stack movement could be derived.
	Unknown,
}

/// Details of a transition observed through popstate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationInfo {
	/// Stack positions moved; negative when going back.
	pub delta: i64,
	/// True when `delta` is negative.
	pub is_back: bool,
	/// Direction derived from `delta`.
	pub direction: NavigationDirection,
}

impl NavigationInfo {
	/// Derives the info from a stack delta.
	pub fn from_delta(delta: i64) -> Self {
		let direction = match delta {
			d if d < 0 => NavigationDirection::Back,
			d if d > 0 => NavigationDirection::Forward,
			_ => NavigationDirection::Unknown,
		};
		Self {
			delta,
			is_back: delta < 0,
			direction,
		}
	}
}
