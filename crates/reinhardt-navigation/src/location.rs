//! Location codec.
//!
//! Pure functions that translate between the ambient browser URL and the
//! router's normalized `path?query#hash` strings, for both the clean-path
//! and the fragment-prefixed history strategies.

use serde::{Deserialize, Serialize};

/// The raw pieces of the ambient URL, as exposed by `window.location`.
///
/// `search` keeps its leading `?` and `hash` its leading `#`; both are empty
/// strings when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
	/// Path component, always starting with `/`.
	pub pathname: String,
	/// Query component including the leading `?`.
	pub search: String,
	/// Fragment component including the leading `#`.
	pub hash: String,
}

impl UrlParts {
	/// Creates URL parts from raw components.
	pub fn new(
		pathname: impl Into<String>,
		search: impl Into<String>,
		hash: impl Into<String>,
	) -> Self {
		Self {
			pathname: pathname.into(),
			search: search.into(),
			hash: hash.into(),
		}
	}
}

/// Decoded query string, preserving key order and repeated keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery(Vec<(String, String)>);

impl LocationQuery {
	/// Decodes an `application/x-www-form-urlencoded` query (without `?`).
	///
	/// Malformed input decodes to an empty query.
	pub fn parse(raw: &str) -> Self {
		if raw.is_empty() {
			return Self::default();
		}
		match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
			Ok(pairs) => Self(pairs),
			Err(err) => {
				tracing::warn!(query = raw, error = %err, "discarding malformed query string");
				Self::default()
			}
		}
	}

	/// Returns the first value for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Returns every value for `key`, in order.
	pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.0
			.iter()
			.filter(move |(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Iterates over all pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Returns true when no pairs were decoded.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// A navigation target split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
	/// Path used for matching.
	pub path: String,
	/// Raw query string without `?`.
	pub search: String,
	/// Decoded query.
	pub query: LocationQuery,
	/// Fragment including `#`, or empty.
	pub hash: String,
	/// `path` + `?search` + `hash`.
	pub full_path: String,
}

/// Splits `location` into path, query and fragment.
///
/// An empty path (e.g. `"?page=2"` or `"#top"`) is taken from `current_path`.
pub fn parse_url(location: &str, current_path: &str) -> ParsedUrl {
	let (before_hash, hash) = match location.find('#') {
		Some(pos) => (&location[..pos], &location[pos..]),
		None => (location, ""),
	};
	let (path, search) = match before_hash.find('?') {
		Some(pos) => (&before_hash[..pos], &before_hash[pos + 1..]),
		None => (before_hash, ""),
	};
	let path = if path.is_empty() { current_path } else { path };

	let mut full_path = path.to_string();
	if !search.is_empty() {
		full_path.push('?');
		full_path.push_str(search);
	}
	full_path.push_str(hash);

	ParsedUrl {
		path: path.to_string(),
		search: search.to_string(),
		query: LocationQuery::parse(search),
		hash: hash.to_string(),
		full_path,
	}
}

/// Normalizes a clean-path history base: leading `/`, no trailing `/`.
///
/// The root base normalizes to the empty string.
pub fn normalize_base(base: &str) -> String {
	let base = base.trim();
	if base.is_empty() {
		return String::new();
	}
	let mut normalized = if base.starts_with('/') || base.starts_with('#') {
		base.to_string()
	} else {
		format!("/{}", base)
	};
	while normalized.len() > 1 && normalized.ends_with('/') {
		normalized.pop();
	}
	if normalized == "/" {
		normalized.clear();
	}
	normalized
}

/// Removes `base` from the start of `pathname`, case-insensitively.
///
/// Returns `"/"` when nothing remains.
pub fn strip_base(pathname: &str, base: &str) -> String {
	if base.is_empty() {
		return pathname.to_string();
	}
	let matches_base = pathname
		.get(..base.len())
		.map(|prefix| prefix.eq_ignore_ascii_case(base))
		.unwrap_or(false);
	if !matches_base {
		return pathname.to_string();
	}
	let rest = &pathname[base.len()..];
	if rest.is_empty() {
		"/".to_string()
	} else {
		rest.to_string()
	}
}

/// Derives the router location from the ambient URL.
///
/// With a fragment base (containing `#`) the path is read from the hash;
/// otherwise it is the pathname with the base stripped, followed by the
/// search and hash.
pub fn current_location(base: &str, parts: &UrlParts) -> String {
	if let Some(hash_pos) = base.find('#') {
		let hash_base = &base[hash_pos..];
		let slice_pos = if parts.hash.starts_with(hash_base) {
			hash_base.len()
		} else {
			1
		};
		let from_hash = parts.hash.get(slice_pos..).unwrap_or("");
		if from_hash.starts_with('/') {
			return from_hash.to_string();
		}
		return format!("/{}", from_hash);
	}

	let path = strip_base(&parts.pathname, base);
	format!("{}{}{}", path, parts.search, parts.hash)
}

/// Builds the href written to the session-history store for `location`.
pub fn create_href(base: &str, location: &str) -> String {
	match base.find('#') {
		Some(hash_pos) => format!("{}{}", &base[hash_pos..], location),
		None => format!("{}{}", base, location),
	}
}
