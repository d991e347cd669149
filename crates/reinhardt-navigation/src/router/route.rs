//! Resolved locations and navigation targets.

use crate::location::{LocationQuery, ParsedUrl, parse_url};
use crate::matcher::same_records;
use crate::record::{RouteMeta, RouteRecord};
use std::fmt;
use std::rc::Rc;

/// A resolved location: the requested URL and the records it matched.
///
/// Two locations are equal when their full paths are equal and they matched
/// the same records (by identity).
#[derive(Debug, Clone)]
pub struct RouteLocation {
	full_path: String,
	path: String,
	query: LocationQuery,
	hash: String,
	matched: Vec<Rc<RouteRecord>>,
	meta: RouteMeta,
	start: bool,
}

impl RouteLocation {
	/// The location the router reports before its first navigation.
	pub fn start() -> Self {
		let mut location = Self::unmatched("/");
		location.start = true;
		location
	}

	/// A location for `url` that matched nothing.
	pub fn unmatched(url: &str) -> Self {
		Self::from_parsed(parse_url(url, "/"), Vec::new())
	}

	pub(crate) fn from_parsed(parsed: ParsedUrl, matched: Vec<Rc<RouteRecord>>) -> Self {
		let mut meta = RouteMeta::new();
		for record in &matched {
			for (key, value) in record.meta() {
				meta.insert(key.clone(), value.clone());
			}
		}
		Self {
			full_path: parsed.full_path,
			path: parsed.path,
			query: parsed.query,
			hash: parsed.hash,
			matched,
			meta,
			start: false,
		}
	}

	/// Returns true for the pre-navigation sentinel.
	pub fn is_start(&self) -> bool {
		self.start
	}

	/// Path used for matching.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Path, query and fragment.
	pub fn full_path(&self) -> &str {
		&self.full_path
	}

	/// Decoded query.
	pub fn query(&self) -> &LocationQuery {
		&self.query
	}

	/// Fragment including `#`, or empty.
	pub fn hash(&self) -> &str {
		&self.hash
	}

	/// Matched records, root first.
	pub fn matched(&self) -> &[Rc<RouteRecord>] {
		&self.matched
	}

	/// The deepest matched record.
	pub fn leaf(&self) -> Option<&Rc<RouteRecord>> {
		self.matched.last()
	}

	/// Name of the deepest matched record.
	pub fn name(&self) -> Option<&str> {
		self.leaf().and_then(|record| record.name())
	}

	/// Meta of every matched record merged root to leaf; deeper records win.
	pub fn meta(&self) -> &RouteMeta {
		&self.meta
	}

	/// Returns true when at least one record matched.
	pub fn is_matched(&self) -> bool {
		!self.matched.is_empty()
	}
}

impl PartialEq for RouteLocation {
	fn eq(&self, other: &Self) -> bool {
		self.start == other.start
			&& self.full_path == other.full_path
			&& same_records(&self.matched, &other.matched)
	}
}

/// Where to navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
	/// A location string (`/users?page=2#top`). A string without a path is
	/// taken relative to the current path.
	Path(String),
	/// A record name.
	Named(String),
}

impl RouteTarget {
	/// Targets the record named `name`.
	pub fn named(name: impl Into<String>) -> Self {
		Self::Named(name.into())
	}
}

impl From<&str> for RouteTarget {
	fn from(path: &str) -> Self {
		Self::Path(path.to_string())
	}
}

impl From<String> for RouteTarget {
	fn from(path: String) -> Self {
		Self::Path(path)
	}
}

impl From<&String> for RouteTarget {
	fn from(path: &String) -> Self {
		Self::Path(path.clone())
	}
}

impl fmt::Display for RouteTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Path(path) => f.write_str(path),
			Self::Named(name) => write!(f, "{{ name: {} }}", name),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matcher::RouterMatcher;
	use crate::record::RouteDef;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_start_sentinel() {
		let start = RouteLocation::start();
		assert!(start.is_start());
		assert_eq!(start.full_path(), "/");
		assert_ne!(start, RouteLocation::unmatched("/"));
	}

	#[rstest]
	fn test_meta_merges_root_to_leaf() {
		let matcher = RouterMatcher::new(vec![
			RouteDef::new("/admin")
				.meta("layout", "admin")
				.meta("requires_auth", true)
				.child(RouteDef::new("/users").name("AdminUsers").meta("layout", "table")),
		])
		.unwrap();
		let matched = matcher.resolve("/admin/users").matched;
		let location = RouteLocation::from_parsed(parse_url("/admin/users?page=2", "/"), matched);

		assert_eq!(location.meta().get("layout"), Some(&json!("table")));
		assert_eq!(location.meta().get("requires_auth"), Some(&json!(true)));
		assert_eq!(location.name(), Some("AdminUsers"));
		assert_eq!(location.query().get("page"), Some("2"));
		assert_eq!(location.path(), "/admin/users");
	}

	#[rstest]
	fn test_target_display() {
		assert_eq!(RouteTarget::from("/a?x=1").to_string(), "/a?x=1");
		assert_eq!(RouteTarget::named("Home").to_string(), "{ name: Home }");
	}
}
