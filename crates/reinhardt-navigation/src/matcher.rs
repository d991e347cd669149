//! Route matcher.
//!
//! Route definitions are flattened into an arena of [`MatchNode`]s. Each node
//! refers to its parent and children by [`RecordId`]; a flat registry keeps
//! registration order for resolution. Matching is exact string equality on
//! the composed absolute path: there are no parameter segments and no
//! wildcard scoring.

use crate::error::RouterError;
use crate::record::{RecordId, RouteDef, RouteRecord};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Arena node wrapping one record.
#[derive(Debug)]
struct MatchNode {
	record: Rc<RouteRecord>,
	parent: Option<RecordId>,
	children: Vec<RecordId>,
}

/// Result of resolving a path: the requested path and its matched chain,
/// root first. An empty chain means no route matched.
#[derive(Debug, Clone)]
pub struct MatchedLocation {
	/// The requested path.
	pub path: String,
	/// Matched records from the root ancestor to the resolving leaf.
	pub matched: Vec<Rc<RouteRecord>>,
}

impl MatchedLocation {
	/// Returns true when at least one record matched.
	pub fn is_matched(&self) -> bool {
		!self.matched.is_empty()
	}
}

impl PartialEq for MatchedLocation {
	fn eq(&self, other: &Self) -> bool {
		self.path == other.path && same_records(&self.matched, &other.matched)
	}
}

/// Compares two chains by record identity.
pub fn same_records(a: &[Rc<RouteRecord>], b: &[Rc<RouteRecord>]) -> bool {
	a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
}

/// Arena-backed route matcher.
#[derive(Default)]
pub struct RouterMatcher {
	nodes: Vec<MatchNode>,
	registry: Vec<RecordId>,
	names: HashMap<String, RecordId>,
}

impl fmt::Debug for RouterMatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterMatcher")
			.field(
				"paths",
				&self
					.registry
					.iter()
					.map(|id| self.nodes[id.0].record.path())
					.collect::<Vec<_>>(),
			)
			.field("names", &self.names.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl RouterMatcher {
	/// Builds a matcher from top-level definitions.
	pub fn new(routes: impl IntoIterator<Item = RouteDef>) -> Result<Self, RouterError> {
		let mut matcher = Self::default();
		for route in routes {
			matcher.add_route(route, None)?;
		}
		Ok(matcher)
	}

	/// Registers `route` and its descendants under `parent`.
	///
	/// The record's path becomes `parent.path + route.path`. Children are
	/// registered before their parent in the flat registry, so a child whose
	/// composed path collides with an ancestor's wins resolution.
	pub fn add_route(
		&mut self,
		route: RouteDef,
		parent: Option<RecordId>,
	) -> Result<RecordId, RouterError> {
		if let Some(parent) = parent {
			if parent.0 >= self.nodes.len() {
				return Err(RouterError::ParentNotFound(format!("#{}", parent.0)));
			}
		}
		self.check_names(&route)?;
		Ok(self.insert(route, parent))
	}

	/// Registers `route` under the record named `parent_name`.
	pub fn add_route_under(
		&mut self,
		route: RouteDef,
		parent_name: &str,
	) -> Result<RecordId, RouterError> {
		let parent = self
			.names
			.get(parent_name)
			.copied()
			.ok_or_else(|| RouterError::ParentNotFound(parent_name.to_string()))?;
		self.add_route(route, Some(parent))
	}

	fn check_names(&self, route: &RouteDef) -> Result<(), RouterError> {
		let mut names = Vec::new();
		route.collect_names(&mut names);

		let mut seen = HashSet::new();
		for name in names {
			if self.names.contains_key(name) || !seen.insert(name) {
				return Err(RouterError::DuplicateRouteName(name.to_string()));
			}
		}
		Ok(())
	}

	fn insert(&mut self, route: RouteDef, parent: Option<RecordId>) -> RecordId {
		let RouteDef {
			path,
			name,
			meta,
			before_enter,
			component,
			guards,
			children,
		} = route;

		let path = match parent {
			Some(parent) => format!("{}{}", self.nodes[parent.0].record.path, path),
			None => path,
		};
		let id = RecordId(self.nodes.len());
		if let Some(name) = &name {
			self.names.insert(name.clone(), id);
		}

		tracing::debug!(path = %path, name = ?name, "registering route record");
		self.nodes.push(MatchNode {
			record: Rc::new(RouteRecord {
				id,
				path,
				name,
				meta,
				before_enter,
				component,
				guards,
				parent,
			}),
			parent,
			children: Vec::new(),
		});
		if let Some(parent) = parent {
			self.nodes[parent.0].children.push(id);
		}

		for child in children {
			self.insert(child, Some(id));
		}
		self.registry.push(id);
		id
	}

	/// Resolves `path` to its matched chain.
	///
	/// The first registered record whose absolute path equals `path` wins;
	/// no match yields an empty chain.
	pub fn resolve(&self, path: &str) -> MatchedLocation {
		let mut matched = Vec::new();
		let mut cursor = self
			.registry
			.iter()
			.copied()
			.find(|id| self.nodes[id.0].record.path == path);

		while let Some(id) = cursor {
			let node = &self.nodes[id.0];
			matched.push(Rc::clone(&node.record));
			cursor = node.parent;
		}
		matched.reverse();

		MatchedLocation {
			path: path.to_string(),
			matched,
		}
	}

	/// Returns the absolute path of the record named `name`.
	pub fn resolve_named(&self, name: &str) -> Option<&str> {
		self.names
			.get(name)
			.map(|id| self.nodes[id.0].record.path.as_str())
	}

	/// Returns the record with `id`.
	pub fn record(&self, id: RecordId) -> Option<&Rc<RouteRecord>> {
		self.nodes.get(id.0).map(|node| &node.record)
	}

	/// Returns the direct children of `id`, in definition order.
	pub fn children(&self, id: RecordId) -> Vec<Rc<RouteRecord>> {
		self.nodes
			.get(id.0)
			.map(|node| {
				node.children
					.iter()
					.map(|child| Rc::clone(&self.nodes[child.0].record))
					.collect()
			})
			.unwrap_or_default()
	}

	/// Returns all records in registry order.
	pub fn records(&self) -> Vec<Rc<RouteRecord>> {
		self.registry
			.iter()
			.map(|id| Rc::clone(&self.nodes[id.0].record))
			.collect()
	}

	/// Returns true when a record is named `name`.
	pub fn has_route(&self, name: &str) -> bool {
		self.names.contains_key(name)
	}

	/// Number of registered records.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Returns true when no record is registered.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn matcher() -> RouterMatcher {
		RouterMatcher::new(vec![
			RouteDef::new("/")
				.name("Home")
				.child(RouteDef::new("a").name("A"))
				.child(RouteDef::new("b").name("B")),
			RouteDef::new("/about").name("About"),
		])
		.unwrap()
	}

	fn paths(location: &MatchedLocation) -> Vec<&str> {
		location.matched.iter().map(|r| r.path()).collect()
	}

	#[rstest]
	fn test_resolve_child_returns_chain(matcher: RouterMatcher) {
		let location = matcher.resolve("/a");
		assert_eq!(paths(&location), vec!["/", "/a"]);
		assert_eq!(location.matched[1].name(), Some("A"));
	}

	#[rstest]
	fn test_resolve_root(matcher: RouterMatcher) {
		assert_eq!(paths(&matcher.resolve("/")), vec!["/"]);
	}

	#[rstest]
	fn test_resolve_unknown_path(matcher: RouterMatcher) {
		let location = matcher.resolve("/zzz");
		assert_eq!(location.path, "/zzz");
		assert!(location.matched.is_empty());
		assert!(!location.is_matched());
	}

	#[rstest]
	fn test_registry_order_children_first(matcher: RouterMatcher) {
		let registered: Vec<String> = matcher
			.records()
			.iter()
			.map(|r| r.path().to_string())
			.collect();
		assert_eq!(registered, vec!["/a", "/b", "/", "/about"]);
	}

	#[rstest]
	fn test_duplicate_path_first_registered_wins() {
		let matcher = RouterMatcher::new(vec![
			RouteDef::new("/dup").name("First"),
			RouteDef::new("/dup").name("Second"),
		])
		.unwrap();

		assert_eq!(matcher.resolve("/dup").matched[0].name(), Some("First"));
	}

	#[rstest]
	fn test_add_route_under_existing_parent(mut matcher: RouterMatcher) {
		matcher
			.add_route_under(RouteDef::new("/team").name("Team"), "About")
			.unwrap();

		assert_eq!(
			paths(&matcher.resolve("/about/team")),
			vec!["/about", "/about/team"]
		);
		assert_eq!(matcher.resolve_named("Team"), Some("/about/team"));
	}

	#[rstest]
	fn test_add_route_under_missing_parent(mut matcher: RouterMatcher) {
		let result = matcher.add_route_under(RouteDef::new("x"), "Missing");
		assert_eq!(
			result.unwrap_err(),
			RouterError::ParentNotFound("Missing".to_string())
		);
		assert_eq!(matcher.len(), 4);
	}

	#[rstest]
	fn test_duplicate_name_rejected_without_partial_insert(mut matcher: RouterMatcher) {
		let result = matcher.add_route(
			RouteDef::new("/x").name("X").child(RouteDef::new("/y").name("A")),
			None,
		);

		assert_eq!(
			result.unwrap_err(),
			RouterError::DuplicateRouteName("A".to_string())
		);
		assert!(!matcher.has_route("X"));
		assert!(matcher.resolve("/x").matched.is_empty());
	}

	#[rstest]
	fn test_children_of_record(matcher: RouterMatcher) {
		let root = matcher.resolve("/").matched[0].id();
		let children: Vec<String> = matcher
			.children(root)
			.iter()
			.map(|r| r.path().to_string())
			.collect();
		assert_eq!(children, vec!["/a", "/b"]);
	}

	#[rstest]
	fn test_matched_locations_compare_by_identity(matcher: RouterMatcher) {
		assert_eq!(matcher.resolve("/a"), matcher.resolve("/a"));

		let other = RouterMatcher::new(vec![
			RouteDef::new("/").child(RouteDef::new("a")),
		])
		.unwrap();
		assert_ne!(matcher.resolve("/a"), other.resolve("/a"));
	}
}
