//! Matcher property-based tests
//!
//! Property-based tests for route resolution and chain diffing over
//! generated route trees.

use proptest::prelude::*;
use reinhardt_navigation::{RouteDef, RouteRecord, RouterMatcher, extract_change_records};
use rstest::*;
use std::collections::HashSet;
use std::rc::Rc;

/// Shape of a generated route tree.
#[derive(Debug, Clone)]
struct Shape(Vec<Shape>);

fn shape() -> impl Strategy<Value = Vec<Shape>> {
	let leaf = Just(Shape(Vec::new()));
	let tree = leaf.prop_recursive(4, 32, 4, |inner| {
		prop::collection::vec(inner, 0..4).prop_map(Shape)
	});
	prop::collection::vec(tree, 1..5)
}

fn build(shapes: &[Shape], counter: &mut usize) -> Vec<RouteDef> {
	shapes
		.iter()
		.map(|shape| {
			let def = RouteDef::new(format!("/n{}", counter));
			*counter += 1;
			def.children(build(&shape.0, counter))
		})
		.collect()
}

fn matcher_for(shapes: &[Shape]) -> RouterMatcher {
	let mut counter = 0;
	RouterMatcher::new(build(shapes, &mut counter)).unwrap()
}

fn path_set(records: &[Rc<RouteRecord>]) -> HashSet<String> {
	records.iter().map(|r| r.path().to_string()).collect()
}

// ============================================================================
// Property-Based Tests: resolution
// ============================================================================

proptest! {
	/// Test: every record resolves to its own ancestor chain
	///
	/// Category: Property
	/// Verifies that the chain ends at the record and walks parent links root first.
	#[rstest]
	fn prop_resolve_returns_ancestor_chain(shapes in shape()) {
		let matcher = matcher_for(&shapes);

		for record in matcher.records() {
			let chain = matcher.resolve(record.path()).matched;

			prop_assert!(Rc::ptr_eq(chain.last().unwrap(), &record));
			prop_assert!(chain[0].parent().is_none());
			for pair in chain.windows(2) {
				prop_assert_eq!(pair[1].parent(), Some(pair[0].id()));
				prop_assert!(pair[1].path().starts_with(pair[0].path()));
			}
		}
	}

	/// Test: unknown paths resolve to an empty chain
	///
	/// Category: Property
	/// Verifies that resolution never panics and reports no match for unregistered paths.
	#[rstest]
	fn prop_unknown_path_is_empty(shapes in shape(), path in "[a-z/?#]{0,16}") {
		let matcher = matcher_for(&shapes);
		let location = matcher.resolve(&path);

		prop_assert_eq!(location.path, path.clone());
		if !matcher.records().iter().any(|r| r.path() == path) {
			prop_assert!(location.matched.is_empty());
		}
	}

	/// Test: chain diff partitions both chains
	///
	/// Category: Property
	/// Verifies that leaving, updating and entering cover `to` and `from` with no overlap.
	#[rstest]
	fn prop_change_records_partition(shapes in shape(), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
		let matcher = matcher_for(&shapes);
		let records = matcher.records();
		let to = matcher.resolve(a.get(&records).path()).matched;
		let from = matcher.resolve(b.get(&records).path()).matched;

		let changes = extract_change_records(&to, &from);
		let leaving = path_set(&changes.leaving);
		let updating = path_set(&changes.updating);
		let entering = path_set(&changes.entering);

		prop_assert!(leaving.is_disjoint(&updating));
		prop_assert!(entering.is_disjoint(&updating));
		prop_assert!(leaving.is_disjoint(&entering));
		prop_assert_eq!(&leaving | &updating, path_set(&from));
		prop_assert_eq!(&entering | &updating, path_set(&to));

		for pair in changes.leaving.windows(2) {
			prop_assert!(pair[0].path().len() > pair[1].path().len());
		}
	}
}
