//! Matched-chain diffing.

use crate::record::RouteRecord;
use std::rc::Rc;

/// How the records of two matched chains relate across a navigation.
#[derive(Debug, Clone, Default)]
pub struct ChangeRecords {
	/// Records of `from` absent from `to`, deepest first.
	pub leaving: Vec<Rc<RouteRecord>>,
	/// Records present in both chains, root first.
	pub updating: Vec<Rc<RouteRecord>>,
	/// Records of `to` absent from `from`, root first.
	pub entering: Vec<Rc<RouteRecord>>,
}

fn contains(chain: &[Rc<RouteRecord>], record: &RouteRecord) -> bool {
	chain.iter().any(|r| r.path() == record.path())
}

/// Partitions the records of `to` and `from`.
///
/// Records are compared by their absolute path.
pub fn extract_change_records(to: &[Rc<RouteRecord>], from: &[Rc<RouteRecord>]) -> ChangeRecords {
	let mut changes = ChangeRecords::default();
	for i in 0..to.len().max(from.len()) {
		if let Some(record) = from.get(i) {
			if contains(to, record) {
				changes.updating.push(Rc::clone(record));
			} else {
				changes.leaving.push(Rc::clone(record));
			}
		}
		if let Some(record) = to.get(i) {
			if !contains(from, record) {
				changes.entering.push(Rc::clone(record));
			}
		}
	}
	changes.leaving.reverse();
	changes
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matcher::RouterMatcher;
	use crate::record::RouteDef;
	use rstest::{fixture, rstest};

	#[fixture]
	fn matcher() -> RouterMatcher {
		RouterMatcher::new(vec![
			RouteDef::new("/").child(RouteDef::new("a")).child(RouteDef::new("b")),
			RouteDef::new("/x")
				.child(RouteDef::new("/y").child(RouteDef::new("/z"))),
		])
		.unwrap()
	}

	fn paths(records: &[Rc<RouteRecord>]) -> Vec<&str> {
		records.iter().map(|r| r.path()).collect()
	}

	#[rstest]
	fn test_sibling_change(matcher: RouterMatcher) {
		let to = matcher.resolve("/b").matched;
		let from = matcher.resolve("/a").matched;
		let changes = extract_change_records(&to, &from);

		assert_eq!(paths(&changes.leaving), vec!["/a"]);
		assert_eq!(paths(&changes.updating), vec!["/"]);
		assert_eq!(paths(&changes.entering), vec!["/b"]);
	}

	#[rstest]
	fn test_leaving_depth_three_is_deepest_first(matcher: RouterMatcher) {
		let to = matcher.resolve("/a").matched;
		let from = matcher.resolve("/x/y/z").matched;
		let changes = extract_change_records(&to, &from);

		assert_eq!(paths(&changes.leaving), vec!["/x/y/z", "/x/y", "/x"]);
		assert!(changes.updating.is_empty());
		assert_eq!(paths(&changes.entering), vec!["/", "/a"]);
	}

	#[rstest]
	fn test_from_empty_chain_enters_everything(matcher: RouterMatcher) {
		let to = matcher.resolve("/x/y").matched;
		let changes = extract_change_records(&to, &[]);

		assert!(changes.leaving.is_empty());
		assert_eq!(paths(&changes.entering), vec!["/x", "/x/y"]);
	}

	#[rstest]
	fn test_same_chain_only_updates(matcher: RouterMatcher) {
		let chain = matcher.resolve("/x/y").matched;
		let changes = extract_change_records(&chain, &chain);

		assert!(changes.leaving.is_empty());
		assert!(changes.entering.is_empty());
		assert_eq!(paths(&changes.updating), vec!["/x", "/x/y"]);
	}
}
