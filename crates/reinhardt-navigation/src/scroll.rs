//! Scroll snapshots and restoration.

use crate::router::RouteLocation;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A scroll offset of the document, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
	/// Horizontal offset.
	pub left: f64,
	/// Vertical offset.
	pub top: f64,
}

impl ScrollPosition {
	/// Creates a scroll position.
	pub fn new(left: f64, top: f64) -> Self {
		Self { left, top }
	}

	/// The top-left corner of the document.
	pub const TOP: Self = Self {
		left: 0.0,
		top: 0.0,
	};
}

/// Decides where to scroll after a committed navigation.
///
/// Receives the new location, the previous one and the position saved for
/// the target history entry (only present on back/forward). Returning `None`
/// leaves the scroll offset untouched.
pub type ScrollBehavior =
	Rc<dyn Fn(&RouteLocation, &RouteLocation, Option<ScrollPosition>) -> Option<ScrollPosition>>;

/// Scroll offsets remembered per history stack position.
#[derive(Debug, Default)]
pub(crate) struct SavedScrollPositions {
	positions: RefCell<HashMap<i64, ScrollPosition>>,
}

impl SavedScrollPositions {
	pub(crate) fn save(&self, stack_position: i64, scroll: ScrollPosition) {
		self.positions.borrow_mut().insert(stack_position, scroll);
	}

	/// Removes and returns the offset saved for `stack_position`.
	pub(crate) fn take(&self, stack_position: i64) -> Option<ScrollPosition> {
		self.positions.borrow_mut().remove(&stack_position)
	}
}
