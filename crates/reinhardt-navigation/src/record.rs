//! Route definitions and normalized route records.
//!
//! A [`RouteDef`] is the declarative input written by the application. The
//! matcher normalizes each definition into a [`RouteRecord`] whose `path` is
//! absolute and fixed for the lifetime of the router.

use crate::guard::Guard;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Opaque key/value bag attached to a route.
pub type RouteMeta = serde_json::Map<String, Value>;

/// Identifier of a record inside a matcher arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
	/// Position of the record in registration order of the arena.
	pub fn index(self) -> usize {
		self.0
	}
}

/// Handle to whatever renders for a record.
///
/// The router never looks inside it; the rendering collaborator recovers its
/// own type with [`ViewBinding::downcast_ref`].
#[derive(Clone)]
pub struct ViewBinding(Rc<dyn Any>);

impl ViewBinding {
	/// Wraps a view value.
	pub fn new<T: 'static>(view: T) -> Self {
		Self(Rc::new(view))
	}

	/// Returns the wrapped value if it is a `T`.
	pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}

	/// Returns true when both handles point to the same view.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for ViewBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ViewBinding(..)")
	}
}

/// Guards contributed by the view mounted for a record.
#[derive(Clone, Default)]
pub struct ComponentGuards {
	pub(crate) leave: Vec<Guard>,
	pub(crate) update: Vec<Guard>,
	pub(crate) enter: Vec<Guard>,
}

impl ComponentGuards {
	/// Guards run when the record leaves the matched chain.
	pub fn leave(&self) -> &[Guard] {
		&self.leave
	}

	/// Guards run when the record stays matched across a navigation.
	pub fn update(&self) -> &[Guard] {
		&self.update
	}

	/// Guards run when the record enters the matched chain.
	pub fn enter(&self) -> &[Guard] {
		&self.enter
	}

	fn is_empty(&self) -> bool {
		self.leave.is_empty() && self.update.is_empty() && self.enter.is_empty()
	}
}

/// Declarative route definition.
///
/// Child paths are relative and are appended verbatim to the parent's
/// absolute path (`"/"` + `"a"` = `"/a"`, `"/users"` + `"/list"` =
/// `"/users/list"`).
///
/// # Example
///
/// ```
/// use reinhardt_navigation::RouteDef;
///
/// let routes = vec![
/// 	RouteDef::new("/")
/// 		.name("Home")
/// 		.child(RouteDef::new("a").name("A"))
/// 		.child(RouteDef::new("b").name("B")),
/// 	RouteDef::new("/about").name("About"),
/// ];
/// assert_eq!(routes[0].child_defs().len(), 2);
/// ```
#[derive(Clone)]
pub struct RouteDef {
	pub(crate) path: String,
	pub(crate) name: Option<String>,
	pub(crate) meta: RouteMeta,
	pub(crate) before_enter: Vec<Guard>,
	pub(crate) component: Option<ViewBinding>,
	pub(crate) guards: ComponentGuards,
	pub(crate) children: Vec<RouteDef>,
}

impl RouteDef {
	/// Creates a definition for `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			name: None,
			meta: RouteMeta::new(),
			before_enter: Vec::new(),
			component: None,
			guards: ComponentGuards::default(),
			children: Vec::new(),
		}
	}

	/// Sets the unique route name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Adds a meta entry.
	pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.meta.insert(key.into(), value.into());
		self
	}

	/// Adds a per-record guard run whenever this record is part of the target.
	pub fn before_enter(mut self, guard: Guard) -> Self {
		self.before_enter.push(guard);
		self
	}

	/// Binds the view rendered for this record.
	pub fn component<T: 'static>(mut self, view: T) -> Self {
		self.component = Some(ViewBinding::new(view));
		self
	}

	/// Adds a view leave guard.
	pub fn on_leave(mut self, guard: Guard) -> Self {
		self.guards.leave.push(guard);
		self
	}

	/// Adds a view update guard.
	pub fn on_update(mut self, guard: Guard) -> Self {
		self.guards.update.push(guard);
		self
	}

	/// Adds a view enter guard.
	pub fn on_enter(mut self, guard: Guard) -> Self {
		self.guards.enter.push(guard);
		self
	}

	/// Appends a child definition.
	pub fn child(mut self, child: RouteDef) -> Self {
		self.children.push(child);
		self
	}

	/// Appends several child definitions.
	pub fn children(mut self, children: impl IntoIterator<Item = RouteDef>) -> Self {
		self.children.extend(children);
		self
	}

	/// Returns the child definitions.
	pub fn child_defs(&self) -> &[RouteDef] {
		&self.children
	}

	/// Returns the path segment as written.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Collects the names of this definition and all descendants.
	pub(crate) fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
		if let Some(name) = self.name.as_deref() {
			names.push(name);
		}
		for child in &self.children {
			child.collect_names(names);
		}
	}
}

impl fmt::Debug for RouteDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteDef")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("children", &self.children)
			.finish_non_exhaustive()
	}
}

/// A normalized route: absolute path, owned by the matcher arena.
pub struct RouteRecord {
	pub(crate) id: RecordId,
	pub(crate) path: String,
	pub(crate) name: Option<String>,
	pub(crate) meta: RouteMeta,
	pub(crate) before_enter: Vec<Guard>,
	pub(crate) component: Option<ViewBinding>,
	pub(crate) guards: ComponentGuards,
	pub(crate) parent: Option<RecordId>,
}

impl RouteRecord {
	/// Arena identifier.
	pub fn id(&self) -> RecordId {
		self.id
	}

	/// Absolute path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Route name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Meta bag.
	pub fn meta(&self) -> &RouteMeta {
		&self.meta
	}

	/// Per-record guards.
	pub fn before_enter(&self) -> &[Guard] {
		&self.before_enter
	}

	/// Bound view, if any.
	pub fn component(&self) -> Option<&ViewBinding> {
		self.component.as_ref()
	}

	/// Guards contributed by the bound view.
	pub fn guards(&self) -> &ComponentGuards {
		&self.guards
	}

	/// Parent record, if this is not a root.
	pub fn parent(&self) -> Option<RecordId> {
		self.parent
	}
}

impl fmt::Debug for RouteRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteRecord")
			.field("id", &self.id)
			.field("path", &self.path)
			.field("name", &self.name)
			.field("meta", &self.meta)
			.field("parent", &self.parent)
			.field("has_component", &self.component.is_some())
			.field("before_enter", &self.before_enter.len())
			.field("has_component_guards", &!self.guards.is_empty())
			.finish()
	}
}
