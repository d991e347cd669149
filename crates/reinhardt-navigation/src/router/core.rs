//! Core Router Implementation.
//!
//! The [`Router`] resolves targets against its matcher, runs the guard
//! phases, records committed navigations in session history and publishes
//! the new location.

use super::changes::{ChangeRecords, extract_change_records};
use super::options::{RouterOptions, Spawner};
use super::route::{RouteLocation, RouteTarget};
use crate::error::{NavigationFailure, RouterError};
use crate::guard::{AfterHook, Guard, NavigationOutcome};
use crate::history::{NavigationInfo, RouterHistory};
use crate::location::parse_url;
use crate::matcher::RouterMatcher;
use crate::reactive::Signal;
use crate::record::{RecordId, RouteDef, RouteRecord};
use crate::scroll::{ScrollBehavior, ScrollPosition};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Outcome of a navigation request.
pub type NavigationResult = Result<RouteLocation, NavigationFailure>;

/// Listener for [`RouterEvent`]s.
pub type EventListener = Rc<dyn Fn(&RouterEvent)>;

/// Guard phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardPhase {
	/// View leave guards of leaving records, deepest first.
	Leave,
	/// Global `before_each` guards.
	BeforeEach,
	/// View update guards of records matched before and after.
	Update,
	/// Per-record `before_enter` guards of the target chain.
	BeforeEnter,
	/// View enter guards of entering records.
	Enter,
	/// Global `before_resolve` guards.
	BeforeResolve,
}

impl GuardPhase {
	/// All phases in execution order.
	pub const ALL: [GuardPhase; 6] = [
		GuardPhase::Leave,
		GuardPhase::BeforeEach,
		GuardPhase::Update,
		GuardPhase::BeforeEnter,
		GuardPhase::Enter,
		GuardPhase::BeforeResolve,
	];
}

/// What the most recent navigation is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NavigationState {
	/// No navigation in progress.
	#[default]
	Idle,
	/// Resolving the target.
	Resolving,
	/// Running the guards of a phase.
	Guarding(GuardPhase),
	/// Writing history and publishing the location.
	Committing,
}

/// Whether the router has committed its first navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Readiness {
	/// No navigation committed yet; browser transitions are not observed.
	#[default]
	Pending,
	/// The history listener is installed.
	Ready,
}

/// How a navigation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
	/// Add a session-history entry.
	Push,
	/// Overwrite the current entry.
	Replace,
	/// The browser already moved through session history by `delta`.
	PopState {
		/// Stack positions moved.
		delta: i64,
	},
}

impl NavigationMode {
	fn is_pop_state(self) -> bool {
		matches!(self, Self::PopState { .. })
	}
}

/// Per-call navigation state.
#[derive(Debug, Clone)]
pub struct PendingNavigation {
	/// Current target; changes on redirect.
	pub target: RouteTarget,
	/// Committed location when the navigation started.
	pub from: RouteLocation,
	/// Issue order of the navigation.
	pub sequence: u64,
	/// How the navigation was requested.
	pub mode: NavigationMode,
}

/// Lifecycle notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterEvent {
	/// A navigation passed resolution and is about to run guards.
	Started {
		/// Full path of the target.
		to: String,
		/// Full path of the committed location.
		from: String,
		/// How the navigation was requested.
		mode: NavigationMode,
	},
	/// A guard phase began.
	PhaseEntered {
		/// Full path of the target.
		to: String,
		/// Phase entered.
		phase: GuardPhase,
	},
	/// A guard redirected.
	Redirected {
		/// Full path of the discarded target.
		from: String,
		/// New target.
		to: RouteTarget,
	},
	/// A guard aborted.
	Aborted {
		/// Full path of the target.
		to: String,
		/// Full path of the committed location.
		from: String,
	},
	/// A newer navigation superseded this one.
	Cancelled {
		/// Full path of the target.
		to: String,
		/// Full path of the committed location.
		from: String,
	},
	/// The location changed.
	Committed {
		/// Full path of the new location.
		to: String,
		/// Full path of the previous location.
		from: String,
	},
}

struct RouterInner {
	matcher: RefCell<RouterMatcher>,
	history: RouterHistory,
	current: Signal<RouteLocation>,
	before_each: RefCell<Vec<Guard>>,
	before_resolve: RefCell<Vec<Guard>>,
	after_each: RefCell<Vec<AfterHook>>,
	event_listeners: RefCell<Vec<EventListener>>,
	readiness: Cell<Readiness>,
	state: Cell<NavigationState>,
	sequence: Cell<u64>,
	spawner: Option<Spawner>,
	max_redirects: usize,
	scroll_behavior: Option<ScrollBehavior>,
}

/// Client-side router.
///
/// Cloning is cheap; clones share all state.
///
/// # Example
///
/// ```
/// use futures::executor::block_on;
/// use reinhardt_navigation::context::{BrowsingContext, MemoryContext};
/// use reinhardt_navigation::history::create_web_history;
/// use reinhardt_navigation::{RouteDef, Router, RouterOptions};
/// use std::rc::Rc;
///
/// let context: Rc<dyn BrowsingContext> = Rc::new(MemoryContext::new("/"));
/// let router = Router::new(
/// 	RouterOptions::new(create_web_history(context, "/").unwrap())
/// 		.route(RouteDef::new("/").name("Home"))
/// 		.route(RouteDef::new("/about").name("About")),
/// )
/// .unwrap();
///
/// block_on(router.start()).unwrap();
/// let about = block_on(router.push("/about")).unwrap();
/// assert_eq!(about.name(), Some("About"));
/// assert_eq!(router.current_route().path(), "/about");
/// ```
#[derive(Clone)]
pub struct Router {
	inner: Rc<RouterInner>,
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("matcher", &*self.inner.matcher.borrow())
			.field("current", &self.inner.current.with(|c| c.full_path().to_string()))
			.field("readiness", &self.inner.readiness.get())
			.field("state", &self.inner.state.get())
			.field("before_each", &self.inner.before_each.borrow().len())
			.field("before_resolve", &self.inner.before_resolve.borrow().len())
			.field("after_each", &self.inner.after_each.borrow().len())
			.finish_non_exhaustive()
	}
}

impl Router {
	/// Builds a router. The current route is the start sentinel until
	/// [`start`](Self::start) or the first navigation commits.
	pub fn new(options: RouterOptions) -> Result<Self, RouterError> {
		let RouterOptions {
			history,
			routes,
			spawner,
			max_redirects,
			scroll_behavior,
		} = options;
		let matcher = RouterMatcher::new(routes)?;
		tracing::debug!(records = matcher.len(), "router created");

		Ok(Self {
			inner: Rc::new(RouterInner {
				matcher: RefCell::new(matcher),
				history,
				current: Signal::new(RouteLocation::start()),
				before_each: RefCell::new(Vec::new()),
				before_resolve: RefCell::new(Vec::new()),
				after_each: RefCell::new(Vec::new()),
				event_listeners: RefCell::new(Vec::new()),
				readiness: Cell::new(Readiness::Pending),
				state: Cell::new(NavigationState::Idle),
				sequence: Cell::new(0),
				spawner,
				max_redirects,
				scroll_behavior,
			}),
		})
	}

	/// The committed location.
	pub fn current_route(&self) -> RouteLocation {
		self.inner.current.get()
	}

	/// The reactive cell holding the committed location.
	pub fn current_route_signal(&self) -> &Signal<RouteLocation> {
		&self.inner.current
	}

	/// The history adapter.
	pub fn history(&self) -> &RouterHistory {
		&self.inner.history
	}

	/// Returns true once the first navigation committed.
	pub fn is_ready(&self) -> bool {
		self.inner.readiness.get() == Readiness::Ready
	}

	/// Current readiness.
	pub fn readiness(&self) -> Readiness {
		self.inner.readiness.get()
	}

	/// State of the most recently issued navigation.
	pub fn navigation_state(&self) -> NavigationState {
		self.inner.state.get()
	}

	/// Registers a guard run for every navigation, after leave guards.
	pub fn before_each(&self, guard: Guard) {
		self.inner.before_each.borrow_mut().push(guard);
	}

	/// Registers a guard run for every navigation, after all other guards.
	pub fn before_resolve(&self, guard: Guard) {
		self.inner.before_resolve.borrow_mut().push(guard);
	}

	/// Registers a hook run after every committed navigation with the new
	/// location and the previous path.
	pub fn after_each(&self, hook: impl Fn(&RouteLocation, &str) + 'static) {
		self.inner.after_each.borrow_mut().push(Rc::new(hook));
	}

	/// Registers a lifecycle listener.
	pub fn on_event(&self, listener: impl Fn(&RouterEvent) + 'static) {
		self.inner.event_listeners.borrow_mut().push(Rc::new(listener));
	}

	/// Adds a route at the top level or under the record named `parent_name`.
	pub fn add_route(&self, route: RouteDef, parent_name: Option<&str>) -> Result<RecordId, RouterError> {
		let mut matcher = self.inner.matcher.borrow_mut();
		match parent_name {
			Some(parent) => matcher.add_route_under(route, parent),
			None => matcher.add_route(route, None),
		}
	}

	/// Returns true when a record is named `name`.
	pub fn has_route(&self, name: &str) -> bool {
		self.inner.matcher.borrow().has_route(name)
	}

	/// All records in resolution order.
	pub fn routes(&self) -> Vec<Rc<RouteRecord>> {
		self.inner.matcher.borrow().records()
	}

	/// Resolves `target` without navigating.
	///
	/// Location strings without a path are taken relative to the current
	/// path. An unmatched path is not an error.
	pub fn resolve(&self, target: impl Into<RouteTarget>) -> Result<RouteLocation, RouterError> {
		self.locate(&target.into()).map_err(RouterError::UnknownRouteName)
	}

	// Fails only with the name of an unregistered named target.
	fn locate(&self, target: &RouteTarget) -> Result<RouteLocation, String> {
		let matcher = self.inner.matcher.borrow();
		let location = match target {
			RouteTarget::Path(location) => location.clone(),
			RouteTarget::Named(name) => matcher
				.resolve_named(name)
				.map(str::to_string)
				.ok_or_else(|| name.clone())?,
		};
		let current_path = self.inner.current.with(|c| c.path().to_string());
		let parsed = parse_url(&location, &current_path);
		let matched = matcher.resolve(&parsed.path).matched;
		Ok(RouteLocation::from_parsed(parsed, matched))
	}

	/// Navigates to `target`, adding a session-history entry.
	pub async fn push(&self, target: impl Into<RouteTarget>) -> NavigationResult {
		self.navigate(target.into(), NavigationMode::Push).await
	}

	/// Navigates to `target`, overwriting the current session-history entry.
	pub async fn replace(&self, target: impl Into<RouteTarget>) -> NavigationResult {
		self.navigate(target.into(), NavigationMode::Replace).await
	}

	/// Performs the initial navigation to the location in the address bar.
	pub async fn start(&self) -> NavigationResult {
		let location = self.inner.history.location();
		self.navigate(RouteTarget::Path(location), NavigationMode::Replace)
			.await
	}

	/// Moves through session history. The resulting navigation runs on the
	/// configured spawner once the router is ready.
	pub fn go(&self, delta: i64) {
		self.inner.history.go(delta, true);
	}

	/// Equivalent to `go(-1)`.
	pub fn back(&self) {
		self.go(-1);
	}

	/// Equivalent to `go(1)`.
	pub fn forward(&self) {
		self.go(1);
	}

	async fn navigate(&self, target: RouteTarget, mode: NavigationMode) -> NavigationResult {
		let from = self.current_route();
		let mut to = self.resolve_target(&target, &from, mode)?;

		let sequence = self.inner.sequence.get() + 1;
		self.inner.sequence.set(sequence);
		let mut pending = PendingNavigation {
			target,
			from,
			sequence,
			mode,
		};
		self.set_state(sequence, NavigationState::Resolving);
		self.emit(RouterEvent::Started {
			to: to.full_path().to_string(),
			from: pending.from.full_path().to_string(),
			mode,
		});

		let mut redirects = 0;
		loop {
			match self.run_guards(&to, &pending).await {
				NavigationOutcome::Proceed => return self.finalize(to, &pending),
				NavigationOutcome::Abort => {
					tracing::warn!(
						to = %to.full_path(),
						from = %pending.from.full_path(),
						"navigation aborted by guard"
					);
					self.set_state(sequence, NavigationState::Idle);
					self.emit(RouterEvent::Aborted {
						to: to.full_path().to_string(),
						from: pending.from.full_path().to_string(),
					});
					return Err(NavigationFailure::Aborted {
						to: to.full_path().to_string(),
						from: pending.from.full_path().to_string(),
					});
				}
				NavigationOutcome::Redirect(next) => {
					redirects += 1;
					if redirects > self.inner.max_redirects {
						tracing::warn!(
							to = %next,
							limit = self.inner.max_redirects,
							"redirect limit reached"
						);
						self.set_state(sequence, NavigationState::Idle);
						return Err(NavigationFailure::RedirectLimit {
							to: next.to_string(),
							limit: self.inner.max_redirects,
						});
					}
					tracing::debug!(from = %to.full_path(), to = %next, "navigation redirected");
					self.emit(RouterEvent::Redirected {
						from: to.full_path().to_string(),
						to: next.clone(),
					});

					// The entry the browser moved to is rewritten with the redirect target.
					if pending.mode.is_pop_state() {
						pending.mode = NavigationMode::Replace;
					}
					pending.target = next;
					self.set_state(sequence, NavigationState::Resolving);
					to = match self.resolve_target(&pending.target, &pending.from, pending.mode) {
						Ok(to) => to,
						Err(failure) => {
							self.set_state(sequence, NavigationState::Idle);
							return Err(failure);
						}
					};
				}
			}
		}
	}

	fn resolve_target(
		&self,
		target: &RouteTarget,
		from: &RouteLocation,
		mode: NavigationMode,
	) -> Result<RouteLocation, NavigationFailure> {
		let to = self
			.locate(target)
			.map_err(NavigationFailure::UnknownRouteName)?;
		if !mode.is_pop_state() && !from.is_start() && to.full_path() == from.full_path() {
			tracing::debug!(to = %to.full_path(), "skipping navigation to current location");
			return Err(NavigationFailure::Duplicated(to.full_path().to_string()));
		}
		Ok(to)
	}

	async fn run_guards(&self, to: &RouteLocation, pending: &PendingNavigation) -> NavigationOutcome {
		let changes = extract_change_records(to.matched(), pending.from.matched());
		for phase in GuardPhase::ALL {
			let guards = self.phase_guards(phase, to, &changes);
			self.set_state(pending.sequence, NavigationState::Guarding(phase));
			tracing::debug!(to = %to.full_path(), ?phase, guards = guards.len(), "entering guard phase");
			self.emit(RouterEvent::PhaseEntered {
				to: to.full_path().to_string(),
				phase,
			});

			for guard in guards {
				match guard.run(to, &pending.from).await {
					NavigationOutcome::Proceed => {}
					outcome => return outcome,
				}
			}
		}
		NavigationOutcome::Proceed
	}

	fn phase_guards(&self, phase: GuardPhase, to: &RouteLocation, changes: &ChangeRecords) -> Vec<Guard> {
		fn collect<'a>(
			records: impl IntoIterator<Item = &'a Rc<RouteRecord>>,
			pick: impl Fn(&'a RouteRecord) -> &'a [Guard],
		) -> Vec<Guard> {
			records
				.into_iter()
				.flat_map(|record| pick(&**record).iter().cloned())
				.collect()
		}

		match phase {
			GuardPhase::Leave => collect(&changes.leaving, |r| r.guards().leave()),
			GuardPhase::BeforeEach => self.inner.before_each.borrow().clone(),
			GuardPhase::Update => collect(&changes.updating, |r| r.guards().update()),
			GuardPhase::BeforeEnter => collect(to.matched(), |r| r.before_enter()),
			GuardPhase::Enter => collect(&changes.entering, |r| r.guards().enter()),
			GuardPhase::BeforeResolve => self.inner.before_resolve.borrow().clone(),
		}
	}

	fn finalize(&self, to: RouteLocation, pending: &PendingNavigation) -> NavigationResult {
		let from = &pending.from;
		if pending.sequence != self.inner.sequence.get() {
			tracing::warn!(
				to = %to.full_path(),
				from = %from.full_path(),
				"navigation cancelled by a newer navigation"
			);
			self.emit(RouterEvent::Cancelled {
				to: to.full_path().to_string(),
				from: from.full_path().to_string(),
			});
			return Err(NavigationFailure::Cancelled {
				to: to.full_path().to_string(),
				from: from.full_path().to_string(),
			});
		}

		self.set_state(pending.sequence, NavigationState::Committing);
		let history = &self.inner.history;
		let saved_scroll = match pending.mode {
			NavigationMode::PopState { .. } => {
				let state = history.state();
				history.take_saved_scroll(state.position).or(state.scroll)
			}
			_ => None,
		};

		let replace = from.is_start()
			|| matches!(pending.mode, NavigationMode::Replace | NavigationMode::PopState { .. });
		let written = if replace {
			history.replace(to.full_path(), None)
		} else {
			history.push(to.full_path(), None)
		};
		if let Err(err) = written {
			tracing::error!(to = %to.full_path(), error = %err, "failed to record navigation");
			self.set_state(pending.sequence, NavigationState::Idle);
			return Err(err.into());
		}

		self.inner.current.set(to.clone());
		self.mark_ready();
		self.apply_scroll(&to, from, saved_scroll);

		tracing::info!(to = %to.full_path(), from = %from.full_path(), "navigation committed");
		self.emit(RouterEvent::Committed {
			to: to.full_path().to_string(),
			from: from.full_path().to_string(),
		});

		let hooks = self.inner.after_each.borrow().clone();
		for hook in hooks {
			hook(&to, from.path());
		}
		self.set_state(pending.sequence, NavigationState::Idle);
		Ok(to)
	}

	fn apply_scroll(
		&self,
		to: &RouteLocation,
		from: &RouteLocation,
		saved: Option<ScrollPosition>,
	) {
		let Some(behavior) = &self.inner.scroll_behavior else {
			return;
		};
		if let Some(position) = behavior(to, from, saved) {
			self.inner.history.context().scroll_to(position);
		}
	}

	fn mark_ready(&self) {
		if self.inner.readiness.get() == Readiness::Ready {
			return;
		}
		self.inner.readiness.set(Readiness::Ready);

		let weak: Weak<RouterInner> = Rc::downgrade(&self.inner);
		self.inner.history.listen(Rc::new(
			move |to: &str, _from: &str, info: NavigationInfo| {
				if let Some(inner) = weak.upgrade() {
					Router { inner }.on_history_change(to.to_string(), info);
				}
			},
		));
		tracing::debug!("router ready; listening to session history");
	}

	fn on_history_change(&self, to: String, info: NavigationInfo) {
		let Some(spawner) = self.inner.spawner.clone() else {
			tracing::warn!(to = %to, "no spawner configured; browser navigation ignored");
			return;
		};
		let router = self.clone();
		spawner(
			async move {
				router.navigate_from_history(to, info).await;
			}
			.boxed_local(),
		);
	}

	async fn navigate_from_history(&self, to: String, info: NavigationInfo) {
		let mode = NavigationMode::PopState { delta: info.delta };
		let failure = match self.navigate(RouteTarget::Path(to), mode).await {
			Ok(_) => return,
			Err(failure) => failure,
		};

		// Put session history back where the committed location is. Only an
		// entry the browser just appended (typed URL) arrives with delta 0.
		match failure {
			NavigationFailure::Cancelled { .. } => {}
			_ if info.delta != 0 => self.inner.history.go(-info.delta, false),
			NavigationFailure::Aborted { .. } | NavigationFailure::Duplicated(_) => {
				self.inner.history.go(-1, false)
			}
			_ => {}
		}
	}

	fn set_state(&self, sequence: u64, state: NavigationState) {
		if sequence == self.inner.sequence.get() {
			self.inner.state.set(state);
		}
	}

	fn emit(&self, event: RouterEvent) {
		let listeners = self.inner.event_listeners.borrow().clone();
		for listener in listeners {
			listener(&event);
		}
	}
}
