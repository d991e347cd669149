//! Reinhardt Navigation - Client-side Routing for Single-page Applications
//!
//! Matches request paths against a tree of route definitions, keeps browser
//! session history in step with the application, and runs an ordered,
//! asynchronous guard pipeline before every route change.
//!
//! ## Features
//!
//! - **Nested Routes**: Child paths compose with their parent; a match yields the whole root-to-leaf chain
//! - **Session History**: Clean-path and fragment-prefixed strategies with back/forward detection
//! - **Guard Pipeline**: Leave, before-each, update, before-enter, enter and before-resolve phases with abort and redirect
//! - **Scroll Restoration**: Offsets remembered per history entry and handed to a user hook
//! - **Single-threaded**: `Rc`/`RefCell` state and `LocalBoxFuture` guards, suited to wasm32
//!
//! ## Architecture
//!
//! - [`location`]: URL parsing and base handling
//! - [`context`]: The browsing-context seam (in-memory and `window.history`)
//! - [`history`]: Session-history adapter
//! - [`matcher`]: Arena-backed route matcher
//! - [`guard`]: Guard capability and its adapters
//! - [`router`]: Navigation pipeline, locations and nested views
//! - [`reactive`]: The observable location cell
//! - [`scroll`]: Scroll snapshots
//!
//! ## Example
//!
//! ```
//! use futures::executor::block_on;
//! use reinhardt_navigation::context::{BrowsingContext, MemoryContext};
//! use reinhardt_navigation::history::create_web_history;
//! use reinhardt_navigation::{NavigationFailure, NavigationOutcome, RouteDef, Router, RouterOptions, guard_sync};
//! use std::rc::Rc;
//!
//! let context: Rc<dyn BrowsingContext> = Rc::new(MemoryContext::new("/"));
//! let router = Router::new(
//!     RouterOptions::new(create_web_history(context, "/").unwrap())
//!         .route(RouteDef::new("/").name("Home"))
//!         .route(RouteDef::new("/admin").meta("requires_auth", true)),
//! )
//! .unwrap();
//!
//! router.before_each(guard_sync(|to, _from| {
//!     if to.meta().contains_key("requires_auth") {
//!         NavigationOutcome::Abort
//!     } else {
//!         NavigationOutcome::Proceed
//!     }
//! }));
//!
//! block_on(router.start()).unwrap();
//! let result = block_on(router.push("/admin"));
//! assert!(matches!(result, Err(NavigationFailure::Aborted { .. })));
//! assert_eq!(router.current_route().path(), "/");
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod guard;
pub mod history;
pub mod location;
pub mod matcher;
pub mod reactive;
pub mod record;
pub mod router;
pub mod scroll;

pub use error::{HistoryError, NavigationFailure, RouterError};
pub use guard::{
	AfterHook, Guard, GuardReturn, NavigationGuard, NavigationOutcome, Next, guard_fn, guard_sync,
	guard_with_next,
};
pub use history::{
	HistoryConfig, HistoryEntry, HistoryMode, NavigationDirection, NavigationInfo, RouterHistory,
	create_history, create_web_hash_history, create_web_history,
};
pub use location::LocationQuery;
pub use matcher::{MatchedLocation, RouterMatcher};
pub use reactive::Signal;
pub use record::{ComponentGuards, RecordId, RouteDef, RouteMeta, RouteRecord, ViewBinding};
pub use router::{
	GuardPhase, NavigationMode, NavigationResult, NavigationState, Readiness, RouteLocation,
	RouteTarget, Router, RouterEvent, RouterOptions, RouterView, extract_change_records,
};
pub use scroll::{ScrollBehavior, ScrollPosition};
