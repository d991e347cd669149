//! Navigation pipeline.
//!
//! This module provides the [`Router`] and the types flowing through a
//! navigation: resolved [`RouteLocation`]s, [`RouteTarget`]s, the chain
//! diff and the nested [`RouterView`] accessor.

mod changes;
mod core;
mod options;
mod route;
mod view;

pub use self::changes::{ChangeRecords, extract_change_records};
pub use self::core::{
	EventListener, GuardPhase, NavigationMode, NavigationResult, NavigationState,
	PendingNavigation, Readiness, Router, RouterEvent,
};
pub use self::options::{DEFAULT_MAX_REDIRECTS, RouterOptions, Spawner};
pub use self::route::{RouteLocation, RouteTarget};
pub use self::view::RouterView;
