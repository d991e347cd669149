//! Navigation guards.
//!
//! Every guard is reduced to one capability: given the target and the
//! current location, produce a [`NavigationOutcome`]. Two calling
//! conventions are adapted to it:
//!
//! - [`guard_fn`]: the guard returns a future that resolves to the outcome.
//! - [`guard_with_next`]: the guard receives a [`Next`] continuation and
//!   settles the step by calling it, or returns a future that is awaited and
//!   treated as an implicit `next.proceed()` once it settles. A guard that
//!   does neither stalls the navigation.

use crate::router::{RouteLocation, RouteTarget};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, Either, LocalBoxFuture};
use std::future::Future;
use std::rc::Rc;

/// Result of running a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
	/// Continue with the next guard.
	Proceed,
	/// Stop the navigation without committing.
	Abort,
	/// Discard the target and restart the navigation against another one.
	Redirect(RouteTarget),
}

impl NavigationOutcome {
	/// Shorthand for a redirect outcome.
	pub fn redirect(target: impl Into<RouteTarget>) -> Self {
		Self::Redirect(target.into())
	}
}

/// A navigation guard.
pub trait NavigationGuard {
	/// Decides whether the navigation from `from` to `to` may continue.
	fn run(&self, to: &RouteLocation, from: &RouteLocation) -> LocalBoxFuture<'static, NavigationOutcome>;
}

/// Shared guard handle, as stored in guard lists and route records.
pub type Guard = Rc<dyn NavigationGuard>;

/// Hook run after a navigation committed, with the new location and the
/// path of the previous one.
pub type AfterHook = Rc<dyn Fn(&RouteLocation, &str)>;

struct FnGuard<F>(F);

impl<F, Fut> NavigationGuard for FnGuard<F>
where
	F: Fn(&RouteLocation, &RouteLocation) -> Fut,
	Fut: Future<Output = NavigationOutcome> + 'static,
{
	fn run(&self, to: &RouteLocation, from: &RouteLocation) -> LocalBoxFuture<'static, NavigationOutcome> {
		(self.0)(to, from).boxed_local()
	}
}

/// Builds a guard from a function returning a future of the outcome.
///
/// # Example
///
/// ```
/// use reinhardt_navigation::{NavigationOutcome, guard_fn};
///
/// let requires_login = guard_fn(|to, _from| {
/// 	let protected = to.meta().get("requires_auth").is_some();
/// 	async move {
/// 		if protected {
/// 			NavigationOutcome::redirect("/login")
/// 		} else {
/// 			NavigationOutcome::Proceed
/// 		}
/// 	}
/// });
/// # let _ = requires_login;
/// ```
pub fn guard_fn<F, Fut>(f: F) -> Guard
where
	F: Fn(&RouteLocation, &RouteLocation) -> Fut + 'static,
	Fut: Future<Output = NavigationOutcome> + 'static,
{
	Rc::new(FnGuard(f))
}

/// Builds a guard from a synchronous decision.
pub fn guard_sync<F>(f: F) -> Guard
where
	F: Fn(&RouteLocation, &RouteLocation) -> NavigationOutcome + 'static,
{
	guard_fn(move |to, from| future::ready(f(to, from)))
}

/// Continuation handed to [`guard_with_next`] guards.
///
/// Consumed by the first call; dropping it without a call leaves the
/// navigation pending.
#[derive(Debug)]
pub struct Next {
	sender: Option<oneshot::Sender<NavigationOutcome>>,
}

impl Next {
	/// Lets the navigation continue.
	pub fn proceed(self) {
		self.resolve(NavigationOutcome::Proceed);
	}

	/// Aborts the navigation.
	pub fn abort(self) {
		self.resolve(NavigationOutcome::Abort);
	}

	/// Redirects the navigation to `target`.
	pub fn redirect(self, target: impl Into<RouteTarget>) {
		self.resolve(NavigationOutcome::Redirect(target.into()));
	}

	/// Settles the step with an explicit outcome.
	pub fn resolve(mut self, outcome: NavigationOutcome) {
		if let Some(sender) = self.sender.take() {
			// The receiver is gone only if the navigation itself was dropped.
			let _ = sender.send(outcome);
		}
	}
}

/// What a continuation-style guard returns besides calling [`Next`].
pub type GuardReturn = Option<LocalBoxFuture<'static, ()>>;

struct NextGuard<F>(F);

impl<F> NavigationGuard for NextGuard<F>
where
	F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardReturn,
{
	fn run(&self, to: &RouteLocation, from: &RouteLocation) -> LocalBoxFuture<'static, NavigationOutcome> {
		let (sender, receiver) = oneshot::channel();
		let returned = (self.0)(
			to,
			from,
			Next {
				sender: Some(sender),
			},
		);
		let target = to.full_path().to_string();

		async move {
			match returned {
				None => match receiver.await {
					Ok(outcome) => outcome,
					Err(_) => {
						tracing::warn!(
							to = %target,
							"guard dropped its continuation without calling it; navigation stalls"
						);
						future::pending().await
					}
				},
				Some(settles) => {
					let implicit = settles.map(|()| NavigationOutcome::Proceed).boxed_local();
					match future::select(receiver, implicit).await {
						Either::Left((Ok(outcome), _)) => outcome,
						Either::Left((Err(_), implicit)) => implicit.await,
						Either::Right((outcome, _)) => outcome,
					}
				}
			}
		}
		.boxed_local()
	}
}

/// Builds a guard that settles through a [`Next`] continuation.
///
/// # Example
///
/// ```
/// use reinhardt_navigation::guard_with_next;
///
/// let log_and_continue = guard_with_next(|to, _from, next| {
/// 	println!("entering {}", to.path());
/// 	next.proceed();
/// 	None
/// });
/// # let _ = log_and_continue;
/// ```
pub fn guard_with_next<F>(f: F) -> Guard
where
	F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardReturn + 'static,
{
	Rc::new(NextGuard(f))
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::executor::{LocalPool, block_on};
	use futures::task::LocalSpawnExt;
	use rstest::rstest;
	use std::cell::RefCell;

	fn location(path: &str) -> RouteLocation {
		RouteLocation::unmatched(path)
	}

	#[rstest]
	fn test_guard_fn_resolves_outcome() {
		let guard = guard_fn(|to, _| {
			let blocked = to.path() == "/admin";
			async move {
				if blocked {
					NavigationOutcome::Abort
				} else {
					NavigationOutcome::Proceed
				}
			}
		});

		assert_eq!(
			block_on(guard.run(&location("/admin"), &location("/"))),
			NavigationOutcome::Abort
		);
		assert_eq!(
			block_on(guard.run(&location("/about"), &location("/"))),
			NavigationOutcome::Proceed
		);
	}

	#[rstest]
	fn test_next_redirect() {
		let guard = guard_with_next(|_, _, next| {
			next.redirect("/login");
			None
		});

		assert_eq!(
			block_on(guard.run(&location("/admin"), &location("/"))),
			NavigationOutcome::redirect("/login")
		);
	}

	#[rstest]
	fn test_returned_future_is_implicit_next() {
		let guard = guard_with_next(|_, _, _next| Some(async {}.boxed_local()));

		assert_eq!(
			block_on(guard.run(&location("/a"), &location("/"))),
			NavigationOutcome::Proceed
		);
	}

	#[rstest]
	fn test_explicit_next_wins_over_returned_future() {
		let guard = guard_with_next(|_, _, next| {
			next.abort();
			Some(async {}.boxed_local())
		});

		assert_eq!(
			block_on(guard.run(&location("/a"), &location("/"))),
			NavigationOutcome::Abort
		);
	}

	#[rstest]
	fn test_guard_without_next_stalls() {
		let mut pool = LocalPool::new();
		let settled = Rc::new(RefCell::new(None));
		let guard = guard_with_next(|_, _, _next| None);

		let slot = Rc::clone(&settled);
		let step = guard.run(&location("/a"), &location("/"));
		pool.spawner()
			.spawn_local(async move {
				*slot.borrow_mut() = Some(step.await);
			})
			.unwrap();
		pool.run_until_stalled();

		assert!(settled.borrow().is_none());
	}

	#[rstest]
	fn test_continuation_called_later_settles() {
		let mut pool = LocalPool::new();
		let parked: Rc<RefCell<Option<Next>>> = Rc::new(RefCell::new(None));
		let settled = Rc::new(RefCell::new(None));

		let park = Rc::clone(&parked);
		let guard = guard_with_next(move |_, _, next| {
			*park.borrow_mut() = Some(next);
			None
		});

		let slot = Rc::clone(&settled);
		let step = guard.run(&location("/a"), &location("/"));
		pool.spawner()
			.spawn_local(async move {
				*slot.borrow_mut() = Some(step.await);
			})
			.unwrap();
		pool.run_until_stalled();
		assert!(settled.borrow().is_none());

		parked.borrow_mut().take().unwrap().proceed();
		pool.run_until_stalled();
		assert_eq!(*settled.borrow(), Some(NavigationOutcome::Proceed));
	}
}
