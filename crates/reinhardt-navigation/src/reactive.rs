//! Reactive location cell.
//!
//! `Signal<T>` is a single shared slot with change notification. The router
//! keeps the current [`RouteLocation`](crate::RouteLocation) in one and the
//! rendering collaborator subscribes to it.
//!
//! ## Example
//!
//! ```
//! use reinhardt_navigation::reactive::Signal;
//!
//! let count = Signal::new(0);
//! let seen = Signal::new(Vec::new());
//!
//! let log = seen.clone();
//! count.subscribe(move |value| log.update(|values| values.push(*value)));
//!
//! count.set(1);
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 2);
//! assert_eq!(seen.get(), vec![1, 2]);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Signal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<T> = Rc<dyn Fn(&T)>;

/// A shared value that notifies subscribers when written.
///
/// Clones share the same value and subscriber list.
pub struct Signal<T: 'static> {
	value: Rc<RefCell<T>>,
	subscribers: Rc<RefCell<Vec<(SubscriptionId, Subscriber<T>)>>>,
	next_id: Rc<Cell<u64>>,
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			value: Rc::clone(&self.value),
			subscribers: Rc::clone(&self.subscribers),
			next_id: Rc::clone(&self.next_id),
		}
	}
}

impl<T: 'static> Signal<T> {
	/// Creates a signal holding `value`.
	pub fn new(value: T) -> Self {
		Self {
			value: Rc::new(RefCell::new(value)),
			subscribers: Rc::new(RefCell::new(Vec::new())),
			next_id: Rc::new(Cell::new(0)),
		}
	}

	/// Returns a clone of the current value.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Reads the current value without cloning it.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Replaces the value and notifies subscribers.
	pub fn set(&self, value: T)
	where
		T: Clone,
	{
		*self.value.borrow_mut() = value;
		self.notify();
	}

	/// Mutates the value in place and notifies subscribers once.
	pub fn update(&self, f: impl FnOnce(&mut T))
	where
		T: Clone,
	{
		f(&mut self.value.borrow_mut());
		self.notify();
	}

	/// Registers `f` to run after every write.
	pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubscriptionId {
		let id = SubscriptionId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.subscribers.borrow_mut().push((id, Rc::new(f)));
		id
	}

	/// Removes a subscriber. Returns false if it was not registered.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut subscribers = self.subscribers.borrow_mut();
		let before = subscribers.len();
		subscribers.retain(|(sid, _)| *sid != id);
		subscribers.len() != before
	}

	// Subscribers get a snapshot so they may read or write the signal.
	fn notify(&self)
	where
		T: Clone,
	{
		let subscribers: Vec<Subscriber<T>> = self
			.subscribers
			.borrow()
			.iter()
			.map(|(_, f)| Rc::clone(f))
			.collect();
		if subscribers.is_empty() {
			return;
		}
		let snapshot = self.get();
		for subscriber in subscribers {
			subscriber(&snapshot);
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("value", &*self.value.borrow())
			.field("subscribers", &self.subscribers.borrow().len())
			.finish()
	}
}
