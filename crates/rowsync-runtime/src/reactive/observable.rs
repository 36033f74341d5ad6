#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value, a version counter, and a list of weak
//! subscriber callbacks in `Rc<RefCell<..>>` storage. The strong side of each
//! callback lives in the [`Subscription`] returned by
//! [`subscribe()`](Observable::subscribe); dropping it kills the weak entry,
//! which is pruned on the next notification.
//!
//! Notification clones the value and releases the borrow before calling out,
//! so callbacks may read or write the same observable.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per notifying mutation.
//! 2. Subscribers are notified in registration order.
//! 3. [`set()`](Observable::set) with a value equal to the current one is a
//!    no-op; [`force_set()`](Observable::force_set) always notifies.
//! 4. A dropped [`Subscription`] is never called again.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// RAII guard for a subscriber callback. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value.
    ///
    /// # Panics
    ///
    /// Panics if the closure writes to the same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value and notify every subscriber, even if the new value
    /// equals the old one.
    pub fn force_set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Register a callback invoked with the new value after each change.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        Subscription {
            _callback: Box::new(callback),
        }
    }

    /// Number of notifying mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn notify(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            let callbacks: Vec<Rc<Callback<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Replace the value. No-op (no version bump, no notification) when the
    /// new value equals the current one.
    pub fn set(&self, value: T) {
        if self.inner.borrow().value == value {
            return;
        }
        self.force_set(value);
    }

    /// Mutate the value in place; notifies only if it actually changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
