#![forbid(unsafe_code)]

//! An observable that never reports an absent value.
//!
//! [`ObservableDefault<T>`] is created with a default. Until the first
//! explicit [`set()`](ObservableDefault::set), readers see that default;
//! afterwards they see the last value set. Every explicit set notifies
//! subscribers synchronously on the calling thread, even when the value is
//! unchanged, because each set is an event for the UI surface that owns it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::observable::{Observable, Subscription};

struct DefaultState<T> {
    default: T,
    explicitly_set: Cell<bool>,
}

/// Single-value UI state holder with a fixed fallback.
///
/// Cloning creates a new handle to the **same** state.
pub struct ObservableDefault<T> {
    value: Observable<T>,
    state: Rc<DefaultState<T>>,
}

impl<T> Clone for ObservableDefault<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableDefault<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableDefault")
            .field("value", &self.value)
            .field("default", &self.state.default)
            .field("explicitly_set", &self.state.explicitly_set.get())
            .finish()
    }
}

impl<T: Clone + 'static> ObservableDefault<T> {
    #[must_use]
    pub fn new(default: T) -> Self {
        Self {
            value: Observable::new(default.clone()),
            state: Rc::new(DefaultState {
                default,
                explicitly_set: Cell::new(false),
            }),
        }
    }

    /// The last value set, or the default if nothing was set yet.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Borrow the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.state.explicitly_set.set(true);
        self.value.force_set(value);
    }

    /// Mutate a copy of the current value and set it.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Restore the default and notify subscribers.
    pub fn reset(&self) {
        self.state.explicitly_set.set(false);
        self.value.force_set(self.state.default.clone());
    }

    /// The value fixed at construction.
    #[must_use]
    pub fn default_value(&self) -> &T {
        &self.state.default
    }

    /// Whether a value has been set since construction or the last reset.
    #[must_use]
    pub fn is_explicitly_set(&self) -> bool {
        self.state.explicitly_set.get()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.value.subscribe(callback)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.value.version()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.value.subscriber_count()
    }
}

impl<T: Clone + Default + 'static> Default for ObservableDefault<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
