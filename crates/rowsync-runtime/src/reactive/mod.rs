#![forbid(unsafe_code)]

//! Reactive state holders for rowsync.
//!
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`ObservableDefault`]: An observable constructed with a default that
//!   readers see until a value is set; never reports an absent value.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification. Both types are `!Send`, which confines them to the
//! thread that owns the UI.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per notifying mutation.
//! 2. Subscribers are notified in registration order.
//! 3. `Observable::set` with an equal value is a no-op;
//!    `ObservableDefault::set` always notifies.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. `ObservableDefault::get` returns the default until the first set.

pub mod default_value;
pub mod observable;

pub use default_value::ObservableDefault;
pub use observable::{Observable, Subscription};
