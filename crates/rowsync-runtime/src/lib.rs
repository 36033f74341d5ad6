#![forbid(unsafe_code)]

//! Runtime: observable UI state, deferred actions, and the lifecycle list
//! adapter.
//!
//! Everything here is single-threaded. State holders use `Rc`/`RefCell` and
//! are `!Send`; callers drive them from the thread that owns the UI.
//!
//! # Feature Flags
//!
//! - `tracing-json`: [`logging`] bootstrap with JSON output.
//! - `test-helpers`: recording surfaces and lifecycle probes in [`testing`].

pub mod adapter;
pub mod binding;
pub mod gate;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod reactive;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use adapter::{AdapterConfig, AdapterFault, LifecycleListAdapter, ListSurface, RowHandle};
pub use binding::{ListBinding, bind_list};
pub use gate::DeferredGate;
#[cfg(feature = "tracing-json")]
pub use logging::{LoggingConfig, LoggingError, init_json_logging, init_logging};
pub use reactive::{Observable, ObservableDefault, Subscription};
