#![forbid(unsafe_code)]

//! rowsync public facade crate.
//!
//! Re-exports the core diffing contract and, with the default `runtime`
//! feature, the stateful adapter and reactive holders.

pub use rowsync_core as core;
#[cfg(feature = "runtime")]
pub use rowsync_runtime as runtime;

pub mod prelude {
    pub use rowsync_core::{
        ChangePayload, DiffConfig, DiffStats, DiffableItem, ListDiffEngine, ListError, Operation,
    };
    #[cfg(feature = "runtime")]
    pub use rowsync_runtime::{
        AdapterConfig, DeferredGate, LifecycleListAdapter, ListBinding, ListSurface,
        ObservableDefault, RowHandle, bind_list,
    };
}
