#![forbid(unsafe_code)]

//! Core: item identity contract, list diffing, and list operations.
//!
//! The pieces here are pure data and pure functions. Nothing in this crate
//! owns UI state; `rowsync-runtime` builds the stateful adapter on top.

pub mod config;
pub mod diff;
pub mod error;
pub mod item;
pub mod operation;

pub use config::DiffConfig;
pub use diff::{DiffResult, DiffStats, ListDiffEngine};
pub use error::{ComparisonFault, LifecycleFault, LifecycleFaultKind, ListError, Predicate, Result};
pub use item::{DiffableItem, check_reflexive};
pub use operation::{ChangePayload, Operation, RangeUpdate, apply_operations, coalesce};
