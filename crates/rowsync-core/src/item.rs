#![forbid(unsafe_code)]

//! The row-model contract consumed by the diff engine.
//!
//! Every concrete row type implements [`DiffableItem`]. The engine never looks
//! inside an item; it only asks the three questions below.
//!
//! # Invariants
//!
//! 1. `x.same_identity(&x)` is `true` for every well-formed item.
//! 2. `same_content` is only consulted after `same_identity` returned `true`.
//! 3. All predicates are pure functions of the two compared values.
//!
//! # Failure Modes
//!
//! - **Predicate panics**: the engine catches the unwind, treats the
//!   comparison as `false` ("differs"), and records a
//!   [`ComparisonFault`](crate::ComparisonFault). The diff still completes.

use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};

use crate::diff::panic_message;
use crate::error::{ListError, Result};

/// Identity, content, and change-payload semantics for one list row.
///
/// # Example
///
/// ```
/// use rowsync_core::DiffableItem;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Contact {
///     id: u64,
///     name: String,
/// }
///
/// impl DiffableItem for Contact {
///     type Id = u64;
///     type Payload = String;
///
///     fn identity(&self) -> u64 {
///         self.id
///     }
///
///     fn same_content(&self, new: &Self) -> bool {
///         self.name == new.name
///     }
///
///     fn change_payload(&self, new: &Self) -> Option<String> {
///         Some(new.name.clone())
///     }
/// }
/// ```
pub trait DiffableItem {
    /// Persistent key used to pair rows across updates.
    type Id: Hash + Eq;

    /// Opaque descriptor of a partial change.
    type Payload;

    /// The persistent key of this row.
    fn identity(&self) -> Self::Id;

    /// Whether `self` and `new` denote the same logical row.
    ///
    /// The default compares [`identity`](Self::identity). Overrides must stay
    /// consistent with it: the engine pairs candidates by key and then confirms
    /// the pairing with this predicate.
    fn same_identity(&self, new: &Self) -> bool {
        self.identity() == new.identity()
    }

    /// Whether no visible field differs. Only meaningful when
    /// [`same_identity`](Self::same_identity) holds.
    fn same_content(&self, new: &Self) -> bool;

    /// What changed between `self` and `new`, for partial re-render.
    ///
    /// `None` means "re-render everything".
    fn change_payload(&self, _new: &Self) -> Option<Self::Payload> {
        None
    }
}

/// Reject a sequence containing a row that does not share identity with
/// itself, or whose identity check panics.
///
/// Returns the first malformed position as [`ListError::InvalidSequence`].
pub fn check_reflexive<T: DiffableItem>(items: &[T]) -> Result<()> {
    for (index, item) in items.iter().enumerate() {
        match panic::catch_unwind(AssertUnwindSafe(|| item.same_identity(item))) {
            Ok(true) => {}
            Ok(false) => return Err(ListError::invalid(index, "identity is not reflexive")),
            Err(payload) => {
                let reason = format!("identity check panicked: {}", panic_message(&*payload));
                return Err(ListError::invalid(index, reason));
            }
        }
    }
    Ok(())
}
