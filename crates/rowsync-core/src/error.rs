#![forbid(unsafe_code)]

//! Errors and diagnostics.
//!
//! [`ListError`] is the only thing returned as `Err`. The two fault types are
//! diagnostics: they describe misbehaving collaborators, get logged, and are
//! handed back as data so callers can inspect them, but they never abort the
//! operation that observed them.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ListError>;

/// Structural errors on input. Rejection leaves prior state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// A submitted sequence failed shape checks.
    #[error("invalid sequence at index {index}: {reason}")]
    InvalidSequence { index: usize, reason: String },

    /// An operation addressed a position outside the target structure.
    #[error("position {position} out of bounds (length {length})")]
    PositionOutOfBounds { position: usize, length: usize },
}

impl ListError {
    #[must_use]
    pub fn invalid(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSequence {
            index,
            reason: reason.into(),
        }
    }
}

/// Which item predicate misbehaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Identity,
    SameIdentity,
    SameContent,
    ChangePayload,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Identity => "identity",
            Self::SameIdentity => "same_identity",
            Self::SameContent => "same_content",
            Self::ChangePayload => "change_payload",
        })
    }
}

/// A `DiffableItem` predicate panicked or contradicted the identity key.
///
/// The comparison was treated as "differs" and the diff carried on. Key
/// faults (`Predicate::Identity`) involve a single item, so only one side
/// carries an index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{predicate} fault at {}: {message}", location(.old_index, .new_index))]
pub struct ComparisonFault {
    pub predicate: Predicate,
    pub old_index: Option<usize>,
    pub new_index: Option<usize>,
    pub message: String,
}

fn location(old_index: &Option<usize>, new_index: &Option<usize>) -> String {
    match (old_index, new_index) {
        (Some(old), Some(new)) => format!("old[{old}]/new[{new}]"),
        (Some(old), None) => format!("old[{old}]"),
        (None, Some(new)) => format!("new[{new}]"),
        (None, None) => "unknown row".to_string(),
    }
}

/// How the rendering surface broke the attach/detach alternation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleFaultKind {
    /// Attach reported for a row that is already attached.
    DoubleAttach,
    /// Detach reported for a row that is not attached.
    DetachWithoutAttach,
    /// Attach or detach reported for a position with no row.
    UnknownPosition { length: usize },
}

impl fmt::Display for LifecycleFaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleAttach => f.write_str("attach without intervening detach"),
            Self::DetachWithoutAttach => f.write_str("detach without prior attach"),
            Self::UnknownPosition { length } => write!(f, "no row (length {length})"),
        }
    }
}

/// The attach/detach invariant was violated by the rendering surface.
///
/// The offending call was not forwarded to the row handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lifecycle misuse at position {position}: {kind}")]
pub struct LifecycleFault {
    pub position: usize,
    pub kind: LifecycleFaultKind,
}
