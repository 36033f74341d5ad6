#![forbid(unsafe_code)]

//! List operations produced by the diff engine.
//!
//! # Position semantics
//!
//! Operations are sequential: every position refers to the structure as it
//! stands when that operation is applied, after all earlier operations in the
//! same batch.
//!
//! - `Insert { position, .. }`: `position <= len`.
//! - `Remove { position }`: `position < len`.
//! - `Move { from, to }`: remove at `from`, then insert at `to`, where `to` is
//!   an index into the list after the removal.
//! - `Change { position, .. }`: replace the row at `position` in place.
//!
//! [`apply_operations`] is the reference consumer of these rules.

use crate::error::{ListError, Result};

/// What a `Change` re-renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePayload<P> {
    /// Partial update described by the item's payload.
    Partial(P),
    /// Full refresh marker: the item had no payload to offer.
    Full,
}

impl<P> ChangePayload<P> {
    #[must_use]
    pub fn from_option(payload: Option<P>) -> Self {
        match payload {
            Some(p) => Self::Partial(p),
            None => Self::Full,
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    #[must_use]
    pub fn as_partial(&self) -> Option<&P> {
        match self {
            Self::Partial(p) => Some(p),
            Self::Full => None,
        }
    }
}

/// One step transforming the old visible state toward the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<T, P> {
    Insert {
        position: usize,
        item: T,
    },
    Remove {
        position: usize,
    },
    Move {
        from: usize,
        to: usize,
    },
    /// In-place update. Carries the new item so a consumer holding only the
    /// old values can reach the new state.
    Change {
        position: usize,
        item: T,
        payload: ChangePayload<P>,
    },
}

impl<T, P> Operation<T, P> {
    #[must_use]
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }

    #[must_use]
    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }

    #[must_use]
    pub fn is_move(&self) -> bool {
        matches!(self, Self::Move { .. })
    }

    #[must_use]
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Change { .. })
    }

    /// Check this operation against a structure of length `len` and return
    /// the length after it is applied.
    pub fn check_bounds(&self, len: usize) -> Result<usize> {
        let out_of_bounds = |position| ListError::PositionOutOfBounds {
            position,
            length: len,
        };
        match *self {
            Self::Insert { position, .. } if position > len => Err(out_of_bounds(position)),
            Self::Insert { .. } => Ok(len + 1),
            Self::Remove { position } if position >= len => Err(out_of_bounds(position)),
            Self::Remove { .. } => Ok(len - 1),
            Self::Move { from, .. } if from >= len => Err(out_of_bounds(from)),
            Self::Move { to, .. } if to >= len => Err(out_of_bounds(to)),
            Self::Move { .. } => Ok(len),
            Self::Change { position, .. } if position >= len => Err(out_of_bounds(position)),
            Self::Change { .. } => Ok(len),
        }
    }
}

/// Apply `ops` in order to `target`.
///
/// The whole batch is bounds-checked first; on error `target` is untouched.
pub fn apply_operations<T: Clone, P>(target: &mut Vec<T>, ops: &[Operation<T, P>]) -> Result<()> {
    ops.iter()
        .try_fold(target.len(), |len, op| op.check_bounds(len))?;

    for op in ops {
        match op {
            Operation::Insert { position, item } => target.insert(*position, item.clone()),
            Operation::Remove { position } => {
                target.remove(*position);
            }
            Operation::Move { from, to } => {
                let item = target.remove(*from);
                target.insert(*to, item);
            }
            Operation::Change { position, item, .. } => target[*position] = item.clone(),
        }
    }
    Ok(())
}

/// A ranged notification, for surfaces that prefer batched updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeUpdate<P> {
    Inserted {
        position: usize,
        count: usize,
    },
    Removed {
        position: usize,
        count: usize,
    },
    Moved {
        from: usize,
        to: usize,
    },
    Changed {
        position: usize,
        count: usize,
        payload: ChangePayload<P>,
    },
}

/// Fold consecutive single-row operations into ranged updates.
///
/// Adjacent inserts grow one `Inserted` range, a run of removes at the same
/// or neighbouring index grows one `Removed` range, and overlapping or
/// touching changes with equal payloads grow one `Changed` range. Moves are
/// never merged. Applying the ranges in order is equivalent to applying `ops`.
#[must_use]
pub fn coalesce<T, P: Clone + PartialEq>(ops: &[Operation<T, P>]) -> Vec<RangeUpdate<P>> {
    let mut out: Vec<RangeUpdate<P>> = Vec::with_capacity(ops.len());
    for op in ops {
        let merged = match (out.last_mut(), op) {
            (
                Some(RangeUpdate::Inserted { position, count }),
                Operation::Insert { position: at, .. },
            ) if *at >= *position && *at <= *position + *count => {
                *count += 1;
                true
            }
            (Some(RangeUpdate::Removed { position, count }), Operation::Remove { position: at })
                if *position >= *at && *position <= *at + 1 =>
            {
                *position = *at;
                *count += 1;
                true
            }
            (
                Some(RangeUpdate::Changed {
                    position,
                    count,
                    payload,
                }),
                Operation::Change {
                    position: at,
                    payload: next,
                    ..
                },
            ) if *payload == *next && *at + 1 >= *position && *at <= *position + *count => {
                let end = (*position + *count).max(*at + 1);
                *position = (*position).min(*at);
                *count = end - *position;
                true
            }
            _ => false,
        };
        if merged {
            continue;
        }
        out.push(match op {
            Operation::Insert { position, .. } => RangeUpdate::Inserted {
                position: *position,
                count: 1,
            },
            Operation::Remove { position } => RangeUpdate::Removed {
                position: *position,
                count: 1,
            },
            Operation::Move { from, to } => RangeUpdate::Moved {
                from: *from,
                to: *to,
            },
            Operation::Change {
                position, payload, ..
            } => RangeUpdate::Changed {
                position: *position,
                count: 1,
                payload: payload.clone(),
            },
        });
    }
    out
}
