#![forbid(unsafe_code)]

//! Lifecycle-aware list adapter.
//!
//! [`LifecycleListAdapter`] keeps the applied item sequence, one row handle
//! per item, and the rendering surface those rows are drawn on. Each
//! [`submit()`](LifecycleListAdapter::submit) diffs the new sequence against
//! the applied one and replays the operations on both the handles and the
//! surface.
//!
//! The surface owns visibility. It reports rows entering and leaving the
//! visible window through
//! [`notify_attached()`](LifecycleListAdapter::notify_attached) and
//! [`notify_detached()`](LifecycleListAdapter::notify_detached); the adapter
//! forwards these to the row's handle and keeps the alternation honest.
//!
//! # Invariants
//!
//! 1. A handle sees `on_attached` and `on_detached` strictly alternating,
//!    starting with `on_attached`.
//! 2. A row removed while attached is detached before the surface sees the
//!    `Remove`.
//! 3. A rejected submission changes nothing: not the items, the handles,
//!    the surface, nor the collected faults.
//! 4. `items().len()` always equals the number of row handles.
//! 5. Dropping the adapter detaches every attached row.
//!
//! # Failure Modes
//!
//! - **Malformed sequence**: `submit` returns
//!   [`ListError::InvalidSequence`] before diffing.
//! - **Lifecycle misuse** by the surface (double attach, detach without
//!   attach, unknown position): the call is not forwarded, `false` is
//!   returned, and a [`LifecycleFault`] is collected.
//! - **Predicate faults** during the diff are collected as
//!   [`AdapterFault::Comparison`]; the submission still applies.

pub mod config;

use std::fmt;

use rowsync_core::{
    ChangePayload, ComparisonFault, DiffStats, DiffableItem, LifecycleFault, LifecycleFaultKind,
    ListDiffEngine, ListError, Operation, Result, check_reflexive,
};
use thiserror::Error;

pub use config::AdapterConfig;

/// The rendering surface the adapter drives.
///
/// Operations arrive in application order with sequential positions; see
/// [`Operation`].
pub trait ListSurface<T, P> {
    fn apply(&mut self, op: &Operation<T, P>);
}

impl<T, P, F> ListSurface<T, P> for F
where
    F: FnMut(&Operation<T, P>),
{
    fn apply(&mut self, op: &Operation<T, P>) {
        self(op);
    }
}

/// Per-row state owned by the adapter.
pub trait RowHandle<T: DiffableItem> {
    /// The row entered the visible window.
    fn on_attached(&mut self);

    /// The row left the visible window.
    fn on_detached(&mut self);

    /// New content for the row. `payload` is `None` right after creation.
    fn on_bind(&mut self, _item: &T, _payload: Option<&ChangePayload<T::Payload>>) {}
}

/// A diagnostic collected by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterFault {
    #[error(transparent)]
    Comparison(#[from] ComparisonFault),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleFault),
}

struct Row<H> {
    handle: H,
    attached: bool,
}

type Factory<T, H> = Box<dyn FnMut(&T) -> H>;

/// Applies item sequences to a surface and drives per-row lifecycles.
pub struct LifecycleListAdapter<T, H, S>
where
    T: DiffableItem,
    H: RowHandle<T>,
{
    items: Vec<T>,
    rows: Vec<Row<H>>,
    factory: Factory<T, H>,
    surface: S,
    engine: ListDiffEngine,
    config: AdapterConfig,
    faults: Vec<AdapterFault>,
}

impl<T, H, S> fmt::Debug for LifecycleListAdapter<T, H, S>
where
    T: DiffableItem,
    H: RowHandle<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleListAdapter")
            .field("len", &self.items.len())
            .field("attached", &self.attached_count())
            .field("faults", &self.faults.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T, H, S> LifecycleListAdapter<T, H, S>
where
    T: DiffableItem,
    H: RowHandle<T>,
{
    /// An empty adapter with default configuration. `factory` creates the
    /// handle for each inserted row.
    #[must_use]
    pub fn new(surface: S, factory: impl FnMut(&T) -> H + 'static) -> Self {
        Self::with_config(AdapterConfig::default(), surface, factory)
    }

    #[must_use]
    pub fn with_config(
        config: AdapterConfig,
        surface: S,
        factory: impl FnMut(&T) -> H + 'static,
    ) -> Self {
        Self {
            items: Vec::new(),
            rows: Vec::new(),
            factory: Box::new(factory),
            surface,
            engine: ListDiffEngine::with_config(config.diff),
            config,
            faults: Vec::new(),
        }
    }

    /// The surface reports that the row at `position` became visible.
    ///
    /// Returns `false`, without touching the handle, on lifecycle misuse.
    pub fn notify_attached(&mut self, position: usize) -> bool {
        let length = self.rows.len();
        let Some(row) = self.rows.get_mut(position) else {
            self.lifecycle_fault(position, LifecycleFaultKind::UnknownPosition { length });
            return false;
        };
        if row.attached {
            self.lifecycle_fault(position, LifecycleFaultKind::DoubleAttach);
            return false;
        }
        row.attached = true;
        row.handle.on_attached();
        true
    }

    /// The surface reports that the row at `position` left the visible
    /// window.
    ///
    /// Returns `false`, without touching the handle, on lifecycle misuse.
    pub fn notify_detached(&mut self, position: usize) -> bool {
        let length = self.rows.len();
        let Some(row) = self.rows.get_mut(position) else {
            self.lifecycle_fault(position, LifecycleFaultKind::UnknownPosition { length });
            return false;
        };
        if !row.attached {
            self.lifecycle_fault(position, LifecycleFaultKind::DetachWithoutAttach);
            return false;
        }
        row.attached = false;
        row.handle.on_detached();
        true
    }

    /// Detach every attached row. Returns how many were detached.
    pub fn detach_all(&mut self) -> usize {
        let mut detached = 0;
        for row in self.rows.iter_mut().filter(|row| row.attached) {
            row.attached = false;
            row.handle.on_detached();
            detached += 1;
        }
        if detached > 0 {
            tracing::debug!(message = "adapter.detach_all", detached);
        }
        detached
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The last applied sequence.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    #[must_use]
    pub fn handle(&self, position: usize) -> Option<&H> {
        self.rows.get(position).map(|row| &row.handle)
    }

    #[must_use]
    pub fn handle_mut(&mut self, position: usize) -> Option<&mut H> {
        self.rows.get_mut(position).map(|row| &mut row.handle)
    }

    #[must_use]
    pub fn is_attached(&self, position: usize) -> bool {
        self.rows.get(position).is_some_and(|row| row.attached)
    }

    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.rows.iter().filter(|row| row.attached).count()
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Collected diagnostics, oldest first.
    #[must_use]
    pub fn faults(&self) -> &[AdapterFault] {
        &self.faults
    }

    /// Drain collected diagnostics.
    pub fn take_faults(&mut self) -> Vec<AdapterFault> {
        std::mem::take(&mut self.faults)
    }

    fn lifecycle_fault(&mut self, position: usize, kind: LifecycleFaultKind) {
        let fault = LifecycleFault { position, kind };
        tracing::warn!(message = "adapter.lifecycle_fault", fault = %fault);
        self.faults.push(AdapterFault::Lifecycle(fault));
    }

    fn validate(&self, sequence: &[T]) -> Result<()> {
        if let Some(max_rows) = self.config.max_rows {
            // Index the first row past the limit.
            if sequence.len() > max_rows {
                return Err(ListError::invalid(
                    max_rows,
                    format!("row {max_rows} exceeds the limit of {max_rows} rows"),
                ));
            }
        }
        if self.config.check_reflexive_identity {
            check_reflexive(sequence)?;
        }
        Ok(())
    }
}

impl<T, H, S> LifecycleListAdapter<T, H, S>
where
    T: DiffableItem + Clone,
    H: RowHandle<T>,
    S: ListSurface<T, T::Payload>,
{
    /// Diff `sequence` against the applied one and apply the result.
    ///
    /// Returns once every operation has reached the handles and the surface.
    pub fn submit(&mut self, sequence: Vec<T>) -> Result<DiffStats> {
        self.submit_with_commit(sequence, |_| {})
    }

    /// Like [`submit()`](Self::submit), then run `commit` with the applied
    /// stats. `commit` does not run when the sequence is rejected.
    pub fn submit_with_commit(
        &mut self,
        sequence: Vec<T>,
        commit: impl FnOnce(&DiffStats),
    ) -> Result<DiffStats> {
        let span = tracing::debug_span!(
            "adapter.submit",
            old_len = self.items.len(),
            new_len = sequence.len()
        );
        let _guard = span.enter();

        if let Err(err) = self.validate(&sequence) {
            tracing::warn!(message = "adapter.rejected", error = %err);
            return Err(err);
        }

        let (ops, stats, faults) = self.engine.diff(&self.items, &sequence).into_parts();
        ops.iter()
            .try_fold(self.rows.len(), |len, op| op.check_bounds(len))?;

        self.faults
            .extend(faults.into_iter().map(AdapterFault::Comparison));
        for op in &ops {
            self.apply(op);
        }
        self.items = sequence;
        debug_assert_eq!(self.items.len(), self.rows.len());

        tracing::debug!(
            message = "adapter.applied",
            inserts = stats.inserts,
            removes = stats.removes,
            moves = stats.moves,
            changes = stats.changes
        );
        commit(&stats);
        Ok(stats)
    }

    fn apply(&mut self, op: &Operation<T, T::Payload>) {
        match op {
            Operation::Insert { position, item } => {
                let mut handle = (self.factory)(item);
                handle.on_bind(item, None);
                self.rows.insert(
                    *position,
                    Row {
                        handle,
                        attached: false,
                    },
                );
            }
            Operation::Remove { position } => {
                let row = &mut self.rows[*position];
                if row.attached {
                    row.attached = false;
                    row.handle.on_detached();
                    tracing::debug!(message = "adapter.detach_on_remove", position = *position);
                }
            }
            Operation::Move { from, to } => {
                let row = self.rows.remove(*from);
                self.rows.insert(*to, row);
            }
            Operation::Change {
                position,
                item,
                payload,
            } => {
                self.rows[*position].handle.on_bind(item, Some(payload));
            }
        }
        self.surface.apply(op);
        if let Operation::Remove { position } = op {
            self.rows.remove(*position);
        }
    }
}

impl<T, H, S> Drop for LifecycleListAdapter<T, H, S>
where
    T: DiffableItem,
    H: RowHandle<T>,
{
    fn drop(&mut self) {
        self.detach_all();
    }
}
