#![forbid(unsafe_code)]

//! Readiness gate for a single deferred action.
//!
//! [`DeferredGate`] holds at most one pending action. While the gate is not
//! ready, [`defer()`](DeferredGate::defer) stores the action, replacing (and
//! dropping) any earlier one. When readiness flips from `false` to `true`,
//! the stored action runs exactly once. Once ready, deferred actions run
//! immediately.
//!
//! # Invariants
//!
//! 1. A stored action runs at most once.
//! 2. Last writer wins: an overwritten action never runs.
//! 3. Actions run with no internal borrow held, so they may call back into
//!    the gate (defer again, cancel, or flip readiness).
//!
//! # Failure Modes
//!
//! - **Overwrite before readiness**: the earlier action is silently lost
//!   apart from a `gate.discard` debug event. Callers needing every action
//!   must queue on their side.

use std::cell::{Cell, RefCell};
use std::fmt;

type Action = Box<dyn FnOnce()>;

/// Postpones one action until the gate is marked ready.
pub struct DeferredGate {
    pending: RefCell<Option<Action>>,
    ready: Cell<bool>,
}

impl fmt::Debug for DeferredGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredGate")
            .field("ready", &self.ready.get())
            .field("has_pending", &self.has_pending())
            .finish()
    }
}

impl Default for DeferredGate {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredGate {
    /// A gate that is not ready and holds nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(None),
            ready: Cell::new(false),
        }
    }

    /// Run `action` now if the gate is ready, otherwise store it in place of
    /// any earlier pending action.
    pub fn defer(&self, action: impl FnOnce() + 'static) {
        if self.ready.get() {
            action();
            return;
        }
        let previous = self.pending.borrow_mut().replace(Box::new(action));
        if previous.is_some() {
            tracing::debug!(message = "gate.discard", reason = "overwritten");
        }
    }

    /// Update readiness. A `false` to `true` transition runs the pending
    /// action, if any.
    pub fn set_ready(&self, ready: bool) {
        let was_ready = self.ready.replace(ready);
        if !ready || was_ready {
            return;
        }
        let action = self.pending.borrow_mut().take();
        if let Some(action) = action {
            tracing::debug!(message = "gate.release");
            action();
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Drop the pending action without running it. Returns whether one was
    /// dropped.
    pub fn cancel(&self) -> bool {
        let previous = self.pending.borrow_mut().take();
        if previous.is_some() {
            tracing::debug!(message = "gate.discard", reason = "cancelled");
            true
        } else {
            false
        }
    }
}
