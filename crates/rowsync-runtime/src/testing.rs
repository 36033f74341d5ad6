#![forbid(unsafe_code)]

//! Recording doubles for adapter tests.
//!
//! [`RecordingSurface`] stores every operation it is asked to apply.
//! [`ProbeLog`] hands out [`LifecycleProbe`] row handles that journal their
//! lifecycle into one shared log, and checks the journal for alternation.
//!
//! Available under `cfg(test)` and with the `test-helpers` feature.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rowsync_core::{ChangePayload, DiffableItem, Operation};

use crate::adapter::{ListSurface, RowHandle};

/// A surface that keeps a copy of every applied operation.
#[derive(Debug, Clone)]
pub struct RecordingSurface<T, P> {
    ops: Vec<Operation<T, P>>,
}

impl<T, P> Default for RecordingSurface<T, P> {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<T, P> RecordingSurface<T, P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation seen so far, in order.
    #[must_use]
    pub fn ops(&self) -> &[Operation<T, P>] {
        &self.ops
    }

    /// Drain the recorded operations.
    pub fn take(&mut self) -> Vec<Operation<T, P>> {
        std::mem::take(&mut self.ops)
    }
}

impl<T: Clone, P: Clone> ListSurface<T, P> for RecordingSurface<T, P> {
    fn apply(&mut self, op: &Operation<T, P>) {
        self.ops.push(op.clone());
    }
}

/// One journal entry written by a [`LifecycleProbe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEvent {
    /// `on_bind`; `partial` is set when a partial payload was delivered.
    Bound { serial: usize, partial: bool },
    Attached { serial: usize },
    Detached { serial: usize },
}

/// Shared journal for every probe created from it.
#[derive(Debug, Clone, Default)]
pub struct ProbeLog {
    events: Rc<RefCell<Vec<ProbeEvent>>>,
    next_serial: Rc<Cell<usize>>,
}

impl ProbeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle factory for [`LifecycleListAdapter`](crate::LifecycleListAdapter).
    /// Each call of the factory creates a probe with the next serial.
    pub fn factory<T: DiffableItem>(&self) -> impl FnMut(&T) -> LifecycleProbe + use<T> {
        let log = self.clone();
        move |_| log.spawn()
    }

    /// A fresh probe with the next serial.
    #[must_use]
    pub fn spawn(&self) -> LifecycleProbe {
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);
        LifecycleProbe {
            serial,
            log: self.clone(),
        }
    }

    /// Number of probes created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.next_serial.get()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ProbeEvent> {
        self.events.borrow().clone()
    }

    /// Serials whose last lifecycle event is an attach.
    #[must_use]
    pub fn attached_serials(&self) -> Vec<usize> {
        let mut attached = vec![false; self.created()];
        for event in self.events.borrow().iter() {
            match *event {
                ProbeEvent::Attached { serial } => attached[serial] = true,
                ProbeEvent::Detached { serial } => attached[serial] = false,
                ProbeEvent::Bound { .. } => {}
            }
        }
        attached
            .iter()
            .enumerate()
            .filter_map(|(serial, &on)| on.then_some(serial))
            .collect()
    }

    /// Check that every probe saw attach and detach strictly alternating,
    /// starting with attach. The error names the first offending event.
    pub fn check_alternation(&self) -> Result<(), String> {
        let mut attached = vec![false; self.created()];
        for (index, event) in self.events.borrow().iter().enumerate() {
            match *event {
                ProbeEvent::Attached { serial } => {
                    if attached[serial] {
                        return Err(format!("event {index}: probe {serial} attached twice"));
                    }
                    attached[serial] = true;
                }
                ProbeEvent::Detached { serial } => {
                    if !attached[serial] {
                        return Err(format!(
                            "event {index}: probe {serial} detached while not attached"
                        ));
                    }
                    attached[serial] = false;
                }
                ProbeEvent::Bound { .. } => {}
            }
        }
        Ok(())
    }

    fn record(&self, event: ProbeEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Row handle that journals its lifecycle into a [`ProbeLog`].
#[derive(Debug)]
pub struct LifecycleProbe {
    serial: usize,
    log: ProbeLog,
}

impl LifecycleProbe {
    #[must_use]
    pub fn serial(&self) -> usize {
        self.serial
    }
}

impl<T: DiffableItem> RowHandle<T> for LifecycleProbe {
    fn on_attached(&mut self) {
        self.log.record(ProbeEvent::Attached {
            serial: self.serial,
        });
    }

    fn on_detached(&mut self) {
        self.log.record(ProbeEvent::Detached {
            serial: self.serial,
        });
    }

    fn on_bind(&mut self, _item: &T, payload: Option<&ChangePayload<T::Payload>>) {
        self.log.record(ProbeEvent::Bound {
            serial: self.serial,
            partial: payload.is_some_and(|p| !p.is_full()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternation_check_flags_double_attach() {
        let log = ProbeLog::new();
        let mut probe = log.spawn();
        RowHandle::<Unit>::on_attached(&mut probe);
        RowHandle::<Unit>::on_attached(&mut probe);
        assert_eq!(
            log.check_alternation(),
            Err("event 1: probe 0 attached twice".to_string())
        );
    }

    #[test]
    fn alternation_check_flags_orphan_detach() {
        let log = ProbeLog::new();
        let mut probe = log.spawn();
        RowHandle::<Unit>::on_detached(&mut probe);
        assert!(log.check_alternation().is_err());
    }

    #[test]
    fn attached_serials_track_last_event() {
        let log = ProbeLog::new();
        let mut a = log.spawn();
        let mut b = log.spawn();
        RowHandle::<Unit>::on_attached(&mut a);
        RowHandle::<Unit>::on_attached(&mut b);
        RowHandle::<Unit>::on_detached(&mut a);
        assert_eq!(log.attached_serials(), vec![1]);
        assert_eq!(log.check_alternation(), Ok(()));
    }

    #[test]
    fn recording_surface_drains() {
        let mut surface = RecordingSurface::<u8, ()>::new();
        surface.apply(&Operation::Remove { position: 0 });
        assert_eq!(surface.ops().len(), 1);
        assert_eq!(surface.take().len(), 1);
        assert!(surface.ops().is_empty());
    }

    #[derive(Debug, Clone)]
    struct Unit;

    impl DiffableItem for Unit {
        type Id = ();
        type Payload = ();

        fn identity(&self) {}

        fn same_content(&self, _new: &Self) -> bool {
            true
        }
    }
}
