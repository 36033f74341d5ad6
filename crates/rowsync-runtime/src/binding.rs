#![forbid(unsafe_code)]

//! Observable list → adapter wiring.
//!
//! [`bind_list`] submits the current value of an
//! `ObservableDefault<Vec<T>>` to a shared adapter, then resubmits on every
//! set. The returned [`ListBinding`] owns the subscription; dropping it
//! stops the updates.
//!
//! # Failure Modes
//!
//! - **Rejected sequence**: logged at error level and counted; the adapter
//!   keeps its previously applied state.
//! - **Reentrant set** (a row handle or surface sets the observable while a
//!   submission is in flight): the value is parked and submitted once the
//!   outer submission returns. Only the latest parked value is applied, so
//!   the adapter always ends on the observable's current list.
//! - **Adapter borrowed elsewhere**: the value is parked the same way and
//!   superseded by the next set.
//! - **Adapter dropped**: notifications become no-ops.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use rowsync_core::DiffableItem;

use crate::adapter::{LifecycleListAdapter, ListSurface, RowHandle};
use crate::reactive::{ObservableDefault, Subscription};

#[derive(Debug, Default)]
struct BindingCounters {
    submitted: Cell<u64>,
    failed: Cell<u64>,
    deferred: Cell<u64>,
}

/// Keeps an adapter in sync with an observable list.
#[must_use = "dropping a ListBinding stops list updates"]
pub struct ListBinding {
    counters: Rc<BindingCounters>,
    _subscription: Subscription,
}

impl fmt::Debug for ListBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBinding")
            .field("submitted", &self.submitted())
            .field("failed", &self.failed())
            .field("deferred", &self.deferred())
            .finish_non_exhaustive()
    }
}

impl ListBinding {
    /// Sequences applied successfully, including the initial one.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.counters.submitted.get()
    }

    /// Sequences the adapter rejected.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.counters.failed.get()
    }

    /// Sets that arrived while a submission was in flight and were parked.
    #[must_use]
    pub fn deferred(&self) -> u64 {
        self.counters.deferred.get()
    }
}

/// Submit `source`'s current list to `adapter` now and on every change.
pub fn bind_list<T, H, S>(
    source: &ObservableDefault<Vec<T>>,
    adapter: &Rc<RefCell<LifecycleListAdapter<T, H, S>>>,
) -> ListBinding
where
    T: DiffableItem + Clone + 'static,
    H: RowHandle<T> + 'static,
    S: ListSurface<T, T::Payload> + 'static,
{
    let counters = Rc::new(BindingCounters::default());
    let parked = Rc::new(RefCell::new(None));
    let target = Rc::downgrade(adapter);

    submit(&target, &counters, &parked, &source.get());

    let shared = Rc::clone(&counters);
    let subscription = source.subscribe(move |items: &Vec<T>| {
        submit(&target, &shared, &parked, items);
    });
    ListBinding {
        counters,
        _subscription: subscription,
    }
}

/// Latest list set during an in-flight submission.
type Parked<T> = RefCell<Option<Vec<T>>>;

fn submit<T, H, S>(
    target: &Weak<RefCell<LifecycleListAdapter<T, H, S>>>,
    counters: &BindingCounters,
    parked: &Parked<T>,
    items: &[T],
) where
    T: DiffableItem + Clone,
    H: RowHandle<T>,
    S: ListSurface<T, T::Payload>,
{
    let Some(adapter) = target.upgrade() else {
        return;
    };
    let Ok(mut guard) = adapter.try_borrow_mut() else {
        tracing::debug!(message = "binding.deferred_submit", len = items.len());
        counters.deferred.set(counters.deferred.get() + 1);
        *parked.borrow_mut() = Some(items.to_vec());
        return;
    };
    // `items` is the newest value; anything parked before it is stale.
    *parked.borrow_mut() = None;
    apply(&mut guard, counters, items.to_vec());
    drop(guard);

    // Sets made by row handles or the surface during the submission.
    loop {
        let next = parked.borrow_mut().take();
        let Some(next) = next else {
            return;
        };
        let Ok(mut guard) = adapter.try_borrow_mut() else {
            *parked.borrow_mut() = Some(next);
            return;
        };
        apply(&mut guard, counters, next);
    }
}

fn apply<T, H, S>(
    adapter: &mut LifecycleListAdapter<T, H, S>,
    counters: &BindingCounters,
    items: Vec<T>,
) where
    T: DiffableItem + Clone,
    H: RowHandle<T>,
    S: ListSurface<T, T::Payload>,
{
    match adapter.submit(items) {
        Ok(stats) => {
            counters.submitted.set(counters.submitted.get() + 1);
            tracing::debug!(message = "binding.submitted", ops = stats.total());
        }
        Err(err) => {
            counters.failed.set(counters.failed.get() + 1);
            tracing::error!(message = "binding.submit_failed", error = %err);
        }
    }
}
