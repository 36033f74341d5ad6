#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rowsync_core::DiffableItem;
use rowsync_runtime::{LifecycleListAdapter, RowHandle};

#[derive(Arbitrary, Debug, Clone, PartialEq)]
struct Row {
    id: u8,
    body: u8,
}

impl DiffableItem for Row {
    type Id = u8;
    type Payload = ();

    fn identity(&self) -> u8 {
        self.id
    }

    fn same_content(&self, new: &Self) -> bool {
        self.body == new.body
    }
}

#[derive(Arbitrary, Debug)]
enum Step {
    Submit(Vec<Row>),
    Attach(u8),
    Detach(u8),
    DetachAll,
}

struct Handle {
    attached: bool,
    violations: Rc<RefCell<u32>>,
}

impl RowHandle<Row> for Handle {
    fn on_attached(&mut self) {
        if self.attached {
            *self.violations.borrow_mut() += 1;
        }
        self.attached = true;
    }

    fn on_detached(&mut self) {
        if !self.attached {
            *self.violations.borrow_mut() += 1;
        }
        self.attached = false;
    }
}

fuzz_target!(|steps: Vec<Step>| {
    let violations = Rc::new(RefCell::new(0u32));
    let shared = Rc::clone(&violations);
    let mut adapter = LifecycleListAdapter::new(
        |_: &rowsync_core::Operation<Row, ()>| {},
        move |_: &Row| Handle {
            attached: false,
            violations: Rc::clone(&shared),
        },
    );

    for step in steps.into_iter().take(64) {
        match step {
            Step::Submit(rows) => {
                let rows: Vec<Row> = rows.into_iter().take(64).collect();
                adapter.submit(rows.clone()).expect("well-formed rows");
                assert_eq!(adapter.items(), rows.as_slice());
            }
            Step::Attach(position) => {
                adapter.notify_attached(usize::from(position));
            }
            Step::Detach(position) => {
                adapter.notify_detached(usize::from(position));
            }
            Step::DetachAll => {
                adapter.detach_all();
            }
        }
    }
    drop(adapter);
    assert_eq!(*violations.borrow(), 0);
});
