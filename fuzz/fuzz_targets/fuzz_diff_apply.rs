#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rowsync_core::{DiffConfig, DiffableItem, ListDiffEngine, apply_operations, coalesce};

#[derive(Arbitrary, Debug, Clone, PartialEq)]
struct Row {
    id: u8,
    body: u8,
}

impl DiffableItem for Row {
    type Id = u8;
    type Payload = u8;

    fn identity(&self) -> u8 {
        self.id
    }

    fn same_content(&self, new: &Self) -> bool {
        self.body == new.body
    }

    fn change_payload(&self, new: &Self) -> Option<u8> {
        (new.body % 2 == 0).then_some(new.body)
    }
}

#[derive(Arbitrary, Debug)]
struct Input {
    old: Vec<Row>,
    new: Vec<Row>,
    detect_moves: bool,
}

fuzz_target!(|input: Input| {
    let old: Vec<Row> = input.old.into_iter().take(256).collect();
    let new: Vec<Row> = input.new.into_iter().take(256).collect();
    let engine =
        ListDiffEngine::with_config(DiffConfig::default().with_detect_moves(input.detect_moves));
    let result = engine.diff(&old, &new);

    let mut applied = old.clone();
    apply_operations(&mut applied, result.ops()).expect("diff stays in bounds");
    assert_eq!(applied, new);
    assert_eq!(result.stats().total(), result.len());
    assert!(coalesce(result.ops()).len() <= result.len());
});
