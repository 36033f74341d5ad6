#![forbid(unsafe_code)]

//! Identity-keyed list diff.
//!
//! [`ListDiffEngine::diff`] compares an old and a new ordered sequence of
//! [`DiffableItem`]s and returns the [`Operation`]s that turn the first into
//! the second.
//!
//! # Algorithm
//!
//! 1. Index the new sequence by `identity()`.
//! 2. Pair every old row with its counterpart and confirm with
//!    `same_identity`.
//! 3. `Remove` unpaired old rows, highest position first.
//! 4. Find the longest increasing run of paired rows (by new position, in old
//!    order). Those stay put; every other paired row gets exactly one `Move`.
//! 5. `Insert` unpaired new rows, lowest position first.
//! 6. `Change` paired rows whose content differs, lowest position first.
//!
//! Move positions are tracked with a Fenwick tree over a slot layout planned
//! up front: every paired row owns its old slot, and every moving row also
//! owns a destination slot placed right after the row it will follow. A move
//! vacates one slot and fills another, and a position is the count of filled
//! slots before it. The whole diff runs in O(n log n).
//!
//! # Invariants
//!
//! 1. `diff(s, s)` is empty.
//! 2. Applying the operations in order to `old` yields `new`, position for
//!    position.
//! 3. The number of moves is `paired - lis(paired)`, the minimum for
//!    single-row moves.
//! 4. `same_content` is never called on an unpaired couple.
//!
//! # Failure Modes
//!
//! - **Duplicate identities**: the first new row with a key wins; later
//!   duplicates (old or new) pair with nothing and are removed or inserted.
//! - **Panicking predicate**: caught, recorded as a [`ComparisonFault`], and
//!   the comparison counts as "differs". Identity faults unpair the rows;
//!   content faults produce a full-refresh `Change`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use ahash::AHashMap;

use crate::config::DiffConfig;
use crate::error::{ComparisonFault, Predicate};
use crate::item::DiffableItem;
use crate::operation::{ChangePayload, Operation};

/// Operation counts for one diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub inserts: usize,
    pub removes: usize,
    pub moves: usize,
    pub changes: usize,
}

impl DiffStats {
    /// Total number of operations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inserts + self.removes + self.moves + self.changes
    }

    fn record<T, P>(&mut self, op: &Operation<T, P>) {
        match op {
            Operation::Insert { .. } => self.inserts += 1,
            Operation::Remove { .. } => self.removes += 1,
            Operation::Move { .. } => self.moves += 1,
            Operation::Change { .. } => self.changes += 1,
        }
    }
}

/// The output of one diff: ordered operations plus diagnostics.
#[derive(Debug, Clone)]
pub struct DiffResult<T, P> {
    ops: Vec<Operation<T, P>>,
    stats: DiffStats,
    faults: Vec<ComparisonFault>,
}

impl<T, P> DiffResult<T, P> {
    /// Operations in application order.
    #[must_use]
    pub fn ops(&self) -> &[Operation<T, P>] {
        &self.ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<Operation<T, P>> {
        self.ops
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<Operation<T, P>>, DiffStats, Vec<ComparisonFault>) {
        (self.ops, self.stats, self.faults)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn stats(&self) -> DiffStats {
        self.stats
    }

    /// Predicate faults absorbed while diffing.
    #[must_use]
    pub fn faults(&self) -> &[ComparisonFault] {
        &self.faults
    }

    /// Feed every operation, in order, to `sink`.
    pub fn dispatch(&self, mut sink: impl FnMut(&Operation<T, P>)) {
        for op in &self.ops {
            sink(op);
        }
    }
}

/// Computes [`DiffResult`]s between item sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDiffEngine {
    config: DiffConfig,
}

impl ListDiffEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: DiffConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff `old` against `new`. Neither sequence is modified.
    pub fn diff<T>(&self, old: &[T], new: &[T]) -> DiffResult<T, T::Payload>
    where
        T: DiffableItem + Clone,
    {
        let span = tracing::debug_span!("rowsync.diff", old_len = old.len(), new_len = new.len());
        let _guard = span.enter();

        let mut run = DiffRun {
            config: self.config,
            ops: Vec::new(),
            stats: DiffStats::default(),
            faults: Vec::new(),
        };

        let (mut old_to_new, mut new_to_old) = run.pair(old, new);
        let stays = run.plan_stays(&old_to_new);

        if !self.config.detect_moves {
            // Reordered rows leave and re-enter instead of moving.
            for (i, stay) in stays.iter().enumerate() {
                if let (Some(j), false) = (old_to_new[i], *stay) {
                    old_to_new[i] = None;
                    new_to_old[j] = None;
                }
            }
        }

        for i in (0..old.len()).rev() {
            if old_to_new[i].is_none() {
                run.push(Operation::Remove { position: i });
            }
        }

        if self.config.detect_moves {
            run.emit_moves(&old_to_new, &new_to_old, &stays);
        }

        for (j, item) in new.iter().enumerate() {
            if new_to_old[j].is_none() {
                run.push(Operation::Insert {
                    position: j,
                    item: item.clone(),
                });
            }
        }

        for (j, item) in new.iter().enumerate() {
            if let Some(i) = new_to_old[j] {
                run.emit_change(&old[i], item, i, j);
            }
        }

        let DiffRun {
            ops, stats, faults, ..
        } = run;
        tracing::debug!(
            message = "diff.complete",
            inserts = stats.inserts,
            removes = stats.removes,
            moves = stats.moves,
            changes = stats.changes,
            faults = faults.len()
        );
        DiffResult { ops, stats, faults }
    }
}

/// Diff with the default configuration.
pub fn diff<T>(old: &[T], new: &[T]) -> DiffResult<T, T::Payload>
where
    T: DiffableItem + Clone,
{
    ListDiffEngine::new().diff(old, new)
}

struct DiffRun<T, P> {
    config: DiffConfig,
    ops: Vec<Operation<T, P>>,
    stats: DiffStats,
    faults: Vec<ComparisonFault>,
}

impl<T, P> DiffRun<T, P>
where
    T: DiffableItem<Payload = P> + Clone,
{
    fn push(&mut self, op: Operation<T, P>) {
        self.stats.record(&op);
        self.ops.push(op);
    }

    fn guarded<R>(&self, f: impl FnOnce() -> R) -> Result<R, String> {
        if !self.config.catch_predicate_panics {
            return Ok(f());
        }
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(&*payload))
    }

    fn fault(
        &mut self,
        predicate: Predicate,
        old_index: Option<usize>,
        new_index: Option<usize>,
        message: String,
    ) {
        let fault = ComparisonFault {
            predicate,
            old_index,
            new_index,
            message,
        };
        tracing::warn!(message = "diff.comparison_fault", fault = %fault);
        self.faults.push(fault);
    }

    /// Pair rows by identity. Returns `(old_to_new, new_to_old)`.
    fn pair(&mut self, old: &[T], new: &[T]) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
        let mut index: AHashMap<T::Id, usize> = AHashMap::with_capacity(new.len());
        for (j, item) in new.iter().enumerate() {
            match self.guarded(|| item.identity()) {
                Ok(key) => {
                    index.entry(key).or_insert(j);
                }
                Err(message) => self.fault(Predicate::Identity, None, Some(j), message),
            }
        }

        let mut old_to_new = vec![None; old.len()];
        let mut new_to_old = vec![None; new.len()];
        for (i, item) in old.iter().enumerate() {
            let key = match self.guarded(|| item.identity()) {
                Ok(key) => key,
                Err(message) => {
                    self.fault(Predicate::Identity, Some(i), None, message);
                    continue;
                }
            };
            let Some(&j) = index.get(&key) else {
                continue;
            };
            if new_to_old[j].is_some() {
                continue;
            }
            match self.guarded(|| item.same_identity(&new[j])) {
                Ok(true) => {
                    old_to_new[i] = Some(j);
                    new_to_old[j] = Some(i);
                }
                Ok(false) => self.fault(
                    Predicate::SameIdentity,
                    Some(i),
                    Some(j),
                    "rejected a pairing with an equal identity key".to_string(),
                ),
                Err(message) => self.fault(Predicate::SameIdentity, Some(i), Some(j), message),
            }
        }
        (old_to_new, new_to_old)
    }

    /// Mark the paired old rows that keep their relative order.
    ///
    /// Indexed by old position; unpaired rows are `false`.
    fn plan_stays(&self, old_to_new: &[Option<usize>]) -> Vec<bool> {
        let paired: Vec<(usize, usize)> = old_to_new
            .iter()
            .enumerate()
            .filter_map(|(i, j)| j.map(|j| (i, j)))
            .collect();
        let targets: Vec<usize> = paired.iter().map(|&(_, j)| j).collect();

        let mut stays = vec![false; old_to_new.len()];
        for k in longest_increasing(&targets) {
            stays[paired[k].0] = true;
        }
        stays
    }

    fn emit_moves(&mut self, old_to_new: &[Option<usize>], new_to_old: &[Option<usize>], stays: &[bool]) {
        // Rank = position among paired rows after the removals.
        let mut rank_of_old = vec![usize::MAX; old_to_new.len()];
        let mut paired_count = 0;
        for (i, j) in old_to_new.iter().enumerate() {
            if j.is_some() {
                rank_of_old[i] = paired_count;
                paired_count += 1;
            }
        }
        let moving = stays
            .iter()
            .zip(old_to_new)
            .filter(|&(stay, j)| !stay && j.is_some())
            .count();
        if moving == 0 {
            return;
        }

        // Paired ranks in target order, with the anchor each mover follows.
        let mut target_order = Vec::with_capacity(paired_count);
        let mut head_chain = Vec::new();
        let mut chains: Vec<Vec<usize>> = vec![Vec::new(); paired_count];
        let mut anchor: Option<usize> = None;
        for i in new_to_old.iter().flatten().copied() {
            let rank = rank_of_old[i];
            target_order.push((rank, stays[i]));
            if stays[i] {
                anchor = Some(rank);
            } else {
                match anchor {
                    Some(a) => chains[a].push(rank),
                    None => head_chain.push(rank),
                }
            }
        }

        // Slot layout: head chain, then each old slot followed by its chain.
        let mut old_slot = vec![0; paired_count];
        let mut new_slot = vec![0; paired_count];
        let mut next = 0;
        for &rank in &head_chain {
            new_slot[rank] = next;
            next += 1;
        }
        for rank in 0..paired_count {
            old_slot[rank] = next;
            next += 1;
            for &follower in &chains[rank] {
                new_slot[follower] = next;
                next += 1;
            }
        }

        let mut filled = Fenwick::new(next);
        for &slot in &old_slot {
            filled.add(slot, 1);
        }

        for (rank, stay) in target_order {
            if stay {
                continue;
            }
            let from = filled.prefix(old_slot[rank]);
            filled.add(old_slot[rank], -1);
            let to = filled.prefix(new_slot[rank]);
            filled.add(new_slot[rank], 1);
            if from != to {
                self.push(Operation::Move { from, to });
            }
        }
    }

    fn emit_change(&mut self, old: &T, new: &T, old_index: usize, new_index: usize) {
        let same = match self.guarded(|| old.same_content(new)) {
            Ok(same) => same,
            Err(message) => {
                self.fault(Predicate::SameContent, Some(old_index), Some(new_index), message);
                false
            }
        };
        if same {
            return;
        }
        let payload = match self.guarded(|| old.change_payload(new)) {
            Ok(payload) => ChangePayload::from_option(payload),
            Err(message) => {
                self.fault(Predicate::ChangePayload, Some(old_index), Some(new_index), message);
                ChangePayload::Full
            }
        };
        self.push(Operation::Change {
            position: new_index,
            item: new.clone(),
            payload,
        });
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "predicate panicked".to_string()
    }
}

/// Indices of one longest strictly increasing subsequence of `values`.
///
/// Patience sorting, O(n log n). Returned indices are ascending.
fn longest_increasing(values: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];
    for (k, &value) in values.iter().enumerate() {
        let at = tails.partition_point(|&t| values[t] < value);
        if at > 0 {
            prev[k] = Some(tails[at - 1]);
        }
        if at == tails.len() {
            tails.push(k);
        } else {
            tails[at] = k;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(k) = cursor {
        out.push(k);
        cursor = prev[k];
    }
    out.reverse();
    out
}

/// Binary indexed tree over slot occupancy.
struct Fenwick {
    tree: Vec<isize>,
}

impl Fenwick {
    fn new(len: usize) -> Self {
        Self {
            tree: vec![0; len + 1],
        }
    }

    fn add(&mut self, slot: usize, delta: isize) {
        let mut i = slot + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    /// Sum over slots `0..slot`.
    fn prefix(&self, slot: usize) -> usize {
        let mut i = slot;
        let mut sum = 0;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum.max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::apply_operations;

    #[derive(Debug, Clone, PartialEq)]
    struct Msg {
        id: u32,
        body: &'static str,
    }

    fn msg(id: u32, body: &'static str) -> Msg {
        Msg { id, body }
    }

    impl DiffableItem for Msg {
        type Id = u32;
        type Payload = (&'static str, &'static str);

        fn identity(&self) -> u32 {
            self.id
        }

        fn same_content(&self, new: &Self) -> bool {
            self.body == new.body
        }

        fn change_payload(&self, new: &Self) -> Option<Self::Payload> {
            Some((self.body, new.body))
        }
    }

    fn applied(old: &[Msg], new: &[Msg], config: DiffConfig) -> Vec<Msg> {
        let result = ListDiffEngine::with_config(config).diff(old, new);
        let mut out = old.to_vec();
        apply_operations(&mut out, result.ops()).unwrap();
        out
    }

    #[test]
    fn identical_sequences_produce_nothing() {
        let s = vec![msg(1, "a"), msg(2, "b"), msg(3, "c")];
        let result = diff(&s, &s);
        assert!(result.is_empty());
        assert_eq!(result.stats(), DiffStats::default());
    }

    #[test]
    fn empty_to_three_inserts_in_order() {
        let new = vec![msg(1, "a"), msg(2, "b"), msg(3, "c")];
        let result = diff(&[], &new);
        let positions: Vec<usize> = result
            .ops()
            .iter()
            .map(|op| match op {
                Operation::Insert { position, .. } => *position,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn disjoint_sequences_remove_then_insert() {
        let old = vec![msg(1, "a"), msg(2, "b")];
        let new = vec![msg(3, "c"), msg(4, "d"), msg(5, "e")];
        let stats = diff(&old, &new).stats();
        assert_eq!(
            stats,
            DiffStats {
                inserts: 3,
                removes: 2,
                moves: 0,
                changes: 0
            }
        );
    }

    #[test]
    fn swap_with_content_change() {
        let old = vec![msg(1, "a"), msg(2, "b")];
        let new = vec![msg(2, "b"), msg(1, "x")];
        let result = diff(&old, &new);
        assert_eq!(result.stats().moves, 1);
        assert_eq!(result.stats().changes, 1);
        let change = result.ops().iter().find(|op| op.is_change()).unwrap();
        assert_eq!(
            change,
            &Operation::Change {
                position: 1,
                item: msg(1, "x"),
                payload: ChangePayload::Partial(("a", "x")),
            }
        );
        assert_eq!(applied(&old, &new, DiffConfig::default()), new);
    }

    #[test]
    fn rotate_left_is_one_move() {
        let old = vec![msg(1, "a"), msg(2, "b"), msg(3, "c"), msg(4, "d")];
        let new = vec![msg(2, "b"), msg(3, "c"), msg(4, "d"), msg(1, "a")];
        let result = diff(&old, &new);
        assert_eq!(result.ops(), &[Operation::Move { from: 0, to: 3 }]);
    }

    #[test]
    fn rotate_right_is_one_move() {
        let old = vec![msg(1, "a"), msg(2, "b"), msg(3, "c"), msg(4, "d")];
        let new = vec![msg(4, "d"), msg(1, "a"), msg(2, "b"), msg(3, "c")];
        let result = diff(&old, &new);
        assert_eq!(result.ops(), &[Operation::Move { from: 3, to: 0 }]);
    }

    #[test]
    fn reversal_moves_all_but_one() {
        let old: Vec<Msg> = (0..6).map(|i| msg(i, "v")).collect();
        let new: Vec<Msg> = old.iter().rev().cloned().collect();
        let result = diff(&old, &new);
        assert_eq!(result.stats().moves, 5);
        assert_eq!(applied(&old, &new, DiffConfig::default()), new);
    }

    #[test]
    fn mixed_edit_reaches_target() {
        let old = vec![
            msg(1, "a"),
            msg(2, "b"),
            msg(3, "c"),
            msg(4, "d"),
            msg(5, "e"),
        ];
        let new = vec![
            msg(5, "e"),
            msg(6, "f"),
            msg(3, "C"),
            msg(1, "a"),
            msg(7, "g"),
        ];
        assert_eq!(applied(&old, &new, DiffConfig::default()), new);
    }

    #[test]
    fn without_move_detection_reorders_become_remove_insert() {
        let old = vec![msg(1, "a"), msg(2, "b"), msg(3, "c")];
        let new = vec![msg(3, "c"), msg(1, "a"), msg(2, "b")];
        let config = DiffConfig::default().with_detect_moves(false);
        let result = ListDiffEngine::with_config(config).diff(&old, &new);
        assert_eq!(result.stats().moves, 0);
        assert_eq!(result.stats().removes, 1);
        assert_eq!(result.stats().inserts, 1);
        assert_eq!(applied(&old, &new, config), new);
    }

    #[test]
    fn duplicate_identities_do_not_crash() {
        let old = vec![msg(1, "a"), msg(1, "b")];
        let new = vec![msg(1, "a"), msg(1, "c"), msg(1, "d")];
        assert_eq!(applied(&old, &new, DiffConfig::default()), new);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Fragile {
        id: u32,
        poisoned: bool,
    }

    impl DiffableItem for Fragile {
        type Id = u32;
        type Payload = ();

        fn identity(&self) -> u32 {
            self.id
        }

        fn same_content(&self, new: &Self) -> bool {
            if new.poisoned {
                panic!("content check exploded");
            }
            self.poisoned == new.poisoned
        }
    }

    #[test]
    fn panicking_content_check_becomes_full_change() {
        let old = vec![Fragile {
            id: 1,
            poisoned: false,
        }];
        let new = vec![Fragile {
            id: 1,
            poisoned: true,
        }];
        let result = diff(&old, &new);
        assert_eq!(result.faults().len(), 1);
        assert_eq!(result.faults()[0].predicate, Predicate::SameContent);
        assert_eq!(result.faults()[0].message, "content check exploded");
        assert_eq!(
            result.ops(),
            &[Operation::Change {
                position: 0,
                item: new[0].clone(),
                payload: ChangePayload::Full,
            }]
        );
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Contrary(u32);

    impl DiffableItem for Contrary {
        type Id = u32;
        type Payload = ();

        fn identity(&self) -> u32 {
            self.0
        }

        fn same_identity(&self, _new: &Self) -> bool {
            false
        }

        fn same_content(&self, _new: &Self) -> bool {
            true
        }
    }

    #[test]
    fn identity_disagreement_unpairs_rows() {
        let old = vec![Contrary(1)];
        let new = vec![Contrary(1)];
        let result = diff(&old, &new);
        assert_eq!(result.faults()[0].predicate, Predicate::SameIdentity);
        assert_eq!(result.stats().removes, 1);
        assert_eq!(result.stats().inserts, 1);
    }

    /// Row whose named predicate panics.
    #[derive(Debug, Clone, PartialEq)]
    struct Volatile {
        id: u32,
        body: u8,
        blows: Option<Predicate>,
    }

    fn steady(id: u32, body: u8) -> Volatile {
        Volatile {
            id,
            body,
            blows: None,
        }
    }

    fn blowing(id: u32, body: u8, predicate: Predicate) -> Volatile {
        Volatile {
            id,
            body,
            blows: Some(predicate),
        }
    }

    impl DiffableItem for Volatile {
        type Id = u32;
        type Payload = u8;

        fn identity(&self) -> u32 {
            if self.blows == Some(Predicate::Identity) {
                panic!("identity exploded");
            }
            self.id
        }

        fn same_content(&self, new: &Self) -> bool {
            self.body == new.body
        }

        fn change_payload(&self, new: &Self) -> Option<u8> {
            if new.blows == Some(Predicate::ChangePayload) {
                panic!("payload exploded");
            }
            Some(new.body)
        }
    }

    fn converges(old: &[Volatile], result: &DiffResult<Volatile, u8>) -> Vec<Volatile> {
        let mut out = old.to_vec();
        apply_operations(&mut out, result.ops()).unwrap();
        out
    }

    #[test]
    fn panicking_identity_on_new_row_leaves_it_unpaired() {
        let old = vec![steady(1, 0), steady(2, 0)];
        let new = vec![blowing(2, 0, Predicate::Identity)];
        let result = diff(&old, &new);

        assert_eq!(
            result.faults(),
            &[ComparisonFault {
                predicate: Predicate::Identity,
                old_index: None,
                new_index: Some(0),
                message: "identity exploded".to_string(),
            }]
        );
        assert_eq!(
            result.ops(),
            &[
                Operation::Remove { position: 1 },
                Operation::Remove { position: 0 },
                Operation::Insert {
                    position: 0,
                    item: new[0].clone(),
                },
            ]
        );
        assert_eq!(converges(&old, &result), new);
    }

    #[test]
    fn panicking_identity_on_old_row_removes_it() {
        let old = vec![blowing(1, 0, Predicate::Identity), steady(2, 0)];
        let new = vec![steady(2, 0), steady(1, 0)];
        let result = diff(&old, &new);

        assert_eq!(result.faults().len(), 1);
        assert_eq!(result.faults()[0].predicate, Predicate::Identity);
        assert_eq!(result.faults()[0].old_index, Some(0));
        assert_eq!(result.faults()[0].new_index, None);
        assert_eq!(result.stats().removes, 1);
        assert_eq!(result.stats().inserts, 1);
        assert_eq!(result.stats().moves, 0);
        assert_eq!(converges(&old, &result), new);
    }

    #[test]
    fn panicking_payload_becomes_full_change() {
        let old = vec![steady(1, 0), steady(2, 0)];
        let new = vec![steady(1, 0), blowing(2, 7, Predicate::ChangePayload)];
        let result = diff(&old, &new);

        assert_eq!(
            result.faults(),
            &[ComparisonFault {
                predicate: Predicate::ChangePayload,
                old_index: Some(1),
                new_index: Some(1),
                message: "payload exploded".to_string(),
            }]
        );
        assert_eq!(
            result.ops(),
            &[Operation::Change {
                position: 1,
                item: new[1].clone(),
                payload: ChangePayload::Full,
            }]
        );
    }

    #[test]
    #[should_panic(expected = "payload exploded")]
    fn uncaught_predicate_panic_unwinds() {
        let old = vec![steady(1, 0)];
        let new = vec![blowing(1, 7, Predicate::ChangePayload)];
        let engine =
            ListDiffEngine::with_config(DiffConfig::default().with_catch_predicate_panics(false));
        let _ = engine.diff(&old, &new);
    }

    #[test]
    fn longest_increasing_picks_maximal_run() {
        assert_eq!(longest_increasing(&[]), Vec::<usize>::new());
        assert_eq!(longest_increasing(&[3, 0, 1, 2]), vec![1, 2, 3]);
        assert_eq!(longest_increasing(&[1, 2, 3, 0]).len(), 3);
        assert_eq!(longest_increasing(&[5, 4, 3, 2, 1]).len(), 1);
    }

    #[test]
    fn fenwick_prefix_counts() {
        let mut f = Fenwick::new(5);
        f.add(1, 1);
        f.add(3, 1);
        assert_eq!(f.prefix(0), 0);
        assert_eq!(f.prefix(2), 1);
        assert_eq!(f.prefix(4), 2);
        f.add(1, -1);
        assert_eq!(f.prefix(4), 1);
    }

    mod tracing_capture {
        use super::*;
        use std::sync::{Arc, Mutex};
        use tracing::Subscriber;
        use tracing_subscriber::Layer;
        use tracing_subscriber::layer::{Context, SubscriberExt};

        #[derive(Default)]
        struct DiffTraceState {
            saw_diff_span: bool,
            faults: usize,
            completions: usize,
        }

        struct DiffTraceCapture {
            state: Arc<Mutex<DiffTraceState>>,
        }

        impl<S> Layer<S> for DiffTraceCapture
        where
            S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
        {
            fn on_new_span(
                &self,
                attrs: &tracing::span::Attributes<'_>,
                _id: &tracing::Id,
                _ctx: Context<'_, S>,
            ) {
                if attrs.metadata().name() == "rowsync.diff" {
                    self.state.lock().expect("diff trace lock").saw_diff_span = true;
                }
            }

            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                struct Msg {
                    message: Option<String>,
                }
                impl tracing::field::Visit for Msg {
                    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                        if field.name() == "message" {
                            self.message = Some(value.to_string());
                        }
                    }

                    fn record_debug(
                        &mut self,
                        field: &tracing::field::Field,
                        value: &dyn std::fmt::Debug,
                    ) {
                        if field.name() == "message" {
                            self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                        }
                    }
                }
                let mut msg = Msg { message: None };
                event.record(&mut msg);
                let mut state = self.state.lock().expect("diff trace lock");
                match msg.message.as_deref() {
                    Some("diff.comparison_fault") => state.faults += 1,
                    Some("diff.complete") => state.completions += 1,
                    _ => {}
                }
            }
        }

        #[test]
        fn diff_emits_span_and_fault_events() {
            let state = Arc::new(Mutex::new(DiffTraceState::default()));
            let subscriber = tracing_subscriber::registry().with(DiffTraceCapture {
                state: Arc::clone(&state),
            });
            let _guard = tracing::subscriber::set_default(subscriber);

            let old = vec![Fragile {
                id: 1,
                poisoned: false,
            }];
            let new = vec![Fragile {
                id: 1,
                poisoned: true,
            }];
            let _ = diff(&old, &new);

            let snapshot = state.lock().expect("diff trace lock");
            assert!(snapshot.saw_diff_span, "expected rowsync.diff span");
            assert_eq!(snapshot.faults, 1, "expected one diff.comparison_fault");
            assert_eq!(snapshot.completions, 1, "expected diff.complete");
        }
    }
}
