#![forbid(unsafe_code)]

//! Property-based invariant tests for the notebook handler.
//!
//! 1. Any sequence of cell mutations keeps `cell_order` and `cells` in step.
//! 2. Failed mutations leave the state exactly as it was.
//! 3. Previous/next lookups agree with `cell_order` positions, and absent
//!    anchors have no neighbours.
//! 4. A cell wait settles at most once, however often the flag toggles.

use std::cell::Cell;
use std::rc::Rc;

use nbstate_model::{CellFlag, CellId, CellState, NotebookState};
use nbstate_notebook::NotebookStateHandler;
use nbstate_runtime::Observable;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Insert { id: CellId, after: Option<CellId> },
    Delete(CellId),
    Run(CellId),
    Complete(CellId),
    Select(Option<CellId>),
}

fn op() -> impl Strategy<Value = Op> {
    let id = 0i32..12;
    prop_oneof![
        (id.clone(), proptest::option::of(0i32..12)).prop_map(|(id, after)| Op::Insert { id, after }),
        id.clone().prop_map(Op::Delete),
        id.clone().prop_map(Op::Run),
        id.clone().prop_map(Op::Complete),
        proptest::option::of(id).prop_map(Op::Select),
    ]
}

fn apply(nb: &NotebookStateHandler, op: &Op) -> bool {
    match op {
        Op::Insert { id, after } => nb.insert_cell(CellState::new(*id, "scala", ""), *after).is_ok(),
        Op::Delete(id) => nb.delete_cell(*id).is_ok(),
        Op::Run(id) => nb.set_cell_running(*id).is_ok(),
        Op::Complete(id) => nb.set_cell_complete(*id).is_ok(),
        Op::Select(id) => nb.set_active_cell(*id).is_ok(),
    }
}

fn order() -> impl Strategy<Value = Vec<CellId>> {
    proptest::collection::btree_set(0i32..50, 0..12)
        .prop_map(|ids| ids.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Mutations
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mutations_keep_order_consistent(ops in proptest::collection::vec(op(), 0..40)) {
        let nb = NotebookStateHandler::new(NotebookState::new("p.ipynb"));
        for op in &ops {
            let before = nb.state();
            let applied = apply(&nb, op);
            let after = nb.state();
            if !applied {
                prop_assert_eq!(&*before, &*after);
            }
            prop_assert!(nb.state().is_consistent(), "after {:?}", op);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4. Queries and waits
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn neighbours_match_positions(order in order(), probe in 0i32..60) {
        let nb = NotebookStateHandler::new(NotebookState::with_cells(
            "p.ipynb",
            order.iter().map(|&id| CellState::new(id, "scala", "")),
        ));
        match order.iter().position(|&id| id == probe) {
            Some(idx) => {
                prop_assert_eq!(nb.get_cell_index(probe), Some(idx));
                let prev = if idx == 0 { None } else { Some(order[idx - 1]) };
                prop_assert_eq!(nb.get_previous_cell_id(probe), prev);
                prop_assert_eq!(nb.get_next_cell_id(probe), order.get(idx + 1).copied());
            }
            None => {
                prop_assert_eq!(nb.get_cell_index(probe), None);
                prop_assert_eq!(nb.get_previous_cell_id(probe), None);
                prop_assert_eq!(nb.get_next_cell_id(probe), None);
            }
        }
    }

    #[test]
    fn wait_settles_at_most_once(toggles in 1usize..10) {
        let nb = NotebookStateHandler::new(NotebookState::with_cells(
            "p.ipynb",
            [CellState::new(1, "scala", "")],
        ));
        let settled = Rc::new(Cell::new(0));
        let count = Rc::clone(&settled);
        let wait = nb.wait_for_cell_change(1, CellFlag::Running).unwrap();
        let observed = nb.subscribe(move |_, _| {}).unwrap();
        for _ in 0..toggles {
            nb.set_cell_running(1).unwrap();
            nb.set_cell_complete(1).unwrap();
        }
        let done = futures::executor::block_on(wait.finally(move || count.set(count.get() + 1)));
        prop_assert_eq!(done, Ok(()));
        prop_assert_eq!(settled.get(), 1);
        prop_assert_eq!(nb.observer_count(), 1);
        drop(observed);
        prop_assert_eq!(nb.observer_count(), 0);
    }
}
