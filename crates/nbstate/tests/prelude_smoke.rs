#![forbid(unsafe_code)]
#![cfg(feature = "notebook")]

//! End-to-end use of the facade prelude.

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use nbstate::prelude::*;

#[test]
fn run_a_cell_through_the_prelude() {
    let nb = NotebookStateHandler::new(NotebookState::with_cells(
        "work/report.ipynb",
        [CellState::new(1, "python", "print(1)")],
    ));

    let statuses: Rc<RefCell<Vec<(bool, bool)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&statuses);
    let cell = nb.cell_view(1).unwrap();
    let _watch = cell
        .subscribe(move |new: &Option<CellState>, _| {
            if let Some(c) = new {
                sink.borrow_mut().push((c.queued, c.running));
            }
        })
        .unwrap();

    let running = nb.wait_for_cell_change(1, CellFlag::Running).unwrap();
    nb.set_cell_queued(1).unwrap();
    nb.set_cell_running(1).unwrap();
    assert_eq!(block_on(running), Ok(()));

    nb.apply_outputs(1, Outputs::replace(vec![Output::new("text/plain", "1")]))
        .unwrap();
    nb.set_cell_complete(1).unwrap();

    assert_eq!(
        *statuses.borrow(),
        vec![(true, false), (false, true), (false, true), (false, false)]
    );
    assert_eq!(nb.state().cell(1).map(|c| c.output.len()), Some(1));

    nb.dispose();
    assert!(cell.is_disposed());
}
