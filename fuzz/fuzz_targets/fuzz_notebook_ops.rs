#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nbstate_model::{CellFlag, CellState, NotebookState, Output, Outputs};
use nbstate_notebook::NotebookStateHandler;
use nbstate_runtime::Observable;

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { id: u8, after: Option<u8> },
    Delete(u8),
    Queue(u8),
    Run(u8),
    Fail(u8),
    Output { id: u8, clear: bool },
    Select(Option<u8>),
    Wait { id: u8, running: bool },
}

fuzz_target!(|ops: Vec<Op>| {
    let nb = NotebookStateHandler::new(NotebookState::new("fuzz.ipynb"));
    let mut waits = Vec::new();
    for op in ops.into_iter().take(512) {
        let _ = match op {
            Op::Insert { id, after } => nb
                .insert_cell(CellState::new(id.into(), "scala", ""), after.map(Into::into))
                .map(|()| true),
            Op::Delete(id) => nb.delete_cell(id.into()).map(|_| true),
            Op::Queue(id) => nb.set_cell_queued(id.into()),
            Op::Run(id) => nb.set_cell_running(id.into()),
            Op::Fail(id) => nb.set_cell_error(id.into(), None),
            Op::Output { id, clear } => {
                let items = vec![Output::new("text/plain", "x")];
                let batch = if clear { Outputs::replace(items) } else { Outputs::append(items) };
                nb.apply_outputs(id.into(), batch)
            }
            Op::Select(id) => nb.set_active_cell(id.map(Into::into)),
            Op::Wait { id, running } => {
                let flag = if running { CellFlag::Running } else { CellFlag::Queued };
                nb.wait_for_cell_change(id.into(), flag).map(|wait| {
                    waits.push(wait);
                    true
                })
            }
        };
        let state = nb.state();
        assert!(state.is_consistent());
        assert!(state.cells.values().all(|c| !(c.running && c.queued)));
    }
});
