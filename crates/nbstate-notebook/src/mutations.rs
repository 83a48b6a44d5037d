#![forbid(unsafe_code)]

//! Mutations on notebook state.
//!
//! Every mutation edits a copy of the current snapshot and stores it in one
//! update, so observers see either none or all of its effects. Mutations
//! naming a missing cell fail with [`NotebookError::UnknownCell`] and leave
//! the state untouched.

use nbstate_core::collections::{arr_delete_first_item, arr_insert};
use nbstate_core::deferred::Deferred;
use nbstate_model::{
    ActivePresence, CellId, CellState, CompletionHint, CompletionRequest, ContentEdit, HandleId,
    NotebookState, Outputs, PresenceId, RuntimeError, SignatureHint, SignatureRequest,
    StreamMessage, TaskInfo,
};
use nbstate_runtime::{Observable, StateView};
use tracing::debug;

use crate::error::{NotebookError, Result};
use crate::handler::NotebookStateHandler;

fn cell_mut(state: &mut NotebookState, id: CellId) -> Result<&mut CellState> {
    state.cells.get_mut(&id).ok_or(NotebookError::UnknownCell(id))
}

fn ensure_cell(state: &NotebookState, id: CellId) -> Result<()> {
    if state.cells.contains_key(&id) {
        Ok(())
    } else {
        Err(NotebookError::UnknownCell(id))
    }
}

/// Replace a cell with `f(cell)`, keeping its id.
fn map_cell(
    state: &mut NotebookState,
    id: CellId,
    f: impl FnOnce(CellState) -> CellState,
) -> Result<()> {
    let cell = cell_mut(state, id)?;
    let mut next = f(std::mem::take(cell));
    next.id = id;
    *cell = next;
    Ok(())
}

/// Rebuild every cell's presence list from the notebook-level presence map.
fn sync_cell_presence(state: &mut NotebookState) {
    let markers: Vec<_> = state
        .active_presence
        .values()
        .filter_map(ActivePresence::cell_presence)
        .collect();
    let ids: Vec<CellId> = state.cells.keys().copied().collect();
    for id in ids {
        let wanted: Vec<_> = markers
            .iter()
            .filter(|(cell, _)| *cell == id)
            .map(|(_, marker)| marker.clone())
            .collect();
        if let Some(cell) = state.cells.get_mut(&id)
            && cell.presence != wanted
        {
            cell.presence = wanted;
        }
    }
}

impl NotebookStateHandler {
    // ── Cells ───────────────────────────────────────────────────────

    /// Insert `cell` below `after`, or at the top when `after` is `None`.
    pub fn insert_cell(&self, cell: CellState, after: Option<CellId>) -> Result<()> {
        let id = cell.id;
        self.try_update(|state| {
            if state.cells.contains_key(&id) {
                return Err(NotebookError::DuplicateCell(id));
            }
            let idx = match after {
                Some(anchor) => {
                    Self::get_cell_index_in(anchor, &state.cell_order)
                        .ok_or(NotebookError::UnknownCell(anchor))?
                        + 1
                }
                None => 0,
            };
            state.cell_order = arr_insert(&state.cell_order, idx as isize, id);
            state.cells.insert(id, cell);
            Ok(())
        })?;
        debug!(cell = id, ?after, "cell inserted");
        Ok(())
    }

    /// Remove a cell and every reference to it. Returns the removed cell.
    pub fn delete_cell(&self, id: CellId) -> Result<CellState> {
        let ((removed, completion, signature), _) = self.try_update(|state| {
            let removed = state
                .cells
                .remove(&id)
                .ok_or(NotebookError::UnknownCell(id))?;
            state.cell_order = arr_delete_first_item(&state.cell_order, &id);
            if state.active_cell_id == Some(id) {
                state.active_cell_id = None;
            }
            for presence in state.active_presence.values_mut() {
                if presence.selection.is_some_and(|sel| sel.cell_id == id) {
                    presence.selection = None;
                }
            }
            let completion = state.active_completion.take_if(|r| r.cell == id);
            let signature = state.active_signature.take_if(|r| r.cell == id);
            Ok((removed, completion, signature))
        })?;
        if let Some(request) = completion {
            request.resolver.reject(());
        }
        if let Some(request) = signature {
            request.resolver.reject(());
        }
        debug!(cell = id, "cell deleted");
        Ok(removed)
    }

    /// Replace a cell with `f(cell)`. The id cannot be changed this way.
    pub fn update_cell(&self, id: CellId, f: impl FnOnce(&CellState) -> CellState) -> Result<bool> {
        let (_, notified) = self.try_update(|state| map_cell(state, id, |cell| f(&cell)))?;
        Ok(notified)
    }

    /// Apply an output batch to a cell. See [`CellState::apply_outputs`].
    pub fn apply_outputs(&self, id: CellId, outputs: Outputs) -> Result<bool> {
        let (_, notified) =
            self.try_update(|state| map_cell(state, id, |cell| cell.apply_outputs(outputs)))?;
        Ok(notified)
    }

    pub fn set_cell_queued(&self, id: CellId) -> Result<bool> {
        let (_, notified) = self.try_update(|state| map_cell(state, id, CellState::mark_queued))?;
        Ok(notified)
    }

    pub fn set_cell_running(&self, id: CellId) -> Result<bool> {
        let (_, notified) = self.try_update(|state| map_cell(state, id, CellState::mark_running))?;
        Ok(notified)
    }

    pub fn set_cell_complete(&self, id: CellId) -> Result<bool> {
        let (_, notified) =
            self.try_update(|state| map_cell(state, id, CellState::mark_complete))?;
        Ok(notified)
    }

    pub fn set_cell_error(&self, id: CellId, error: Option<RuntimeError>) -> Result<bool> {
        let (_, notified) =
            self.try_update(|state| map_cell(state, id, |cell| cell.mark_error(error)))?;
        Ok(notified)
    }

    /// Select a cell, or clear the selection with `None`.
    pub fn set_active_cell(&self, id: Option<CellId>) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            if let Some(id) = id {
                ensure_cell(state, id)?;
            }
            if let Some(prev) = state.active_cell_id
                && Some(prev) != id
                && let Some(cell) = state.cells.get_mut(&prev)
            {
                cell.selected = false;
            }
            if let Some(id) = id {
                cell_mut(state, id)?.selected = true;
            }
            state.active_cell_id = id;
            Ok(())
        })?;
        Ok(notified)
    }

    /// A view of one cell; `None` once the cell is deleted.
    pub fn cell_view(&self, id: CellId) -> Result<StateView<Option<CellState>>> {
        let view = self.map_view(
            |state: &NotebookState| &state.cells,
            move |cells: &im::OrdMap<CellId, CellState>| cells.get(&id).cloned(),
        )?;
        Ok(view)
    }

    // ── Completion and signature help ───────────────────────────────

    /// Start a completion request for `cell`. A request already pending is
    /// rejected.
    pub fn request_completion(&self, cell: CellId, offset: usize) -> Result<Deferred<CompletionHint>> {
        let (request, pending) = CompletionRequest::new(cell, offset);
        let (previous, _) = self.try_update(|state| {
            ensure_cell(state, cell)?;
            Ok(state.active_completion.replace(request))
        })?;
        if let Some(previous) = previous {
            previous.resolver.reject(());
        }
        Ok(pending)
    }

    /// Answer the pending completion request. Returns `false` if none was
    /// pending.
    pub fn resolve_completion(&self, hint: CompletionHint) -> Result<bool> {
        let (pending, _) = self.try_update(|state| Ok(state.active_completion.take()))?;
        Ok(pending.is_some_and(|request| request.resolver.resolve(hint)))
    }

    /// Start a signature-help request for `cell`. A request already pending
    /// is rejected.
    pub fn request_signature(&self, cell: CellId, offset: usize) -> Result<Deferred<SignatureHint>> {
        let (request, pending) = SignatureRequest::new(cell, offset);
        let (previous, _) = self.try_update(|state| {
            ensure_cell(state, cell)?;
            Ok(state.active_signature.replace(request))
        })?;
        if let Some(previous) = previous {
            previous.resolver.reject(());
        }
        Ok(pending)
    }

    /// Answer the pending signature request. Returns `false` if none was
    /// pending.
    pub fn resolve_signature(&self, hint: SignatureHint) -> Result<bool> {
        let (pending, _) = self.try_update(|state| Ok(state.active_signature.take()))?;
        Ok(pending.is_some_and(|request| request.resolver.resolve(hint)))
    }

    // ── Streams ─────────────────────────────────────────────────────

    /// Buffer a message under the handle it arrived on.
    pub fn push_stream(&self, message: StreamMessage) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            state
                .active_streams
                .entry(message.handle())
                .or_default()
                .push(message);
            Ok(())
        })?;
        Ok(notified)
    }

    /// Stop buffering a handle and return what it had buffered.
    pub fn close_stream(&self, handle: HandleId) -> Result<Vec<StreamMessage>> {
        let (buffered, _) =
            self.try_update(|state| Ok(state.active_streams.remove(&handle).unwrap_or_default()))?;
        Ok(buffered)
    }

    // ── Presence ────────────────────────────────────────────────────

    /// Add or replace a collaborator, mirroring their cursor into the cell
    /// they are in.
    pub fn update_presence(&self, presence: ActivePresence) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            if let Some(sel) = presence.selection {
                ensure_cell(state, sel.cell_id)?;
            }
            state.active_presence.insert(presence.id, presence);
            sync_cell_presence(state);
            Ok(())
        })?;
        Ok(notified)
    }

    pub fn remove_presence(&self, id: PresenceId) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            state.active_presence.remove(&id);
            sync_cell_presence(state);
            Ok(())
        })?;
        Ok(notified)
    }

    // ── Kernel ──────────────────────────────────────────────────────

    /// Add or replace a kernel task, keyed by its id.
    pub fn set_task(&self, task: TaskInfo) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            state.kernel.tasks.insert(task.id.clone(), task);
            Ok(())
        })?;
        Ok(notified)
    }

    pub fn remove_task(&self, id: &str) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            state.kernel.tasks.remove(id);
            Ok(())
        })?;
        Ok(notified)
    }

    // ── Versions ────────────────────────────────────────────────────

    /// Record a local edit and return the new local version.
    pub fn bump_local_version(&self, edits: Vec<ContentEdit>) -> Result<u32> {
        let (version, _) = self.try_update(|state| {
            state.local_version = state.local_version.wrapping_add(1);
            state.edit_buffer.push(state.local_version, edits);
            Ok(state.local_version)
        })?;
        Ok(version)
    }

    pub fn set_global_version(&self, version: u32) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            state.global_version = version;
            Ok(())
        })?;
        Ok(notified)
    }

    /// Forget local edits up to and including `version`, once acknowledged.
    pub fn discard_edits_until(&self, version: u32) -> Result<bool> {
        let (_, notified) = self.try_update(|state| {
            state.edit_buffer.discard_until(version);
            Ok(())
        })?;
        Ok(notified)
    }
}
