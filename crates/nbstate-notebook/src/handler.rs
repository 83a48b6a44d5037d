#![forbid(unsafe_code)]

//! Notebook state handler: construction, queries and waits.
//!
//! # Invariants
//!
//! 1. `cell_order` and the keys of `cells` always hold the same ids; every
//!    mutation in this crate keeps them in step.
//! 2. Index lookups return `None` only when the id is absent. Index 0 is a
//!    valid answer.
//! 3. A wait settles at most once and its observer removes itself when it
//!    settles, or at the first notification after the wait was dropped.
//! 4. Disposing the handler abandons every pending wait.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use nbstate_core::deferred::{Deferred, deferred};
use nbstate_core::equality::changed_fields;
use nbstate_model::{CellFlag, CellId, NotebookState, SymbolTable, TaskInfo, TaskStatus};
use nbstate_runtime::{Observable, ObserverId, StateHandler, StateView};
use tracing::{debug, trace, warn};

use crate::config::NotebookHandlerConfig;
use crate::error::Result;
use crate::values::{AvailableValues, ValueMap};

/// Observable notebook state.
///
/// Dereferences to the underlying [`StateHandler`], so the whole
/// [`Observable`] surface (`state`, `view`, `add_observer`, `dispose`, ...)
/// is available directly. Cloning shares the same state.
#[derive(Clone)]
pub struct NotebookStateHandler {
    inner: StateHandler<NotebookState>,
}

impl NotebookStateHandler {
    #[must_use]
    pub fn new(state: NotebookState) -> Self {
        Self::with_config(state, NotebookHandlerConfig::default())
    }

    #[must_use]
    pub fn with_config(state: NotebookState, config: NotebookHandlerConfig) -> Self {
        let mut handler_config = config.handler;
        if handler_config.label.is_none() {
            handler_config = handler_config.with_label(state.name());
        }
        let inner = StateHandler::with_config(state, handler_config);
        if config.trace_changes {
            let traced = inner.add_observer(|new: &NotebookState, old: &NotebookState| {
                match changed_fields(old, new) {
                    Ok(fields) => debug!(?fields, "notebook state changed"),
                    Err(err) => warn!(%err, "could not diff notebook state"),
                }
            });
            if let Err(err) = traced {
                warn!(%err, "change tracing not installed");
            }
        }
        Self { inner }
    }

    /// The underlying state handler.
    #[must_use]
    pub fn handler(&self) -> &StateHandler<NotebookState> {
        &self.inner
    }

    // ── Cell order ──────────────────────────────────────────────────

    #[must_use]
    pub fn get_cell_index(&self, cell: CellId) -> Option<usize> {
        self.inner
            .with(|state| Self::get_cell_index_in(cell, &state.cell_order))
    }

    /// Position of `cell` in `order`.
    #[must_use]
    pub fn get_cell_index_in(cell: CellId, order: &[CellId]) -> Option<usize> {
        order.iter().position(|id| *id == cell)
    }

    #[must_use]
    pub fn get_cell_id_at_index(&self, idx: usize) -> Option<CellId> {
        self.inner.with(|state| state.cell_order.get(idx).copied())
    }

    /// The cell displayed above `anchor`, if any.
    #[must_use]
    pub fn get_previous_cell_id(&self, anchor: CellId) -> Option<CellId> {
        self.inner
            .with(|state| Self::get_previous_cell_id_in(anchor, &state.cell_order))
    }

    #[must_use]
    pub fn get_previous_cell_id_in(anchor: CellId, order: &[CellId]) -> Option<CellId> {
        let idx = Self::get_cell_index_in(anchor, order)?;
        order.get(idx.checked_sub(1)?).copied()
    }

    /// The cell displayed below `anchor`, if any.
    #[must_use]
    pub fn get_next_cell_id(&self, anchor: CellId) -> Option<CellId> {
        self.inner
            .with(|state| Self::get_next_cell_id_in(anchor, &state.cell_order))
    }

    #[must_use]
    pub fn get_next_cell_id_in(anchor: CellId, order: &[CellId]) -> Option<CellId> {
        let idx = Self::get_cell_index_in(anchor, order)?;
        order.get(idx + 1).copied()
    }

    // ── Waits ───────────────────────────────────────────────────────

    /// Settles at the first notification after this call in which `cell`
    /// exists and has `flag` set.
    ///
    /// Dropping the returned deferred cancels the wait.
    pub fn wait_for_cell_change(&self, cell: CellId, flag: CellFlag) -> Result<Deferred<()>> {
        let (resolver, pending) = deferred();
        let this = self.inner.downgrade();
        let registered: Rc<Cell<Option<ObserverId>>> = Rc::new(Cell::new(None));
        let slot = Rc::clone(&registered);

        let id = self.inner.add_observer(move |state: &NotebookState, _| {
            let finished = if resolver.is_abandoned() {
                trace!(cell, ?flag, "cell wait dropped");
                true
            } else if state.cell(cell).is_some_and(|c| flag.is_set(c)) {
                resolver.resolve(());
                true
            } else {
                false
            };
            if finished
                && let (Some(handler), Some(id)) = (this.upgrade(), slot.get())
            {
                handler.remove_observer(id);
            }
        })?;
        registered.set(Some(id));
        Ok(pending)
    }

    /// Whether the kernel reports a task for this notebook's path.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner
            .with(|state| state.kernel.tasks.contains_key(&state.path))
    }

    /// Settles once the notebook's loading task completes or disappears.
    ///
    /// Already settled when no task is recorded or it is already complete.
    /// A loading task that ends in
    /// [`TaskStatus::Error`] keeps the wait pending until the task is removed.
    pub fn loaded(&self) -> Result<Deferred<()>> {
        let (path, current) = self.inner.with(|state| {
            let current = state.kernel.tasks.get(&state.path).map(|task| task.status);
            (state.path.clone(), current)
        });
        if current.is_none_or(|s| s == TaskStatus::Complete) {
            return Ok(Deferred::resolved(()));
        }
        let status = self.inner.map_view(
            |state: &NotebookState| &state.kernel.tasks,
            move |tasks: &BTreeMap<String, TaskInfo>| tasks.get(&path).map(|task| task.status),
        )?;

        let (resolver, pending) = deferred();
        let view = status.clone();
        status.add_observer(move |current: &Option<TaskStatus>, _| {
            let done = current.is_none_or(|s| s == TaskStatus::Complete);
            if done || resolver.is_abandoned() {
                view.dispose();
                resolver.resolve(());
            }
        })?;
        Ok(pending)
    }

    // ── Available values ────────────────────────────────────────────

    /// Values visible at `cell`, computed from the current snapshot.
    pub fn available_values_at<D: ?Sized>(
        &self,
        cell: CellId,
        values: &impl AvailableValues<D>,
        dispatcher: &D,
    ) -> ValueMap {
        let state = self.inner.state();
        values.available_values(&state.kernel.symbols, &state, dispatcher, cell)
    }

    /// A view of the values visible at `cell`, recomputed whenever the
    /// kernel's symbol table changes.
    pub fn view_available_values_at<D>(
        &self,
        cell: CellId,
        values: impl AvailableValues<D> + 'static,
        dispatcher: Rc<D>,
    ) -> Result<StateView<ValueMap>>
    where
        D: ?Sized + 'static,
    {
        let this = self.inner.downgrade();
        let view = self.inner.map_view(
            |state: &NotebookState| &state.kernel.symbols,
            move |symbols: &SymbolTable| match this.upgrade() {
                Some(handler) => {
                    let state = handler.state();
                    values.available_values(symbols, &state, &dispatcher, cell)
                }
                None => ValueMap::new(),
            },
        )?;
        Ok(view)
    }

    // ── Mutation plumbing ───────────────────────────────────────────

    /// Apply a fallible edit to a copy of the state and store it.
    ///
    /// Nothing is stored when `f` fails. Returns `f`'s output and whether
    /// observers were notified.
    pub(crate) fn try_update<R>(
        &self,
        f: impl FnOnce(&mut NotebookState) -> Result<R>,
    ) -> Result<(R, bool)> {
        let mut next = NotebookState::clone(&self.inner.state());
        let out = f(&mut next)?;
        let notified = self.inner.set_state(next)?;
        Ok((out, notified))
    }
}

impl Deref for NotebookStateHandler {
    type Target = StateHandler<NotebookState>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for NotebookStateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.with(|state| {
            f.debug_struct("NotebookStateHandler")
                .field("id", &self.inner.id())
                .field("path", &state.path)
                .field("cells", &state.cell_order)
                .field("observers", &self.inner.observer_count())
                .field("disposed", &self.inner.is_disposed())
                .finish()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::PrecedingCells;
    use nbstate_model::{CellState, ResultValue};

    fn notebook(ids: &[CellId]) -> NotebookStateHandler {
        NotebookStateHandler::new(NotebookState::with_cells(
            "notebooks/demo.ipynb",
            ids.iter().map(|&id| CellState::new(id, "scala", "")),
        ))
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[test]
    fn neighbours_at_the_edges() {
        let nb = notebook(&[10, 20, 30]);
        assert_eq!(nb.get_previous_cell_id(10), None);
        assert_eq!(nb.get_next_cell_id(30), None);
        assert_eq!(nb.get_previous_cell_id(20), Some(10));
        assert_eq!(nb.get_next_cell_id(20), Some(30));
    }

    #[test]
    fn first_cell_has_a_next_cell() {
        let nb = notebook(&[10, 20, 30]);
        assert_eq!(nb.get_cell_index(10), Some(0));
        assert_eq!(nb.get_next_cell_id(10), Some(20));
        assert_eq!(nb.get_previous_cell_id(30), Some(20));
    }

    #[test]
    fn absent_anchor_has_no_neighbours() {
        let nb = notebook(&[10, 20, 30]);
        assert_eq!(nb.get_cell_index(99), None);
        assert_eq!(nb.get_previous_cell_id(99), None);
        assert_eq!(nb.get_next_cell_id(99), None);
    }

    #[test]
    fn explicit_order_overrides_state() {
        let order = [3, 1, 2];
        assert_eq!(NotebookStateHandler::get_cell_index_in(1, &order), Some(1));
        assert_eq!(NotebookStateHandler::get_previous_cell_id_in(1, &order), Some(3));
        assert_eq!(NotebookStateHandler::get_next_cell_id_in(1, &order), Some(2));
        assert_eq!(NotebookStateHandler::get_next_cell_id_in(1, &[]), None);
    }

    #[test]
    fn id_at_index() {
        let nb = notebook(&[10, 20]);
        assert_eq!(nb.get_cell_id_at_index(0), Some(10));
        assert_eq!(nb.get_cell_id_at_index(1), Some(20));
        assert_eq!(nb.get_cell_id_at_index(2), None);
    }

    #[test]
    fn label_defaults_to_file_name() {
        let nb = notebook(&[]);
        assert_eq!(nb.config().label.as_deref(), Some("demo.ipynb"));
    }

    // ── Waits ───────────────────────────────────────────────────────

    #[test]
    fn wait_resolves_once_on_flag() {
        let nb = notebook(&[1, 2]);
        let mut wait = nb.wait_for_cell_change(1, CellFlag::Running).unwrap();
        assert_eq!(nb.observer_count(), 1);
        assert!(wait.try_take().is_none());

        nb.set_cell_queued(1).unwrap();
        nb.set_cell_running(2).unwrap();
        assert!(wait.try_take().is_none());

        nb.set_cell_running(1).unwrap();
        assert_eq!(wait.try_take(), Some(Ok(())));
        assert_eq!(nb.observer_count(), 0);

        nb.set_cell_complete(1).unwrap();
        nb.set_cell_running(1).unwrap();
        assert_eq!(nb.observer_count(), 0);
    }

    #[test]
    fn wait_for_error_flag() {
        let nb = notebook(&[1]);
        let wait = nb.wait_for_cell_change(1, CellFlag::Error).unwrap();
        nb.set_cell_running(1).unwrap();
        assert!(!wait.is_settled());
        nb.set_cell_error(1, None).unwrap();
        assert_eq!(futures::executor::block_on(wait), Ok(()));
    }

    #[test]
    fn dropped_wait_deregisters_on_next_change() {
        let nb = notebook(&[1]);
        let wait = nb.wait_for_cell_change(1, CellFlag::Queued).unwrap();
        drop(wait);
        assert_eq!(nb.observer_count(), 1);
        nb.update_cell(1, |c| CellState {
            content: "changed".into(),
            ..c.clone()
        })
        .unwrap();
        assert_eq!(nb.observer_count(), 0);
    }

    #[test]
    fn dispose_abandons_waits() {
        let nb = notebook(&[1]);
        let wait = nb.wait_for_cell_change(1, CellFlag::Queued).unwrap();
        nb.dispose();
        assert_eq!(
            futures::executor::block_on(wait),
            Err(nbstate_core::DeferredError::Abandoned)
        );
        assert!(nb.wait_for_cell_change(1, CellFlag::Queued).unwrap_err().is_disposed());
    }

    #[test]
    fn loaded_when_idle_is_immediate() {
        let nb = notebook(&[1]);
        assert!(!nb.is_loading());
        assert!(nb.loaded().unwrap().is_settled());
    }

    #[test]
    fn loaded_after_completed_task_is_immediate() {
        let nb = notebook(&[1]);
        let path = nb.state().path.clone();
        nb.set_task(TaskInfo::new(&path, "Loading", TaskStatus::Complete))
            .unwrap();
        assert!(nb.is_loading());

        let loaded = nb.loaded().unwrap();
        assert!(loaded.is_settled());
        assert_eq!(nb.view_count(), 0);
        assert_eq!(futures::executor::block_on(loaded), Ok(()));
    }

    #[test]
    fn loaded_waits_for_completion() {
        let nb = notebook(&[1]);
        let path = nb.state().path.clone();
        nb.set_task(TaskInfo::new(&path, "Loading", TaskStatus::Running))
            .unwrap();
        assert!(nb.is_loading());

        let loaded = nb.loaded().unwrap();
        assert_eq!(nb.view_count(), 1);

        nb.set_task(TaskInfo::new(&path, "Loading", TaskStatus::Running).with_progress(128))
            .unwrap();
        nb.set_task(TaskInfo::new("other", "Other", TaskStatus::Complete))
            .unwrap();
        assert!(!loaded.is_settled());

        nb.set_task(TaskInfo::new(&path, "Loading", TaskStatus::Complete))
            .unwrap();
        assert!(loaded.is_settled());
        assert_eq!(nb.view_count(), 0);
    }

    #[test]
    fn loaded_settles_when_task_disappears() {
        let nb = notebook(&[]);
        let path = nb.state().path.clone();
        nb.set_task(TaskInfo::new(&path, "Loading", TaskStatus::Queued))
            .unwrap();
        let loaded = nb.loaded().unwrap();
        nb.remove_task(&path).unwrap();
        assert_eq!(futures::executor::block_on(loaded), Ok(()));
        assert!(!nb.is_loading());
    }

    // ── Available values ────────────────────────────────────────────

    fn define(nb: &NotebookStateHandler, cell: CellId, name: &str) {
        nb.update(|state| {
            let mut next = state.clone();
            next.kernel
                .symbols
                .entry(cell)
                .or_default()
                .insert(name.into(), ResultValue::new(name, "Int", cell));
            next
        })
        .unwrap();
    }

    #[test]
    fn available_values_delegate_to_source() {
        let nb = notebook(&[1, 2, 3]);
        define(&nb, 1, "a");
        define(&nb, 3, "c");
        let values = nb.available_values_at(3, &PrecedingCells, &());
        assert_eq!(values.keys().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn value_view_follows_symbols_only() {
        let nb = notebook(&[1, 2, 3]);
        define(&nb, 1, "a");
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        let source = move |symbols: &SymbolTable, nb: &NotebookState, d: &(), cell: CellId| {
            counted.set(counted.get() + 1);
            PrecedingCells.available_values(symbols, nb, d, cell)
        };
        let view = nb
            .view_available_values_at(3, source, Rc::new(()))
            .unwrap();
        assert_eq!(view.state().len(), 1);
        assert_eq!(calls.get(), 1);

        let emitted = Rc::new(Cell::new(0));
        let sink = Rc::clone(&emitted);
        view.add_observer(move |_, _| sink.set(sink.get() + 1)).unwrap();

        nb.update_cell(2, |c| CellState {
            content: "x".into(),
            ..c.clone()
        })
        .unwrap();
        assert_eq!(calls.get(), 1);

        define(&nb, 2, "b");
        assert_eq!(emitted.get(), 1);
        assert_eq!(view.state().len(), 2);

        define(&nb, 3, "c");
        assert_eq!(calls.get(), 3);
        assert_eq!(emitted.get(), 1, "cell 3's own values are not visible to it");
    }

    #[test]
    fn change_tracing_observer_is_installed() {
        let nb = NotebookStateHandler::with_config(
            NotebookState::new("x.ipynb"),
            NotebookHandlerConfig::default().with_change_tracing(true),
        );
        assert_eq!(nb.observer_count(), 1);
        nb.set_global_version(3).unwrap();
        assert_eq!(nb.state().global_version, 3);
    }

    #[test]
    fn debug_lists_cells() {
        let nb = notebook(&[4, 5]);
        let dbg = format!("{nb:?}");
        assert!(dbg.contains("[4, 5]"));
    }
}
