#![forbid(unsafe_code)]

//! The whole notebook as one value.

use std::collections::{BTreeMap, BTreeSet};

use im::OrdMap;
use nbstate_core::collections::name_from_path;
use serde::{Deserialize, Serialize};

use crate::cell::{CellId, CellState};
use crate::completion::{CompletionRequest, SignatureRequest};
use crate::config::NbConfig;
use crate::edit::EditBuffer;
use crate::kernel::KernelState;
use crate::presence::{ActivePresence, PresenceId};
use crate::stream::{HandleId, StreamMessage};

/// Document, kernel and session state of one open notebook.
///
/// `cell_order` is the only source of display order; iteration order of
/// `cells` carries no meaning. The two always hold the same ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookState {
    pub path: String,
    pub cells: OrdMap<CellId, CellState>,
    pub cell_order: Vec<CellId>,
    pub config: NbConfig,
    pub kernel: KernelState,
    pub global_version: u32,
    pub local_version: u32,
    pub edit_buffer: EditBuffer,

    // Ephemeral.
    pub active_cell_id: Option<CellId>,
    #[serde(skip)]
    pub active_completion: Option<CompletionRequest>,
    #[serde(skip)]
    pub active_signature: Option<SignatureRequest>,
    pub active_presence: BTreeMap<PresenceId, ActivePresence>,
    /// Handle id → messages received on it, oldest first.
    pub active_streams: BTreeMap<HandleId, Vec<StreamMessage>>,
}

impl NotebookState {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// A notebook holding `cells` in the given order.
    ///
    /// Later cells replace earlier ones with the same id.
    #[must_use]
    pub fn with_cells(path: impl Into<String>, cells: impl IntoIterator<Item = CellState>) -> Self {
        let mut state = Self::new(path);
        for cell in cells {
            let id = cell.id;
            if state.cells.insert(id, cell).is_none() {
                state.cell_order.push(id);
            }
        }
        state
    }

    /// File name of the notebook, without directories.
    #[must_use]
    pub fn name(&self) -> &str {
        name_from_path(&self.path)
    }

    #[must_use]
    pub fn cell(&self, id: CellId) -> Option<&CellState> {
        self.cells.get(&id)
    }

    /// Cells in display order.
    pub fn ordered_cells(&self) -> impl Iterator<Item = &CellState> {
        self.cell_order.iter().filter_map(|id| self.cells.get(id))
    }

    /// An id not used by any cell.
    #[must_use]
    pub fn next_cell_id(&self) -> CellId {
        self.cells.keys().copied().max().map_or(0, |max| max.saturating_add(1))
    }

    /// Whether `cell_order` and `cells` agree, and every ephemeral reference
    /// points at an existing cell.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let ordered: BTreeSet<CellId> = self.cell_order.iter().copied().collect();
        if ordered.len() != self.cell_order.len() || ordered.len() != self.cells.len() {
            return false;
        }
        if !self.cells.keys().all(|id| ordered.contains(id)) {
            return false;
        }
        if self
            .active_cell_id
            .is_some_and(|id| !self.cells.contains_key(&id))
        {
            return false;
        }
        self.active_presence.values().all(|p| {
            p.selection
                .is_none_or(|sel| self.cells.contains_key(&sel.cell_id))
        })
    }
}
