#![forbid(unsafe_code)]

//! Collaborator cursors.

use serde::{Deserialize, Serialize};

use crate::cell::CellId;
use crate::result::PosRange;

/// Identifies one connected collaborator.
pub type PresenceId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSelection {
    pub cell_id: CellId,
    pub range: PosRange,
}

/// A collaborator as tracked at the notebook level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePresence {
    pub id: PresenceId,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<PresenceSelection>,
}

impl ActivePresence {
    #[must_use]
    pub fn new(id: PresenceId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            avatar: None,
            selection: None,
        }
    }

    #[must_use]
    pub fn with_selection(mut self, cell_id: CellId, range: PosRange) -> Self {
        self.selection = Some(PresenceSelection { cell_id, range });
        self
    }

    /// The cell-level marker for this collaborator, if their cursor is in a cell.
    #[must_use]
    pub fn cell_presence(&self) -> Option<(CellId, CellPresence)> {
        self.selection.map(|sel| {
            (
                sel.cell_id,
                CellPresence {
                    id: self.id,
                    name: self.name.clone(),
                    color: self.color.clone(),
                    range: sel.range,
                    avatar: self.avatar.clone(),
                },
            )
        })
    }
}

/// A collaborator's cursor as shown inside one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPresence {
    pub id: PresenceId,
    pub name: String,
    pub color: String,
    pub range: PosRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
