#![forbid(unsafe_code)]

//! Cells: content, outputs, results and execution status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::edit::ContentEdit;
use crate::presence::CellPresence;
use crate::result::{CellResult, CompileErrors, PosRange, RuntimeError};

/// Identifies a cell within one notebook.
pub type CellId = i32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellMetadata {
    pub disable_run: bool,
    pub hide_source: bool,
    pub hide_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellComment {
    pub uuid: String,
    pub range: PosRange,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub content: String,
}

/// One block of cell output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub content_type: String,
    pub content: Vec<String>,
}

impl Output {
    #[must_use]
    pub fn new(content_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content: vec![content.into()],
        }
    }
}

/// A batch of outputs for one cell.
///
/// With `clear` set, the batch replaces everything the cell showed before;
/// otherwise it is appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    pub items: Vec<Output>,
    #[serde(default)]
    pub clear: bool,
}

impl Outputs {
    #[must_use]
    pub fn append(items: Vec<Output>) -> Self {
        Self {
            items,
            clear: false,
        }
    }

    #[must_use]
    pub fn replace(items: Vec<Output>) -> Self {
        Self { items, clear: true }
    }
}

/// A highlighted span, e.g. the expression currently being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub range: PosRange,
    pub class_name: String,
}

/// Execution flags a caller can wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellFlag {
    Queued,
    Running,
    Error,
}

impl CellFlag {
    #[must_use]
    pub fn is_set(self, cell: &CellState) -> bool {
        match self {
            Self::Queued => cell.queued,
            Self::Running => cell.running,
            Self::Error => cell.error,
        }
    }
}

/// Everything known about one cell.
///
/// `running` and `queued` are never both set; the `mark_*` transitions keep
/// it that way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellState {
    pub id: CellId,
    pub language: String,
    pub content: String,
    pub metadata: CellMetadata,
    /// Comment uuid → comment.
    pub comments: BTreeMap<String, CellComment>,
    pub output: Vec<Output>,
    pub results: Vec<CellResult>,
    pub compile_errors: Vec<CompileErrors>,
    pub runtime_error: Option<RuntimeError>,

    // Ephemeral.
    pub pending_edits: Vec<ContentEdit>,
    pub presence: Vec<CellPresence>,
    pub editing: bool,
    pub selected: bool,
    pub error: bool,
    pub running: bool,
    pub queued: bool,
    pub current_selection: Option<PosRange>,
    pub current_highlight: Option<Highlight>,
}

impl CellState {
    #[must_use]
    pub fn new(id: CellId, language: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            language: language.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: CellMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Waiting to run. Clears any previous error.
    #[must_use]
    pub fn mark_queued(mut self) -> Self {
        self.queued = true;
        self.running = false;
        self.error = false;
        self
    }

    /// Started running. Clears any previous error and the queued flag.
    #[must_use]
    pub fn mark_running(mut self) -> Self {
        self.running = true;
        self.queued = false;
        self.error = false;
        self.runtime_error = None;
        self.current_highlight = None;
        self
    }

    /// Finished without error.
    #[must_use]
    pub fn mark_complete(mut self) -> Self {
        self.running = false;
        self.queued = false;
        self.current_highlight = None;
        self
    }

    /// Finished with an error, optionally recording the exception.
    #[must_use]
    pub fn mark_error(mut self, runtime_error: Option<RuntimeError>) -> Self {
        self.error = true;
        self.running = false;
        self.queued = false;
        self.current_highlight = None;
        if runtime_error.is_some() {
            self.runtime_error = runtime_error;
        }
        self
    }

    /// Apply an output batch: replace on `clear`, append otherwise.
    #[must_use]
    pub fn apply_outputs(mut self, outputs: Outputs) -> Self {
        if outputs.clear {
            self.output = outputs.items;
        } else {
            self.output.extend(outputs.items);
        }
        self
    }

    /// Drop outputs, results and errors ahead of a fresh run.
    #[must_use]
    pub fn clear_results(mut self) -> Self {
        self.output.clear();
        self.results.clear();
        self.compile_errors.clear();
        self.runtime_error = None;
        self
    }
}
