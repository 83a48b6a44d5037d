use nbstate_model::CellId;
use nbstate_runtime::StateError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotebookError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotebookError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("no cell with id {0}")]
    UnknownCell(CellId),

    #[error("a cell with id {0} already exists")]
    DuplicateCell(CellId),
}

impl NotebookError {
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::State(err) if err.is_disposed())
    }
}
