#![forbid(unsafe_code)]

//! Notebook data model.
//!
//! Plain values: every type here is cheap to clone (cells live in an
//! [`im::OrdMap`]) and compared structurally, so a whole [`NotebookState`]
//! can be held as an immutable snapshot and replaced on every edit.
//!
//! Types that cross the wire derive `serde` with camelCase field names.
//! Ephemeral request handles ([`CompletionRequest`], [`SignatureRequest`])
//! are never serialized.

pub mod cell;
pub mod completion;
pub mod config;
pub mod edit;
pub mod kernel;
pub mod notebook;
pub mod presence;
pub mod result;
pub mod stream;

pub use cell::{CellComment, CellFlag, CellId, CellMetadata, CellState, Highlight, Output, Outputs};
pub use completion::{
    CompletionCandidate, CompletionHint, CompletionRequest, ParameterHint, SignatureHint,
    SignatureInfo, SignatureRequest, Signatures,
};
pub use config::{NbConfig, NotebookConfig, RepositoryConfig};
pub use edit::{ContentEdit, EditBuffer};
pub use kernel::{KernelState, KernelStatus, SymbolTable, TaskInfo, TaskStatus};
pub use notebook::NotebookState;
pub use presence::{ActivePresence, CellPresence, PresenceId, PresenceSelection};
pub use result::{
    CellResult, ClientResult, CompileErrors, KernelReport, PosRange, ResultValue, RuntimeError,
    Severity, ValueRepr,
};
pub use stream::{HandleData, HandleId, ModifyStream, StreamMessage};
