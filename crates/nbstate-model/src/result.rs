#![forbid(unsafe_code)]

//! Values, errors and positions produced by running cells.

use serde::{Deserialize, Serialize};

use crate::cell::CellId;
use crate::stream::HandleId;

/// Half-open character range within a cell's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PosRange {
    pub start: usize,
    pub end: usize,
}

impl PosRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// One way of presenting a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValueRepr {
    String { content: String },
    #[serde(rename_all = "camelCase")]
    Mime { mime_type: String, content: String },
    /// Data delivered incrementally through a stream handle.
    Streaming { handle: HandleId, count: Option<u64> },
}

/// A named value computed by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultValue {
    pub name: String,
    pub type_name: String,
    pub reprs: Vec<ValueRepr>,
    pub source_cell: CellId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<PosRange>,
}

impl ResultValue {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, source_cell: CellId) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            reprs: Vec::new(),
            source_cell,
            pos: None,
        }
    }

    #[must_use]
    pub fn with_repr(mut self, repr: ValueRepr) -> Self {
        self.reprs.push(repr);
        self
    }

    /// Plain-text rendering, if one was provided.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.reprs.iter().find_map(|repr| match repr {
            ValueRepr::String { content } => Some(content.as_str()),
            _ => None,
        })
    }
}

/// A result computed on the client rather than by the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResult {
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Closed union of everything a cell's `results` may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum CellResult {
    Value(ResultValue),
    Client(ClientResult),
}

impl CellResult {
    #[must_use]
    pub fn as_value(&self) -> Option<&ResultValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::Client(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelReport {
    pub position: PosRange,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileErrors {
    pub reports: Vec<KernelReport>,
}

impl CompileErrors {
    /// Whether any report is an error rather than a warning.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| r.severity == Severity::Error)
    }
}

/// An exception raised while a cell ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeError {
    pub class_name: String,
    pub message: String,
    #[serde(default)]
    pub stack_trace: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<RuntimeError>>,
}

impl RuntimeError {
    #[must_use]
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
            stack_trace: Vec::new(),
            cause: None,
        }
    }
}
