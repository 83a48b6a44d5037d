#![forbid(unsafe_code)]

//! State of the kernel attached to a notebook.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::CellId;
use crate::result::ResultValue;

/// Values the kernel has announced, grouped by the cell that produced them.
pub type SymbolTable = BTreeMap<CellId, BTreeMap<String, ResultValue>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelStatus {
    #[default]
    Disconnected,
    Dead,
    Busy,
    Idle,
}

impl KernelStatus {
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Busy | Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Complete,
    #[default]
    Queued,
    Running,
    Error,
}

impl TaskStatus {
    #[must_use]
    pub fn is_done(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// A unit of kernel work, such as loading a notebook or running a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub detail: String,
    pub status: TaskStatus,
    /// 0 to 255, where 255 is done.
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl TaskInfo {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelState {
    pub symbols: SymbolTable,
    pub status: KernelStatus,
    /// Free-form key/value details reported by the kernel.
    pub info: BTreeMap<String, String>,
    /// Task id → task.
    pub tasks: BTreeMap<String, TaskInfo>,
}

impl KernelState {
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&TaskInfo> {
        self.tasks.get(id)
    }

    /// Every value announced by any cell, in cell id order.
    pub fn all_symbols(&self) -> impl Iterator<Item = &ResultValue> {
        self.symbols.values().flat_map(BTreeMap::values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_predicates() {
        assert!(KernelStatus::Idle.is_connected());
        assert!(!KernelStatus::Dead.is_connected());
        assert!(TaskStatus::Error.is_done());
        assert!(!TaskStatus::Running.is_done());
    }

    #[test]
    fn symbols_iterate_in_cell_order() {
        let mut kernel = KernelState::default();
        kernel
            .symbols
            .entry(2)
            .or_default()
            .insert("y".into(), ResultValue::new("y", "Int", 2));
        kernel
            .symbols
            .entry(1)
            .or_default()
            .insert("x".into(), ResultValue::new("x", "Int", 1));
        let names: Vec<_> = kernel.all_symbols().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
    }
}
