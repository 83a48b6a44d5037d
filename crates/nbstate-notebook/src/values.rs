#![forbid(unsafe_code)]

//! Values visible to a cell.
//!
//! Which kernel values a cell can see is decided by an interpreter outside
//! this crate. The handler only passes it the symbol table, the notebook and
//! an opaque dispatcher through [`AvailableValues`].

use std::collections::BTreeMap;

use nbstate_model::{CellId, NotebookState, ResultValue, SymbolTable};

/// Value name → value.
pub type ValueMap = BTreeMap<String, ResultValue>;

/// Computes the values available at a cell.
///
/// Implementations must be pure: the same inputs give the same map.
/// Implemented for any `Fn(&SymbolTable, &NotebookState, &D, CellId) -> ValueMap`.
pub trait AvailableValues<D: ?Sized> {
    fn available_values(
        &self,
        symbols: &SymbolTable,
        notebook: &NotebookState,
        dispatcher: &D,
        cell: CellId,
    ) -> ValueMap;
}

impl<D, F> AvailableValues<D> for F
where
    D: ?Sized,
    F: Fn(&SymbolTable, &NotebookState, &D, CellId) -> ValueMap,
{
    fn available_values(
        &self,
        symbols: &SymbolTable,
        notebook: &NotebookState,
        dispatcher: &D,
        cell: CellId,
    ) -> ValueMap {
        self(symbols, notebook, dispatcher, cell)
    }
}

/// Values announced by the cells above `cell` in display order.
///
/// A name defined by several cells resolves to the definition nearest above
/// `cell`. Cells not in the notebook see nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecedingCells;

impl<D: ?Sized> AvailableValues<D> for PrecedingCells {
    fn available_values(
        &self,
        symbols: &SymbolTable,
        notebook: &NotebookState,
        _dispatcher: &D,
        cell: CellId,
    ) -> ValueMap {
        let Some(idx) = notebook.cell_order.iter().position(|id| *id == cell) else {
            return ValueMap::new();
        };
        let mut values = ValueMap::new();
        for id in &notebook.cell_order[..idx] {
            if let Some(cell_values) = symbols.get(id) {
                values.extend(
                    cell_values
                        .iter()
                        .map(|(name, value)| (name.clone(), value.clone())),
                );
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbstate_model::CellState;

    fn notebook() -> NotebookState {
        let mut nb = NotebookState::with_cells(
            "nb.ipynb",
            [1, 2, 3].map(|id| CellState::new(id, "scala", "")),
        );
        for (cell, name) in [(1, "x"), (2, "y"), (2, "x"), (3, "z")] {
            nb.kernel
                .symbols
                .entry(cell)
                .or_default()
                .insert(name.into(), ResultValue::new(name, "Int", cell));
        }
        nb
    }

    #[test]
    fn preceding_cells_shadow_in_order() {
        let nb = notebook();
        let values = PrecedingCells.available_values(&nb.kernel.symbols, &nb, &(), 3);
        assert_eq!(values.keys().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(values["x"].source_cell, 2);
    }

    #[test]
    fn first_and_unknown_cells_see_nothing() {
        let nb = notebook();
        assert!(PrecedingCells.available_values(&nb.kernel.symbols, &nb, &(), 1).is_empty());
        assert!(PrecedingCells.available_values(&nb.kernel.symbols, &nb, &(), 9).is_empty());
    }

    #[test]
    fn closures_are_value_sources() {
        let nb = notebook();
        let everything = |symbols: &SymbolTable, _: &NotebookState, scope: &str, _: CellId| {
            symbols
                .values()
                .flat_map(|m| m.values())
                .filter(|v| v.name.starts_with(scope))
                .map(|v| (v.name.clone(), v.clone()))
                .collect::<ValueMap>()
        };
        let values = everything.available_values(&nb.kernel.symbols, &nb, "z", 1);
        assert_eq!(values.len(), 1);
    }
}
