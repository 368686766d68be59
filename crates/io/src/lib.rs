// Persistence adapters around the engine's cell list.
//
// Both adapters speak the same shape: an ordered list of
// `{value, row, col, rowSpan, colSpan}` records. They never touch a
// live `Table`; callers load a cell list and apply it wholesale.

pub mod error;
pub mod json;
pub mod native;

use mergegrid_engine::cell::Cell;

use crate::error::PersistenceError;

/// Shared load-side validation: a stored cell list is malformed when a
/// span is zero or two records claim the same origin.
pub(crate) fn validate_cells(cells: &[Cell]) -> Result<(), PersistenceError> {
    let mut origins = std::collections::HashSet::new();
    for cell in cells {
        if cell.row_span == 0 || cell.col_span == 0 {
            return Err(PersistenceError::InvalidFormat(format!(
                "cell at ({}, {}) has zero span",
                cell.row, cell.col
            )));
        }
        if !origins.insert(cell.origin()) {
            return Err(PersistenceError::InvalidFormat(format!(
                "duplicate cell origin ({}, {})",
                cell.row, cell.col
            )));
        }
    }
    Ok(())
}
