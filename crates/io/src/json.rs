// Flat-file JSON documents

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use mergegrid_engine::cell::Cell;

use crate::error::PersistenceError;
use crate::validate_cells;

/// On-disk document shape: one object with a `cells` array. The `Cell`
/// serde attributes supply the wire field names (`rowSpan`, `colSpan`,
/// `val`) and their defaults.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    cells: Vec<Cell>,
}

/// Write the cell list as a JSON document. The bytes land in a sibling
/// temp file first and are renamed over the target, so a failed write
/// never leaves a truncated document behind.
pub fn save_document(path: &Path, cells: &[Cell]) -> Result<(), PersistenceError> {
    let document = Document {
        cells: cells.to_vec(),
    };
    let json = serde_json::to_string_pretty(&document)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    debug!("saved {} cells to {}", cells.len(), path.display());
    Ok(())
}

/// Read a JSON document back into a cell list. Unknown fields are
/// ignored; missing spans default to 1 and a missing value to "".
pub fn load_document(path: &Path) -> Result<Vec<Cell>, PersistenceError> {
    let contents = fs::read_to_string(path)?;
    let document: Document = serde_json::from_str(&contents)?;

    validate_cells(&document.cells)?;
    debug!(
        "loaded {} cells from {}",
        document.cells.len(),
        path.display()
    );
    Ok(document.cells)
}
