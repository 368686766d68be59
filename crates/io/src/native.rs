// Relational cell storage using SQLite

use log::debug;
use rusqlite::{params, Connection};

use mergegrid_engine::cell::Cell;

use crate::error::PersistenceError;
use crate::validate_cells;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value TEXT,
    row INTEGER NOT NULL,
    col INTEGER NOT NULL,
    rowSpan INTEGER NOT NULL DEFAULT 1,
    colSpan INTEGER NOT NULL DEFAULT 1
)";

fn schema_for(table: &str) -> String {
    SCHEMA.replace("{table}", table)
}

/// Create the cell table if needed and, when it is empty, seed it with
/// a fully tiled `rows × cols` unit grid inside one transaction.
pub fn init_table(
    conn: &mut Connection,
    table: &str,
    rows: usize,
    cols: usize,
    default_value: &str,
) -> Result<(), PersistenceError> {
    conn.execute_batch(&schema_for(table))?;

    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    if count > 0 {
        debug!("table {} already populated ({} cells)", table, count);
        return Ok(());
    }

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (value, row, col, rowSpan, colSpan) VALUES (?1, ?2, ?3, ?4, ?5)",
            table
        ))?;
        for row in 0..rows {
            for col in 0..cols {
                stmt.execute(params![default_value, row as i64, col as i64, 1i64, 1i64])?;
            }
        }
    }
    tx.commit()?;
    debug!("seeded table {} with {}x{} unit grid", table, rows, cols);
    Ok(())
}

/// Replace the stored table with the given cell list, atomically: the
/// delete and every insert commit together or not at all.
pub fn save_table(
    conn: &mut Connection,
    table: &str,
    cells: &[Cell],
) -> Result<(), PersistenceError> {
    conn.execute_batch(&schema_for(table))?;

    let tx = conn.transaction()?;
    {
        tx.execute(&format!("DELETE FROM {}", table), [])?;

        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} (value, row, col, rowSpan, colSpan) VALUES (?1, ?2, ?3, ?4, ?5)",
            table
        ))?;
        for cell in cells {
            stmt.execute(params![
                cell.value,
                cell.row as i64,
                cell.col as i64,
                cell.row_span as i64,
                cell.col_span as i64,
            ])?;
        }
    }
    tx.commit()?;
    debug!("saved {} cells to table {}", cells.len(), table);
    Ok(())
}

/// Load the stored cell list in row-major order. On any failure the
/// caller's in-memory state is untouched; nothing is partially applied.
pub fn load_table(conn: &Connection, table: &str) -> Result<Vec<Cell>, PersistenceError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT value, row, col, rowSpan, colSpan FROM {} ORDER BY row, col",
        table
    ))?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;

    let mut cells = Vec::new();
    for record in rows {
        let (value, row, col, row_span, col_span) = record?;
        cells.push(Cell {
            value: value.unwrap_or_default(),
            row: to_index(row, "row")?,
            col: to_index(col, "col")?,
            row_span: to_index(row_span, "rowSpan")?,
            col_span: to_index(col_span, "colSpan")?,
        });
    }

    validate_cells(&cells)?;
    debug!("loaded {} cells from table {}", cells.len(), table);
    Ok(cells)
}

fn to_index(value: i64, field: &str) -> Result<usize, PersistenceError> {
    usize::try_from(value)
        .map_err(|_| PersistenceError::InvalidFormat(format!("negative {}: {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergegrid_engine::table::Table;

    fn open() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_init_seeds_unit_grid_once() {
        let mut conn = open();
        init_table(&mut conn, "cells", 4, 4, "Cell").unwrap();

        let cells = load_table(&conn, "cells").unwrap();
        assert_eq!(cells.len(), 16);
        assert_eq!(cells[0].value, "Cell");
        assert_eq!(cells[0].origin(), (0, 0));

        // Re-init must not duplicate the seed
        init_table(&mut conn, "cells", 4, 4, "Cell").unwrap();
        assert_eq!(load_table(&conn, "cells").unwrap().len(), 16);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut conn = open();
        let mut table = Table::unit(3, 3);
        table.set_value_at(0, 0, "top left");
        table.merge(1, 0, 2, 2).unwrap();

        save_table(&mut conn, "cells", &table.cells()).unwrap();
        let loaded = load_table(&conn, "cells").unwrap();

        assert_eq!(loaded, table.cells());
        let reopened = Table::from_cells(loaded);
        assert_eq!(reopened.span_at(1, 0), (2, 2));
        assert_eq!(reopened.value_at(0, 0), Some("top left"));
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let mut conn = open();
        save_table(&mut conn, "cells", &Table::unit(4, 4).cells()).unwrap();
        save_table(&mut conn, "cells", &Table::unit(2, 2).cells()).unwrap();

        assert_eq!(load_table(&conn, "cells").unwrap().len(), 4);
    }

    #[test]
    fn test_load_missing_table_fails() {
        let conn = open();
        assert!(load_table(&conn, "absent").is_err());
    }

    #[test]
    fn test_load_rejects_corrupt_spans() {
        let conn = open();
        conn.execute_batch(&schema_for("cells")).unwrap();
        conn.execute(
            "INSERT INTO cells (value, row, col, rowSpan, colSpan) VALUES ('x', 0, 0, 0, 1)",
            [],
        )
        .unwrap();

        assert!(matches!(
            load_table(&conn, "cells"),
            Err(PersistenceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_rejects_negative_coordinates() {
        let conn = open();
        conn.execute_batch(&schema_for("cells")).unwrap();
        conn.execute(
            "INSERT INTO cells (value, row, col, rowSpan, colSpan) VALUES ('x', -1, 0, 1, 1)",
            [],
        )
        .unwrap();

        assert!(matches!(
            load_table(&conn, "cells"),
            Err(PersistenceError::InvalidFormat(_))
        ));
    }
}
