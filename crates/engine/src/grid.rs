use std::collections::HashMap;

use super::cell::Cell;

/// The cell store: a sparse collection of span rectangles keyed by origin.
///
/// INVARIANT (maintained by `Table`, checked by the test harness): the
/// rectangles exactly and non-overlappingly tile
/// `[0, row_count()) × [0, column_count())`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    cells: HashMap<(usize, usize), Cell>,
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    /// A fully tiled grid of unmerged cells, all carrying `value`.
    pub fn unit(rows: usize, cols: usize, value: &str) -> Self {
        let mut grid = Self::new();
        for row in 0..rows {
            for col in 0..cols {
                grid.insert(Cell::new(row, col, value));
            }
        }
        grid
    }

    /// Build a store from a cell list, e.g. one returned by a persistence
    /// adapter. Later duplicates of an origin replace earlier ones.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        let mut grid = Self::new();
        for cell in cells {
            grid.insert(cell);
        }
        grid
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Insert a cell keyed by its origin, replacing any previous record.
    pub fn insert(&mut self, cell: Cell) {
        self.cells.insert(cell.origin(), cell);
    }

    pub fn remove(&mut self, row: usize, col: usize) -> Option<Cell> {
        self.cells.remove(&(row, col))
    }

    /// Exact-origin lookup. Interior coordinates of a span do not match;
    /// use `find_covering` for containment.
    pub fn find_exact(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.cells.get_mut(&(row, col))
    }

    /// The cell whose rectangle covers `(row, col)`, if any.
    pub fn find_covering(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.values().find(|cell| cell.contains(row, col))
    }

    /// Scan rows `0..row` at a fixed column for a cell whose vertical span
    /// reaches past `row`, i.e. `(row, col)` sits inside a span entered
    /// from above. Only origins in the same column can match.
    pub fn find_span_on_col(&self, row: usize, col: usize) -> Option<&Cell> {
        for cur_row in 0..row {
            if let Some(cell) = self.find_exact(cur_row, col) {
                if cell.end_row() > row {
                    return Some(cell);
                }
            }
        }
        None
    }

    /// Transpose of `find_span_on_col`: a span entered from the left.
    pub fn find_span_on_row(&self, row: usize, col: usize) -> Option<&Cell> {
        for cur_col in 0..col {
            if let Some(cell) = self.find_exact(row, cur_col) {
                if cell.end_col() > col {
                    return Some(cell);
                }
            }
        }
        None
    }

    /// 1 + the largest row any cell reaches. O(cells) on every call,
    /// never cached; an empty store reports 1.
    pub fn row_count(&self) -> usize {
        self.cells
            .values()
            .map(|cell| cell.end_row() - 1)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn column_count(&self) -> usize {
        self.cells
            .values()
            .map(|cell| cell.end_col() - 1)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn cells_iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Row-major copy of the store, for persistence and diagnostics.
    pub fn sorted_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.cells.values().cloned().collect();
        cells.sort_by_key(|cell| (cell.row, cell.col));
        cells
    }

    /// Shift every cell at or below `from_row` in one column down a row.
    ///
    /// Candidate rows are visited in descending order, re-running the
    /// exact lookup at each step: each hit is re-keyed to `row + 1`, and
    /// ascending order would find a just-shifted cell again and move it
    /// twice. Spans are not altered, only origins.
    pub fn shift_rows_down(&mut self, col: usize, from_row: usize, total_rows: usize) {
        for row in (from_row..total_rows).rev() {
            if let Some(mut cell) = self.cells.remove(&(row, col)) {
                cell.row += 1;
                self.insert(cell);
            }
        }
    }

    /// Transpose of `shift_rows_down`.
    pub fn shift_cols_right(&mut self, row: usize, from_col: usize, total_cols: usize) {
        for col in (from_col..total_cols).rev() {
            if let Some(mut cell) = self.cells.remove(&(row, col)) {
                cell.col += 1;
                self.insert(cell);
            }
        }
    }

    /// Delete one grid line: cells living entirely on `row` are removed,
    /// spans straddling it shrink by one, and every origin below moves up.
    pub fn remove_row(&mut self, row: usize) {
        let mut next = HashMap::with_capacity(self.cells.len());
        for (_, mut cell) in self.cells.drain() {
            if cell.row <= row && cell.end_row() > row {
                if cell.row_span > 1 {
                    cell.row_span -= 1;
                } else {
                    continue;
                }
            } else if cell.row > row {
                cell.row -= 1;
            }
            next.insert(cell.origin(), cell);
        }
        self.cells = next;
    }

    /// Transpose of `remove_row`.
    pub fn remove_col(&mut self, col: usize) {
        let mut next = HashMap::with_capacity(self.cells.len());
        for (_, mut cell) in self.cells.drain() {
            if cell.col <= col && cell.end_col() > col {
                if cell.col_span > 1 {
                    cell.col_span -= 1;
                } else {
                    continue;
                }
            } else if cell.col > col {
                cell.col -= 1;
            }
            next.insert(cell.origin(), cell);
        }
        self.cells = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_grid_counts() {
        let grid = Grid::new();
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.column_count(), 1);
    }

    #[test]
    fn test_counts_include_span_extents() {
        let mut grid = Grid::unit(2, 2, "");
        grid.remove(1, 1);
        grid.insert(Cell::with_span(1, 1, 3, 2, ""));

        assert_eq!(grid.row_count(), 4);
        assert_eq!(grid.column_count(), 3);
    }

    #[test]
    fn test_find_exact_misses_span_interior() {
        let mut grid = Grid::new();
        grid.insert(Cell::with_span(0, 0, 2, 2, "a"));

        assert!(grid.find_exact(0, 0).is_some());
        assert!(grid.find_exact(1, 1).is_none());
        assert_eq!(grid.find_covering(1, 1).map(|c| c.value.as_str()), Some("a"));
    }

    #[test]
    fn test_find_span_on_col() {
        let mut grid = Grid::unit(4, 4, "");
        for (r, c) in [(0, 1), (1, 0), (1, 1)] {
            grid.remove(r, c);
        }
        grid.remove(0, 0);
        grid.insert(Cell::with_span(0, 0, 2, 2, "m"));

        // Row 1 lies inside the vertical span at both covered columns
        assert_eq!(grid.find_span_on_col(1, 0).map(|c| c.origin()), Some((0, 0)));
        // Column 1 has no origin above row 1, so no match there
        assert!(grid.find_span_on_col(1, 1).is_none());
        // The span ends at row 2, so row 2 is not inside it
        assert!(grid.find_span_on_col(2, 0).is_none());
    }

    #[test]
    fn test_find_span_on_row() {
        let mut grid = Grid::unit(3, 3, "");
        for (r, c) in [(0, 1), (0, 2)] {
            grid.remove(r, c);
        }
        grid.remove(0, 0);
        grid.insert(Cell::with_span(0, 0, 1, 3, "w"));

        assert_eq!(grid.find_span_on_row(0, 2).map(|c| c.origin()), Some((0, 0)));
        assert!(grid.find_span_on_row(1, 2).is_none());
    }

    #[test]
    fn test_shift_rows_down_shifts_each_cell_once() {
        let mut grid = Grid::unit(4, 1, "");
        grid.get_mut(1, 0).unwrap().value = "marker".into();

        grid.shift_rows_down(0, 1, grid.row_count());

        // Rows 1..4 each moved down exactly one, opening a gap at row 1
        assert!(grid.find_exact(1, 0).is_none());
        assert_eq!(grid.find_exact(2, 0).unwrap().value, "marker");
        assert_eq!(grid.row_count(), 5);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_remove_row_shrinks_straddling_span() {
        let mut grid = Grid::unit(3, 1, "");
        grid.remove(0, 0);
        grid.remove(1, 0);
        grid.insert(Cell::with_span(0, 0, 2, 1, "tall"));

        grid.remove_row(1);

        let cell = grid.find_exact(0, 0).unwrap();
        assert_eq!(cell.row_span, 1);
        // Row 2 closed the gap
        assert!(grid.find_exact(1, 0).is_some());
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn test_remove_row_deletes_unit_cells_on_line() {
        let mut grid = Grid::unit(3, 2, "");
        grid.remove_row(1);

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn test_sorted_cells_row_major() {
        let grid = Grid::unit(2, 2, "");
        let origins: Vec<_> = grid.sorted_cells().iter().map(|c| c.origin()).collect();
        assert_eq!(origins, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }
}
