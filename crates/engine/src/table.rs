//! The grid mutator: merge, split, structural edits, and undo/redo over
//! a spanning-cell table.
//!
//! One `Table` instance per document. Mutations validate their
//! preconditions, snapshot the pre-mutation state into history, rewrite
//! the cell store, bring the merge registry back in agreement with the
//! store, and buffer notification events the owning view drains with
//! `take_events`.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use super::cell::Cell;
use super::error::GridError;
use super::events::GridEvent;
use super::grid::Grid;
use super::history::{History, TableState};

#[derive(Debug)]
pub struct Table {
    grid: Grid,
    /// Origins of cells currently spanning more than 1×1. Redundant with
    /// the store's span fields; kept in lockstep to drive view
    /// resynchronization.
    merged: BTreeSet<(usize, usize)>,
    history: History,
    default_value: String,
    events: Vec<GridEvent>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// An empty table. Note the degenerate store still reports 1×1
    /// dimensions; callers wanting a usable grid should start from
    /// `unit` or `from_cells`.
    pub fn new() -> Self {
        Self {
            grid: Grid::new(),
            merged: BTreeSet::new(),
            history: History::new(),
            default_value: String::new(),
            events: Vec::new(),
        }
    }

    /// A fully tiled `rows × cols` table of unmerged default cells.
    pub fn unit(rows: usize, cols: usize) -> Self {
        let mut table = Self::new();
        table.grid = Grid::unit(rows, cols, "");
        table
    }

    /// Build a table from a loaded cell list; the merge registry is
    /// derived from the span fields.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        let mut table = Self::new();
        table.grid = Grid::from_cells(cells);
        table.merged = derive_merged(&table.grid);
        table
    }

    pub fn set_default_value(&mut self, value: impl Into<String>) {
        self.default_value = value.into();
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    pub fn set_history_limit(&mut self, max_entries: usize) {
        self.history.set_max_entries(max_entries);
    }

    // =========================================================================
    // Query surface
    // =========================================================================

    pub fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.grid.column_count()
    }

    /// Value displayed at a coordinate: the owning cell's value whether
    /// the coordinate is its origin or interior to its span.
    pub fn value_at(&self, row: usize, col: usize) -> Option<&str> {
        self.grid
            .find_covering(row, col)
            .map(|cell| cell.value.as_str())
    }

    /// Extent of the cell whose origin is exactly `(row, col)`, or
    /// `(1, 1)`. Coordinates interior to another span also report
    /// `(1, 1)`; callers must already know the owning origin.
    pub fn span_at(&self, row: usize, col: usize) -> (usize, usize) {
        match self.grid.find_exact(row, col) {
            Some(cell) => (cell.row_span, cell.col_span),
            None => (1, 1),
        }
    }

    pub fn merged_cells(&self) -> &BTreeSet<(usize, usize)> {
        &self.merged
    }

    /// Row-major copy of the cell list, e.g. for a persistence adapter.
    pub fn cells(&self) -> Vec<Cell> {
        self.grid.sorted_cells()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Drain the buffered notification events, in emission order.
    pub fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Value edits
    // =========================================================================

    /// Set the value of the cell covering `(row, col)`. Returns false
    /// without touching history when no cell covers the coordinate.
    pub fn set_value_at(&mut self, row: usize, col: usize, value: &str) -> bool {
        let target = match self.grid.find_covering(row, col) {
            Some(cell) => cell.clone(),
            None => return false,
        };
        if target.value == value {
            return true;
        }

        self.snapshot();
        if let Some(cell) = self.grid.get_mut(target.row, target.col) {
            cell.value = value.to_string();
        }
        self.emit(GridEvent::ContentChanged {
            top_left: (target.row, target.col),
            bottom_right: (target.end_row() - 1, target.end_col() - 1),
        });
        true
    }

    /// Replace the grid wholesale (e.g. after a load). History is
    /// discarded and the registry re-derived; the view should follow up
    /// with `replay_merge_state` to rebuild its rendered spans.
    pub fn replace_cells(&mut self, cells: Vec<Cell>) {
        self.grid = Grid::from_cells(cells);
        self.merged = derive_merged(&self.grid);
        self.history.clear();
        self.emit(GridEvent::ContentChanged {
            top_left: (0, 0),
            bottom_right: (self.grid.row_count() - 1, self.grid.column_count() - 1),
        });
        self.emit(GridEvent::UndoAvailable(false));
        self.emit(GridEvent::RedoAvailable(false));
    }

    /// Re-announce every registered span, e.g. so a freshly attached
    /// view can rebuild its rendering after a wholesale load.
    pub fn replay_merge_state(&mut self) {
        let sets = self.registered_spans();
        for (row, col, row_span, col_span) in sets {
            self.emit(GridEvent::SpanSet {
                row,
                col,
                row_span,
                col_span,
            });
        }
    }

    /// Announce a 1×1 reset for every registered span without touching
    /// the grid, so a view can clear its rendering before a reload.
    pub fn clear_merge_state(&mut self) {
        let cancels: Vec<(usize, usize)> = self.merged.iter().copied().collect();
        for (row, col) in cancels {
            self.emit(GridEvent::SpanCancelled { row, col });
        }
    }

    // =========================================================================
    // Merge / split
    // =========================================================================

    /// Merge the rectangle `[top, top+height) × [left, left+width)` into
    /// the cell whose origin is `(top, left)`.
    ///
    /// Every other cell intersecting the rectangle is consumed whole,
    /// even when it only partially overlaps. Consumed merged cells are
    /// cancelled before the new span is announced, so a view un-spans
    /// them first; the final `SpanSet` is emitted last.
    pub fn merge(
        &mut self,
        top: usize,
        left: usize,
        width: usize,
        height: usize,
    ) -> Result<(), GridError> {
        if width == 0 || height == 0 {
            warn!("merge rejected: zero extent {}x{}", width, height);
            return Err(GridError::InvalidArgument(format!(
                "merge extent must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        if self.grid.find_exact(top, left).is_none() {
            warn!("merge rejected: no origin at ({}, {})", top, left);
            return Err(GridError::NotFound {
                row: top,
                col: left,
            });
        }

        self.snapshot();
        debug!("merge {}x{} at ({}, {})", width, height, top, left);

        let mut victims: Vec<(usize, usize)> = self
            .grid
            .cells_iter()
            .filter(|cell| cell.intersects(top, left, height, width))
            .map(|cell| cell.origin())
            .filter(|&origin| origin != (top, left))
            .collect();
        victims.sort_unstable();

        for (row, col) in victims {
            if let Some(removed) = self.grid.remove(row, col) {
                if removed.is_merged() {
                    self.merged.remove(&(row, col));
                    self.emit(GridEvent::SpanCancelled { row, col });
                }
            }
        }

        {
            let cell = self.grid.get_mut(top, left).ok_or_else(|| {
                GridError::InvariantViolation(format!(
                    "merge origin ({}, {}) vanished mid-operation",
                    top, left
                ))
            })?;
            cell.row_span = height;
            cell.col_span = width;
        }
        if height > 1 || width > 1 {
            self.merged.insert((top, left));
        } else {
            self.merged.remove(&(top, left));
        }

        self.emit(GridEvent::ContentChanged {
            top_left: (top, left),
            bottom_right: (top + height - 1, left + width - 1),
        });
        self.emit(GridEvent::SpanSet {
            row: top,
            col: left,
            row_span: height,
            col_span: width,
        });
        Ok(())
    }

    /// Break the cell at `(row, col)` back into unit cells.
    ///
    /// The whole former rectangle, origin included, is repopulated
    /// with fresh default-valued 1×1 cells; the merged value is
    /// discarded, not redistributed.
    pub fn split(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        let cell = match self.grid.find_exact(row, col) {
            Some(cell) => cell.clone(),
            None => {
                warn!("split rejected: no origin at ({}, {})", row, col);
                return Err(GridError::NotFound { row, col });
            }
        };

        self.snapshot();
        debug!(
            "split ({}, {}) into {}x{} unit cells",
            row, col, cell.row_span, cell.col_span
        );

        self.emit(GridEvent::SpanCancelled { row, col });
        self.merged.remove(&(row, col));
        self.grid.remove(row, col);

        for r in cell.row..cell.end_row() {
            for c in cell.col..cell.end_col() {
                self.grid.insert(Cell::new(r, c, self.default_value.clone()));
            }
        }

        self.emit(GridEvent::ContentChanged {
            top_left: (cell.row, cell.col),
            bottom_right: (cell.end_row() - 1, cell.end_col() - 1),
        });
        Ok(())
    }

    // =========================================================================
    // Structural edits
    // =========================================================================

    /// Insert `count` rows before `row`, growing spans the insertion
    /// line crosses and shifting everything below.
    pub fn insert_rows(&mut self, row: usize, count: usize) -> Result<(), GridError> {
        if count == 0 {
            return Err(GridError::InvalidArgument(
                "insert count must be at least 1".into(),
            ));
        }
        if row > self.grid.row_count() {
            warn!("insert_rows rejected: row {} out of range", row);
            return Err(GridError::InvalidArgument(format!(
                "insert position {} past the grid ({} rows)",
                row,
                self.grid.row_count()
            )));
        }

        self.snapshot();
        debug!("insert {} row(s) at {}", count, row);
        let before = self.span_map();

        // Each repetition re-reads the current counts; appended rows
        // change them.
        for _ in 0..count {
            self.insert_row_once(row);
        }

        self.resync_merged(&before);
        self.emit(GridEvent::ContentChanged {
            top_left: (row, 0),
            bottom_right: (self.grid.row_count() - 1, self.grid.column_count() - 1),
        });
        Ok(())
    }

    /// Transpose of `insert_rows`.
    pub fn insert_cols(&mut self, col: usize, count: usize) -> Result<(), GridError> {
        if count == 0 {
            return Err(GridError::InvalidArgument(
                "insert count must be at least 1".into(),
            ));
        }
        if col > self.grid.column_count() {
            warn!("insert_cols rejected: col {} out of range", col);
            return Err(GridError::InvalidArgument(format!(
                "insert position {} past the grid ({} columns)",
                col,
                self.grid.column_count()
            )));
        }

        self.snapshot();
        debug!("insert {} column(s) at {}", count, col);
        let before = self.span_map();

        for _ in 0..count {
            self.insert_col_once(col);
        }

        self.resync_merged(&before);
        self.emit(GridEvent::ContentChanged {
            top_left: (0, col),
            bottom_right: (self.grid.row_count() - 1, self.grid.column_count() - 1),
        });
        Ok(())
    }

    /// Remove one row: spans crossing it shrink, cells living entirely
    /// on it disappear, everything below shifts up.
    pub fn remove_row(&mut self, row: usize) -> Result<(), GridError> {
        if row >= self.grid.row_count() {
            warn!("remove_row rejected: row {} out of range", row);
            return Err(GridError::InvalidArgument(format!(
                "row {} out of range ({} rows)",
                row,
                self.grid.row_count()
            )));
        }

        self.snapshot();
        debug!("remove row {}", row);
        let before = self.span_map();

        self.grid.remove_row(row);

        self.resync_merged(&before);
        let rows = self.grid.row_count();
        let cols = self.grid.column_count();
        self.emit(GridEvent::ContentChanged {
            top_left: (row.min(rows - 1), 0),
            bottom_right: (rows - 1, cols - 1),
        });
        Ok(())
    }

    /// Transpose of `remove_row`.
    pub fn remove_col(&mut self, col: usize) -> Result<(), GridError> {
        if col >= self.grid.column_count() {
            warn!("remove_col rejected: col {} out of range", col);
            return Err(GridError::InvalidArgument(format!(
                "column {} out of range ({} columns)",
                col,
                self.grid.column_count()
            )));
        }

        self.snapshot();
        debug!("remove column {}", col);
        let before = self.span_map();

        self.grid.remove_col(col);

        self.resync_merged(&before);
        let rows = self.grid.row_count();
        let cols = self.grid.column_count();
        self.emit(GridEvent::ContentChanged {
            top_left: (0, col.min(cols - 1)),
            bottom_right: (rows - 1, cols - 1),
        });
        Ok(())
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    /// Restore the most recent snapshot. Returns false (reporting the
    /// unavailable affordance) when history is empty.
    ///
    /// The view is walked through the swap: every currently rendered
    /// span is cancelled, the state flips, and the restored registry is
    /// replayed as fresh `SpanSet`s.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            self.emit(GridEvent::UndoAvailable(false));
            return false;
        }

        self.clear_merge_state();
        let live = self.capture();
        let restored = match self.history.undo(live) {
            Some(state) => state,
            None => return false,
        };
        self.grid = restored.grid;
        self.merged = restored.merged;

        self.emit(GridEvent::ContentChanged {
            top_left: (0, 0),
            bottom_right: (self.grid.row_count() - 1, self.grid.column_count() - 1),
        });
        self.replay_merge_state();
        self.emit(GridEvent::UndoAvailable(self.history.can_undo()));
        self.emit(GridEvent::RedoAvailable(true));
        debug!("undo applied, {} cells restored", self.grid.len());
        true
    }

    /// Exact mirror of `undo`.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            self.emit(GridEvent::RedoAvailable(false));
            return false;
        }

        self.clear_merge_state();
        let live = self.capture();
        let restored = match self.history.redo(live) {
            Some(state) => state,
            None => return false,
        };
        self.grid = restored.grid;
        self.merged = restored.merged;

        self.emit(GridEvent::ContentChanged {
            top_left: (0, 0),
            bottom_right: (self.grid.row_count() - 1, self.grid.column_count() - 1),
        });
        self.replay_merge_state();
        self.emit(GridEvent::RedoAvailable(self.history.can_redo()));
        self.emit(GridEvent::UndoAvailable(true));
        debug!("redo applied, {} cells restored", self.grid.len());
        true
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn emit(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    fn capture(&self) -> TableState {
        TableState {
            grid: self.grid.clone(),
            merged: self.merged.clone(),
        }
    }

    /// Deep-copy the live state onto the undo stack. Precedes every
    /// mutation except undo/redo themselves.
    fn snapshot(&mut self) {
        let state = self.capture();
        self.history.checkpoint(state);
        self.emit(GridEvent::UndoAvailable(true));
        self.emit(GridEvent::RedoAvailable(false));
    }

    /// One row insertion, scanning columns left to right from 0.
    fn insert_row_once(&mut self, row: usize) {
        let total_cols = self.grid.column_count();
        let total_rows = self.grid.row_count();

        let mut col = 0;
        while col < total_cols {
            // Insertion line falls inside an existing vertical span:
            // the span absorbs the new row.
            if let Some(span) = self.grid.find_span_on_col(row, col).cloned() {
                for c in span.col..span.end_col() {
                    self.grid.shift_rows_down(c, row, total_rows);
                }
                if let Some(cell) = self.grid.get_mut(span.row, span.col) {
                    cell.row_span += 1;
                }
                col = span.end_col();
                continue;
            }

            // A cell sits immediately above the insertion line: the new
            // cell copies its width. The shift must cover the whole
            // width, or columns past the first would keep stale origins.
            if row > 0 {
                if let Some(above) = self.grid.find_exact(row - 1, col).cloned() {
                    for c in col..col + above.col_span {
                        self.grid.shift_rows_down(c, row, total_rows);
                    }
                    self.grid.insert(Cell::with_span(
                        row,
                        col,
                        1,
                        above.col_span,
                        self.default_value.clone(),
                    ));
                    col += above.col_span;
                    continue;
                }
            }

            // No span and no upper neighbor (top edge, or a span ending
            // exactly at the line): synthesize a fresh unit cell.
            self.grid.shift_rows_down(col, row, total_rows);
            self.grid.insert(Cell::new(row, col, self.default_value.clone()));
            col += 1;
        }
    }

    /// Transpose of `insert_row_once`. The missing-left-neighbor case
    /// falls through to the synthesize branch like the row variant.
    fn insert_col_once(&mut self, col: usize) {
        let total_rows = self.grid.row_count();
        let total_cols = self.grid.column_count();

        let mut row = 0;
        while row < total_rows {
            if let Some(span) = self.grid.find_span_on_row(row, col).cloned() {
                for r in span.row..span.end_row() {
                    self.grid.shift_cols_right(r, col, total_cols);
                }
                if let Some(cell) = self.grid.get_mut(span.row, span.col) {
                    cell.col_span += 1;
                }
                row = span.end_row();
                continue;
            }

            if col > 0 {
                if let Some(left) = self.grid.find_exact(row, col - 1).cloned() {
                    for r in row..row + left.row_span {
                        self.grid.shift_cols_right(r, col, total_cols);
                    }
                    self.grid.insert(Cell::with_span(
                        row,
                        col,
                        left.row_span,
                        1,
                        self.default_value.clone(),
                    ));
                    row += left.row_span;
                    continue;
                }
            }

            self.grid.shift_cols_right(row, col, total_cols);
            self.grid.insert(Cell::new(row, col, self.default_value.clone()));
            row += 1;
        }
    }

    /// Registered origins with their current extents.
    fn span_map(&self) -> BTreeMap<(usize, usize), (usize, usize)> {
        self.grid
            .cells_iter()
            .filter(|cell| cell.is_merged())
            .map(|cell| (cell.origin(), (cell.row_span, cell.col_span)))
            .collect()
    }

    /// Bring the registry back in agreement with the store after a
    /// structural edit, announcing the difference: origins that stopped
    /// spanning are cancelled, origins that appeared or changed extent
    /// are (re)announced.
    fn resync_merged(&mut self, before: &BTreeMap<(usize, usize), (usize, usize)>) {
        let after = self.span_map();

        for &(row, col) in before.keys() {
            if !after.contains_key(&(row, col)) {
                self.emit(GridEvent::SpanCancelled { row, col });
            }
        }
        for (&(row, col), &(row_span, col_span)) in &after {
            if before.get(&(row, col)) != Some(&(row_span, col_span)) {
                self.emit(GridEvent::SpanSet {
                    row,
                    col,
                    row_span,
                    col_span,
                });
            }
        }

        self.merged = after.keys().copied().collect();
    }

    fn registered_spans(&self) -> Vec<(usize, usize, usize, usize)> {
        self.merged
            .iter()
            .filter_map(|&(row, col)| {
                self.grid
                    .find_exact(row, col)
                    .map(|cell| (row, col, cell.row_span, cell.col_span))
            })
            .collect()
    }
}

fn derive_merged(grid: &Grid) -> BTreeSet<(usize, usize)> {
    grid.cells_iter()
        .filter(|cell| cell.is_merged())
        .map(|cell| cell.origin())
        .collect()
}
