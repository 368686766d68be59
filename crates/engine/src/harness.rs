//! Test harness for table operations with invariant tracking.
//!
//! Checks the two structural invariants after every operation:
//! - Tiling: every coordinate of `[0, rows) × [0, cols)` is covered by
//!   exactly one cell rectangle.
//! - Registry agreement: the merge registry holds exactly the origins
//!   of cells spanning more than 1×1.
//!
//! Also verifies event-stream contracts a view relies on (cancellations
//! arrive before the spans that replace them).

use crate::events::GridEvent;
use crate::table::Table;

/// Assert that the cell rectangles exactly tile the grid.
pub fn assert_tiling(table: &Table) {
    let rows = table.row_count();
    let cols = table.column_count();
    let cells = table.cells();

    for row in 0..rows {
        for col in 0..cols {
            let covering = cells.iter().filter(|cell| cell.contains(row, col)).count();
            assert_eq!(
                covering, 1,
                "coordinate ({}, {}) covered by {} cells",
                row, col, covering
            );
        }
    }
}

/// Assert the merge registry agrees with the store's span fields.
pub fn assert_registry_agrees(table: &Table) {
    let derived: Vec<(usize, usize)> = {
        let mut origins: Vec<_> = table
            .cells()
            .iter()
            .filter(|cell| cell.is_merged())
            .map(|cell| cell.origin())
            .collect();
        origins.sort_unstable();
        origins
    };
    let registered: Vec<(usize, usize)> = table.merged_cells().iter().copied().collect();
    assert_eq!(registered, derived, "registry out of sync with the grid");
}

fn assert_consistent(table: &Table) {
    assert_tiling(table);
    assert_registry_agrees(table);
}

/// Within one drained batch, every SpanCancelled must precede every
/// SpanSet: a view re-spanning a cell before un-spanning its victims
/// would paint overlapping spans.
pub fn assert_cancels_precede_sets(events: &[GridEvent]) {
    let first_set = events
        .iter()
        .position(|e| matches!(e, GridEvent::SpanSet { .. }));
    let last_cancel = events
        .iter()
        .rposition(|e| matches!(e, GridEvent::SpanCancelled { .. }));
    if let (Some(set), Some(cancel)) = (first_set, last_cancel) {
        assert!(
            cancel < set,
            "SpanCancelled at {} after SpanSet at {}",
            cancel, set
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariants_hold_through_merge_heavy_sequence() {
        let mut table = Table::unit(6, 6);
        assert_consistent(&table);

        table.merge(0, 0, 2, 2).unwrap();
        assert_consistent(&table);

        table.merge(2, 2, 3, 2).unwrap();
        assert_consistent(&table);

        table.split(0, 0).unwrap();
        assert_consistent(&table);

        table.merge(0, 3, 2, 3).unwrap();
        assert_consistent(&table);
    }

    #[test]
    fn test_invariants_hold_through_structural_edits() {
        let mut table = Table::unit(5, 5);
        table.merge(1, 1, 3, 2).unwrap();
        assert_consistent(&table);

        table.insert_rows(2, 1).unwrap();
        assert_consistent(&table);

        table.insert_cols(2, 2).unwrap();
        assert_consistent(&table);

        table.remove_row(0).unwrap();
        assert_consistent(&table);

        table.remove_col(0).unwrap();
        assert_consistent(&table);

        table.remove_row(table.row_count() - 1).unwrap();
        assert_consistent(&table);
    }

    #[test]
    fn test_invariants_hold_through_undo_redo() {
        let mut table = Table::unit(4, 4);
        table.merge(0, 0, 2, 2).unwrap();
        table.insert_rows(3, 1).unwrap();
        table.remove_col(3).unwrap();

        while table.undo() {
            assert_consistent(&table);
        }
        while table.redo() {
            assert_consistent(&table);
        }
    }

    #[test]
    fn test_insert_into_span_interior_keeps_tiling() {
        let mut table = Table::unit(4, 4);
        table.merge(0, 0, 4, 3).unwrap();
        assert_consistent(&table);

        // The line crosses the span: it grows instead of splitting
        table.insert_rows(1, 1).unwrap();
        assert_consistent(&table);
        assert_eq!(table.span_at(0, 0), (4, 4));

        table.insert_cols(2, 1).unwrap();
        assert_consistent(&table);
        assert_eq!(table.span_at(0, 0), (4, 5));
    }

    #[test]
    fn test_event_batches_order_cancels_before_sets() {
        let mut table = Table::unit(6, 6);
        table.merge(0, 0, 2, 2).unwrap();
        table.merge(0, 2, 2, 2).unwrap();
        table.take_events();

        // Consumes both existing merges
        table.merge(0, 0, 4, 2).unwrap();
        assert_cancels_precede_sets(&table.take_events());

        table.undo();
        assert_cancels_precede_sets(&table.take_events());

        table.redo();
        assert_cancels_precede_sets(&table.take_events());
    }

    #[test]
    fn test_value_edits_never_break_tiling() {
        let mut table = Table::unit(3, 3);
        table.merge(0, 0, 2, 2).unwrap();

        table.set_value_at(1, 1, "interior");
        table.set_value_at(2, 2, "corner");
        assert_consistent(&table);
    }
}
