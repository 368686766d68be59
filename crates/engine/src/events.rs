//! Notification types for grid change events.
//!
//! The engine buffers these while an operation runs; the owning view
//! drains them with `Table::take_events` and applies them in order to
//! resynchronize its rendered spans. The test harness uses the same
//! stream to verify ordering invariants.

/// Events emitted by `Table` mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// Render cell `(row, col)` as spanning the given extent.
    SpanSet {
        row: usize,
        col: usize,
        row_span: usize,
        col_span: usize,
    },

    /// Reset cell `(row, col)` to a 1×1 rendering.
    SpanCancelled { row: usize, col: usize },

    /// Displayed values changed inside an inclusive rectangular region.
    ContentChanged {
        top_left: (usize, usize),
        bottom_right: (usize, usize),
    },

    /// Enable or disable the undo affordance.
    UndoAvailable(bool),

    /// Enable or disable the redo affordance.
    RedoAvailable(bool),
}

/// Simple event collector for view code and tests.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<GridEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = GridEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only SpanSet events, as `(row, col, row_span, col_span)`.
    pub fn span_sets(&self) -> Vec<(usize, usize, usize, usize)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                GridEvent::SpanSet {
                    row,
                    col,
                    row_span,
                    col_span,
                } => Some((*row, *col, *row_span, *col_span)),
                _ => None,
            })
            .collect()
    }

    /// Filter to only SpanCancelled events, as `(row, col)`.
    pub fn span_cancels(&self) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                GridEvent::SpanCancelled { row, col } => Some((*row, *col)),
                _ => None,
            })
            .collect()
    }
}
