use serde::{Deserialize, Serialize};

fn default_span() -> usize {
    1
}

/// A rectangle of the grid sharing one value.
///
/// The `(row, col)` origin is the unique key of a cell; `row_span` and
/// `col_span` give the rectangle's extent. A 1×1 cell is unmerged.
///
/// The serde field names match the flat-file document format: missing
/// spans default to 1 and a missing value to the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "val", default)]
    pub value: String,
    pub row: usize,
    pub col: usize,
    #[serde(rename = "rowSpan", default = "default_span")]
    pub row_span: usize,
    #[serde(rename = "colSpan", default = "default_span")]
    pub col_span: usize,
}

impl Cell {
    /// Create an unmerged 1×1 cell.
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self::with_span(row, col, 1, 1, value)
    }

    pub fn with_span(
        row: usize,
        col: usize,
        row_span: usize,
        col_span: usize,
        value: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            row,
            col,
            row_span,
            col_span,
        }
    }

    pub fn origin(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }

    /// First row past the cell's rectangle.
    pub fn end_row(&self) -> usize {
        self.row + self.row_span
    }

    /// First column past the cell's rectangle.
    pub fn end_col(&self) -> usize {
        self.col + self.col_span
    }

    /// Whether the rectangle covers the given coordinate.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.end_row() && col >= self.col && col < self.end_col()
    }

    /// Whether the rectangle overlaps `[top, top+height) × [left, left+width)`.
    pub fn intersects(&self, top: usize, left: usize, height: usize, width: usize) -> bool {
        self.row < top + height
            && self.end_row() > top
            && self.col < left + width
            && self.end_col() > left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_covers_full_rectangle() {
        let cell = Cell::with_span(1, 2, 2, 3, "x");

        assert!(cell.contains(1, 2));
        assert!(cell.contains(2, 4));
        assert!(!cell.contains(0, 2));
        assert!(!cell.contains(3, 2));
        assert!(!cell.contains(1, 5));
    }

    #[test]
    fn test_intersects_partial_overlap() {
        let cell = Cell::with_span(0, 0, 2, 2, "x");

        // Overlaps the bottom-right quadrant only
        assert!(cell.intersects(1, 1, 2, 2));
        // Touching edges do not overlap
        assert!(!cell.intersects(2, 0, 1, 2));
        assert!(!cell.intersects(0, 2, 2, 1));
    }

    #[test]
    fn test_is_merged() {
        assert!(!Cell::new(0, 0, "").is_merged());
        assert!(Cell::with_span(0, 0, 2, 1, "").is_merged());
        assert!(Cell::with_span(0, 0, 1, 2, "").is_merged());
    }

    #[test]
    fn test_document_field_defaults() {
        // Spans and value may be absent in stored documents
        let cell: Cell = serde_json::from_str(r#"{"row": 3, "col": 1}"#).unwrap();
        assert_eq!(cell.row, 3);
        assert_eq!(cell.col, 1);
        assert_eq!(cell.row_span, 1);
        assert_eq!(cell.col_span, 1);
        assert_eq!(cell.value, "");
    }

    #[test]
    fn test_document_field_names() {
        let cell = Cell::with_span(1, 2, 3, 4, "hello");
        let json = serde_json::to_string(&cell).unwrap();
        assert!(json.contains("\"rowSpan\":3"));
        assert!(json.contains("\"colSpan\":4"));
        assert!(json.contains("\"val\":\"hello\""));
    }
}
