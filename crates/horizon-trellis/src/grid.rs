//! Collaborator contracts between the selection core and the grid.
//!
//! The selection core never owns grid data. It consumes two traits:
//!
//! - [`GridGeometry`] describes the currently visible shape of the grid:
//!   column/row counts, merged-cell spans, and the conversion between
//!   ephemeral *positions* and stable *indices*.
//! - [`RowProvider`] resolves row objects by stable index, which the
//!   identity selection store uses to key selection by row identity.
//!
//! [`UniformGrid`] and [`VecRowProvider`] are concrete in-memory
//! implementations used by tests and small applications.

use parking_lot::RwLock;

use crate::geometry::{CellCoordinate, PositionRect};

/// A resolved cell: its origin position plus the positions it spans.
///
/// Merged ("spanned") cells occupy more than one position on one or both
/// axes. Selection and traversal always operate on the full origin+span
/// rectangle, so partially overlapping a spanned cell selects the whole
/// cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    /// The origin (top-left) position of the cell.
    pub origin: CellCoordinate,
    /// Number of column positions the cell occupies (at least 1).
    pub column_span: usize,
    /// Number of row positions the cell occupies (at least 1).
    pub row_span: usize,
}

impl CellSpan {
    /// Creates an unspanned cell at the given position.
    pub const fn single(column: usize, row: usize) -> Self {
        Self {
            origin: CellCoordinate::new(column, row),
            column_span: 1,
            row_span: 1,
        }
    }

    /// The full rectangle this cell occupies in position space.
    pub fn rect(&self) -> PositionRect {
        PositionRect::new(
            self.origin.column,
            self.origin.row,
            self.column_span,
            self.row_span,
        )
    }

    /// The rightmost column position occupied by the cell.
    pub fn rightmost_column(&self) -> usize {
        self.origin.column + self.column_span - 1
    }

    /// The bottommost row position occupied by the cell.
    pub fn bottom_row(&self) -> usize {
        self.origin.row + self.row_span - 1
    }
}

/// Geometry of the currently visible grid.
///
/// Positions are coordinates in the visible ordering and change when
/// columns or rows are hidden or reordered. Indices are stable identifiers
/// into the backing data. Lookups at out-of-range positions return `None`
/// rather than failing; the selection core treats a missing cell as
/// "silently abort the sub-operation".
pub trait GridGeometry: Send + Sync {
    /// Number of visible column positions.
    fn column_count(&self) -> usize;

    /// Number of visible row positions.
    fn row_count(&self) -> usize;

    /// Resolves the cell at a position, accounting for merged cells.
    ///
    /// Any position inside a merged region resolves to the same
    /// [`CellSpan`]. Returns `None` when the position is out of range.
    fn cell_span_at(&self, column: usize, row: usize) -> Option<CellSpan> {
        if column < self.column_count() && row < self.row_count() {
            Some(CellSpan::single(column, row))
        } else {
            None
        }
    }

    /// Converts a visible column position to its stable index.
    fn column_position_to_index(&self, position: usize) -> Option<usize>;

    /// Converts a stable column index to its current visible position.
    ///
    /// Returns `None` when the column is hidden or gone.
    fn column_index_to_position(&self, index: usize) -> Option<usize>;

    /// Converts a visible row position to its stable index.
    fn row_position_to_index(&self, position: usize) -> Option<usize>;

    /// Converts a stable row index to its current visible position.
    ///
    /// Returns `None` when the row is hidden or gone.
    fn row_index_to_position(&self, index: usize) -> Option<usize>;
}

/// Resolves row objects for identity-keyed selection.
///
/// Implementations must tolerate rows that are no longer present:
/// [`index_of`](Self::index_of) returns `None` for a row object that has
/// been deleted or filtered out, which the identity store treats as
/// "already deselected".
pub trait RowProvider: Send + Sync {
    /// The row object type.
    type Row: Clone;

    /// Returns the row object at the given stable index.
    fn row_at(&self, index: usize) -> Option<Self::Row>;

    /// Returns the current stable index of a row object, if still present.
    fn index_of(&self, row: &Self::Row) -> Option<usize>;
}

/// A simple in-memory grid geometry.
///
/// Supports registering merged-cell regions and hiding column/row
/// positions, which is enough to exercise span-aware traversal and the
/// hide-widening path of the selection layer. Positions map to indices via
/// the visible-order tables.
///
/// # Example
///
/// ```
/// use horizon_trellis::grid::{GridGeometry, UniformGrid};
/// use horizon_trellis::geometry::PositionRect;
///
/// let mut grid = UniformGrid::new(10, 5);
/// grid.add_span(PositionRect::new(2, 1, 3, 1)); // merge 3 columns in row 1
///
/// let span = grid.cell_span_at(3, 1).unwrap();
/// assert_eq!(span.origin.column, 2);
/// assert_eq!(span.column_span, 3);
/// ```
#[derive(Debug, Clone)]
pub struct UniformGrid {
    /// Stable column index for each visible position.
    column_indexes: Vec<usize>,
    /// Stable row index for each visible position.
    row_indexes: Vec<usize>,
    /// Merged-cell regions, in position space.
    spans: Vec<PositionRect>,
}

impl UniformGrid {
    /// Creates a grid with the given visible dimensions and no merged cells.
    pub fn new(column_count: usize, row_count: usize) -> Self {
        Self {
            column_indexes: (0..column_count).collect(),
            row_indexes: (0..row_count).collect(),
            spans: Vec::new(),
        }
    }

    /// Registers a merged-cell region.
    ///
    /// Every position inside `region` resolves to one cell whose origin is
    /// the region's top-left corner.
    pub fn add_span(&mut self, region: PositionRect) {
        self.spans.push(region);
    }

    /// Removes the given column positions from the visible ordering.
    ///
    /// Positions to the right shift left accordingly. Out-of-range entries
    /// are ignored.
    pub fn hide_columns(&mut self, positions: &[usize]) {
        let mut sorted: Vec<usize> = positions.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for position in sorted.into_iter().rev() {
            if position < self.column_indexes.len() {
                self.column_indexes.remove(position);
            }
        }
    }

    /// Removes the given row positions from the visible ordering.
    pub fn hide_rows(&mut self, positions: &[usize]) {
        let mut sorted: Vec<usize> = positions.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for position in sorted.into_iter().rev() {
            if position < self.row_indexes.len() {
                self.row_indexes.remove(position);
            }
        }
    }
}

impl GridGeometry for UniformGrid {
    fn column_count(&self) -> usize {
        self.column_indexes.len()
    }

    fn row_count(&self) -> usize {
        self.row_indexes.len()
    }

    fn cell_span_at(&self, column: usize, row: usize) -> Option<CellSpan> {
        if column >= self.column_count() || row >= self.row_count() {
            return None;
        }
        for span in &self.spans {
            if span.contains_cell(column, row) {
                return Some(CellSpan {
                    origin: CellCoordinate::new(span.x, span.y),
                    column_span: span.width,
                    row_span: span.height,
                });
            }
        }
        Some(CellSpan::single(column, row))
    }

    fn column_position_to_index(&self, position: usize) -> Option<usize> {
        self.column_indexes.get(position).copied()
    }

    fn column_index_to_position(&self, index: usize) -> Option<usize> {
        self.column_indexes.iter().position(|&i| i == index)
    }

    fn row_position_to_index(&self, position: usize) -> Option<usize> {
        self.row_indexes.get(position).copied()
    }

    fn row_index_to_position(&self, index: usize) -> Option<usize> {
        self.row_indexes.iter().position(|&i| i == index)
    }
}

/// An in-memory row provider backed by a `Vec`.
///
/// Rows are matched by equality, so reordering the backing vector changes
/// indices without invalidating identity-based selection. Interior
/// mutability allows the backing data to be reordered while selection
/// stores hold a shared reference.
pub struct VecRowProvider<R> {
    rows: RwLock<Vec<R>>,
}

impl<R: Clone + PartialEq + Send + Sync> VecRowProvider<R> {
    /// Creates a provider over the given rows.
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Replaces the backing rows, e.g. after a sort or filter elsewhere.
    pub fn set_rows(&self, rows: Vec<R>) {
        *self.rows.write() = rows;
    }

    /// Removes the row at the given index, if present.
    pub fn remove_row(&self, index: usize) -> Option<R> {
        let mut rows = self.rows.write();
        if index < rows.len() {
            Some(rows.remove(index))
        } else {
            None
        }
    }

    /// Number of rows currently present.
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }
}

impl<R: Clone + PartialEq + Send + Sync> RowProvider for VecRowProvider<R> {
    type Row = R;

    fn row_at(&self, index: usize) -> Option<R> {
        self.rows.read().get(index).cloned()
    }

    fn index_of(&self, row: &R) -> Option<usize> {
        self.rows.read().iter().position(|r| r == row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_grid_counts() {
        let grid = UniformGrid::new(10, 5);
        assert_eq!(grid.column_count(), 10);
        assert_eq!(grid.row_count(), 5);
    }

    #[test]
    fn test_cell_span_resolution() {
        let mut grid = UniformGrid::new(10, 5);
        grid.add_span(PositionRect::new(2, 1, 3, 2));

        // Every position inside the merged region resolves to its origin.
        for col in 2..5 {
            for row in 1..3 {
                let span = grid.cell_span_at(col, row).unwrap();
                assert_eq!(span.origin, CellCoordinate::new(2, 1));
                assert_eq!(span.column_span, 3);
                assert_eq!(span.row_span, 2);
            }
        }

        // Positions outside resolve to plain single cells.
        let span = grid.cell_span_at(5, 1).unwrap();
        assert_eq!(span, CellSpan::single(5, 1));
    }

    #[test]
    fn test_out_of_range_lookup_is_none() {
        let grid = UniformGrid::new(3, 3);
        assert!(grid.cell_span_at(3, 0).is_none());
        assert!(grid.cell_span_at(0, 3).is_none());
        assert!(grid.column_position_to_index(3).is_none());
        assert!(grid.row_index_to_position(5).is_none());
    }

    #[test]
    fn test_hide_columns_shifts_positions() {
        let mut grid = UniformGrid::new(6, 2);
        grid.hide_columns(&[1, 3]);

        assert_eq!(grid.column_count(), 4);
        // Index 2 now lives at position 1, index 4 at position 2.
        assert_eq!(grid.column_index_to_position(2), Some(1));
        assert_eq!(grid.column_index_to_position(4), Some(2));
        assert_eq!(grid.column_index_to_position(1), None);
        assert_eq!(grid.column_position_to_index(0), Some(0));
    }

    #[test]
    fn test_vec_row_provider_reorder() {
        let provider = VecRowProvider::new(vec!["a", "b", "c"]);
        assert_eq!(provider.row_at(1), Some("b"));
        assert_eq!(provider.index_of(&"c"), Some(2));

        provider.set_rows(vec!["c", "a", "b"]);
        assert_eq!(provider.index_of(&"c"), Some(0));
        assert_eq!(provider.index_of(&"b"), Some(2));

        provider.remove_row(0);
        assert_eq!(provider.index_of(&"c"), None);
    }
}
