//! Position-space geometry for the selection core.
//!
//! Selection state is tracked in *position space*: column and row positions
//! in the currently visible ordering of the grid. Positions are ephemeral
//! (they change when columns or rows are hidden or reordered), as opposed to
//! the stable *indices* into the backing data. The [`crate::grid`] module
//! converts between the two.

/// Sentinel extent meaning "to the end of the axis".
///
/// A [`PositionRect`] whose width or height is `FULL_EXTENT` conceptually
/// selects an entire row or column regardless of how many positions the
/// grid currently has. All extent arithmetic saturates so the sentinel never
/// wraps.
pub const FULL_EXTENT: usize = usize::MAX;

/// A cell location in position space.
///
/// The invalid value [`CellCoordinate::NO_SELECTION`] is used for "no anchor"
/// and "no last-selected cell" markers, mirroring how the layer starts out
/// before any selection was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoordinate {
    /// The column position.
    pub column: usize,
    /// The row position.
    pub row: usize,
}

impl CellCoordinate {
    /// Marker value meaning "no cell".
    pub const NO_SELECTION: Self = Self {
        column: usize::MAX,
        row: usize::MAX,
    };

    /// Creates a coordinate at the given column and row positions.
    #[inline]
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Returns `true` if this coordinate refers to an actual cell.
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::NO_SELECTION
    }
}

impl Default for CellCoordinate {
    fn default() -> Self {
        Self::NO_SELECTION
    }
}

/// An axis-aligned rectangle in position space.
///
/// `width` and `height` may be [`FULL_EXTENT`] to express "the rest of the
/// axis". The exclusive end coordinates are therefore computed with
/// saturating arithmetic: an unbounded rectangle ends at `usize::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionRect {
    /// Leftmost column position.
    pub x: usize,
    /// Topmost row position.
    pub y: usize,
    /// Number of columns covered (possibly [`FULL_EXTENT`]).
    pub width: usize,
    /// Number of rows covered (possibly [`FULL_EXTENT`]).
    pub height: usize,
}

impl PositionRect {
    /// Creates a rectangle from its origin and extents.
    #[inline]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a 1x1 rectangle covering a single cell position.
    #[inline]
    pub const fn cell(column: usize, row: usize) -> Self {
        Self::new(column, row, 1, 1)
    }

    /// Creates a rectangle covering an entire column.
    #[inline]
    pub const fn full_column(column: usize) -> Self {
        Self::new(column, 0, 1, FULL_EXTENT)
    }

    /// Creates a rectangle covering an entire row.
    #[inline]
    pub const fn full_row(row: usize) -> Self {
        Self::new(0, row, FULL_EXTENT, 1)
    }

    /// Creates the smallest rectangle containing both coordinates.
    pub fn spanning(a: CellCoordinate, b: CellCoordinate) -> Self {
        let x = a.column.min(b.column);
        let y = a.row.min(b.row);
        Self::new(
            x,
            y,
            a.column.max(b.column) - x + 1,
            a.row.max(b.row) - y + 1,
        )
    }

    /// Returns `true` if the rectangle covers no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The exclusive right edge (saturating for unbounded widths).
    #[inline]
    pub fn end_x(&self) -> usize {
        self.x.saturating_add(self.width)
    }

    /// The exclusive bottom edge (saturating for unbounded heights).
    #[inline]
    pub fn end_y(&self) -> usize {
        self.y.saturating_add(self.height)
    }

    /// Returns `true` if the given cell position lies inside this rectangle.
    #[inline]
    pub fn contains_cell(&self, column: usize, row: usize) -> bool {
        column >= self.x && column < self.end_x() && row >= self.y && row < self.end_y()
    }

    /// Returns `true` if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &PositionRect) -> bool {
        if other.is_empty() {
            return true;
        }
        self.x <= other.x
            && self.y <= other.y
            && self.end_x() >= other.end_x()
            && self.end_y() >= other.end_y()
    }

    /// Returns `true` if the two rectangles share at least one cell.
    pub fn intersects(&self, other: &PositionRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.end_x()
            && other.x < self.end_x()
            && self.y < other.end_y()
            && other.y < self.end_y()
    }

    /// Computes the overlapping rectangle, or `None` if disjoint.
    pub fn intersection(&self, other: &PositionRect) -> Option<PositionRect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(PositionRect::new(
            x,
            y,
            self.end_x().min(other.end_x()) - x,
            self.end_y().min(other.end_y()) - y,
        ))
    }

    /// Subtracts `other` from this rectangle.
    ///
    /// Returns the up-to-four residual rectangles lying strictly above,
    /// below, left, and right of the overlap. Returns the original rectangle
    /// unchanged when the two do not intersect; returns nothing when `other`
    /// covers this rectangle entirely. Zero-area residuals are dropped.
    pub fn subtract(&self, other: &PositionRect) -> Vec<PositionRect> {
        let Some(overlap) = self.intersection(other) else {
            return vec![*self];
        };

        let mut residuals = Vec::with_capacity(4);

        // Strip above the overlap, full width of self.
        if overlap.y > self.y {
            residuals.push(PositionRect::new(
                self.x,
                self.y,
                self.width,
                overlap.y - self.y,
            ));
        }
        // Strip below the overlap, full width of self.
        if self.end_y() > overlap.end_y() {
            residuals.push(PositionRect::new(
                self.x,
                overlap.end_y(),
                self.width,
                self.end_y() - overlap.end_y(),
            ));
        }
        // Left strip, confined to the overlap's row band.
        if overlap.x > self.x {
            residuals.push(PositionRect::new(
                self.x,
                overlap.y,
                overlap.x - self.x,
                overlap.height,
            ));
        }
        // Right strip, confined to the overlap's row band.
        if self.end_x() > overlap.end_x() {
            residuals.push(PositionRect::new(
                overlap.end_x(),
                overlap.y,
                self.end_x() - overlap.end_x(),
                overlap.height,
            ));
        }

        residuals
    }

    /// Clamps unbounded extents to the given grid dimensions.
    ///
    /// Rectangles using [`FULL_EXTENT`] are resolved against the current
    /// column and row counts so they can be enumerated.
    pub fn bounded_to(&self, column_count: usize, row_count: usize) -> PositionRect {
        PositionRect::new(
            self.x,
            self.y,
            self.width.min(column_count.saturating_sub(self.x)),
            self.height.min(row_count.saturating_sub(self.y)),
        )
    }
}
