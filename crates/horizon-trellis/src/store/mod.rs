//! Selection stores.
//!
//! A selection store tracks *which* cells are selected. Two implementations
//! exist:
//!
//! - [`RegionSelectionStore`](region::RegionSelectionStore) keeps an
//!   unordered collection of rectangles in position space. Fast and simple,
//!   but selection does not survive row reordering.
//! - [`IdentitySelectionStore`](identity::IdentitySelectionStore) keys
//!   selection by a stable per-row identity, so it tolerates reordering and
//!   deletion of the backing data.
//!
//! All store operations are guarded by a reader-writer lock per store:
//! queries (used concurrently by the paint path) take the read lock,
//! mutations take the write lock. Locks are held only for in-memory
//! bookkeeping, never across I/O.

pub mod identity;
pub mod region;

use parking_lot::RwLock;

use crate::events::StructuralChangeEvent;
use crate::geometry::{CellCoordinate, PositionRect};
use crate::grid::CellSpan;

/// Result of repairing a store after a structural change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralRepair {
    /// Whether any selection state was dropped or altered.
    pub changed: bool,
    /// Row positions still selected after the repair, ascending. Used to
    /// emit a row selection changed notification naming the survivors.
    pub remaining_rows: Vec<usize>,
}

/// The common query/mutation surface of a selection store.
///
/// Coordinates are positions in the currently visible ordering. Out-of-range
/// arguments never fail: mutations are silently ignored and queries return
/// `false`/empty.
pub trait SelectionStore: Send + Sync {
    /// Whether more than one region/row may be selected at a time.
    fn multiple_selection_allowed(&self) -> bool;

    /// Enables or disables multi-selection. Disabling does not shrink an
    /// existing selection; the next add enforces the 1x1 rule.
    fn set_multiple_selection_allowed(&self, allowed: bool);

    /// Adds a region to the selection.
    ///
    /// With multi-selection disabled the store is cleared first and the
    /// region forced to a single cell.
    fn add_selection(&self, region: PositionRect);

    /// Removes every selected cell inside the given region.
    fn clear_region(&self, region: PositionRect);

    /// Removes all selection state.
    fn clear_all(&self);

    /// Returns `true` when nothing is selected.
    fn is_empty(&self) -> bool;

    /// The selected regions, as position-space rectangles.
    fn selected_regions(&self) -> Vec<PositionRect>;

    /// Returns `true` if the given (span-resolved) cell is selected.
    ///
    /// Span resolution happens before the store is consulted, so partial
    /// overlap between a selection and a merged cell selects the whole cell.
    fn is_cell_selected(&self, cell: &CellSpan) -> bool;

    /// The column positions touched by any selection, ascending, distinct.
    fn selected_column_positions(&self, column_count: usize) -> Vec<usize>;

    /// Whether the union of selected regions covers the full column.
    fn is_column_fully_selected(&self, column: usize, row_count: usize) -> bool;

    /// All fully selected column positions, ascending.
    fn fully_selected_columns(&self, column_count: usize, row_count: usize) -> Vec<usize>;

    /// The row positions touched by any selection, ascending, distinct.
    fn selected_row_positions(&self, row_count: usize) -> Vec<usize>;

    /// Whether the union of selected regions covers the full row.
    fn is_row_fully_selected(&self, row: usize, column_count: usize) -> bool;

    /// All fully selected row positions, ascending.
    fn fully_selected_rows(&self, column_count: usize, row_count: usize) -> Vec<usize>;

    /// Repairs the store after a structural change.
    ///
    /// Must be idempotent: repeated or overlapping notifications only ever
    /// remove now-invalid entries, never re-add.
    fn handle_structural_change(&self, event: &StructuralChangeEvent) -> StructuralRepair;

    /// Marker persistence, if this store provides it.
    ///
    /// Stores that track selection by identity can also keep the anchor and
    /// last-selected markers by identity so they survive reordering. The
    /// selection layer delegates markers here when available and falls back
    /// to [`LocalMarkers`] otherwise.
    fn markers(&self) -> Option<&dyn MarkerHolder> {
        None
    }
}

/// Holds the selection layer's anchor and last-selected markers.
///
/// The anchor is the fixed reference point shift-extended selections are
/// measured from; the last-selected cell/region record the most recent
/// selection action and are used to resume traversal.
pub trait MarkerHolder: Send + Sync {
    /// The anchor position, or [`CellCoordinate::NO_SELECTION`].
    fn anchor(&self) -> CellCoordinate;

    /// Moves the anchor.
    fn set_anchor(&self, coordinate: CellCoordinate);

    /// The most recently selected cell position.
    fn last_selected_cell(&self) -> CellCoordinate;

    /// Records the most recently selected cell position.
    fn set_last_selected_cell(&self, coordinate: CellCoordinate);

    /// The most recent rectangular selection, if any.
    fn last_selected_region(&self) -> Option<PositionRect>;

    /// Records (or clears) the most recent rectangular selection.
    fn set_last_selected_region(&self, region: Option<PositionRect>);

    /// Resets all markers to "no selection".
    fn reset(&self) {
        self.set_anchor(CellCoordinate::NO_SELECTION);
        self.set_last_selected_cell(CellCoordinate::NO_SELECTION);
        self.set_last_selected_region(None);
    }
}

#[derive(Debug, Default)]
struct MarkerState {
    anchor: CellCoordinate,
    last_cell: CellCoordinate,
    last_region: Option<PositionRect>,
}

/// Position-based marker storage.
///
/// Markers are plain positions; they do not survive reordering of the
/// backing data. Used whenever the active store does not provide its own
/// marker persistence.
#[derive(Debug, Default)]
pub struct LocalMarkers {
    state: RwLock<MarkerState>,
}

impl LocalMarkers {
    /// Creates markers in the "no selection" state.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkerHolder for LocalMarkers {
    fn anchor(&self) -> CellCoordinate {
        self.state.read().anchor
    }

    fn set_anchor(&self, coordinate: CellCoordinate) {
        self.state.write().anchor = coordinate;
    }

    fn last_selected_cell(&self) -> CellCoordinate {
        self.state.read().last_cell
    }

    fn set_last_selected_cell(&self, coordinate: CellCoordinate) {
        self.state.write().last_cell = coordinate;
    }

    fn last_selected_region(&self) -> Option<PositionRect> {
        self.state.read().last_region
    }

    fn set_last_selected_region(&self, region: Option<PositionRect>) {
        self.state.write().last_region = region;
    }
}

/// Merges a sorted list of `[start, end)` intervals and checks whether the
/// union covers `[0, count)` without gaps.
///
/// Interval merging keeps full-row/column checks correct for unbounded or
/// huge grids where enumerating positions would not be.
pub(crate) fn intervals_cover(mut intervals: Vec<(usize, usize)>, count: usize) -> bool {
    if count == 0 {
        return false;
    }
    intervals.sort_unstable();

    let mut covered_to = 0usize;
    for (start, end) in intervals {
        if start > covered_to {
            return false;
        }
        covered_to = covered_to.max(end);
        if covered_to >= count {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_markers_roundtrip() {
        let markers = LocalMarkers::new();
        assert!(!markers.anchor().is_valid());

        markers.set_anchor(CellCoordinate::new(1, 2));
        markers.set_last_selected_cell(CellCoordinate::new(3, 4));
        markers.set_last_selected_region(Some(PositionRect::new(1, 2, 3, 3)));

        assert_eq!(markers.anchor(), CellCoordinate::new(1, 2));
        assert_eq!(markers.last_selected_cell(), CellCoordinate::new(3, 4));
        assert_eq!(
            markers.last_selected_region(),
            Some(PositionRect::new(1, 2, 3, 3))
        );

        markers.reset();
        assert!(!markers.anchor().is_valid());
        assert!(!markers.last_selected_cell().is_valid());
        assert!(markers.last_selected_region().is_none());
    }

    #[test]
    fn test_intervals_cover() {
        assert!(intervals_cover(vec![(0, 5), (5, 10)], 10));
        assert!(intervals_cover(vec![(3, 10), (0, 4)], 10));
        assert!(intervals_cover(vec![(0, 12)], 10));
        assert!(!intervals_cover(vec![(0, 4), (5, 10)], 10));
        assert!(!intervals_cover(vec![(1, 10)], 10));
        assert!(!intervals_cover(vec![], 10));
        assert!(!intervals_cover(vec![(0, 1)], 0));
    }
}
