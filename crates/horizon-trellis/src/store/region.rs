//! Position-based selection store.
//!
//! Keeps an unordered collection of non-identical rectangles in position
//! space. Additions subsume contained regions; clearing subtracts
//! rectangles, re-inserting up to four residual strips per affected region.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::events::StructuralChangeEvent;
use crate::geometry::PositionRect;
use crate::grid::CellSpan;
use crate::store::{intervals_cover, SelectionStore, StructuralRepair};

/// Selection store tracking rectangles of selected positions.
///
/// # Invariants
///
/// - With multi-selection disabled, the store holds at most one 1x1 region.
/// - Additions immediately subsume any existing region fully contained in
///   the new one, and are skipped when the new region is itself contained
///   in an existing one. Overlap that is not containment is allowed and
///   handled by the queries.
///
/// # Example
///
/// ```
/// use horizon_trellis::store::region::RegionSelectionStore;
/// use horizon_trellis::store::SelectionStore;
/// use horizon_trellis::geometry::PositionRect;
/// use horizon_trellis::grid::CellSpan;
///
/// let store = RegionSelectionStore::new();
/// store.add_selection(PositionRect::new(0, 0, 4, 4));
/// store.clear_region(PositionRect::cell(1, 1));
///
/// assert!(store.is_cell_selected(&CellSpan::single(0, 0)));
/// assert!(!store.is_cell_selected(&CellSpan::single(1, 1)));
/// ```
#[derive(Debug, Default)]
pub struct RegionSelectionStore {
    regions: RwLock<Vec<PositionRect>>,
    multiple_selection_allowed: AtomicBool,
}

impl RegionSelectionStore {
    /// Creates an empty store with multi-selection enabled.
    pub fn new() -> Self {
        Self {
            regions: RwLock::new(Vec::new()),
            multiple_selection_allowed: AtomicBool::new(true),
        }
    }

    /// Creates an empty store restricted to a single 1x1 selection.
    pub fn single_selection() -> Self {
        Self {
            regions: RwLock::new(Vec::new()),
            multiple_selection_allowed: AtomicBool::new(false),
        }
    }

    fn column_interval(region: &PositionRect, row_count: usize) -> (usize, usize) {
        (region.y, region.end_y().min(row_count))
    }

    fn row_interval(region: &PositionRect, column_count: usize) -> (usize, usize) {
        (region.x, region.end_x().min(column_count))
    }
}

impl SelectionStore for RegionSelectionStore {
    fn multiple_selection_allowed(&self) -> bool {
        self.multiple_selection_allowed.load(Ordering::Relaxed)
    }

    fn set_multiple_selection_allowed(&self, allowed: bool) {
        self.multiple_selection_allowed.store(allowed, Ordering::Relaxed);
    }

    fn add_selection(&self, region: PositionRect) {
        if region.is_empty() {
            return;
        }

        let mut regions = self.regions.write();

        if !self.multiple_selection_allowed() {
            regions.clear();
            regions.push(PositionRect::cell(region.x, region.y));
            return;
        }

        // A region already covering the new one makes the add a no-op;
        // this also covers the exact-duplicate case.
        if regions.iter().any(|existing| existing.contains_rect(&region)) {
            return;
        }

        // The new region subsumes anything fully contained in it.
        regions.retain(|existing| !region.contains_rect(existing));
        regions.push(region);

        tracing::trace!(
            target: "horizon_trellis::selection",
            region = ?region,
            region_count = regions.len(),
            "added selection region"
        );
    }

    fn clear_region(&self, region: PositionRect) {
        if region.is_empty() {
            return;
        }

        let mut regions = self.regions.write();
        let mut result = Vec::with_capacity(regions.len());
        for existing in regions.drain(..) {
            if existing.intersects(&region) {
                result.extend(existing.subtract(&region));
            } else {
                result.push(existing);
            }
        }
        *regions = result;
    }

    fn clear_all(&self) {
        self.regions.write().clear();
    }

    fn is_empty(&self) -> bool {
        self.regions.read().is_empty()
    }

    fn selected_regions(&self) -> Vec<PositionRect> {
        self.regions.read().clone()
    }

    fn is_cell_selected(&self, cell: &CellSpan) -> bool {
        let cell_rect = cell.rect();
        self.regions
            .read()
            .iter()
            .any(|region| region.intersects(&cell_rect))
    }

    fn selected_column_positions(&self, column_count: usize) -> Vec<usize> {
        let regions = self.regions.read();
        let mut columns = BTreeSet::new();
        for region in regions.iter() {
            for column in region.x..region.end_x().min(column_count) {
                columns.insert(column);
            }
        }
        columns.into_iter().collect()
    }

    fn is_column_fully_selected(&self, column: usize, row_count: usize) -> bool {
        let regions = self.regions.read();
        let intervals: Vec<(usize, usize)> = regions
            .iter()
            .filter(|region| region.x <= column && column < region.end_x())
            .map(|region| Self::column_interval(region, row_count))
            .collect();
        intervals_cover(intervals, row_count)
    }

    fn fully_selected_columns(&self, column_count: usize, row_count: usize) -> Vec<usize> {
        self.selected_column_positions(column_count)
            .into_iter()
            .filter(|&column| self.is_column_fully_selected(column, row_count))
            .collect()
    }

    fn selected_row_positions(&self, row_count: usize) -> Vec<usize> {
        let regions = self.regions.read();
        let mut rows = BTreeSet::new();
        for region in regions.iter() {
            for row in region.y..region.end_y().min(row_count) {
                rows.insert(row);
            }
        }
        rows.into_iter().collect()
    }

    fn is_row_fully_selected(&self, row: usize, column_count: usize) -> bool {
        let regions = self.regions.read();
        let intervals: Vec<(usize, usize)> = regions
            .iter()
            .filter(|region| region.y <= row && row < region.end_y())
            .map(|region| Self::row_interval(region, column_count))
            .collect();
        intervals_cover(intervals, column_count)
    }

    fn fully_selected_rows(&self, column_count: usize, row_count: usize) -> Vec<usize> {
        self.selected_row_positions(row_count)
            .into_iter()
            .filter(|&row| self.is_row_fully_selected(row, column_count))
            .collect()
    }

    fn handle_structural_change(&self, event: &StructuralChangeEvent) -> StructuralRepair {
        let mut regions = self.regions.write();
        if regions.is_empty() {
            return StructuralRepair::default();
        }

        // Positions are ephemeral: a full refresh, or any diff that shifts
        // positions at or before a stored region, invalidates the stored
        // rectangles. Diffs beyond every region leave the selection intact.
        let invalidated = if event.is_full_refresh() {
            true
        } else {
            let row_diffs = event.row_diffs.as_deref().unwrap_or(&[]);
            let column_diffs = event.column_diffs.as_deref().unwrap_or(&[]);

            row_diffs.iter().any(|diff| {
                let affected = diff.positions();
                regions.iter().any(|region| {
                    if diff.shifts_positions() {
                        region.end_y() > affected.start
                    } else {
                        region.y < affected.end && region.end_y() > affected.start
                    }
                })
            }) || column_diffs.iter().any(|diff| {
                let affected = diff.positions();
                regions.iter().any(|region| {
                    if diff.shifts_positions() {
                        region.end_x() > affected.start
                    } else {
                        region.x < affected.end && region.end_x() > affected.start
                    }
                })
            })
        };

        if invalidated {
            tracing::debug!(
                target: "horizon_trellis::structural",
                dropped_regions = regions.len(),
                "structural change invalidated position-based selection"
            );
            regions.clear();
            StructuralRepair {
                changed: true,
                remaining_rows: Vec::new(),
            }
        } else {
            StructuralRepair::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_query() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(2, 2, 3, 3));

        assert!(store.is_cell_selected(&CellSpan::single(2, 2)));
        assert!(store.is_cell_selected(&CellSpan::single(4, 4)));
        assert!(!store.is_cell_selected(&CellSpan::single(5, 5)));
        assert!(!store.is_empty());
    }

    #[test]
    fn test_subsumption_inner_then_outer() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(3, 3, 2, 2));
        store.add_selection(PositionRect::new(0, 0, 10, 10));

        // The outer add removed the inner region and kept only itself.
        assert_eq!(store.selected_regions(), vec![PositionRect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn test_subsumption_outer_then_inner() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(0, 0, 10, 10));

        let before = store.selected_regions();
        store.add_selection(PositionRect::new(3, 3, 2, 2));
        assert_eq!(store.selected_regions(), before);

        // Membership is unchanged for every cell.
        for row in 0..10 {
            for col in 0..10 {
                assert!(store.is_cell_selected(&CellSpan::single(col, row)));
            }
        }
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(1, 1, 2, 2));
        store.add_selection(PositionRect::new(1, 1, 2, 2));
        assert_eq!(store.selected_regions().len(), 1);
    }

    #[test]
    fn test_single_selection_forces_single_cell() {
        let store = RegionSelectionStore::single_selection();
        store.add_selection(PositionRect::new(2, 3, 5, 5));
        assert_eq!(store.selected_regions(), vec![PositionRect::cell(2, 3)]);

        store.add_selection(PositionRect::new(7, 8, 2, 2));
        assert_eq!(store.selected_regions(), vec![PositionRect::cell(7, 8)]);
    }

    #[test]
    fn test_subtraction_leaves_96_cells() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(0, 0, 10, 10));
        store.clear_region(PositionRect::new(3, 3, 2, 2));

        let mut selected = 0;
        for row in 0..10 {
            for col in 0..10 {
                let in_hole = (3..5).contains(&col) && (3..5).contains(&row);
                let is_selected = store.is_cell_selected(&CellSpan::single(col, row));
                assert_eq!(is_selected, !in_hole, "cell ({col},{row})");
                if is_selected {
                    selected += 1;
                }
            }
        }
        assert_eq!(selected, 96);
    }

    #[test]
    fn test_spanned_cell_partial_overlap_selects_whole_cell() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::cell(2, 0));

        // A cell spanning columns 2..5: the selection only overlaps its
        // first position, but the whole cell reports selected.
        let spanned = CellSpan {
            origin: crate::geometry::CellCoordinate::new(2, 0),
            column_span: 3,
            row_span: 1,
        };
        assert!(store.is_cell_selected(&spanned));
    }

    #[test]
    fn test_full_column_aggregation_from_partial_adds() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(0, 0, 5, 1));
        store.add_selection(PositionRect::new(0, 1, 5, 1));

        for column in 0..5 {
            assert!(store.is_column_fully_selected(column, 2), "column {column}");
        }
        assert!(!store.is_column_fully_selected(5, 2));
        assert_eq!(store.fully_selected_columns(10, 2), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_full_column_with_gap_is_not_fully_selected() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(0, 0, 1, 3));
        store.add_selection(PositionRect::new(0, 4, 1, 6));
        assert!(!store.is_column_fully_selected(0, 10));

        store.add_selection(PositionRect::new(0, 3, 1, 1));
        assert!(store.is_column_fully_selected(0, 10));
    }

    #[test]
    fn test_unbounded_column_is_fully_selected() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::full_column(4));
        assert!(store.is_column_fully_selected(4, 1_000_000));
        assert_eq!(store.selected_column_positions(10), vec![4]);
    }

    #[test]
    fn test_selected_positions_sorted_distinct() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(5, 0, 2, 1));
        store.add_selection(PositionRect::new(1, 0, 2, 1));
        store.add_selection(PositionRect::new(2, 1, 2, 1));

        assert_eq!(store.selected_column_positions(10), vec![1, 2, 3, 5, 6]);
        assert_eq!(store.selected_row_positions(10), vec![0, 1]);
    }

    #[test]
    fn test_out_of_range_queries_return_empty() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(8, 8, 4, 4));

        // Clamped by the grid counts.
        assert_eq!(store.selected_column_positions(10), vec![8, 9]);
        assert!(!store.is_column_fully_selected(20, 10));
        assert!(!store.is_column_fully_selected(8, 0));
    }

    #[test]
    fn test_structural_change_beyond_selection_is_ignored() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(0, 0, 2, 2));

        let repair = store.handle_structural_change(&StructuralChangeEvent::rows(vec![
            crate::events::StructuralDiff::Delete(5..8),
        ]));
        assert!(!repair.changed);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_structural_change_at_selection_clears() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(0, 3, 2, 2));

        let repair = store.handle_structural_change(&StructuralChangeEvent::rows(vec![
            crate::events::StructuralDiff::Delete(0..1),
        ]));
        assert!(repair.changed);
        assert!(store.is_empty());

        // Idempotent: a second identical notification changes nothing.
        let repair = store.handle_structural_change(&StructuralChangeEvent::rows(vec![
            crate::events::StructuralDiff::Delete(0..1),
        ]));
        assert!(!repair.changed);
    }

    #[test]
    fn test_full_refresh_clears() {
        let store = RegionSelectionStore::new();
        store.add_selection(PositionRect::new(0, 0, 2, 2));
        let repair = store.handle_structural_change(&StructuralChangeEvent::full_refresh());
        assert!(repair.changed);
        assert!(store.is_empty());
    }
}
