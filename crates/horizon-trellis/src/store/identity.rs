//! Identity-based selection store.
//!
//! Keys selection by a stable per-row identity instead of by position, so
//! selection survives reordering (sorts, filters) and tolerates deletion of
//! the backing data. Used for grids whose row order can change underneath
//! the selection.
//!
//! Row positions are resolved on demand through the grid geometry and the
//! row provider: `position -> index -> row object -> identity`. Rows that
//! cannot currently be resolved (hidden, deleted) are skipped on selection
//! and treated as already deselected on queries.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::StructuralChangeEvent;
use crate::geometry::{CellCoordinate, PositionRect};
use crate::grid::{CellSpan, GridGeometry, RowProvider};
use crate::store::{MarkerHolder, SelectionStore, StructuralRepair};

/// Extracts the stable identity from a row object.
pub type IdentityAccessor<R, I> = Arc<dyn Fn(&R) -> I + Send + Sync>;

struct LastRange<I> {
    region: PositionRect,
    identities: HashSet<I>,
}

struct IdentityState<I, R> {
    selected: HashMap<I, R>,
    /// Cache of the most recent Select-Region rectangle and the identities
    /// it resolved to. Repeated calls over the same rectangle short-circuit,
    /// and an anchored drag that shrinks deselects the rows it left behind.
    last_range: Option<LastRange<I>>,
}

struct IdentityMarkers<R> {
    anchor: Option<(usize, R)>,
    last_cell: Option<(usize, R)>,
    last_region: Option<PositionRect>,
}

/// Selection store keyed by row identity.
///
/// The selected set maps identity to the row object. Because membership is
/// identity-based, a reorder of the backing data moves the selection with
/// the rows; no re-selection is needed. The anchor and last-selected-cell
/// markers are also kept by row object, so they too survive reordering
/// (see [`MarkerHolder`]).
pub struct IdentitySelectionStore<P, I>
where
    P: RowProvider + 'static,
    P::Row: Send + Sync,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    geometry: Arc<dyn GridGeometry>,
    provider: Arc<P>,
    identity_of: IdentityAccessor<P::Row, I>,
    multiple_selection_allowed: AtomicBool,
    state: RwLock<IdentityState<I, P::Row>>,
    markers: RwLock<IdentityMarkers<P::Row>>,
}

impl<P, I> IdentitySelectionStore<P, I>
where
    P: RowProvider + 'static,
    P::Row: Send + Sync,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Creates an empty store.
    ///
    /// `identity_of` derives the stable identity from a row object; it must
    /// be consistent for the lifetime of the row (typically a key field).
    pub fn new<F>(geometry: Arc<dyn GridGeometry>, provider: Arc<P>, identity_of: F) -> Self
    where
        F: Fn(&P::Row) -> I + Send + Sync + 'static,
    {
        Self {
            geometry,
            provider,
            identity_of: Arc::new(identity_of),
            multiple_selection_allowed: AtomicBool::new(true),
            state: RwLock::new(IdentityState {
                selected: HashMap::new(),
                last_range: None,
            }),
            markers: RwLock::new(IdentityMarkers {
                anchor: None,
                last_cell: None,
                last_region: None,
            }),
        }
    }

    /// Resolves a row position to its identity and row object.
    fn resolve_row(&self, position: usize) -> Option<(I, P::Row)> {
        let index = self.geometry.row_position_to_index(position)?;
        let row = self.provider.row_at(index)?;
        let identity = (self.identity_of)(&row);
        Some((identity, row))
    }

    /// The current visible position of a row object, if any.
    fn position_of(&self, row: &P::Row) -> Option<usize> {
        let index = self.provider.index_of(row)?;
        self.geometry.row_index_to_position(index)
    }

    /// Returns `true` if the row at the given position is selected.
    pub fn is_row_position_selected(&self, position: usize) -> bool {
        match self.resolve_row(position) {
            Some((identity, _)) => self.state.read().selected.contains_key(&identity),
            None => false,
        }
    }

    /// The selected row objects, in no particular order.
    pub fn selected_rows(&self) -> Vec<P::Row>
    where
        P::Row: Clone,
    {
        self.state.read().selected.values().cloned().collect()
    }

    fn resolve_range(&self, region: &PositionRect) -> (Vec<(I, P::Row)>, HashSet<I>) {
        let row_count = self.geometry.row_count();
        let bounded = region.bounded_to(self.geometry.column_count().max(1), row_count);
        let mut resolved = Vec::new();
        let mut identities = HashSet::new();
        for position in bounded.y..bounded.end_y() {
            if let Some((identity, row)) = self.resolve_row(position) {
                identities.insert(identity.clone());
                resolved.push((identity, row));
            }
        }
        (resolved, identities)
    }

    fn current_row_positions(&self, row_count: usize) -> Vec<usize> {
        let state = self.state.read();
        let mut positions: Vec<usize> = state
            .selected
            .values()
            .filter_map(|row| self.position_of(row))
            .filter(|&position| position < row_count)
            .collect();
        positions.sort_unstable();
        positions
    }
}

impl<P, I> SelectionStore for IdentitySelectionStore<P, I>
where
    P: RowProvider + 'static,
    P::Row: Send + Sync,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
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

        let region = if self.multiple_selection_allowed() {
            region
        } else {
            PositionRect::cell(region.x, region.y)
        };

        // Resolve outside the write lock; the provider may itself lock.
        let (resolved, identities) = self.resolve_range(&region);

        let mut state = self.state.write();

        if !self.multiple_selection_allowed() {
            state.selected.clear();
            state.last_range = None;
        } else if let Some(last) = state.last_range.take() {
            if last.region == region && last.identities == identities {
                // Same rectangle as the previous call: nothing to do.
                state.last_range = Some(last);
                for (identity, row) in resolved {
                    state.selected.insert(identity, row);
                }
                return;
            }
            if last.region.x == region.x && last.region.y == region.y {
                // Anchored drag: rows covered by the previous rectangle but
                // not the new one leave the selection.
                for identity in last.identities.difference(&identities) {
                    state.selected.remove(identity);
                }
            }
        }

        for (identity, row) in resolved {
            state.selected.insert(identity, row);
        }
        state.last_range = Some(LastRange { region, identities });

        tracing::trace!(
            target: "horizon_trellis::selection",
            region = ?region,
            selected_count = state.selected.len(),
            "added identity selection"
        );
    }

    fn clear_region(&self, region: PositionRect) {
        if region.is_empty() {
            return;
        }
        let (resolved, _) = self.resolve_range(&region);

        let mut state = self.state.write();
        for (identity, _) in resolved {
            state.selected.remove(&identity);
        }
        if let Some(last) = &state.last_range {
            if last.region.intersects(&region) {
                state.last_range = None;
            }
        }
    }

    fn clear_all(&self) {
        let mut state = self.state.write();
        state.selected.clear();
        state.last_range = None;
    }

    fn is_empty(&self) -> bool {
        self.state.read().selected.is_empty()
    }

    fn selected_regions(&self) -> Vec<PositionRect> {
        // Selection is whole-row: contiguous runs of selected positions
        // become full-width rectangles.
        let row_count = self.geometry.row_count();
        let column_count = self.geometry.column_count();
        let positions = self.current_row_positions(row_count);

        let mut regions = Vec::new();
        let mut run: Option<(usize, usize)> = None;
        for position in positions {
            run = match run {
                Some((start, end)) if position == end => Some((start, position + 1)),
                Some((start, end)) => {
                    regions.push(PositionRect::new(0, start, column_count, end - start));
                    Some((position, position + 1))
                }
                None => Some((position, position + 1)),
            };
        }
        if let Some((start, end)) = run {
            regions.push(PositionRect::new(0, start, column_count, end - start));
        }
        regions
    }

    fn is_cell_selected(&self, cell: &CellSpan) -> bool {
        if cell.origin.column >= self.geometry.column_count() {
            return false;
        }
        let rect = cell.rect();
        (rect.y..rect.end_y().min(self.geometry.row_count()))
            .any(|position| self.is_row_position_selected(position))
    }

    fn selected_column_positions(&self, column_count: usize) -> Vec<usize> {
        // Whole rows are selected, so any selection touches every column.
        if self.is_empty() {
            Vec::new()
        } else {
            (0..column_count).collect()
        }
    }

    fn is_column_fully_selected(&self, column: usize, row_count: usize) -> bool {
        column < self.geometry.column_count()
            && row_count > 0
            && self.current_row_positions(row_count).len() == row_count
    }

    fn fully_selected_columns(&self, column_count: usize, row_count: usize) -> Vec<usize> {
        if row_count > 0 && self.current_row_positions(row_count).len() == row_count {
            (0..column_count).collect()
        } else {
            Vec::new()
        }
    }

    fn selected_row_positions(&self, row_count: usize) -> Vec<usize> {
        self.current_row_positions(row_count)
    }

    fn is_row_fully_selected(&self, row: usize, _column_count: usize) -> bool {
        self.is_row_position_selected(row)
    }

    fn fully_selected_rows(&self, _column_count: usize, row_count: usize) -> Vec<usize> {
        self.current_row_positions(row_count)
    }

    fn handle_structural_change(&self, _event: &StructuralChangeEvent) -> StructuralRepair {
        // Revalidate every stored identity against the provider. Entries
        // that no longer resolve are dropped; nothing is ever re-added, so
        // overlapping notifications are safe.
        let dropped = {
            let mut state = self.state.write();
            let before = state.selected.len();
            state
                .selected
                .retain(|_, row| self.provider.index_of(row).is_some());
            state.last_range = None;
            before - state.selected.len()
        };

        if dropped > 0 {
            tracing::debug!(
                target: "horizon_trellis::structural",
                dropped,
                "dropped unresolvable identities after structural change"
            );
        }

        StructuralRepair {
            changed: dropped > 0,
            remaining_rows: self.current_row_positions(self.geometry.row_count()),
        }
    }

    fn markers(&self) -> Option<&dyn MarkerHolder> {
        Some(self)
    }
}

impl<P, I> MarkerHolder for IdentitySelectionStore<P, I>
where
    P: RowProvider + 'static,
    P::Row: Send + Sync,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn anchor(&self) -> CellCoordinate {
        let markers = self.markers.read();
        match &markers.anchor {
            Some((column, row)) => match self.position_of(row) {
                Some(position) => CellCoordinate::new(*column, position),
                None => CellCoordinate::NO_SELECTION,
            },
            None => CellCoordinate::NO_SELECTION,
        }
    }

    fn set_anchor(&self, coordinate: CellCoordinate) {
        let resolved = coordinate
            .is_valid()
            .then(|| self.resolve_row(coordinate.row))
            .flatten()
            .map(|(_, row)| (coordinate.column, row));
        self.markers.write().anchor = resolved;
    }

    fn last_selected_cell(&self) -> CellCoordinate {
        let markers = self.markers.read();
        match &markers.last_cell {
            Some((column, row)) => match self.position_of(row) {
                Some(position) => CellCoordinate::new(*column, position),
                None => CellCoordinate::NO_SELECTION,
            },
            None => CellCoordinate::NO_SELECTION,
        }
    }

    fn set_last_selected_cell(&self, coordinate: CellCoordinate) {
        let resolved = coordinate
            .is_valid()
            .then(|| self.resolve_row(coordinate.row))
            .flatten()
            .map(|(_, row)| (coordinate.column, row));
        self.markers.write().last_cell = resolved;
    }

    fn last_selected_region(&self) -> Option<PositionRect> {
        self.markers.read().last_region
    }

    fn set_last_selected_region(&self, region: Option<PositionRect>) {
        self.markers.write().last_region = region;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{UniformGrid, VecRowProvider};

    fn store_with_rows(
        rows: &[&'static str],
    ) -> (
        Arc<VecRowProvider<&'static str>>,
        IdentitySelectionStore<VecRowProvider<&'static str>, &'static str>,
    ) {
        let geometry: Arc<dyn GridGeometry> = Arc::new(UniformGrid::new(5, rows.len()));
        let provider = Arc::new(VecRowProvider::new(rows.to_vec()));
        let store = IdentitySelectionStore::new(geometry, provider.clone(), |row| *row);
        (provider, store)
    }

    const ROWS: [&str; 10] = [
        "K0", "K1", "K7", "K3", "K4", "K5", "K6", "K2", "K8", "K9",
    ];

    #[test]
    fn test_add_selection_resolves_identities() {
        let (_, store) = store_with_rows(&ROWS);
        store.add_selection(PositionRect::new(0, 2, 5, 2));

        assert!(store.is_row_position_selected(2));
        assert!(store.is_row_position_selected(3));
        assert!(!store.is_row_position_selected(4));
        assert_eq!(store.selected_row_positions(10), vec![2, 3]);
    }

    #[test]
    fn test_selection_survives_reordering() {
        let (provider, store) = store_with_rows(&ROWS);

        // "K7" sits at position 2.
        store.add_selection(PositionRect::new(0, 2, 5, 1));
        assert!(store.is_row_position_selected(2));

        // Reorder so "K7" moves to position 9.
        provider.set_rows(vec![
            "K0", "K1", "K2", "K3", "K4", "K5", "K6", "K8", "K9", "K7",
        ]);

        assert!(store.is_row_position_selected(9));
        assert!(!store.is_row_position_selected(2));
        assert_eq!(store.selected_row_positions(10), vec![9]);
    }

    #[test]
    fn test_markers_survive_reordering() {
        let (provider, store) = store_with_rows(&ROWS);
        store.set_anchor(CellCoordinate::new(1, 2));
        store.set_last_selected_cell(CellCoordinate::new(1, 2));

        provider.set_rows(vec![
            "K0", "K1", "K2", "K3", "K4", "K5", "K6", "K8", "K9", "K7",
        ]);

        assert_eq!(store.anchor(), CellCoordinate::new(1, 9));
        assert_eq!(store.last_selected_cell(), CellCoordinate::new(1, 9));
    }

    #[test]
    fn test_marker_for_deleted_row_is_no_selection() {
        let (provider, store) = store_with_rows(&ROWS);
        store.set_anchor(CellCoordinate::new(0, 2));

        provider.remove_row(2);
        assert_eq!(store.anchor(), CellCoordinate::NO_SELECTION);
    }

    #[test]
    fn test_unresolvable_rows_are_skipped() {
        let (_, store) = store_with_rows(&ROWS);
        // Range extends past the end of the grid; only real rows land.
        store.add_selection(PositionRect::new(0, 8, 5, 10));
        assert_eq!(store.selected_row_positions(10), vec![8, 9]);
    }

    #[test]
    fn test_anchored_drag_shrink_deselects() {
        let (_, store) = store_with_rows(&ROWS);

        // Drag grows to cover rows 2..6...
        store.add_selection(PositionRect::new(0, 2, 5, 4));
        assert_eq!(store.selected_row_positions(10), vec![2, 3, 4, 5]);

        // ...then shrinks back to rows 2..4: the departed rows deselect.
        store.add_selection(PositionRect::new(0, 2, 5, 2));
        assert_eq!(store.selected_row_positions(10), vec![2, 3]);
    }

    #[test]
    fn test_non_anchored_add_preserves_existing() {
        let (_, store) = store_with_rows(&ROWS);
        store.add_selection(PositionRect::new(0, 0, 5, 1));
        store.add_selection(PositionRect::new(0, 5, 5, 1));
        assert_eq!(store.selected_row_positions(10), vec![0, 5]);
    }

    #[test]
    fn test_structural_repair_drops_deleted() {
        let (provider, store) = store_with_rows(&ROWS);
        store.add_selection(PositionRect::new(0, 1, 5, 3));
        assert_eq!(store.selected_row_positions(10), vec![1, 2, 3]);

        // Delete the row at index 2 ("K7").
        provider.remove_row(2);
        let repair = store.handle_structural_change(&StructuralChangeEvent::full_refresh());
        assert!(repair.changed);
        assert_eq!(repair.remaining_rows, vec![1, 2]);

        // Idempotent on a repeated notification.
        let repair = store.handle_structural_change(&StructuralChangeEvent::full_refresh());
        assert!(!repair.changed);
        assert_eq!(repair.remaining_rows, vec![1, 2]);
    }

    #[test]
    fn test_full_selection_queries() {
        let (_, store) = store_with_rows(&ROWS);
        assert!(store.selected_column_positions(5).is_empty());

        store.add_selection(PositionRect::new(0, 0, 5, 10));
        assert!(store.is_column_fully_selected(0, 10));
        assert!(store.is_column_fully_selected(4, 10));
        assert!(!store.is_column_fully_selected(5, 10));
        assert_eq!(store.selected_column_positions(5), vec![0, 1, 2, 3, 4]);
        assert!(store.is_row_fully_selected(3, 5));
    }

    #[test]
    fn test_selected_regions_merges_runs() {
        let (_, store) = store_with_rows(&ROWS);
        store.add_selection(PositionRect::new(0, 1, 5, 2));
        store.add_selection(PositionRect::new(0, 5, 5, 1));

        assert_eq!(
            store.selected_regions(),
            vec![PositionRect::new(0, 1, 5, 2), PositionRect::new(0, 5, 5, 1)]
        );
    }

    #[test]
    fn test_single_selection_mode() {
        let (_, store) = store_with_rows(&ROWS);
        store.set_multiple_selection_allowed(false);
        store.add_selection(PositionRect::new(0, 2, 5, 4));
        assert_eq!(store.selected_row_positions(10), vec![2]);

        store.add_selection(PositionRect::new(0, 7, 5, 1));
        assert_eq!(store.selected_row_positions(10), vec![7]);
    }
}
