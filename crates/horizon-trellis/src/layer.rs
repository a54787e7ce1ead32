//! The selection layer.
//!
//! [`SelectionLayer`] orchestrates a selection store, the anchor and
//! last-selected markers, and outward change notifications. It owns the
//! gesture semantics: plain clicks replace the selection, Shift extends a
//! rectangle from the anchor, Ctrl adds or toggles without clearing, and
//! directional moves run the traversal algorithm and apply its result.
//!
//! The layer holds no cell data; it reads shape through
//! [`GridGeometry`](crate::grid::GridGeometry) and delegates membership to
//! the active [`SelectionStore`]. When the store provides identity-based
//! marker persistence the layer's markers live there (so they survive
//! reordering); otherwise positional [`LocalMarkers`] are used.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_trellis::grid::UniformGrid;
//! use horizon_trellis::layer::SelectionLayer;
//! use horizon_trellis::store::region::RegionSelectionStore;
//!
//! let layer = SelectionLayer::new(
//!     Arc::new(UniformGrid::new(10, 5)),
//!     Arc::new(RegionSelectionStore::new()),
//! );
//!
//! layer.select_cell(2, 3, false, false);
//! assert!(layer.is_cell_selected(2, 3));
//! assert_eq!(layer.anchor().column, 2);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::events::{CellSelectionEvent, RowSelectionEvent, SelectionSignals, StructuralChangeEvent};
use crate::geometry::{CellCoordinate, PositionRect};
use crate::grid::GridGeometry;
use crate::movement::traverse;
use crate::store::{LocalMarkers, MarkerHolder, SelectionStore};
use crate::traversal::{Direction, TraversalStrategy};

/// What happens to the selection when the grid structure changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructuralChangePolicy {
    /// Repair the stores, keeping whatever is still resolvable.
    #[default]
    Preserve,
    /// Clear all selection state on any structural change.
    Reset,
}

/// Orchestrates selection state, markers, and notifications for one grid.
pub struct SelectionLayer {
    geometry: Arc<dyn GridGeometry>,
    store: Arc<dyn SelectionStore>,
    local_markers: LocalMarkers,
    signals: SelectionSignals,
    structural_policy: StructuralChangePolicy,
    /// Drag-to-extend target rectangle, independent of the store.
    fill_handle: RwLock<Option<PositionRect>>,
}

impl SelectionLayer {
    /// Creates a layer over the given geometry and store, with empty
    /// selection and the [`StructuralChangePolicy::Preserve`] policy.
    pub fn new(geometry: Arc<dyn GridGeometry>, store: Arc<dyn SelectionStore>) -> Self {
        Self {
            geometry,
            store,
            local_markers: LocalMarkers::new(),
            signals: SelectionSignals::new(),
            structural_policy: StructuralChangePolicy::default(),
            fill_handle: RwLock::new(None),
        }
    }

    /// Sets the structural change policy.
    pub fn with_structural_change_policy(mut self, policy: StructuralChangePolicy) -> Self {
        self.structural_policy = policy;
        self
    }

    /// The outward notification surface.
    pub fn signals(&self) -> &SelectionSignals {
        &self.signals
    }

    /// The active selection store.
    pub fn store(&self) -> &Arc<dyn SelectionStore> {
        &self.store
    }

    /// The grid geometry this layer reads shape from.
    pub fn geometry(&self) -> &Arc<dyn GridGeometry> {
        &self.geometry
    }

    /// The active marker holder: the store's, when it persists markers by
    /// identity, else the layer's positional markers.
    fn markers(&self) -> &dyn MarkerHolder {
        self.store.markers().unwrap_or(&self.local_markers)
    }

    // ===== Marker accessors =====

    /// The anchor position, or [`CellCoordinate::NO_SELECTION`].
    pub fn anchor(&self) -> CellCoordinate {
        self.markers().anchor()
    }

    /// Moves the anchor.
    pub fn set_anchor(&self, coordinate: CellCoordinate) {
        self.markers().set_anchor(coordinate);
    }

    /// The most recently selected cell position.
    pub fn last_selected_cell(&self) -> CellCoordinate {
        self.markers().last_selected_cell()
    }

    /// The most recent rectangular selection, if any.
    pub fn last_selected_region(&self) -> Option<PositionRect> {
        self.markers().last_selected_region()
    }

    // ===== Queries =====

    /// Returns `true` if the (span-resolved) cell at the position is
    /// selected.
    pub fn is_cell_selected(&self, column: usize, row: usize) -> bool {
        match self.geometry.cell_span_at(column, row) {
            Some(cell) => self.store.is_cell_selected(&cell),
            None => false,
        }
    }

    /// Returns `true` when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The selected regions, in position space.
    pub fn selected_regions(&self) -> Vec<PositionRect> {
        self.store.selected_regions()
    }

    /// Row positions touched by any selection, ascending.
    pub fn selected_row_positions(&self) -> Vec<usize> {
        self.store.selected_row_positions(self.geometry.row_count())
    }

    /// Column positions touched by any selection, ascending.
    pub fn selected_column_positions(&self) -> Vec<usize> {
        self.store
            .selected_column_positions(self.geometry.column_count())
    }

    /// Whether the full height of the column is selected.
    pub fn is_column_fully_selected(&self, column: usize) -> bool {
        self.store
            .is_column_fully_selected(column, self.geometry.row_count())
    }

    /// All fully selected columns, ascending.
    pub fn fully_selected_columns(&self) -> Vec<usize> {
        self.store
            .fully_selected_columns(self.geometry.column_count(), self.geometry.row_count())
    }

    /// Whether the full width of the row is selected.
    pub fn is_row_fully_selected(&self, row: usize) -> bool {
        self.store
            .is_row_fully_selected(row, self.geometry.column_count())
    }

    /// All fully selected rows, ascending.
    pub fn fully_selected_rows(&self) -> Vec<usize> {
        self.store
            .fully_selected_rows(self.geometry.column_count(), self.geometry.row_count())
    }

    // ===== Fill handle =====

    /// Sets (or clears) the drag-to-extend target rectangle.
    pub fn set_fill_handle_region(&self, region: Option<PositionRect>) {
        *self.fill_handle.write() = region;
    }

    /// The drag-to-extend target rectangle, if one is active.
    pub fn fill_handle_region(&self) -> Option<PositionRect> {
        *self.fill_handle.read()
    }

    /// The bottom-right cell of the selection, when the whole selection
    /// forms one contiguous rectangle.
    ///
    /// Computed on demand: the bounding box of all selected regions is
    /// checked for full coverage by subtracting each region from it.
    /// Returns `None` for an empty or non-contiguous selection.
    pub fn bottom_right_of_contiguous_selection(&self) -> Option<CellCoordinate> {
        let regions: Vec<PositionRect> = self
            .selected_regions()
            .into_iter()
            .map(|r| r.bounded_to(self.geometry.column_count(), self.geometry.row_count()))
            .filter(|r| !r.is_empty())
            .collect();
        let first = regions.first()?;

        let mut bounds = *first;
        for region in &regions[1..] {
            let x = bounds.x.min(region.x);
            let y = bounds.y.min(region.y);
            let end_x = bounds.end_x().max(region.end_x());
            let end_y = bounds.end_y().max(region.end_y());
            bounds = PositionRect::new(x, y, end_x - x, end_y - y);
        }

        let mut uncovered = vec![bounds];
        for region in &regions {
            uncovered = uncovered
                .into_iter()
                .flat_map(|piece| piece.subtract(region))
                .collect();
            if uncovered.is_empty() {
                break;
            }
        }

        if uncovered.is_empty() {
            Some(CellCoordinate::new(bounds.end_x() - 1, bounds.end_y() - 1))
        } else {
            None
        }
    }

    // ===== Mutations =====

    /// Adds a region to the selection, establishing the anchor at the
    /// region origin if none is set.
    pub fn add_selection(&self, region: PositionRect) {
        if !self.anchor().is_valid() {
            self.markers()
                .set_anchor(CellCoordinate::new(region.x, region.y));
        }
        self.store.add_selection(region);
    }

    /// Selects the cell at a position under the given modifier state.
    ///
    /// No modifier replaces the selection and moves the anchor; `extend`
    /// selects the rectangle between the anchor and the cell (replacing the
    /// previous extended rectangle); `additive` toggles the cell without
    /// clearing anything else.
    pub fn select_cell(&self, column: usize, row: usize, extend: bool, additive: bool) {
        let Some(cell) = self.geometry.cell_span_at(column, row) else {
            return;
        };
        let markers = self.markers();
        let anchor = markers.anchor();

        if extend && anchor.is_valid() {
            let far = CellCoordinate::new(cell.rightmost_column(), cell.bottom_row());
            let region = PositionRect::spanning(anchor, far)
                .bounded_to(self.geometry.column_count(), self.geometry.row_count());
            if !additive {
                if let Some(previous) = markers.last_selected_region() {
                    self.store.clear_region(previous);
                }
            }
            self.store.add_selection(region);
            markers.set_last_selected_region(Some(region));
        } else if additive {
            if self.store.is_cell_selected(&cell) {
                self.store.clear_region(cell.rect());
            } else {
                self.store.add_selection(cell.rect());
            }
            markers.set_anchor(cell.origin);
            markers.set_last_selected_region(None);
        } else {
            self.store.clear_all();
            self.store.add_selection(cell.rect());
            markers.set_anchor(cell.origin);
            markers.set_last_selected_region(None);
        }
        markers.set_last_selected_cell(cell.origin);

        self.signals.cell_selection_changed.emit(CellSelectionEvent {
            coordinate: cell.origin,
            with_extend: extend,
            with_additive: additive,
        });
    }

    /// Selects a rectangular region under the given modifier state.
    ///
    /// `additive` toggles: a region that is already fully selected is
    /// cleared instead of re-added.
    pub fn select_region(&self, region: PositionRect, extend: bool, additive: bool) {
        if region.is_empty() {
            return;
        }
        let bounded = region.bounded_to(self.geometry.column_count(), self.geometry.row_count());
        if bounded.is_empty() {
            return;
        }
        let markers = self.markers();
        let anchor = markers.anchor();
        let origin = CellCoordinate::new(bounded.x, bounded.y);

        if extend && anchor.is_valid() {
            let far = CellCoordinate::new(bounded.end_x() - 1, bounded.end_y() - 1);
            let extended = PositionRect::spanning(anchor, far);
            if !additive {
                if let Some(previous) = markers.last_selected_region() {
                    self.store.clear_region(previous);
                }
            }
            self.store.add_selection(extended);
            markers.set_last_selected_region(Some(extended));
        } else if additive {
            if self.is_region_fully_selected(&bounded) {
                self.store.clear_region(bounded);
                markers.set_last_selected_region(None);
            } else {
                self.store.add_selection(bounded);
                markers.set_anchor(origin);
                markers.set_last_selected_region(Some(bounded));
            }
        } else {
            self.store.clear_all();
            self.store.add_selection(bounded);
            markers.set_anchor(origin);
            markers.set_last_selected_region(Some(bounded));
        }
        markers.set_last_selected_cell(origin);

        self.signals.cell_selection_changed.emit(CellSelectionEvent {
            coordinate: origin,
            with_extend: extend,
            with_additive: additive,
        });
    }

    fn is_region_fully_selected(&self, region: &PositionRect) -> bool {
        let mut uncovered = vec![*region];
        for selected in self.store.selected_regions() {
            uncovered = uncovered
                .into_iter()
                .flat_map(|piece| piece.subtract(&selected))
                .collect();
            if uncovered.is_empty() {
                return true;
            }
        }
        uncovered.is_empty()
    }

    /// Selects whole columns under the given modifier state.
    ///
    /// `row` is the position the gesture happened at; it becomes the anchor
    /// row. `additive` toggles: a fully selected column is deselected, and
    /// if it held the anchor the anchor moves to the nearest column that is
    /// still fully selected.
    pub fn select_column(&self, column: usize, row: usize, extend: bool, additive: bool) {
        if column >= self.geometry.column_count() {
            return;
        }
        let markers = self.markers();
        let anchor = markers.anchor();

        if extend && anchor.is_valid() {
            let start = anchor.column.min(column);
            let end = anchor.column.max(column);
            if !additive {
                if let Some(previous) = markers.last_selected_region() {
                    self.store.clear_region(previous);
                }
            }
            let region =
                PositionRect::new(start, 0, end - start + 1, crate::geometry::FULL_EXTENT);
            self.store.add_selection(region);
            markers.set_last_selected_region(Some(region));
        } else if additive {
            if self.is_column_fully_selected(column) {
                self.store.clear_region(PositionRect::full_column(column));
                if anchor.column == column {
                    self.rederive_column_anchor(column, row, markers);
                }
            } else {
                self.store.add_selection(PositionRect::full_column(column));
                markers.set_anchor(CellCoordinate::new(column, row));
            }
            markers.set_last_selected_region(None);
        } else {
            self.store.clear_all();
            self.store.add_selection(PositionRect::full_column(column));
            markers.set_anchor(CellCoordinate::new(column, row));
            markers.set_last_selected_region(None);
        }
        markers.set_last_selected_cell(CellCoordinate::new(column, row));

        self.signals.cell_selection_changed.emit(CellSelectionEvent {
            coordinate: CellCoordinate::new(column, row),
            with_extend: extend,
            with_additive: additive,
        });
    }

    /// Moves the anchor to the fully selected column nearest to the one
    /// just deselected, or clears it when none remains.
    fn rederive_column_anchor(&self, removed: usize, row: usize, markers: &dyn MarkerHolder) {
        let survivors = self.fully_selected_columns();
        let nearest = survivors
            .iter()
            .copied()
            .min_by_key(|&c| c.abs_diff(removed));
        match nearest {
            Some(column) => markers.set_anchor(CellCoordinate::new(column, row)),
            None => markers.set_anchor(CellCoordinate::NO_SELECTION),
        }
    }

    /// Selects whole rows under the given modifier state.
    ///
    /// `column` is the position the gesture happened at; it becomes the
    /// anchor column. `extend` selects every row between the anchor row and
    /// the gesture rows; `additive` toggles each row, re-deriving the
    /// anchor from an adjacent selected row if its row is deselected.
    pub fn select_rows(
        &self,
        column: usize,
        rows: &[usize],
        extend: bool,
        additive: bool,
        row_to_reveal: Option<usize>,
    ) {
        let row_count = self.geometry.row_count();
        let rows: Vec<usize> = rows.iter().copied().filter(|&r| r < row_count).collect();
        let Some(&last_row) = rows.last() else {
            return;
        };
        let markers = self.markers();
        let anchor = markers.anchor();

        if extend && anchor.is_valid() {
            let start = anchor.row.min(last_row);
            let end = anchor.row.max(last_row);
            if !additive {
                if let Some(previous) = markers.last_selected_region() {
                    self.store.clear_region(previous);
                }
            }
            let region = PositionRect::new(0, start, crate::geometry::FULL_EXTENT, end - start + 1);
            self.store.add_selection(region);
            markers.set_last_selected_region(Some(region));
            markers.set_last_selected_cell(CellCoordinate::new(anchor.column, last_row));
        } else if additive {
            for &row in &rows {
                if self.is_row_fully_selected(row) {
                    self.store.clear_region(PositionRect::full_row(row));
                    if markers.anchor().row == row {
                        self.rederive_row_anchor(row, column, markers);
                    }
                } else {
                    self.store.add_selection(PositionRect::full_row(row));
                    markers.set_anchor(CellCoordinate::new(column, row));
                }
            }
            markers.set_last_selected_cell(CellCoordinate::new(column, last_row));
            markers.set_last_selected_region(None);
        } else {
            self.store.clear_all();
            for &row in &rows {
                self.store.add_selection(PositionRect::full_row(row));
            }
            markers.set_anchor(CellCoordinate::new(column, rows[0]));
            markers.set_last_selected_cell(CellCoordinate::new(column, last_row));
            markers.set_last_selected_region(None);
        }

        self.signals.row_selection_changed.emit(RowSelectionEvent {
            row_positions: self.selected_row_positions(),
            row_position_to_reveal: row_to_reveal,
        });
    }

    /// Moves the anchor to the selected row nearest to the one just
    /// deselected, or clears it when none remains.
    fn rederive_row_anchor(&self, removed: usize, column: usize, markers: &dyn MarkerHolder) {
        let survivors = self.selected_row_positions();
        let nearest = survivors
            .iter()
            .copied()
            .min_by_key(|&r| r.abs_diff(removed));
        match nearest {
            Some(row) => markers.set_anchor(CellCoordinate::new(column, row)),
            None => markers.set_anchor(CellCoordinate::NO_SELECTION),
        }
    }

    /// Selects the entire grid.
    ///
    /// If no valid last-selected cell exists, the first visible cell is
    /// established as anchor so subsequent gestures have a reference point.
    pub fn select_all(&self) {
        let column_count = self.geometry.column_count();
        let row_count = self.geometry.row_count();
        if column_count == 0 || row_count == 0 {
            return;
        }
        let markers = self.markers();

        if !markers.last_selected_cell().is_valid() {
            let first = CellCoordinate::new(0, 0);
            markers.set_anchor(first);
            markers.set_last_selected_cell(first);
        }
        let region = PositionRect::new(0, 0, column_count, row_count);
        self.store.add_selection(region);
        markers.set_last_selected_region(Some(region));

        self.signals.cell_selection_changed.emit(CellSelectionEvent {
            coordinate: markers.last_selected_cell(),
            with_extend: false,
            with_additive: false,
        });
    }

    /// Empties the store and resets all markers.
    ///
    /// With `fire_event` set, a single selection-changed notification is
    /// emitted, and only if something was actually selected before.
    pub fn clear(&self, fire_event: bool) {
        let had_selection = !self.store.is_empty();
        self.store.clear_all();
        self.markers().reset();
        *self.fill_handle.write() = None;

        if fire_event && had_selection {
            self.signals.cell_selection_changed.emit(CellSelectionEvent {
                coordinate: CellCoordinate::NO_SELECTION,
                with_extend: false,
                with_additive: false,
            });
        }
    }

    // ===== Movement =====

    /// Moves the selection one traversal step in a direction.
    ///
    /// Without `extend`, movement starts from the anchor and the target
    /// replaces the selection (or is added, under `additive`). With
    /// `extend`, movement starts from the last selected cell and the
    /// rectangle between the anchor and the target is selected, so the
    /// extension continues from the selection edge.
    pub fn move_selection(
        &self,
        direction: Direction,
        strategy: &TraversalStrategy,
        extend: bool,
        additive: bool,
    ) {
        let source = if extend {
            self.markers().last_selected_cell()
        } else {
            self.markers().anchor()
        };
        let Some(target) = traverse(self.geometry.as_ref(), strategy, source, direction) else {
            return;
        };

        if !extend && additive {
            // Additive movement always adds; toggling is reserved for the
            // discrete click handler, so ctrl+arrow over an already
            // selected cell keeps it selected.
            let Some(cell) = self.geometry.cell_span_at(target.column, target.row) else {
                return;
            };
            let markers = self.markers();
            self.store.add_selection(cell.rect());
            markers.set_anchor(cell.origin);
            markers.set_last_selected_cell(cell.origin);
            markers.set_last_selected_region(None);

            self.signals.cell_selection_changed.emit(CellSelectionEvent {
                coordinate: cell.origin,
                with_extend: false,
                with_additive: true,
            });
            return;
        }
        self.select_cell(target.column, target.row, extend, additive);
    }

    /// Row-oriented movement: runs the same traversal vertically, then
    /// keeps whole rows selected as the anchor moves.
    ///
    /// With `extend`, every row between the anchor row and the target row
    /// is selected and rows the extension retreated from are deselected,
    /// preserving the anchor's original row (drag-shrinking a multi-row
    /// selection).
    pub fn move_row_selection(
        &self,
        direction: Direction,
        strategy: &TraversalStrategy,
        extend: bool,
    ) {
        if direction.is_horizontal() {
            return;
        }
        let markers = self.markers();
        let source = if extend {
            markers.last_selected_cell()
        } else {
            markers.anchor()
        };
        let Some(target) = traverse(self.geometry.as_ref(), strategy, source, direction) else {
            return;
        };
        let anchor = markers.anchor();

        if extend && anchor.is_valid() {
            let start = anchor.row.min(target.row);
            let end = anchor.row.max(target.row);

            // Rows the extension retreated from leave the selection.
            if let Some(previous) = markers.last_selected_region() {
                for row in previous.y..previous.end_y().min(self.geometry.row_count()) {
                    if row < start || row > end {
                        self.store.clear_region(PositionRect::full_row(row));
                    }
                }
            }
            let region = PositionRect::new(0, start, crate::geometry::FULL_EXTENT, end - start + 1);
            self.store.add_selection(region);
            markers.set_last_selected_region(Some(region));
            markers.set_last_selected_cell(CellCoordinate::new(anchor.column, target.row));

            self.signals.row_selection_changed.emit(RowSelectionEvent {
                row_positions: self.selected_row_positions(),
                row_position_to_reveal: Some(target.row),
            });
        } else {
            self.select_rows(target.column, &[target.row], false, false, Some(target.row));
        }
    }

    // ===== Structural changes =====

    /// Reacts to a structural change in the surrounding grid.
    ///
    /// Under [`StructuralChangePolicy::Reset`] the selection is cleared.
    /// Under [`StructuralChangePolicy::Preserve`] the store repairs itself
    /// (dropping what no longer resolves) and, when anything changed, a row
    /// selection notification naming the surviving rows is emitted.
    pub fn handle_structural_change(&self, event: &StructuralChangeEvent) {
        match self.structural_policy {
            StructuralChangePolicy::Reset => {
                debug!(
                    target: "horizon_trellis::structural",
                    "structural change: resetting selection"
                );
                self.clear(true);
            }
            StructuralChangePolicy::Preserve => {
                let repair = self.store.handle_structural_change(event);
                if repair.changed {
                    debug!(
                        target: "horizon_trellis::structural",
                        remaining = repair.remaining_rows.len(),
                        "structural change: selection repaired"
                    );
                    if self.store.is_empty() {
                        self.markers().reset();
                    }
                    self.signals.row_selection_changed.emit(RowSelectionEvent {
                        row_positions: repair.remaining_rows,
                        row_position_to_reveal: None,
                    });
                }
            }
        }
    }
}
