//! Selection change notifications and structural change events.
//!
//! The selection core emits outward notifications through
//! [`SelectionSignals`] whenever selection state changes, and consumes
//! inward [`StructuralChangeEvent`]s describing insertions, deletions, and
//! resizes performed elsewhere (sorting, filtering, data edits).

use std::ops::Range;

use horizon_trellis_core::Signal;

use crate::geometry::CellCoordinate;

/// Notification that the cell selection changed.
///
/// Carries the origin position of the most recently selected cell (or
/// [`CellCoordinate::NO_SELECTION`] after a clear) and the modifier state of
/// the gesture that caused the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSelectionEvent {
    /// Origin position of the affected cell.
    pub coordinate: CellCoordinate,
    /// Whether the gesture extended the selection (Shift).
    pub with_extend: bool,
    /// Whether the gesture was additive (Ctrl).
    pub with_additive: bool,
}

/// Notification that row selection changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSelectionEvent {
    /// The row positions affected by the change, ascending.
    pub row_positions: Vec<usize>,
    /// A row position the viewport should scroll into view, if any.
    pub row_position_to_reveal: Option<usize>,
}

/// The outward notification surface of the selection layer.
///
/// Observers (views, header painters, overlays) connect to these signals.
/// Emission is synchronous; see [`horizon_trellis_core::Signal`].
pub struct SelectionSignals {
    /// Emitted when the cell selection changes.
    pub cell_selection_changed: Signal<CellSelectionEvent>,
    /// Emitted when row selection changes (row-oriented handlers and
    /// identity revalidation).
    pub row_selection_changed: Signal<RowSelectionEvent>,
}

impl SelectionSignals {
    /// Creates the signal bundle with no connections.
    pub fn new() -> Self {
        Self {
            cell_selection_changed: Signal::new(),
            row_selection_changed: Signal::new(),
        }
    }
}

impl Default for SelectionSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// A single structural difference on one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralDiff {
    /// Positions were inserted.
    Insert(Range<usize>),
    /// Positions were deleted.
    Delete(Range<usize>),
    /// Positions were resized in place.
    Resize(Range<usize>),
}

impl StructuralDiff {
    /// The position range this diff touches.
    pub fn positions(&self) -> Range<usize> {
        match self {
            Self::Insert(range) | Self::Delete(range) | Self::Resize(range) => range.clone(),
        }
    }

    /// Whether this diff shifts positions after it (insert/delete do,
    /// resize does not).
    pub fn shifts_positions(&self) -> bool {
        !matches!(self, Self::Resize(_))
    }
}

/// A structural change notification from the surrounding grid.
///
/// Carries optional per-axis diff lists. When a diff list is absent the
/// change is a full refresh on that axis and every stored selection must be
/// re-checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralChangeEvent {
    /// Column-axis diffs, or `None` for a full refresh.
    pub column_diffs: Option<Vec<StructuralDiff>>,
    /// Row-axis diffs, or `None` for a full refresh.
    pub row_diffs: Option<Vec<StructuralDiff>>,
}

impl StructuralChangeEvent {
    /// A change with no diff information: everything must be re-checked.
    pub fn full_refresh() -> Self {
        Self::default()
    }

    /// A change described entirely by row diffs.
    pub fn rows(diffs: Vec<StructuralDiff>) -> Self {
        Self {
            column_diffs: Some(Vec::new()),
            row_diffs: Some(diffs),
        }
    }

    /// A change described entirely by column diffs.
    pub fn columns(diffs: Vec<StructuralDiff>) -> Self {
        Self {
            column_diffs: Some(diffs),
            row_diffs: Some(Vec::new()),
        }
    }

    /// Returns `true` when no diff information is available.
    pub fn is_full_refresh(&self) -> bool {
        self.column_diffs.is_none() && self.row_diffs.is_none()
    }
}
