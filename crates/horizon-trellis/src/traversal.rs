//! Traversal strategies.
//!
//! A [`TraversalStrategy`] is a policy value describing how a directional
//! move behaves: its [`TraversalScope`] (confined to the current row/column
//! or free to flow across the whole table), whether it cycles at a
//! boundary, how many positions it steps, and an optional target-validity
//! predicate used to skip non-eligible cells (e.g. non-editable ones).
//!
//! Strategies are cheap to clone and carry no grid state; the movement
//! algorithm in [`crate::movement`] interprets them against a
//! [`GridGeometry`](crate::grid::GridGeometry).
//!
//! # Example
//!
//! ```
//! use horizon_trellis::traversal::TraversalStrategy;
//!
//! // Tab-key style traversal: flow across rows, wrap at the table end,
//! // skip cells in column 0.
//! let strategy = TraversalStrategy::table_cycle()
//!     .with_valid_target(|_, to| to.origin.column != 0);
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::grid::CellSpan;

/// The four directional moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Returns `true` for horizontal movement.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Returns `true` when the move increases the position (right/down).
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Right | Self::Down)
    }
}

/// Whether traversal is confined to one row/column or free to flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalScope {
    /// Movement stays on the source row (horizontal) or column (vertical).
    Axis,
    /// Overflowing one axis advances the other, so movement flows across
    /// the whole table.
    Table,
}

/// How far a single move steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCount {
    /// Step this many positions (usually 1, or a page size).
    Steps(usize),
    /// Jump directly to the first/last position on the axis.
    ToEnd,
}

/// Predicate deciding whether a candidate target cell may be selected.
pub type ValidTargetFn = Arc<dyn Fn(&CellSpan, &CellSpan) -> bool + Send + Sync>;

/// A directional-movement policy.
///
/// The default strategy (`TraversalStrategy::axis()`) steps one position,
/// stays on the current row/column, stops at the boundary, and accepts
/// every target.
#[derive(Clone)]
pub struct TraversalStrategy {
    /// Axis-confined or table-wide movement.
    pub scope: TraversalScope,
    /// Whether movement wraps at a boundary instead of stopping.
    pub cycle: bool,
    /// How far one move steps.
    pub step_count: StepCount,
    valid_target: Option<ValidTargetFn>,
}

impl TraversalStrategy {
    /// Axis scope, no cycling: arrow-key movement that stops at the edge.
    pub fn axis() -> Self {
        Self {
            scope: TraversalScope::Axis,
            cycle: false,
            step_count: StepCount::Steps(1),
            valid_target: None,
        }
    }

    /// Axis scope with cycling: wraps around on the same row/column.
    pub fn axis_cycle() -> Self {
        Self {
            cycle: true,
            ..Self::axis()
        }
    }

    /// Table scope, no cycling: overflow flows onto the next row/column,
    /// stopping at the table corner.
    pub fn table() -> Self {
        Self {
            scope: TraversalScope::Table,
            cycle: false,
            step_count: StepCount::Steps(1),
            valid_target: None,
        }
    }

    /// Table scope with cycling: overflow at the table corner wraps back
    /// to the opposite corner.
    pub fn table_cycle() -> Self {
        Self {
            cycle: true,
            ..Self::table()
        }
    }

    /// Sets the number of positions one move steps.
    pub fn with_step_count(mut self, steps: usize) -> Self {
        self.step_count = StepCount::Steps(steps);
        self
    }

    /// Makes moves jump to the first/last position on the axis
    /// (Home/End-style movement).
    pub fn to_end(mut self) -> Self {
        self.step_count = StepCount::ToEnd;
        self
    }

    /// Restricts movement to targets accepted by the predicate.
    ///
    /// The predicate receives the source and candidate cells. Rejected
    /// candidates are skipped; see [`crate::movement::traverse`] for the
    /// retry and termination rules.
    pub fn with_valid_target<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CellSpan, &CellSpan) -> bool + Send + Sync + 'static,
    {
        self.valid_target = Some(Arc::new(predicate));
        self
    }

    /// Applies the validity predicate; `true` when none is set.
    pub fn is_valid_target(&self, from: &CellSpan, to: &CellSpan) -> bool {
        match &self.valid_target {
            Some(predicate) => predicate(from, to),
            None => true,
        }
    }
}

impl Default for TraversalStrategy {
    fn default() -> Self {
        Self::axis()
    }
}

impl fmt::Debug for TraversalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalStrategy")
            .field("scope", &self.scope)
            .field("cycle", &self.cycle)
            .field("step_count", &self.step_count)
            .field("has_valid_target", &self.valid_target.is_some())
            .finish()
    }
}

/// Expands a row position to the contiguous run of eligible rows around it.
///
/// Scans outward from `row` in both directions while `eligible` holds,
/// returning the half-open range of the run. When `row` itself is not
/// eligible (a group with zero eligible rows) the original single-row range
/// is returned unchanged.
pub fn contiguous_row_range<F>(row: usize, row_count: usize, eligible: F) -> Range<usize>
where
    F: Fn(usize) -> bool,
{
    if row >= row_count || !eligible(row) {
        return row..row + 1;
    }

    let mut start = row;
    while start > 0 && eligible(start - 1) {
        start -= 1;
    }
    let mut end = row + 1;
    while end < row_count && eligible(end) {
        end += 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_constructors() {
        let axis = TraversalStrategy::axis();
        assert_eq!(axis.scope, TraversalScope::Axis);
        assert!(!axis.cycle);
        assert_eq!(axis.step_count, StepCount::Steps(1));

        let table = TraversalStrategy::table_cycle();
        assert_eq!(table.scope, TraversalScope::Table);
        assert!(table.cycle);

        let end = TraversalStrategy::axis().to_end();
        assert_eq!(end.step_count, StepCount::ToEnd);
    }

    #[test]
    fn test_valid_target_defaults_to_true() {
        let strategy = TraversalStrategy::axis();
        let a = CellSpan::single(0, 0);
        let b = CellSpan::single(1, 0);
        assert!(strategy.is_valid_target(&a, &b));

        let picky = strategy.with_valid_target(|_, to| to.origin.column > 2);
        assert!(!picky.is_valid_target(&a, &b));
        assert!(picky.is_valid_target(&a, &CellSpan::single(3, 0)));
    }

    #[test]
    fn test_direction_axes() {
        assert!(Direction::Left.is_horizontal());
        assert!(!Direction::Down.is_horizontal());
        assert!(Direction::Right.is_forward());
        assert!(!Direction::Up.is_forward());
    }

    #[test]
    fn test_contiguous_row_range() {
        let eligible = |row: usize| row != 3 && row != 7;

        assert_eq!(contiguous_row_range(5, 10, eligible), 4..7);
        assert_eq!(contiguous_row_range(0, 10, eligible), 0..3);
        assert_eq!(contiguous_row_range(8, 10, eligible), 8..10);
    }

    #[test]
    fn test_contiguous_row_range_with_no_eligible_rows() {
        // The anchor row itself is ineligible: the single-row range comes
        // back unchanged.
        assert_eq!(contiguous_row_range(3, 10, |_| false), 3..4);
        assert_eq!(contiguous_row_range(12, 10, |_| true), 12..13);
    }
}
