//! Directional movement.
//!
//! [`traverse`] computes the target of a "move selection in direction D"
//! request from a source position and a [`TraversalStrategy`]. It accounts
//! for merged cells (movement starts from the far edge of the source
//! span and a target inside a span resolves to the span origin), the
//! strategy's scope and cycling rules at boundaries, and the validity
//! predicate.
//!
//! Movement is a pure computation over [`GridGeometry`]; the selection
//! layer applies the result to the store and markers.
//!
//! When the validity predicate rejects a candidate, the move retries with
//! the step count incremented by one. The retry chain is bounded: a
//! non-cycling boundary clamp stops it, and a cycling scan stops as soon as
//! the candidate resolves back to the source cell. In the worst case (no
//! valid target anywhere) one keypress scans every position in scope before
//! giving up, which keeps termination guaranteed at O(axis) for axis scope
//! and O(cells) for table scope.

use tracing::trace;

use crate::geometry::CellCoordinate;
use crate::grid::{CellSpan, GridGeometry};
use crate::traversal::{Direction, StepCount, TraversalScope, TraversalStrategy};

/// Computes the target of a directional move.
///
/// Returns the origin position of the new target cell, or `None` when the
/// move results in no selection change: the source cannot be resolved, the
/// candidate lands back on the source cell, or no valid target exists
/// before the traversal terminates. Callers keep the current selection on
/// `None`.
pub fn traverse(
    geometry: &dyn GridGeometry,
    strategy: &TraversalStrategy,
    from: CellCoordinate,
    direction: Direction,
) -> Option<CellCoordinate> {
    if !from.is_valid() {
        return None;
    }
    let source = geometry.cell_span_at(from.column, from.row)?;

    let horizontal = direction.is_horizontal();
    let (primary_count, secondary_count) = if horizontal {
        (geometry.column_count(), geometry.row_count())
    } else {
        (geometry.row_count(), geometry.column_count())
    };
    if primary_count == 0 || secondary_count == 0 {
        return None;
    }

    // Movement starts from the far edge of the source span in the movement
    // direction, so stepping off a merged cell counts from its boundary.
    let start_primary = match direction {
        Direction::Right => source.rightmost_column(),
        Direction::Left => source.origin.column,
        Direction::Down => source.bottom_row(),
        Direction::Up => source.origin.row,
    };
    let start_secondary = if horizontal { from.row } else { from.column };

    let target = match strategy.step_count {
        StepCount::ToEnd => to_end_target(
            geometry,
            strategy,
            &source,
            direction,
            start_primary,
            start_secondary,
            primary_count,
        ),
        StepCount::Steps(base_steps) => stepped_target(
            geometry,
            strategy,
            &source,
            direction,
            base_steps,
            start_primary,
            start_secondary,
            primary_count,
            secondary_count,
        ),
    };

    trace!(
        target: "horizon_trellis::traversal",
        ?direction,
        from = ?from,
        to = ?target,
        "traversal computed"
    );
    target
}

/// Stepped movement with boundary handling and validity retries.
#[allow(clippy::too_many_arguments)]
fn stepped_target(
    geometry: &dyn GridGeometry,
    strategy: &TraversalStrategy,
    source: &CellSpan,
    direction: Direction,
    base_steps: usize,
    start_primary: usize,
    start_secondary: usize,
    primary_count: usize,
    secondary_count: usize,
) -> Option<CellCoordinate> {
    let sign: isize = if direction.is_forward() { 1 } else { -1 };
    let mut steps = base_steps;

    loop {
        let raw = start_primary as isize + sign * steps as isize;
        let mut stop_on_invalid = false;

        let (primary, secondary) = if raw >= 0 && (raw as usize) < primary_count {
            (raw as usize, start_secondary)
        } else {
            match (strategy.scope, strategy.cycle) {
                (TraversalScope::Axis, false) => {
                    // Clamp to the boundary; the clamp also terminates the
                    // validity-retry chain.
                    stop_on_invalid = true;
                    let clamped = if direction.is_forward() {
                        primary_count - 1
                    } else {
                        0
                    };
                    (clamped, start_secondary)
                }
                (TraversalScope::Axis, true) => (
                    raw.rem_euclid(primary_count as isize) as usize,
                    start_secondary,
                ),
                (TraversalScope::Table, cycle) => {
                    let wrapped = raw.rem_euclid(primary_count as isize) as usize;
                    let carry = raw.div_euclid(primary_count as isize);
                    let raw_secondary = start_secondary as isize + carry;
                    if raw_secondary >= 0 && (raw_secondary as usize) < secondary_count {
                        (wrapped, raw_secondary as usize)
                    } else if cycle {
                        (
                            wrapped,
                            raw_secondary.rem_euclid(secondary_count as isize) as usize,
                        )
                    } else {
                        // Overflowed the table corner: clamp to the last
                        // (or first) cell and stop retrying.
                        stop_on_invalid = true;
                        if direction.is_forward() {
                            (primary_count - 1, secondary_count - 1)
                        } else {
                            (0, 0)
                        }
                    }
                }
            }
        };

        let (column, row) = if direction.is_horizontal() {
            (primary, secondary)
        } else {
            (secondary, primary)
        };
        let target = geometry.cell_span_at(column, row)?;

        // Landing back inside the source cell means no movement; this is
        // also what terminates a cycling scan with no valid target.
        if target.origin == source.origin {
            return None;
        }
        if strategy.is_valid_target(source, &target) {
            return Some(target.origin);
        }
        if stop_on_invalid {
            return None;
        }
        steps += 1;
    }
}

/// Home/End-style movement: jump to the axis boundary, then scan back
/// toward the source for the first valid cell.
fn to_end_target(
    geometry: &dyn GridGeometry,
    strategy: &TraversalStrategy,
    source: &CellSpan,
    direction: Direction,
    start_primary: usize,
    start_secondary: usize,
    primary_count: usize,
) -> Option<CellCoordinate> {
    let boundary = if direction.is_forward() {
        primary_count - 1
    } else {
        0
    };

    let positions: Box<dyn Iterator<Item = usize>> = if direction.is_forward() {
        Box::new((start_primary + 1..=boundary).rev())
    } else {
        Box::new(boundary..start_primary)
    };

    for primary in positions {
        let (column, row) = if direction.is_horizontal() {
            (primary, start_secondary)
        } else {
            (start_secondary, primary)
        };
        let target = geometry.cell_span_at(column, row)?;
        if target.origin == source.origin {
            // Scanned back into the source span: nothing valid beyond it.
            return None;
        }
        if strategy.is_valid_target(source, &target) {
            return Some(target.origin);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PositionRect;
    use crate::grid::UniformGrid;
    use crate::traversal::TraversalStrategy;

    fn at(column: usize, row: usize) -> CellCoordinate {
        CellCoordinate::new(column, row)
    }

    #[test]
    fn test_axis_step_right() {
        let grid = UniformGrid::new(10, 5);
        let strategy = TraversalStrategy::axis();

        assert_eq!(
            traverse(&grid, &strategy, at(3, 2), Direction::Right),
            Some(at(4, 2))
        );
        assert_eq!(
            traverse(&grid, &strategy, at(3, 2), Direction::Up),
            Some(at(3, 1))
        );
    }

    #[test]
    fn test_axis_no_cycle_clamps_at_boundary() {
        let grid = UniformGrid::new(10, 5);
        let strategy = TraversalStrategy::axis();

        // From the last column, moving right does nothing, repeatedly.
        assert_eq!(traverse(&grid, &strategy, at(9, 2), Direction::Right), None);
        assert_eq!(traverse(&grid, &strategy, at(9, 2), Direction::Right), None);
        // Same at the first column moving left.
        assert_eq!(traverse(&grid, &strategy, at(0, 2), Direction::Left), None);
    }

    #[test]
    fn test_axis_cycle_wraps_on_same_row() {
        let grid = UniformGrid::new(10, 5);
        let strategy = TraversalStrategy::axis_cycle();

        assert_eq!(
            traverse(&grid, &strategy, at(9, 2), Direction::Right),
            Some(at(0, 2))
        );
        assert_eq!(
            traverse(&grid, &strategy, at(0, 2), Direction::Left),
            Some(at(9, 2))
        );
    }

    #[test]
    fn test_table_scope_flows_to_next_row() {
        let grid = UniformGrid::new(10, 5);
        let strategy = TraversalStrategy::table();

        assert_eq!(
            traverse(&grid, &strategy, at(9, 2), Direction::Right),
            Some(at(0, 3))
        );
        assert_eq!(
            traverse(&grid, &strategy, at(0, 3), Direction::Left),
            Some(at(9, 2))
        );
        // The table corner clamps without cycling.
        assert_eq!(traverse(&grid, &strategy, at(9, 4), Direction::Right), None);
    }

    #[test]
    fn test_table_cycle_wraps_at_corner() {
        let grid = UniformGrid::new(10, 5);
        let strategy = TraversalStrategy::table_cycle();

        assert_eq!(
            traverse(&grid, &strategy, at(9, 4), Direction::Right),
            Some(at(0, 0))
        );
        assert_eq!(
            traverse(&grid, &strategy, at(0, 0), Direction::Left),
            Some(at(9, 4))
        );
    }

    #[test]
    fn test_validity_skipping_terminates() {
        let grid = UniformGrid::new(5, 10);
        let strategy =
            TraversalStrategy::axis().with_valid_target(|_, to| to.origin.row % 2 == 1);

        // Even rows are rejected: moving down from row 0 skips to row 1.
        assert_eq!(
            traverse(&grid, &strategy, at(2, 0), Direction::Down),
            Some(at(2, 1))
        );
        // From row 7, row 8 is rejected and row 9 accepted.
        assert_eq!(
            traverse(&grid, &strategy, at(2, 7), Direction::Down),
            Some(at(2, 9))
        );
        // From the last valid row the clamp stops the retry chain.
        assert_eq!(traverse(&grid, &strategy, at(2, 9), Direction::Down), None);
    }

    #[test]
    fn test_cycling_with_no_valid_target_terminates() {
        let grid = UniformGrid::new(5, 10);
        let strategy = TraversalStrategy::axis_cycle().with_valid_target(|_, _| false);

        // The scan wraps back to the source and gives up.
        assert_eq!(traverse(&grid, &strategy, at(2, 3), Direction::Down), None);
    }

    #[test]
    fn test_span_aware_start_edge() {
        let mut grid = UniformGrid::new(10, 5);
        grid.add_span(PositionRect::new(2, 1, 3, 1)); // columns 2..5 of row 1

        let strategy = TraversalStrategy::axis();

        // Moving right from anywhere in the span counts from its right
        // edge (column 4).
        assert_eq!(
            traverse(&grid, &strategy, at(2, 1), Direction::Right),
            Some(at(5, 1))
        );
        // Moving left counts from the origin column.
        assert_eq!(
            traverse(&grid, &strategy, at(4, 1), Direction::Left),
            Some(at(1, 1))
        );
        // Moving into the span resolves to its origin.
        assert_eq!(
            traverse(&grid, &strategy, at(5, 1), Direction::Left),
            Some(at(2, 1))
        );
    }

    #[test]
    fn test_to_end_jumps_to_boundary() {
        let grid = UniformGrid::new(10, 5);
        let strategy = TraversalStrategy::axis().to_end();

        assert_eq!(
            traverse(&grid, &strategy, at(3, 2), Direction::Right),
            Some(at(9, 2))
        );
        assert_eq!(
            traverse(&grid, &strategy, at(3, 2), Direction::Up),
            Some(at(3, 0))
        );
        // Already at the boundary: no movement.
        assert_eq!(traverse(&grid, &strategy, at(9, 2), Direction::Right), None);
    }

    #[test]
    fn test_to_end_scans_back_for_valid_target() {
        let grid = UniformGrid::new(10, 5);
        let strategy = TraversalStrategy::axis()
            .to_end()
            .with_valid_target(|_, to| to.origin.column < 7);

        // End jump lands on column 9 (invalid); the scan walks back to the
        // first valid cell, column 6.
        assert_eq!(
            traverse(&grid, &strategy, at(3, 2), Direction::Right),
            Some(at(6, 2))
        );
    }

    #[test]
    fn test_unresolvable_source_is_no_op() {
        let grid = UniformGrid::new(5, 5);
        let strategy = TraversalStrategy::axis();

        assert_eq!(traverse(&grid, &strategy, at(7, 2), Direction::Right), None);
        assert_eq!(
            traverse(&grid, &strategy, CellCoordinate::NO_SELECTION, Direction::Right),
            None
        );
    }

    #[test]
    fn test_zero_step_is_no_op() {
        let grid = UniformGrid::new(5, 5);
        let strategy = TraversalStrategy::axis().with_step_count(0);
        assert_eq!(traverse(&grid, &strategy, at(2, 2), Direction::Right), None);
    }
}
