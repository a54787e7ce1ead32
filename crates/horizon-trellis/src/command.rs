//! The toolkit-agnostic command surface.
//!
//! Interaction layers (keyboard handlers, mouse bindings) produce
//! [`GridCommand`] values; [`dispatch`] applies them to a
//! [`SelectionLayer`]. Selection commands are consumed here. Hide and
//! resize commands are pass-through: they are rewritten when they touch a
//! fully selected column/row (see below) and then handed back to the
//! caller as [`CommandOutcome::Forward`] for the surrounding grid to
//! execute.
//!
//! Hide/resize widening: when the target of a hide or resize is fully
//! selected, the command is rewritten to cover *every* fully selected
//! column/row, so acting on one selected column acts on the whole selected
//! set. Hide additionally clears the selection over the affected positions
//! first, so stale highlighting cannot reappear after the positions shift.

use tracing::debug;

use crate::geometry::PositionRect;
use crate::layer::SelectionLayer;
use crate::store::SelectionStore;
use crate::traversal::{Direction, TraversalStrategy};

/// A request against the selection core or the surrounding grid.
#[derive(Debug, Clone)]
pub enum GridCommand {
    /// Select the cell at a position.
    SelectCell {
        column: usize,
        row: usize,
        extend: bool,
        additive: bool,
    },
    /// Select a rectangular region.
    SelectRegion {
        region: PositionRect,
        extend: bool,
        additive: bool,
    },
    /// Select whole rows.
    SelectRows {
        column: usize,
        rows: Vec<usize>,
        extend: bool,
        additive: bool,
        row_to_reveal: Option<usize>,
    },
    /// Select a whole column.
    SelectColumn {
        column: usize,
        row: usize,
        extend: bool,
        additive: bool,
    },
    /// Move the selection one traversal step.
    MoveSelection {
        direction: Direction,
        strategy: TraversalStrategy,
        extend: bool,
        additive: bool,
    },
    /// Move the selection one traversal step, keeping whole rows selected.
    MoveRowSelection {
        direction: Direction,
        strategy: TraversalStrategy,
        extend: bool,
    },
    /// Select the entire grid.
    SelectAll,
    /// Clear all selection state.
    ClearAllSelections,
    /// Hide column positions (executed by the surrounding grid).
    HideColumns { positions: Vec<usize> },
    /// Hide row positions (executed by the surrounding grid).
    HideRows { positions: Vec<usize> },
    /// Resize column positions (executed by the surrounding grid).
    ResizeColumns { positions: Vec<usize>, width: usize },
    /// Resize row positions (executed by the surrounding grid).
    ResizeRows { positions: Vec<usize>, height: usize },
}

/// What happened to a dispatched command.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    /// The command was consumed by the selection core.
    Handled,
    /// The (possibly rewritten) command must be executed by the caller.
    Forward(GridCommand),
}

/// Applies a command to the selection layer.
pub fn dispatch(layer: &SelectionLayer, command: GridCommand) -> CommandOutcome {
    match command {
        GridCommand::SelectCell {
            column,
            row,
            extend,
            additive,
        } => {
            layer.select_cell(column, row, extend, additive);
            CommandOutcome::Handled
        }
        GridCommand::SelectRegion {
            region,
            extend,
            additive,
        } => {
            layer.select_region(region, extend, additive);
            CommandOutcome::Handled
        }
        GridCommand::SelectRows {
            column,
            rows,
            extend,
            additive,
            row_to_reveal,
        } => {
            layer.select_rows(column, &rows, extend, additive, row_to_reveal);
            CommandOutcome::Handled
        }
        GridCommand::SelectColumn {
            column,
            row,
            extend,
            additive,
        } => {
            layer.select_column(column, row, extend, additive);
            CommandOutcome::Handled
        }
        GridCommand::MoveSelection {
            direction,
            strategy,
            extend,
            additive,
        } => {
            layer.move_selection(direction, &strategy, extend, additive);
            CommandOutcome::Handled
        }
        GridCommand::MoveRowSelection {
            direction,
            strategy,
            extend,
        } => {
            layer.move_row_selection(direction, &strategy, extend);
            CommandOutcome::Handled
        }
        GridCommand::SelectAll => {
            layer.select_all();
            CommandOutcome::Handled
        }
        GridCommand::ClearAllSelections => {
            layer.clear(true);
            CommandOutcome::Handled
        }
        GridCommand::HideColumns { positions } => {
            let widened = widen_columns(layer, positions);
            for &column in &widened {
                layer
                    .store()
                    .clear_region(PositionRect::full_column(column));
            }
            CommandOutcome::Forward(GridCommand::HideColumns { positions: widened })
        }
        GridCommand::HideRows { positions } => {
            let widened = widen_rows(layer, positions);
            for &row in &widened {
                layer.store().clear_region(PositionRect::full_row(row));
            }
            CommandOutcome::Forward(GridCommand::HideRows { positions: widened })
        }
        GridCommand::ResizeColumns { positions, width } => {
            let widened = widen_columns(layer, positions);
            CommandOutcome::Forward(GridCommand::ResizeColumns {
                positions: widened,
                width,
            })
        }
        GridCommand::ResizeRows { positions, height } => {
            let widened = widen_rows(layer, positions);
            CommandOutcome::Forward(GridCommand::ResizeRows {
                positions: widened,
                height,
            })
        }
    }
}

/// Widens a column position list to cover every fully selected column when
/// any target column is itself fully selected.
fn widen_columns(layer: &SelectionLayer, mut positions: Vec<usize>) -> Vec<usize> {
    if positions
        .iter()
        .any(|&column| layer.is_column_fully_selected(column))
    {
        let before = positions.len();
        positions.extend(layer.fully_selected_columns());
        positions.sort_unstable();
        positions.dedup();
        if positions.len() > before {
            debug!(
                target: "horizon_trellis::selection",
                columns = ?positions,
                "widened column command over fully selected columns"
            );
        }
    }
    positions
}

/// Row analogue of [`widen_columns`].
fn widen_rows(layer: &SelectionLayer, mut positions: Vec<usize>) -> Vec<usize> {
    if positions
        .iter()
        .any(|&row| layer.is_row_fully_selected(row))
    {
        positions.extend(layer.fully_selected_rows());
        positions.sort_unstable();
        positions.dedup();
    }
    positions
}
