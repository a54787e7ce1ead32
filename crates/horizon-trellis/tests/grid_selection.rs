//! End-to-end tests driving the selection core through the command surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use horizon_trellis::prelude::*;

fn cell_layer(columns: usize, rows: usize) -> SelectionLayer {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    SelectionLayer::new(
        Arc::new(UniformGrid::new(columns, rows)),
        Arc::new(RegionSelectionStore::new()),
    )
}

#[test]
fn test_keyboard_navigation_session() {
    let layer = cell_layer(8, 6);

    // Click, then arrow around with axis-scoped movement.
    dispatch(
        &layer,
        GridCommand::SelectCell {
            column: 0,
            row: 0,
            extend: false,
            additive: false,
        },
    );
    let step = TraversalStrategy::axis();
    for _ in 0..3 {
        dispatch(
            &layer,
            GridCommand::MoveSelection {
                direction: Direction::Right,
                strategy: step.clone(),
                extend: false,
                additive: false,
            },
        );
    }
    dispatch(
        &layer,
        GridCommand::MoveSelection {
            direction: Direction::Down,
            strategy: step.clone(),
            extend: false,
            additive: false,
        },
    );
    assert!(layer.is_cell_selected(3, 1));
    assert_eq!(layer.anchor(), CellCoordinate::new(3, 1));

    // Shift-End selects to the row boundary.
    dispatch(
        &layer,
        GridCommand::MoveSelection {
            direction: Direction::Right,
            strategy: TraversalStrategy::axis().to_end(),
            extend: true,
            additive: false,
        },
    );
    for column in 3..8 {
        assert!(layer.is_cell_selected(column, 1), "column {column}");
    }
    assert_eq!(layer.anchor(), CellCoordinate::new(3, 1));
}

#[test]
fn test_tab_traversal_wraps_across_rows() {
    let layer = cell_layer(4, 3);
    layer.select_cell(3, 0, false, false);

    let tab = TraversalStrategy::table_cycle();
    layer.move_selection(Direction::Right, &tab, false, false);
    assert!(layer.is_cell_selected(0, 1));

    // From the last cell of the table, tab wraps to the first.
    layer.select_cell(3, 2, false, false);
    layer.move_selection(Direction::Right, &tab, false, false);
    assert!(layer.is_cell_selected(0, 0));
}

#[test]
fn test_select_all_then_hide_widening() {
    let layer = cell_layer(6, 4);

    layer.select_column(0, 0, false, false);
    layer.select_column(2, 0, false, true);
    layer.select_column(4, 0, false, true);

    // Hiding one selected column widens to the whole selected set and
    // clears their selection before the grid reorders.
    let outcome = dispatch(&layer, GridCommand::HideColumns { positions: vec![2] });
    match outcome {
        CommandOutcome::Forward(GridCommand::HideColumns { positions }) => {
            assert_eq!(positions, vec![0, 2, 4]);
        }
        other => panic!("expected forwarded hide, got {other:?}"),
    }
    assert!(layer.is_empty());
}

#[test]
fn test_row_selection_with_identity_store() {
    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        id: u32,
        customer: &'static str,
    }

    let orders = vec![
        Order { id: 10, customer: "ada" },
        Order { id: 11, customer: "grace" },
        Order { id: 12, customer: "zuse" },
        Order { id: 13, customer: "barbara" },
    ];

    let geometry: Arc<dyn GridGeometry> = Arc::new(UniformGrid::new(3, 4));
    let provider = Arc::new(VecRowProvider::new(orders.clone()));
    let store = Arc::new(IdentitySelectionStore::new(
        geometry.clone(),
        provider.clone(),
        |order: &Order| order.id,
    ));
    let layer = SelectionLayer::new(geometry, store);

    let changes = Arc::new(AtomicUsize::new(0));
    let changes_clone = changes.clone();
    layer.signals().row_selection_changed.connect(move |_| {
        changes_clone.fetch_add(1, Ordering::SeqCst);
    });

    // Select the "zuse" row (position 2) and anchor there.
    layer.select_rows(0, &[2], false, false, Some(2));
    assert!(layer.is_row_fully_selected(2));
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    // Sort the backing data by customer name; the selected row moves to
    // position 3 and the selection follows it.
    let mut sorted = orders.clone();
    sorted.sort_by_key(|order| order.customer);
    provider.set_rows(sorted);

    assert!(layer.is_row_fully_selected(3));
    assert!(!layer.is_row_fully_selected(2));
    assert_eq!(layer.anchor().row, 3);

    // Deleting the selected row and repairing drops it and notifies.
    provider.remove_row(3);
    layer.handle_structural_change(&StructuralChangeEvent::rows(vec![StructuralDiff::Delete(
        1..2,
    )]));
    assert!(layer.is_empty());
    assert_eq!(changes.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_reads_during_mutation() {
    let layer = Arc::new(cell_layer(50, 50));
    layer.select_all();

    // A render thread hammers membership queries while the owner thread
    // mutates; this must not deadlock or panic.
    let reader = {
        let layer = layer.clone();
        std::thread::spawn(move || {
            let mut hits = 0usize;
            for _ in 0..200 {
                for cell in 0..50 {
                    if layer.is_cell_selected(cell, cell) {
                        hits += 1;
                    }
                }
            }
            hits
        })
    };

    for row in 0..50 {
        layer.select_rows(0, &[row], false, true, None);
    }
    let hits = reader.join().unwrap();
    assert!(hits <= 200 * 50);
}
