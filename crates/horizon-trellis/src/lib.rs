//! Horizon Trellis - selection and traversal core for grid widgets.
//!
//! Trellis tracks *which* cells of a large interactive grid are selected
//! and *how* the selection moves under keyboard and mouse navigation,
//! while the grid may contain merged cells, be reordered or filtered, and
//! present either free-form cell selection or row-identity-based
//! selection.
//!
//! The crate is rendering-agnostic: it owns no cell data and draws
//! nothing. A host grid supplies its shape through
//! [`grid::GridGeometry`], feeds gestures in as [`command::GridCommand`]s,
//! and observes changes through [`events::SelectionSignals`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_trellis::prelude::*;
//!
//! let layer = SelectionLayer::new(
//!     Arc::new(UniformGrid::new(10, 5)),
//!     Arc::new(RegionSelectionStore::new()),
//! );
//!
//! // Click cell (2,3), then shift-arrow right twice.
//! layer.select_cell(2, 3, false, false);
//! let right = TraversalStrategy::axis();
//! layer.move_selection(Direction::Right, &right, true, false);
//! layer.move_selection(Direction::Right, &right, true, false);
//!
//! assert!(layer.is_cell_selected(4, 3));
//! assert_eq!(layer.anchor(), CellCoordinate::new(2, 3));
//! ```

pub use horizon_trellis_core::{ConnectionGuard, ConnectionId, Signal};

pub mod command;
pub mod events;
pub mod geometry;
pub mod grid;
pub mod layer;
pub mod movement;
pub mod prelude;
pub mod store;
pub mod traversal;
