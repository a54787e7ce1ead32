//! Prelude module for Horizon Trellis.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_trellis::prelude::*;
//! ```
//!
//! This provides access to:
//! - The orchestrating layer (`SelectionLayer`)
//! - Selection stores (`RegionSelectionStore`, `IdentitySelectionStore`)
//! - Traversal policies (`TraversalStrategy`, `Direction`)
//! - The command surface (`GridCommand`, `dispatch`)
//! - Geometry types (`CellCoordinate`, `PositionRect`)

// ============================================================================
// Selection Layer
// ============================================================================

pub use crate::layer::{SelectionLayer, StructuralChangePolicy};

// ============================================================================
// Selection Stores
// ============================================================================

pub use crate::store::identity::IdentitySelectionStore;
pub use crate::store::region::RegionSelectionStore;
pub use crate::store::{MarkerHolder, SelectionStore, StructuralRepair};

// ============================================================================
// Traversal and Movement
// ============================================================================

pub use crate::movement::traverse;
pub use crate::traversal::{Direction, StepCount, TraversalScope, TraversalStrategy};

// ============================================================================
// Command Surface
// ============================================================================

pub use crate::command::{dispatch, CommandOutcome, GridCommand};

// ============================================================================
// Geometry and Grid Contracts
// ============================================================================

pub use crate::geometry::{CellCoordinate, PositionRect, FULL_EXTENT};
pub use crate::grid::{CellSpan, GridGeometry, RowProvider, UniformGrid, VecRowProvider};

// ============================================================================
// Events
// ============================================================================

pub use crate::events::{
    CellSelectionEvent, RowSelectionEvent, SelectionSignals, StructuralChangeEvent, StructuralDiff,
};

// ============================================================================
// Signals (re-exported from horizon-trellis-core)
// ============================================================================

pub use horizon_trellis_core::{ConnectionGuard, ConnectionId, Signal};
