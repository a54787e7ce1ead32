//! Core systems for Horizon Trellis.
//!
//! This crate provides the foundational pieces shared by the Trellis grid
//! components:
//!
//! - **Signal/Slot System**: Type-safe change notification between the
//!   selection core and its observers (views, headers, overlays)
//! - **Logging**: `tracing` target constants for filtering Trellis output
//!
//! Unlike a full application framework there is no event loop here: Trellis
//! selection state is mutated synchronously by a single logical owner, so
//! signals dispatch directly in the emitting thread.
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_trellis_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use signal::{ConnectionGuard, ConnectionId, Signal};
