//! Logging facilities for Horizon Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. To see logs, install
//! a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem, e.g.
/// `RUST_LOG=horizon_trellis::selection=trace`.
pub mod targets {
    /// Core support crate target.
    pub const CORE: &str = "horizon_trellis_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_trellis_core::signal";
    /// Selection store and layer target.
    pub const SELECTION: &str = "horizon_trellis::selection";
    /// Directional traversal target.
    pub const TRAVERSAL: &str = "horizon_trellis::traversal";
    /// Structural change repair target.
    pub const STRUCTURAL: &str = "horizon_trellis::structural";
}
