pub mod complex;
pub mod controller;
pub mod error;
pub mod escape;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use controller::{DragState, PixelPoint, ViewportController};
pub use error::CoreError;
pub use escape::{escape_count, BAILOUT_NORM_SQ};
pub use viewport::Viewport;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
