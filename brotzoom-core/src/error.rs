use thiserror::Error;

use crate::controller::PixelPoint;

/// Errors originating from the core sampling and navigation logic.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid grid: {width}×{height} (both must be > 0)")]
    InvalidGrid { width: u32, height: u32 },

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("degenerate selection from {start} to {end}: zero width or height")]
    DegenerateSelection { start: PixelPoint, end: PixelPoint },

    #[error("selection ended without a selection in progress")]
    NoSelectionInProgress,
}
