use std::path::PathBuf;

use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid render configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to start worker {worker}")]
    WorkerDispatch {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("histogram total {actual} does not match pixel count {expected}")]
    HistogramInconsistency { expected: u64, actual: u64 },

    #[error("render cancelled")]
    Cancelled,

    #[error("failed to export {}: {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    #[error(transparent)]
    Core(#[from] brotzoom_core::CoreError),
}
