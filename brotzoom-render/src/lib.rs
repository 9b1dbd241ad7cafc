pub mod band;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod explorer;
pub mod export;
pub mod histogram;
pub mod palette;
pub mod pixel_grid;
pub mod scheduler;

pub use band::{partition_rows, Band};
pub use buffer::RenderBuffer;
pub use config::{RenderConfig, MAX_ITERATIONS_LIMIT};
pub use engine::{Frame, RenderEngine};
pub use error::RenderError;
pub use explorer::{Explorer, SelectionOutcome};
pub use export::{export_png, ExportMetadata};
pub use histogram::Histogram;
pub use palette::{builtin_gradient, builtin_gradients, GradientStop, Palette, Rgba};
pub use pixel_grid::PixelGrid;
pub use scheduler::{sample_pass, PassOutput, RenderCancel};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
