use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::viewport::Viewport;

/// A pixel coordinate reported by the input layer.
///
/// Signed because a drag may leave the grid; such points simply map
/// outside the current bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Selection state of the zoom rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// A selection is in progress from `start`; `current` follows motion.
    Dragging { start: PixelPoint, current: PixelPoint },
}

/// Turns a pixel-space selection rectangle into new viewport bounds.
///
/// `Idle → Dragging` on [`selection_start`](Self::selection_start),
/// `Dragging → Idle` on [`selection_end`](Self::selection_end). The
/// controller never owns the viewport; it computes the replacement and the
/// caller decides whether to install it and re-render.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: DragState,
    grid_width: u32,
    grid_height: u32,
}

impl ViewportController {
    pub fn new(grid_width: u32, grid_height: u32) -> crate::Result<Self> {
        if grid_width == 0 || grid_height == 0 {
            return Err(CoreError::InvalidGrid {
                width: grid_width,
                height: grid_height,
            });
        }
        Ok(Self {
            state: DragState::Idle,
            grid_width,
            grid_height,
        })
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Begin a selection. Starting again while dragging restarts it.
    pub fn selection_start(&mut self, at: PixelPoint) {
        if self.is_dragging() {
            debug!(%at, "Selection restarted");
        }
        self.state = DragState::Dragging {
            start: at,
            current: at,
        };
    }

    /// Track the moving corner. Returns `false` (and does nothing) when idle.
    pub fn selection_motion(&mut self, at: PixelPoint) -> bool {
        match &mut self.state {
            DragState::Dragging { current, .. } => {
                *current = at;
                true
            }
            DragState::Idle => false,
        }
    }

    /// The rectangle being dragged, as `(start, current)`, for on-screen feedback.
    pub fn drag_rect(&self) -> Option<(PixelPoint, PixelPoint)> {
        match self.state {
            DragState::Dragging { start, current } => Some((start, current)),
            DragState::Idle => None,
        }
    }

    /// Abandon any selection in progress.
    pub fn cancel_selection(&mut self) {
        self.state = DragState::Idle;
    }

    /// Finish the selection at `at` and compute the viewport it selects
    /// within `current`.
    ///
    /// Always returns to `Idle`. A selection with zero width or height is
    /// rejected with [`CoreError::DegenerateSelection`]; the caller keeps
    /// its viewport and skips the re-render.
    pub fn selection_end(&mut self, at: PixelPoint, current: &Viewport) -> crate::Result<Viewport> {
        let start = match std::mem::take(&mut self.state) {
            DragState::Dragging { start, .. } => start,
            DragState::Idle => return Err(CoreError::NoSelectionInProgress),
        };

        if start.x == at.x || start.y == at.y {
            warn!(%start, end = %at, "Rejecting zero-area selection");
            return Err(CoreError::DegenerateSelection { start, end: at });
        }

        let (w, h) = (self.grid_width, self.grid_height);
        let a = current.pixel_to_plane(start.x as f64, start.y as f64, w, h);
        let b = current.pixel_to_plane(at.x as f64, at.y as f64, w, h);
        let selected = Viewport::from_corners(a, b)?;
        let fitted = selected.enforce_aspect(w as f64 / h as f64)?;
        debug!(%start, end = %at, viewport = %fitted, "Selection finalized");
        Ok(fitted)
    }
}
