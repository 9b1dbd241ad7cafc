use tracing::{info, warn};

use brotzoom_core::{Complex, CoreError, PixelPoint, Viewport, ViewportController};

use crate::config::RenderConfig;
use crate::engine::{Frame, RenderEngine};

/// What a finished selection did.
#[derive(Debug, PartialEq)]
pub enum SelectionOutcome {
    /// The selection was installed and a new frame published.
    Rendered,
    /// The selection was ignored (degenerate, or nothing was being dragged);
    /// viewport and frame are unchanged.
    Rejected(CoreError),
}

/// An interactive session: the current viewport, the zoom-selection state
/// machine, and the engine that renders it.
///
/// The viewport only changes together with a successfully published frame,
/// so [`viewport`](Self::viewport) always describes what is on screen once
/// the first render has completed.
pub struct Explorer {
    engine: RenderEngine,
    controller: ViewportController,
    viewport: Viewport,
}

impl Explorer {
    pub fn new(config: RenderConfig, viewport: Viewport) -> crate::Result<Self> {
        let controller = ViewportController::new(config.width, config.height)?;
        let engine = RenderEngine::new(config)?;
        Ok(Self {
            engine,
            controller,
            viewport,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.engine.frame()
    }

    /// Render the current viewport.
    pub fn render(&mut self) -> crate::Result<&Frame> {
        let viewport = self.viewport;
        self.engine.render(&viewport)
    }

    /// Render request with explicit bounds.
    ///
    /// Invalid bounds are rejected before any work starts and leave the
    /// session as it was.
    pub fn request_render(
        &mut self,
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    ) -> crate::Result<&Frame> {
        let viewport = Viewport::new(x_min, x_max, y_min, y_max).map_err(|e| {
            warn!(error = %e, "Rejecting render request");
            e
        })?;
        self.install(viewport)
    }

    fn install(&mut self, viewport: Viewport) -> crate::Result<&Frame> {
        let frame = self.engine.render(&viewport)?;
        self.viewport = viewport;
        Ok(frame)
    }

    pub fn selection_start(&mut self, at: PixelPoint) {
        self.controller.selection_start(at);
    }

    pub fn selection_motion(&mut self, at: PixelPoint) -> bool {
        self.controller.selection_motion(at)
    }

    /// The rectangle being dragged, for on-screen feedback.
    pub fn drag_rect(&self) -> Option<(PixelPoint, PixelPoint)> {
        self.controller.drag_rect()
    }

    /// Finish a selection: compute the selected viewport and render it.
    ///
    /// Rejected selections are reported as [`SelectionOutcome::Rejected`];
    /// `Err` is reserved for a render pass that failed.
    pub fn selection_end(&mut self, at: PixelPoint) -> crate::Result<SelectionOutcome> {
        match self.controller.selection_end(at, &self.viewport) {
            Ok(next) => {
                self.install(next)?;
                info!(viewport = %next, "Zoomed to selection");
                Ok(SelectionOutcome::Rendered)
            }
            Err(
                e @ (CoreError::DegenerateSelection { .. }
                | CoreError::NoSelectionInProgress
                | CoreError::InvalidViewport { .. }),
            ) => Ok(SelectionOutcome::Rejected(e)),
            Err(e) => Err(e.into()),
        }
    }

    /// Zoom a fraction `ratio` of the way toward `target` and render.
    pub fn zoom_toward(&mut self, target: Complex, ratio: f64) -> crate::Result<&Frame> {
        let next = self.viewport.zoom_toward(target, ratio)?;
        self.install(next)
    }

    /// Plane coordinate under a pixel, for status display.
    pub fn plane_at(&self, px: i32, py: i32) -> Complex {
        let cfg = self.engine.config();
        self.viewport
            .pixel_to_plane(px as f64, py as f64, cfg.width, cfg.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explorer() -> Explorer {
        let cfg = RenderConfig {
            width: 80,
            height: 60,
            max_iterations: 64,
            workers: 4,
            ..RenderConfig::default()
        };
        Explorer::new(cfg, Viewport::default()).unwrap()
    }

    #[test]
    fn selection_zooms_and_renders() {
        let mut ex = explorer();
        ex.render().unwrap();
        let before = *ex.viewport();

        ex.selection_start(PixelPoint::new(20, 15));
        assert!(ex.selection_motion(PixelPoint::new(30, 25)));
        assert!(ex.drag_rect().is_some());
        let outcome = ex.selection_end(PixelPoint::new(60, 45)).unwrap();

        assert_eq!(outcome, SelectionOutcome::Rendered);
        assert!(ex.viewport().width() < before.width());
        assert_eq!(ex.frame().unwrap().viewport, *ex.viewport());
        assert!(ex.drag_rect().is_none());
    }

    #[test]
    fn degenerate_selection_changes_nothing() {
        let mut ex = explorer();
        ex.render().unwrap();
        let before = *ex.viewport();
        let grid_before = ex.frame().unwrap().grid.clone();

        ex.selection_start(PixelPoint::new(10, 10));
        let outcome = ex.selection_end(PixelPoint::new(10, 50)).unwrap();

        assert!(matches!(
            outcome,
            SelectionOutcome::Rejected(CoreError::DegenerateSelection { .. })
        ));
        assert_eq!(*ex.viewport(), before);
        assert_eq!(ex.frame().unwrap().grid, grid_before);
    }

    #[test]
    fn invalid_request_keeps_viewport() {
        let mut ex = explorer();
        let before = *ex.viewport();
        assert!(ex.request_render(1.0, 0.0, -1.0, 1.0).is_err());
        assert!(ex.request_render(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert_eq!(*ex.viewport(), before);
        assert!(ex.frame().is_none(), "no render should have been triggered");
    }

    #[test]
    fn request_render_installs_bounds() {
        let mut ex = explorer();
        let frame = ex.request_render(-1.0, -0.5, 0.0, 0.25).unwrap();
        assert_eq!(frame.viewport.x_min(), -1.0);
        assert_eq!(ex.viewport().y_max(), 0.25);
    }

    #[test]
    fn zoom_toward_keeps_target_inside() {
        let mut ex = explorer();
        let target = Complex::new(-0.74967, -0.07);
        for _ in 0..3 {
            ex.zoom_toward(target, 0.8).unwrap();
        }
        let vp = ex.viewport();
        assert!(vp.x_min() < target.re && target.re < vp.x_max());
        assert!(vp.width() < Viewport::default().width() * 0.01);
    }

    #[test]
    fn plane_at_origin_pixel() {
        let ex = explorer();
        assert_eq!(ex.plane_at(0, 0), Complex::new(-2.5, -1.1));
    }
}
