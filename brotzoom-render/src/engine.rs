use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use brotzoom_core::Viewport;

use crate::buffer::RenderBuffer;
use crate::config::RenderConfig;
use crate::histogram::Histogram;
use crate::palette::Palette;
use crate::pixel_grid::PixelGrid;
use crate::scheduler::{sample_pass_with, worker_builder, RenderCancel};

/// The published result of one complete render pass.
#[derive(Debug, Clone)]
pub struct Frame {
    pub viewport: Viewport,
    pub grid: PixelGrid,
    pub histogram: Histogram,
    pub image: RenderBuffer,
    pub workers: usize,
    pub elapsed: Duration,
}

impl Frame {
    /// Pixels that never escaped.
    pub fn interior_pixels(&self) -> usize {
        self.grid.interior_count()
    }
}

/// Owns the palette and the last published frame.
///
/// A pass either completes (sampling, histogram check, coloring) and
/// replaces the published frame in one step, or fails and leaves the
/// previous frame untouched.
pub struct RenderEngine {
    config: RenderConfig,
    palette: Palette,
    cancel: Arc<RenderCancel>,
    frame: Option<Frame>,
}

impl RenderEngine {
    pub fn new(config: RenderConfig) -> crate::Result<Self> {
        config.validate()?;
        let palette = config.build_palette()?;
        debug!(
            width = config.width,
            height = config.height,
            workers = config.workers,
            colors = palette.len(),
            "Render engine ready"
        );
        Ok(Self {
            config,
            palette,
            cancel: Arc::new(RenderCancel::new()),
            frame: None,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Handle another thread can use to supersede the pass in flight.
    pub fn cancel_handle(&self) -> Arc<RenderCancel> {
        Arc::clone(&self.cancel)
    }

    /// The last successfully completed frame, if any.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Run a full pass over `viewport` and publish it.
    pub fn render(&mut self, viewport: &Viewport) -> crate::Result<&Frame> {
        self.render_with(viewport, worker_builder)
    }

    pub(crate) fn render_with<B>(&mut self, viewport: &Viewport, builder: B) -> crate::Result<&Frame>
    where
        B: Fn(usize) -> thread::Builder,
    {
        let start = Instant::now();
        let cfg = &self.config;
        let pass = sample_pass_with(
            viewport,
            cfg.width,
            cfg.height,
            cfg.max_iterations,
            cfg.workers,
            &self.cancel,
            builder,
        )?;
        let image = self.palette.colorize(&pass.grid, &pass.histogram);

        let elapsed = start.elapsed();
        info!(
            elapsed_ms = elapsed.as_millis(),
            sample_ms = pass.elapsed.as_millis(),
            viewport = %viewport,
            "Frame published"
        );
        Ok(&*self.frame.insert(Frame {
            viewport: *viewport,
            grid: pass.grid,
            histogram: pass.histogram,
            image,
            workers: pass.workers,
            elapsed,
        }))
    }
}
