use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use brotzoom_core::{escape_count, CoreError, Viewport};

use crate::band::{partition_rows, Band};
use crate::error::RenderError;
use crate::histogram::Histogram;
use crate::pixel_grid::PixelGrid;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current render generation for supersession and progress.
///
/// Advancing the generation tells every in-flight worker to stop at its
/// next row boundary. The progress counters count finished rows.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Cancel the current pass by advancing the generation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset progress for a new pass of `total` rows.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    pub fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the current progress as `(done, total)` rows.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-pass liveness check shared by the workers of one pass.
struct PassToken<'a> {
    cancel: &'a RenderCancel,
    generation: u64,
    /// Set when the pass is being torn down (a sibling failed to start).
    abort: AtomicBool,
}

impl PassToken<'_> {
    #[inline]
    fn is_live(&self) -> bool {
        !self.abort.load(Ordering::Relaxed) && self.cancel.generation() == self.generation
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A completed sampling pass: every pixel sampled, histogram verified.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub grid: PixelGrid,
    pub histogram: Histogram,
    pub workers: usize,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Per-band sampling
// ---------------------------------------------------------------------------

/// Sample every pixel of `band` into `rows` and tally a local histogram.
///
/// Returns `None` if the pass stopped being live; the check happens
/// between rows, never in the middle of a pixel.
fn sample_band(
    band: Band,
    rows: &mut [u32],
    width: u32,
    height: u32,
    viewport: &Viewport,
    max_iterations: u32,
    token: &PassToken<'_>,
) -> Option<Histogram> {
    let mut histogram = Histogram::new(max_iterations);
    for (row, y) in rows
        .chunks_exact_mut(width as usize)
        .zip(band.y_start..band.y_end)
    {
        if !token.is_live() {
            return None;
        }
        for (x, cell) in row.iter_mut().enumerate() {
            let c = viewport.pixel_to_plane(x as f64, y as f64, width, height);
            let n = escape_count(c, max_iterations);
            *cell = n;
            histogram.record(n);
        }
        token.cancel.inc_progress();
    }
    Some(histogram)
}

// ---------------------------------------------------------------------------
// Full pass
// ---------------------------------------------------------------------------

/// Sample a `width × height` grid over `viewport` on `workers` OS threads.
///
/// Rows are split into disjoint bands (see [`partition_rows`]); each worker
/// writes only its own slice of the grid and its own histogram, and the
/// histograms are summed once every worker has joined. The viewport is
/// copied into each worker, so the caller may change its own afterwards.
///
/// Nothing partial ever escapes: a worker that fails to start, panics, or
/// sees the pass cancelled turns the whole pass into an error.
pub fn sample_pass(
    viewport: &Viewport,
    width: u32,
    height: u32,
    max_iterations: u32,
    workers: usize,
    cancel: &RenderCancel,
) -> crate::Result<PassOutput> {
    sample_pass_with(
        viewport,
        width,
        height,
        max_iterations,
        workers,
        cancel,
        worker_builder,
    )
}

/// Thread builder for sampling worker `worker`.
pub(crate) fn worker_builder(worker: usize) -> thread::Builder {
    thread::Builder::new().name(format!("sample-{worker}"))
}

/// [`sample_pass`] with the thread builder for each worker supplied by
/// `builder`.
pub(crate) fn sample_pass_with<B>(
    viewport: &Viewport,
    width: u32,
    height: u32,
    max_iterations: u32,
    workers: usize,
    cancel: &RenderCancel,
    builder: B,
) -> crate::Result<PassOutput>
where
    B: Fn(usize) -> thread::Builder,
{
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    if max_iterations == 0 {
        return Err(CoreError::InvalidMaxIterations(max_iterations).into());
    }
    if workers == 0 {
        return Err(RenderError::InvalidConfig {
            reason: "worker count must be >= 1".to_string(),
        });
    }

    let start = Instant::now();
    let token = PassToken {
        cancel,
        generation: cancel.generation(),
        abort: AtomicBool::new(false),
    };
    let bands = partition_rows(height, workers);
    let snapshot = *viewport;
    cancel.reset_progress(height as usize);
    debug!(
        width,
        height,
        max_iterations,
        workers = bands.len(),
        viewport = %snapshot,
        "Starting sampling pass"
    );

    let mut grid = PixelGrid::new(width, height, max_iterations);
    let slices = grid.band_slices_mut(&bands);

    let (joined, dispatch_error) = thread::scope(|scope| {
        let token = &token;
        let mut handles = Vec::with_capacity(bands.len());
        let mut dispatch_error = None;

        for (worker, (&band, rows)) in bands.iter().zip(slices).enumerate() {
            let spawned = builder(worker).spawn_scoped(scope, move || {
                sample_band(band, rows, width, height, &snapshot, max_iterations, token)
            });
            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(source) => {
                    token.abort.store(true, Ordering::Relaxed);
                    dispatch_error = Some(RenderError::WorkerDispatch { worker, source });
                    break;
                }
            }
        }

        let joined: Vec<_> = handles
            .into_iter()
            .map(|(worker, handle)| (worker, handle.join()))
            .collect();
        (joined, dispatch_error)
    });

    if let Some(err) = dispatch_error {
        warn!(error = %err, "Aborting pass: worker dispatch failed");
        return Err(err);
    }

    let mut histogram = Histogram::new(max_iterations);
    for (worker, outcome) in joined {
        match outcome {
            Ok(Some(local)) => histogram.merge(&local),
            Ok(None) => {
                let (rows_done, rows_total) = cancel.progress();
                debug!(worker, rows_done, rows_total, "Pass cancelled");
                return Err(RenderError::Cancelled);
            }
            Err(_) => return Err(RenderError::WorkerPanicked { worker }),
        }
    }
    histogram.verify_total(width as u64 * height as u64)?;

    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        workers = bands.len(),
        "Sampling pass complete"
    );

    Ok(PassOutput {
        grid,
        histogram,
        workers: bands.len(),
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn pass_fills_grid_and_histogram() {
        let cancel = RenderCancel::new();
        let out = sample_pass(&Viewport::default(), 64, 48, 100, 4, &cancel).unwrap();

        assert_eq!(out.grid.data.len(), 64 * 48);
        assert_eq!(out.histogram.total(), 64 * 48);
        assert_eq!(out.workers, 4);
        assert!(out.grid.data.iter().all(|&n| n <= 100));
        assert_eq!(cancel.progress(), (48, 48));
    }

    #[test]
    fn histogram_matches_grid() {
        let cancel = RenderCancel::new();
        let out = sample_pass(&Viewport::default(), 40, 30, 50, 3, &cancel).unwrap();
        let mut expected = Histogram::new(50);
        for &n in &out.grid.data {
            expected.record(n);
        }
        assert_eq!(out.histogram, expected);
    }

    #[test]
    fn worker_count_does_not_change_result() {
        let cancel = RenderCancel::new();
        let vp = Viewport::new(-0.8, -0.7, 0.05, 0.15).unwrap();
        let single = sample_pass(&vp, 73, 41, 300, 1, &cancel).unwrap();
        for workers in [2, 3, 7, 16, 64] {
            let multi = sample_pass(&vp, 73, 41, 300, workers, &cancel).unwrap();
            assert_eq!(single.grid, multi.grid, "{workers} workers diverged");
            assert_eq!(single.histogram, multi.histogram);
        }
    }

    #[test]
    fn rejects_bad_arguments() {
        let cancel = RenderCancel::new();
        let vp = Viewport::default();
        assert!(matches!(
            sample_pass(&vp, 0, 10, 10, 1, &cancel),
            Err(RenderError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            sample_pass(&vp, 10, 10, 0, 1, &cancel),
            Err(RenderError::Core(CoreError::InvalidMaxIterations(0)))
        ));
        assert!(matches!(
            sample_pass(&vp, 10, 10, 10, 0, &cancel),
            Err(RenderError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn stale_token_stops_band() {
        let cancel = RenderCancel::new();
        let token = PassToken {
            cancel: &cancel,
            generation: cancel.generation(),
            abort: AtomicBool::new(false),
        };
        cancel.cancel();

        let mut rows = vec![0u32; 8 * 2];
        let band = Band { y_start: 0, y_end: 2 };
        let out = sample_band(band, &mut rows, 8, 2, &Viewport::default(), 10, &token);
        assert!(out.is_none());
    }

    #[test]
    fn aborted_token_stops_band() {
        let cancel = RenderCancel::new();
        let token = PassToken {
            cancel: &cancel,
            generation: cancel.generation(),
            abort: AtomicBool::new(true),
        };
        let mut rows = vec![0u32; 4];
        let band = Band { y_start: 0, y_end: 1 };
        assert!(sample_band(band, &mut rows, 4, 1, &Viewport::default(), 10, &token).is_none());
    }

    /// Cancels `cancel` from another thread as soon as the first row of the
    /// running pass has finished.
    fn cancel_after_first_row(cancel: &Arc<RenderCancel>) -> thread::JoinHandle<()> {
        let remote = Arc::clone(cancel);
        thread::spawn(move || {
            while remote.progress().0 == 0 {
                thread::yield_now();
            }
            remote.cancel();
        })
    }

    #[test]
    fn cancellation_from_another_thread() {
        let cancel = Arc::new(RenderCancel::new());
        let canceller = cancel_after_first_row(&cancel);

        let result = sample_pass(&Viewport::default(), 512, 512, 50_000, 4, &cancel);
        canceller.join().unwrap();

        assert!(matches!(result, Err(RenderError::Cancelled)), "{result:?}");
        let (done, total) = cancel.progress();
        assert!(done > 0 && done < total, "{done} of {total} rows finished");
    }

    #[test]
    fn failed_spawn_aborts_pass() {
        let cancel = RenderCancel::new();
        let result = sample_pass_with(&Viewport::default(), 64, 64, 5_000, 4, &cancel, |worker| {
            if worker == 1 {
                thread::Builder::new().stack_size(usize::MAX)
            } else {
                worker_builder(worker)
            }
        });
        match result {
            Err(RenderError::WorkerDispatch { worker, .. }) => assert_eq!(worker, 1),
            other => panic!("expected dispatch failure, got {other:?}"),
        }
        // Later workers were never started.
        assert!(cancel.progress().0 <= 16);
    }

    #[test]
    fn pass_after_failed_spawn_still_completes() {
        let cancel = RenderCancel::new();
        let failing = |_: usize| thread::Builder::new().stack_size(usize::MAX);
        assert!(sample_pass_with(&Viewport::default(), 32, 32, 50, 2, &cancel, failing).is_err());

        let out = sample_pass(&Viewport::default(), 32, 32, 50, 2, &cancel).unwrap();
        assert_eq!(out.histogram.total(), 32 * 32);
    }
}
