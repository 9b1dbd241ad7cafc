/// A contiguous run of grid rows `[y_start, y_end)` owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub y_start: u32,
    pub y_end: u32,
}

impl Band {
    pub fn rows(&self) -> u32 {
        self.y_end - self.y_start
    }

    /// Number of pixels in this band for a grid `width` columns wide.
    pub fn pixel_count(&self, width: u32) -> usize {
        self.rows() as usize * width as usize
    }
}

/// Split `height` rows into `workers` disjoint bands of `height / workers`
/// rows each.
///
/// The `height % workers` leftover rows are appended to the last band so
/// every row is covered exactly once. The worker count is capped at
/// `height`, so no band is ever empty. Returns no bands for an empty grid
/// or zero workers.
pub fn partition_rows(height: u32, workers: usize) -> Vec<Band> {
    let workers = (workers.min(height as usize)) as u32;
    if workers == 0 {
        return Vec::new();
    }
    let per_band = height / workers;
    (0..workers)
        .map(|i| {
            let y_start = i * per_band;
            let y_end = if i + 1 == workers {
                height
            } else {
                y_start + per_band
            };
            Band { y_start, y_end }
        })
        .collect()
}
