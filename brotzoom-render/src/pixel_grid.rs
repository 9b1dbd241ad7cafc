use crate::band::Band;

/// Per-pixel escape counts for a full frame, row-major.
///
/// This is the raw output of a sampling pass before coloring. Every entry
/// is in `[0, max_iterations]`, where `max_iterations` means "did not
/// escape".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub data: Vec<u32>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, max_iterations: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            max_iterations,
            data: vec![0; size],
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Split the buffer into one exclusive mutable slice per band.
    ///
    /// `bands` must be ordered and contiguous from row 0 (as produced by
    /// [`partition_rows`](crate::band::partition_rows)); the returned slices
    /// never overlap, so each can be handed to a different thread.
    pub fn band_slices_mut(&mut self, bands: &[Band]) -> Vec<&mut [u32]> {
        let width = self.width;
        let mut rest: &mut [u32] = &mut self.data;
        let mut slices = Vec::with_capacity(bands.len());
        for band in bands {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(band.pixel_count(width));
            slices.push(head);
            rest = tail;
        }
        slices
    }

    /// Number of pixels that never escaped.
    pub fn interior_count(&self) -> usize {
        self.data
            .iter()
            .filter(|&&n| n == self.max_iterations)
            .count()
    }
}
