use tracing::error;

use crate::error::RenderError;

/// Pixel counts per escape count, `max_iterations + 1` buckets.
///
/// Each sampling worker fills its own histogram; the scheduler sums them
/// after every worker has joined, so the hot loop never contends on a
/// shared counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            counts: vec![0; max_iterations as usize + 1],
        }
    }

    /// Build directly from bucket counts (mainly for tests and tooling).
    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    #[inline]
    pub fn record(&mut self, escape_count: u32) {
        self.counts[escape_count as usize] += 1;
    }

    /// Add every bucket of `other` into `self`.
    pub fn merge(&mut self, other: &Histogram) {
        debug_assert_eq!(self.counts.len(), other.counts.len());
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            *dst += src;
        }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Check that every pixel of the pass landed in exactly one bucket.
    pub fn verify_total(&self, expected: u64) -> crate::Result<()> {
        let actual = self.total();
        if actual != expected {
            error!(expected, actual, "Histogram total does not match pixel count");
            return Err(RenderError::HistogramInconsistency { expected, actual });
        }
        Ok(())
    }

    /// Prefix sums: entry `n` is the number of pixels whose count is
    /// strictly below `n`. Has the same length as the histogram.
    pub fn cumulative_below(&self) -> Vec<u64> {
        let mut running = 0;
        self.counts
            .iter()
            .map(|&c| {
                let below = running;
                running += c;
                below
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_one_bucket_per_count_including_cap() {
        let h = Histogram::new(255);
        assert_eq!(h.counts().len(), 256);
        assert_eq!(h.total(), 0);
    }

    #[test]
    fn record_and_merge() {
        let mut a = Histogram::new(4);
        let mut b = Histogram::new(4);
        a.record(0);
        a.record(4);
        b.record(4);
        b.record(2);
        a.merge(&b);
        assert_eq!(a.counts(), &[1, 0, 1, 0, 2]);
        assert_eq!(a.total(), 4);
    }

    #[test]
    fn verify_total_flags_shortfall() {
        let h = Histogram::from_counts(vec![3, 2, 1]);
        assert!(h.verify_total(6).is_ok());
        assert!(matches!(
            h.verify_total(7),
            Err(RenderError::HistogramInconsistency {
                expected: 7,
                actual: 6
            })
        ));
    }

    #[test]
    fn cumulative_below_excludes_own_bucket() {
        let h = Histogram::from_counts(vec![3, 0, 2, 5]);
        assert_eq!(h.cumulative_below(), vec![0, 3, 3, 5]);
    }
}
