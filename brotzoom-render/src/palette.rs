use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::histogram::Histogram;
use crate::pixel_grid::PixelGrid;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An 8-bit-per-channel color with named fields.
///
/// Built, compared and blended channel by channel; it is never packed into
/// an integer, so byte order cannot leak into results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    #[serde(default = "opaque_alpha")]
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

fn opaque_alpha() -> u8 {
    255
}

impl Rgba {
    /// Sentinel for pixels that never escaped.
    pub const INTERIOR: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    pub fn to_opaque(self) -> Self {
        Self { a: 255, ..self }
    }

    /// Channel-wise blend of R, G and B; the result is always opaque.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |x: u8, y: u8| {
            (x as f64 + (y as f64 - x as f64) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::opaque(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }

    /// Bytes in `R, G, B, A` order, as stored in [`RenderBuffer`].
    pub fn to_rgba_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ---------------------------------------------------------------------------
// Gradient stops
// ---------------------------------------------------------------------------

/// A control point of a gradient: `position` in `[0, 1]` and its color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(position: f64, color: Rgba) -> Self {
        Self { position, color }
    }
}

/// Check that stops can be turned into a palette: at least two, positions
/// within `[0, 1]` and in non-decreasing order.
pub fn validate_gradient(stops: &[GradientStop]) -> Result<(), String> {
    if stops.len() < 2 {
        return Err(format!("gradient needs at least 2 stops, got {}", stops.len()));
    }
    if let Some(bad) = stops
        .iter()
        .find(|s| !(0.0..=1.0).contains(&s.position))
    {
        return Err(format!("stop position {} is outside [0, 1]", bad.position));
    }
    if stops.windows(2).any(|w| w[1].position < w[0].position) {
        return Err("stop positions must be in non-decreasing order".to_string());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// A fixed-size lookup table interpolated from gradient stops.
///
/// Built once; each pixel then resolves to a single table entry chosen by
/// histogram equalization (see [`colorize`](Self::colorize)).
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgba>,
}

impl Palette {
    /// Interpolate `num_colors` entries from `stops`.
    ///
    /// Slot `i` samples the gradient at `v = i / num_colors`, between the
    /// stops with `breaks[k] <= v < breaks[k + 1]`. Values before the first
    /// stop take its color; values at or past the last stop take the last.
    pub fn from_gradient(stops: &[GradientStop], num_colors: usize) -> crate::Result<Self> {
        validate_gradient(stops).map_err(|reason| RenderError::InvalidConfig { reason })?;
        if num_colors == 0 {
            return Err(RenderError::InvalidConfig {
                reason: "palette needs at least 1 color".to_string(),
            });
        }

        let first = stops[0];
        let last = stops[stops.len() - 1];
        let colors = (0..num_colors)
            .map(|i| {
                let v = i as f64 / num_colors as f64;
                match stops
                    .windows(2)
                    .find(|w| w[0].position <= v && v < w[1].position)
                {
                    Some(w) => {
                        let t = (v - w[0].position) / (w[1].position - w[0].position);
                        w[0].color.lerp(w[1].color, t)
                    }
                    None if v < first.position => first.color.to_opaque(),
                    None => last.color.to_opaque(),
                }
            })
            .collect();
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for one pixel.
    ///
    /// `cumulative_below` is [`Histogram::cumulative_below`] for the pass and
    /// `total` its pixel count, so the hue is the share of pixels that
    /// escaped strictly earlier than this one.
    #[inline]
    pub fn equalized_color(
        &self,
        count: u32,
        max_iterations: u32,
        cumulative_below: &[u64],
        total: u64,
    ) -> Rgba {
        if count >= max_iterations {
            return Rgba::INTERIOR;
        }
        let below = cumulative_below.get(count as usize).copied().unwrap_or(total);
        let hue = if total == 0 {
            0.0
        } else {
            (below as f64 / total as f64).clamp(0.0, 1.0)
        };
        let n = self.colors.len();
        let index = ((hue * n as f64).floor() as usize).min(n - 1);
        self.colors[index]
    }

    /// Color a whole grid with histogram equalization.
    pub fn colorize(&self, grid: &PixelGrid, histogram: &Histogram) -> RenderBuffer {
        let cumulative = histogram.cumulative_below();
        let total = grid.pixel_count() as u64;
        let max_iterations = grid.max_iterations;

        let mut buffer = RenderBuffer::new(grid.width, grid.height);
        buffer
            .pixels
            .par_chunks_mut(4)
            .zip(grid.data.par_iter())
            .for_each(|(pixel, &count)| {
                let c = self.equalized_color(count, max_iterations, &cumulative, total);
                pixel.copy_from_slice(&c.to_rgba_bytes());
            });
        buffer
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: (0..=255u8).map(|v| Rgba::opaque(v, v, v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builtin gradients
// ---------------------------------------------------------------------------

pub const DEFAULT_GRADIENT: &str = "classic";

/// Every builtin gradient with its name.
pub fn builtin_gradients() -> Vec<(&'static str, Vec<GradientStop>)> {
    ["classic", "fire", "ocean", "grayscale"]
        .into_iter()
        .filter_map(|name| builtin_gradient(name).map(|g| (name, g)))
        .collect()
}

/// Look up a builtin gradient by (case-insensitive) name.
pub fn builtin_gradient(name: &str) -> Option<Vec<GradientStop>> {
    let stops: &[(f64, [u8; 3])] = match name.to_ascii_lowercase().as_str() {
        "classic" => &[
            (0.0, [0, 7, 100]),
            (0.16, [32, 107, 203]),
            (0.42, [237, 255, 255]),
            (0.6425, [255, 170, 0]),
            (0.8575, [0, 2, 0]),
            (1.0, [0, 7, 100]),
        ],
        "fire" => &[
            (0.0, [0, 0, 0]),
            (0.25, [128, 0, 0]),
            (0.5, [255, 128, 0]),
            (0.75, [255, 255, 0]),
            (1.0, [255, 255, 255]),
        ],
        "ocean" => &[
            (0.0, [0, 0, 30]),
            (0.3, [0, 50, 120]),
            (0.6, [0, 150, 200]),
            (0.8, [100, 220, 255]),
            (1.0, [240, 255, 255]),
        ],
        "grayscale" => &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])],
        _ => return None,
    };
    Some(
        stops
            .iter()
            .map(|&(pos, [r, g, b])| GradientStop::new(pos, Rgba::opaque(r, g, b)))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
