use serde::Serialize;

use crate::complex::Complex;
use crate::error::CoreError;

/// The rectangular region of the complex plane mapped onto the pixel grid.
///
/// Pixel row 0 maps to `y_min` and column 0 to `x_min`; there is no axis
/// flip. Construction always validates, so a `Viewport` in hand has finite
/// bounds with `x_max > x_min` and `y_max > y_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

/// Validating deserialization: a config file cannot smuggle in an inverted
/// or non-finite viewport.
impl<'de> serde::Deserialize<'de> for Viewport {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            x_min: f64,
            x_max: f64,
            y_min: f64,
            y_max: f64,
        }
        let raw = <Raw as serde::Deserialize>::deserialize(deserializer)?;
        Viewport::new(raw.x_min, raw.x_max, raw.y_min, raw.y_max).map_err(serde::de::Error::custom)
    }
}

/// Precise linear interpolation: exact at both `t = 0` and `t = 1`.
#[inline]
fn lerp(t: f64, min: f64, max: f64) -> f64 {
    min * (1.0 - t) + max * t
}

impl Viewport {
    pub const DEFAULT_X_MIN: f64 = -2.5;
    pub const DEFAULT_X_MAX: f64 = 1.0;
    pub const DEFAULT_Y_MIN: f64 = -1.1;
    pub const DEFAULT_Y_MAX: f64 = 1.1;

    /// Create a viewport from explicit bounds.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> crate::Result<Self> {
        if ![x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite()) {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "bounds must be finite, got x=({x_min}, {x_max}) y=({y_min}, {y_max})"
                ),
            });
        }
        if x_max <= x_min || y_max <= y_min {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "bounds must have positive extent, got x=({x_min}, {x_max}) y=({y_min}, {y_max})"
                ),
            });
        }
        // Catches finite bounds whose difference overflows.
        if !(x_max - x_min).is_finite() || !(y_max - y_min).is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: "extent overflows f64".to_string(),
            });
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Build a viewport spanning two arbitrary corners, in any order.
    pub fn from_corners(a: Complex, b: Complex) -> crate::Result<Self> {
        Self::new(a.re.min(b.re), a.re.max(b.re), a.im.min(b.im), a.im.max(b.im))
    }

    /// The full Mandelbrot set: `[-2.5, 1.0] × [-1.1, 1.1]`.
    pub fn default_mandelbrot() -> Self {
        Self {
            x_min: Self::DEFAULT_X_MIN,
            x_max: Self::DEFAULT_X_MAX,
            y_min: Self::DEFAULT_Y_MIN,
            y_max: Self::DEFAULT_Y_MAX,
        }
    }

    #[inline]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    #[inline]
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    #[inline]
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Extent along the real axis.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Extent along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width() / self.height()
    }

    pub fn center(&self) -> Complex {
        Complex::new(
            lerp(0.5, self.x_min, self.x_max),
            lerp(0.5, self.y_min, self.y_max),
        )
    }

    /// Map (possibly fractional) pixel coordinates on a `grid_w × grid_h`
    /// grid to a point on the complex plane.
    ///
    /// `(0, 0)` maps exactly to `(x_min, y_min)` and `(grid_w, grid_h)`
    /// exactly to `(x_max, y_max)`. Sampled pixels stop at
    /// `(grid_w - 1, grid_h - 1)`, so the far edges are never sampled.
    #[inline]
    pub fn pixel_to_plane(&self, px: f64, py: f64, grid_w: u32, grid_h: u32) -> Complex {
        let fx = px / grid_w as f64;
        let fy = py / grid_h as f64;
        Complex::new(
            lerp(fx, self.x_min, self.x_max),
            lerp(fy, self.y_min, self.y_max),
        )
    }

    /// Expand the narrower axis so the aspect ratio (width / height) becomes
    /// `target_ratio`.
    ///
    /// Only ever expands, never shrinks, and moves both edges of the expanded
    /// axis by the same amount so the center stays put.
    pub fn enforce_aspect(self, target_ratio: f64) -> crate::Result<Self> {
        if !(target_ratio > 0.0 && target_ratio.is_finite()) {
            return Err(CoreError::InvalidViewport {
                reason: format!("target aspect ratio must be positive and finite, got {target_ratio}"),
            });
        }
        let width = self.width();
        let height = self.height();
        let current = width / height;

        if target_ratio > current {
            // Too narrow: widen x.
            let diff = (target_ratio - current) / current;
            let pad = width * diff * 0.5;
            Self::new(self.x_min - pad, self.x_max + pad, self.y_min, self.y_max)
        } else if target_ratio < current {
            // Too wide: heighten y.
            let diff = (current - target_ratio) / target_ratio;
            let pad = height * diff * 0.5;
            Self::new(self.x_min, self.x_max, self.y_min - pad, self.y_max + pad)
        } else {
            Ok(self)
        }
    }

    /// Move every bound a fraction `ratio` of the way toward `target`.
    ///
    /// With `ratio` in `(0, 1)` this zooms in on `target`, shrinking both
    /// spans by the factor `1 - ratio` while `target` keeps its relative
    /// position on screen.
    pub fn zoom_toward(self, target: Complex, ratio: f64) -> crate::Result<Self> {
        if !(0.0..1.0).contains(&ratio) || !target.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("zoom ratio must be in [0, 1) with a finite target, got {ratio} toward {target}"),
            });
        }
        Self::new(
            lerp(ratio, self.x_min, target.re),
            lerp(ratio, self.x_max, target.re),
            lerp(ratio, self.y_min, target.im),
            lerp(ratio, self.y_max, target.im),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::default_mandelbrot()
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x=({}, {}) y=({}, {})",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}
