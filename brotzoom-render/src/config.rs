use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::palette::{builtin_gradient, validate_gradient, GradientStop, Palette, DEFAULT_GRADIENT};

/// Largest accepted `max_iterations`, which bounds per-worker histogram
/// memory at about 8 MiB.
pub const MAX_ITERATIONS_LIMIT: u32 = 1 << 20;

/// Fixed settings for a render engine, provided once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Iteration cap per pixel, at most [`MAX_ITERATIONS_LIMIT`]. Each
    /// worker keeps its own histogram of `max_iterations + 1` eight-byte
    /// buckets for the duration of a pass.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// OS threads per sampling pass. Defaults to the logical CPU count.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Palette resolution.
    #[serde(default = "default_num_colors")]
    pub num_colors: usize,
    #[serde(default = "default_gradient")]
    pub gradient: Vec<GradientStop>,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_max_iterations() -> u32 {
    255
}
fn default_workers() -> usize {
    num_cpus::get().max(1)
}
fn default_num_colors() -> usize {
    256
}
fn default_gradient() -> Vec<GradientStop> {
    builtin_gradient(DEFAULT_GRADIENT).unwrap_or_default()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_iterations: default_max_iterations(),
            workers: default_workers(),
            num_colors: default_num_colors(),
            gradient: default_gradient(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let reason = if self.max_iterations == 0 {
            Some("max_iterations must be >= 1".to_string())
        } else if self.max_iterations > MAX_ITERATIONS_LIMIT {
            Some(format!(
                "max_iterations must be <= {MAX_ITERATIONS_LIMIT}, got {}",
                self.max_iterations
            ))
        } else if self.workers == 0 {
            Some("workers must be >= 1".to_string())
        } else if self.num_colors == 0 {
            Some("num_colors must be >= 1".to_string())
        } else {
            validate_gradient(&self.gradient).err()
        };
        match reason {
            Some(reason) => Err(RenderError::InvalidConfig { reason }),
            None => Ok(()),
        }
    }

    pub fn build_palette(&self) -> crate::Result<Palette> {
        Palette::from_gradient(&self.gradient, self.num_colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RenderConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!((cfg.width, cfg.height), (800, 600));
        assert_eq!(cfg.max_iterations, 255);
        assert!(cfg.workers >= 1);
        assert_eq!(cfg.build_palette().unwrap().len(), 256);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: RenderConfig = serde_json::from_str(r#"{"width": 320, "workers": 2}"#).unwrap();
        assert_eq!(cfg.width, 320);
        assert_eq!(cfg.height, 600);
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.gradient, default_gradient());
    }

    #[test]
    fn json_round_trip() {
        let cfg = RenderConfig {
            workers: 3,
            ..RenderConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn validate_rejects_each_bad_field() {
        let base = RenderConfig::default();
        let cases = [
            RenderConfig { width: 0, ..base.clone() },
            RenderConfig { height: 0, ..base.clone() },
            RenderConfig { max_iterations: 0, ..base.clone() },
            RenderConfig { max_iterations: MAX_ITERATIONS_LIMIT + 1, ..base.clone() },
            RenderConfig { workers: 0, ..base.clone() },
            RenderConfig { num_colors: 0, ..base.clone() },
            RenderConfig { gradient: Vec::new(), ..base.clone() },
        ];
        for cfg in cases {
            assert!(cfg.validate().is_err(), "{cfg:?} should be rejected");
        }
    }

    #[test]
    fn iteration_limit_is_inclusive() {
        let at_limit = RenderConfig {
            max_iterations: MAX_ITERATIONS_LIMIT,
            ..RenderConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let over = RenderConfig {
            max_iterations: u32::MAX,
            ..RenderConfig::default()
        };
        assert!(matches!(over.validate(), Err(RenderError::InvalidConfig { .. })));
    }
}
