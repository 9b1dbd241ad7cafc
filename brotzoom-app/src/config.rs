use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use brotzoom_core::{Complex, Viewport};
use brotzoom_render::palette::DEFAULT_GRADIENT;
use brotzoom_render::{builtin_gradient, RenderConfig, RenderError};

/// Everything the front end needs at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub render: RenderConfig,
    /// Initial bounds.
    #[serde(default)]
    pub viewport: Viewport,
    /// Named builtin gradient. Overrides `render.gradient` when set.
    #[serde(default)]
    pub palette: Option<String>,
    /// Fixed point of the automatic zoom sequence.
    #[serde(default = "default_zoom_target")]
    pub zoom_target: Complex,
    /// Fraction of the way each bound moves toward the target per frame.
    #[serde(default = "default_zoom_ratio")]
    pub zoom_ratio: f64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_zoom_target() -> Complex {
    Complex::new(-0.74967, -0.07)
}
fn default_zoom_ratio() -> f64 {
    0.8
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("frames")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            viewport: Viewport::default(),
            palette: None,
            zoom_target: default_zoom_target(),
            zoom_ratio: default_zoom_ratio(),
            output_dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    /// Load a JSON config, falling back to defaults if it is missing or broken.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppConfig>(&json) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => error!("Failed to parse config: {e}"),
            },
            Err(e) => error!("Failed to read config file: {e}"),
        }
        Self::default()
    }

    /// Resolve `palette` into `render.gradient`.
    pub fn apply_palette(&mut self) -> Result<(), RenderError> {
        if let Some(name) = &self.palette {
            self.render.gradient =
                builtin_gradient(name).ok_or_else(|| RenderError::InvalidConfig {
                    reason: format!("unknown palette '{name}'"),
                })?;
        }
        Ok(())
    }

    /// Label recorded in exported images.
    pub fn palette_label(&self) -> &str {
        match &self.palette {
            Some(name) => name.as_str(),
            None if Some(&self.render.gradient) == builtin_gradient(DEFAULT_GRADIENT).as_ref() => {
                DEFAULT_GRADIENT
            }
            None => "custom",
        }
    }
}
