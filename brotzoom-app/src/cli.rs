use std::path::PathBuf;

use clap::Parser;

use brotzoom_core::PixelPoint;

use crate::config::AppConfig;

/// A zoom rectangle given on the command line as `x0,y0,x1,y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: PixelPoint,
    pub end: PixelPoint,
}

fn parse_selection(s: &str) -> Result<Selection, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid selection '{s}': {e}"))?;
    match parts.as_slice() {
        &[x0, y0, x1, y1] => Ok(Selection {
            start: PixelPoint::new(x0, y0),
            end: PixelPoint::new(x1, y1),
        }),
        _ => Err(format!("selection '{s}' must be x0,y0,x1,y1")),
    }
}

/// Render histogram-equalized Mandelbrot frames to PNG.
#[derive(Debug, Parser)]
#[command(name = "brotzoom", version)]
pub struct Cli {
    /// JSON config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory for PNG frames.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Sampling threads per pass.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Builtin gradient: classic, fire, ocean or grayscale.
    #[arg(long)]
    pub palette: Option<String>,

    /// Zoom selection in pixels, applied in order. Repeatable.
    #[arg(long = "select", value_parser = parse_selection)]
    pub selections: Vec<Selection>,

    /// Extra frames zooming toward the configured target.
    #[arg(long, default_value_t = 0)]
    pub frames: u32,
}

impl Cli {
    /// Build the effective config: file (or defaults), then flags on top.
    pub fn resolve_config(&self) -> AppConfig {
        let mut config = self
            .config
            .as_deref()
            .map(AppConfig::load)
            .unwrap_or_default();
        if let Some(out) = &self.out {
            config.output_dir = out.clone();
        }
        if let Some(w) = self.width {
            config.render.width = w;
        }
        if let Some(h) = self.height {
            config.render.height = h;
        }
        if let Some(n) = self.max_iterations {
            config.render.max_iterations = n;
        }
        if let Some(n) = self.workers {
            config.render.workers = n;
        }
        if let Some(p) = &self.palette {
            config.palette = Some(p.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selection() {
        assert_eq!(
            parse_selection("10, 20,300,400").unwrap(),
            Selection {
                start: PixelPoint::new(10, 20),
                end: PixelPoint::new(300, 400),
            }
        );
        assert!(parse_selection("1,2,3").is_err());
        assert!(parse_selection("a,b,c,d").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "brotzoom",
            "--width",
            "320",
            "--workers",
            "2",
            "--palette",
            "ocean",
            "--select",
            "1,2,30,40",
            "--select",
            "5,5,6,6",
            "--frames",
            "3",
        ]);
        let cfg = cli.resolve_config();
        assert_eq!(cfg.render.width, 320);
        assert_eq!(cfg.render.height, 600);
        assert_eq!(cfg.render.workers, 2);
        assert_eq!(cfg.palette.as_deref(), Some("ocean"));
        assert_eq!(cli.selections.len(), 2);
        assert_eq!(cli.frames, 3);
    }

    #[test]
    fn clap_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
