mod cli;
mod config;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use brotzoom_render::{export_png, ExportMetadata, Explorer, Frame, RenderError, SelectionOutcome};

use cli::Cli;

fn write_frame(frame: &Frame, dir: &Path, index: u32, palette: &str) -> Result<(), RenderError> {
    let path = dir.join(format!("frame_{index:04}.png"));
    export_png(&frame.image, &path, &ExportMetadata::for_frame(frame, palette))?;
    info!(
        path = %path.display(),
        viewport = %frame.viewport,
        center = %frame.viewport.center(),
        interior = frame.interior_pixels(),
        elapsed_ms = frame.elapsed.as_millis(),
        "Wrote frame"
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<(), RenderError> {
    let mut config = cli.resolve_config();
    config.apply_palette()?;
    let palette = config.palette_label().to_string();

    std::fs::create_dir_all(&config.output_dir).map_err(|e| RenderError::Export {
        path: config.output_dir.clone(),
        reason: format!("failed to create output directory: {e}"),
    })?;

    let mut explorer = Explorer::new(config.render.clone(), config.viewport)?;
    explorer.render()?;

    for selection in &cli.selections {
        explorer.selection_start(selection.start);
        explorer.selection_motion(selection.end);
        match explorer.selection_end(selection.end)? {
            SelectionOutcome::Rendered => info!(viewport = %explorer.viewport(), "Applied selection"),
            SelectionOutcome::Rejected(reason) => warn!(%reason, "Skipped selection"),
        }
    }

    let mut index = 0;
    if let Some(frame) = explorer.frame() {
        write_frame(frame, &config.output_dir, index, &palette)?;
    }
    for _ in 0..cli.frames {
        index += 1;
        let frame = explorer.zoom_toward(config.zoom_target, config.zoom_ratio)?;
        write_frame(frame, &config.output_dir, index, &palette)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting brotzoom");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
