//! PNG export with embedded view metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use brotzoom_core::Viewport;

use crate::buffer::RenderBuffer;
use crate::engine::Frame;
use crate::error::RenderError;

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone)]
pub struct ExportMetadata {
    pub viewport: Viewport,
    pub max_iterations: u32,
    pub palette_name: String,
}

impl ExportMetadata {
    pub fn for_frame(frame: &Frame, palette_name: impl Into<String>) -> Self {
        Self {
            viewport: frame.viewport,
            max_iterations: frame.grid.max_iterations,
            palette_name: palette_name.into(),
        }
    }
}

/// Write an RGBA buffer as a PNG file with the view embedded as text.
pub fn export_png(
    buffer: &RenderBuffer,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let fail = |reason: String| RenderError::Export {
        path: path.to_path_buf(),
        reason,
    };

    let file =
        std::fs::File::create(path).map_err(|e| fail(format!("failed to create file: {e}")))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder
        .add_text_chunk("Software".to_string(), "brotzoom".to_string())
        .map_err(|e| fail(format!("failed to add text chunk: {e}")))?;
    for (key, value) in metadata_pairs(metadata, buffer) {
        encoder
            .add_text_chunk(key.clone(), value)
            .map_err(|e| fail(format!("failed to add text chunk '{key}': {e}")))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| fail(format!("failed to write PNG header: {e}")))?;
    png_writer
        .write_image_data(&buffer.pixels)
        .map_err(|e| fail(format!("failed to write PNG image data: {e}")))?;

    debug!(
        "Exported PNG {}x{} to {}",
        buffer.width,
        buffer.height,
        path.display()
    );
    Ok(())
}

fn metadata_pairs(meta: &ExportMetadata, buffer: &RenderBuffer) -> Vec<(String, String)> {
    let vp = &meta.viewport;
    vec![
        ("Brotzoom.XMin".into(), vp.x_min().to_string()),
        ("Brotzoom.XMax".into(), vp.x_max().to_string()),
        ("Brotzoom.YMin".into(), vp.y_min().to_string()),
        ("Brotzoom.YMax".into(), vp.y_max().to_string()),
        ("Brotzoom.MaxIterations".into(), meta.max_iterations.to_string()),
        ("Brotzoom.Palette".into(), meta.palette_name.clone()),
        (
            "Brotzoom.Resolution".into(),
            format!("{}x{}", buffer.width, buffer.height),
        ),
    ]
}
