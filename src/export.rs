use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::ColorImage;
use image::{ExtendedColorType, ImageFormat};

/// Write a captured frame to `path` as PNG, whatever the extension says.
pub fn save_png(image: &ColorImage, path: &Path) -> Result<()> {
    let [w, h] = image.size;
    let bytes: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|c| c.to_srgba_unmultiplied())
        .collect();

    image::save_buffer_with_format(
        path,
        &bytes,
        u32::try_from(w).context("image too wide")?,
        u32::try_from(h).context("image too tall")?,
        ExtendedColorType::Rgba8,
        ImageFormat::Png,
    )
    .with_context(|| format!("writing PNG to {}", path.display()))?;

    log::info!("Saved {w}x{h} heatmap to {}", path.display());
    Ok(())
}
