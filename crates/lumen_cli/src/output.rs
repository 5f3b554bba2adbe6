//! Writing rendered images to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lumen_renderer::ImageBuffer;

/// Save a gamma-corrected 8-bit image. The format follows the extension.
pub fn save_image(image: &ImageBuffer, path: &Path) -> Result<()> {
    let buffer = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba())
        .context("Pixel buffer does not match image dimensions")?;
    buffer
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved {}x{} image to {}", image.width, image.height, path.display());
    Ok(())
}

/// `out/render.png` becomes `out/render_photon_3.png` for iteration 3.
pub fn iteration_path(output: &Path, iteration: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output.with_file_name(format!("{stem}_photon_{iteration}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_renderer::Color;

    #[test]
    fn test_iteration_path() {
        assert_eq!(
            iteration_path(Path::new("out/render.png"), 3),
            PathBuf::from("out/render_photon_3.png")
        );
        assert_eq!(
            iteration_path(Path::new("frame"), 0),
            PathBuf::from("frame_photon_0.png")
        );
    }

    #[test]
    fn test_saved_png_round_trips_pixels() {
        let mut image = ImageBuffer::new(4, 2);
        image.set_pixel(1, 0, Color::ONE);
        image.set_pixel(3, 1, Color::new(1.0, 0.0, 0.0));

        let path = std::env::temp_dir().join(format!("lumen_{}_save.png", std::process::id()));
        save_image(&image, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.dimensions(), (4, 2));
        assert_eq!(loaded.get_pixel(1, 0).0, [255, 255, 255, 255]);
        assert_eq!(loaded.get_pixel(3, 1).0, [255, 0, 0, 255]);
        assert_eq!(loaded.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }
}
