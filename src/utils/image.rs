//! Image loading.

use crate::core::errors::OCRError;
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Converts a DynamicImage to an RgbImage, dropping any alpha channel.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns [`OCRError::ImageLoad`] if the file is missing, unreadable or
/// cannot be decoded.
pub fn load_image(path: &Path) -> Result<RgbImage, OCRError> {
    let img = image::open(path).map_err(|e| OCRError::image_load(path, e))?;
    Ok(dynamic_to_rgb(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_load_drops_alpha() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tile.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 0]))
            .save(&path)
            .unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_missing_file_is_image_load_error() {
        let err = load_image(Path::new("/nonexistent/example1.png")).unwrap_err();
        assert!(matches!(err, OCRError::ImageLoad { .. }));
    }

    #[test]
    fn test_undecodable_file_is_image_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(
            load_image(&path),
            Err(OCRError::ImageLoad { .. })
        ));
    }
}
