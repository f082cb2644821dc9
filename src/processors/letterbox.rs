//! Letterbox preprocessing of captcha images.
//!
//! The source image is padded to the integer aspect ratio of the network
//! input, resized bilinearly to the input size, converted to BGR or gray and
//! scaled into `[0, 1]`. The result is an NHWC batch of one.

use crate::core::batch::Tensor4D;
use crate::core::constants::PIXEL_SCALE;
use crate::core::errors::{OCRError, OcrResult};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Geometry of a network input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterboxParams {
    pub width: u32,
    pub height: u32,
    /// 1 for grayscale, 3 for BGR.
    pub channels: u32,
    /// Gray level of the padding.
    pub fill_color: u8,
}

impl LetterboxParams {
    /// Integer target aspect ratio, never below 1.
    pub fn aspect_ratio(&self) -> u32 {
        (self.width / self.height.max(1)).max(1)
    }

    /// NHWC input shape with a batch of one.
    pub fn input_shape(&self) -> [usize; 4] {
        [
            1,
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        ]
    }

    fn validate(&self) -> OcrResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(OCRError::invalid_argument(format!(
                "input size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.channels != 1 && self.channels != 3 {
            return Err(OCRError::invalid_argument(format!(
                "input channels must be 1 or 3, got {}",
                self.channels
            )));
        }
        Ok(())
    }
}

/// Pads `image` with the fill color towards the target aspect ratio.
///
/// Images narrower than the ratio are extended on the right. Wider images
/// get equal bands on top and bottom; the band height is rounded down, so
/// the ratio is approached rather than matched exactly.
pub fn pad_to_aspect(image: &RgbImage, params: &LetterboxParams) -> OcrResult<RgbImage> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(OCRError::invalid_argument("cannot letterbox an empty image"));
    }

    let ratio = params.aspect_ratio();
    let fill = Rgb([params.fill_color; 3]);
    let target_w = ratio * h;

    if w < target_w {
        let mut padded = RgbImage::from_pixel(target_w, h, fill);
        imageops::replace(&mut padded, image, 0, 0);
        Ok(padded)
    } else if w > target_w {
        let band = (w - target_w) / (ratio * 2);
        let mut padded = RgbImage::from_pixel(w, h + 2 * band, fill);
        imageops::replace(&mut padded, image, 0, band as i64);
        Ok(padded)
    } else {
        Ok(image.clone())
    }
}

/// Converts an image already at the input size into a scaled NHWC tensor.
pub fn to_tensor(image: &RgbImage, params: &LetterboxParams) -> OcrResult<Tensor4D> {
    if image.dimensions() != (params.width, params.height) {
        return Err(OCRError::shape_mismatch(
            "letterbox",
            &[params.height as usize, params.width as usize],
            &[image.height() as usize, image.width() as usize],
        ));
    }

    let mut tensor = Tensor4D::zeros(params.input_shape());
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (x, y) = (x as usize, y as usize);
        if params.channels == 1 {
            tensor[[0, y, x, 0]] = gray_level(r, g, b) as f32 / PIXEL_SCALE;
        } else {
            tensor[[0, y, x, 0]] = b as f32 / PIXEL_SCALE;
            tensor[[0, y, x, 1]] = g as f32 / PIXEL_SCALE;
            tensor[[0, y, x, 2]] = r as f32 / PIXEL_SCALE;
        }
    }
    Ok(tensor)
}

/// Pads, resizes and normalizes `image` into the network input tensor.
pub fn preprocess(image: &RgbImage, params: &LetterboxParams) -> OcrResult<Tensor4D> {
    params.validate()?;
    let padded = pad_to_aspect(image, params)?;
    let resized = imageops::resize(&padded, params.width, params.height, FilterType::Triangle);
    tracing::debug!(
        "Letterboxed {}x{} -> {}x{} -> {}x{}",
        image.width(),
        image.height(),
        padded.width(),
        padded.height(),
        params.width,
        params.height
    );
    to_tensor(&resized, params)
}

// ITU-R BT.601 luma, rounded like an 8-bit color conversion.
fn gray_level(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: u32, height: u32, channels: u32) -> LetterboxParams {
        LetterboxParams {
            width,
            height,
            channels,
            fill_color: 255,
        }
    }

    #[test]
    fn test_narrow_image_padded_right() {
        let image = RgbImage::from_pixel(20, 10, Rgb([0, 0, 0]));
        let padded = pad_to_aspect(&image, &params(128, 32, 1)).unwrap();
        assert_eq!(padded.dimensions(), (40, 10));
        assert_eq!(padded.get_pixel(5, 5).0, [0, 0, 0]);
        assert_eq!(padded.get_pixel(30, 5).0, [255, 255, 255]);
    }

    #[test]
    fn test_wide_image_padded_top_and_bottom() {
        let image = RgbImage::from_pixel(100, 10, Rgb([0, 0, 0]));
        let padded = pad_to_aspect(&image, &params(128, 32, 1)).unwrap();
        // (100 - 40) / 8 = 7 rows on each side
        assert_eq!(padded.dimensions(), (100, 24));
        assert_eq!(padded.get_pixel(50, 3).0, [255, 255, 255]);
        assert_eq!(padded.get_pixel(50, 12).0, [0, 0, 0]);
        assert_eq!(padded.get_pixel(50, 20).0, [255, 255, 255]);
    }

    #[test]
    fn test_matching_ratio_unchanged() {
        let image = RgbImage::from_pixel(40, 10, Rgb([9, 9, 9]));
        let padded = pad_to_aspect(&image, &params(128, 32, 1)).unwrap();
        assert_eq!(padded, image);
    }

    #[test]
    fn test_ratio_never_below_one() {
        assert_eq!(params(20, 64, 1).aspect_ratio(), 1);
        let image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let padded = pad_to_aspect(&image, &params(20, 64, 1)).unwrap();
        assert_eq!(padded.dimensions(), (10, 10));
    }

    #[test]
    fn test_color_tensor_is_bgr() {
        let image = RgbImage::from_pixel(64, 32, Rgb([255, 0, 0]));
        let tensor = preprocess(&image, &params(64, 32, 3)).unwrap();
        assert_eq!(tensor.shape(), &[1, 32, 64, 3]);
        assert_eq!(tensor[[0, 10, 10, 0]], 0.0);
        assert_eq!(tensor[[0, 10, 10, 2]], 1.0);
    }

    #[test]
    fn test_gray_tensor_in_unit_range() {
        let image = RgbImage::from_fn(30, 25, |x, _| Rgb([(x * 5) as u8, 128, 255]));
        let tensor = preprocess(&image, &params(128, 64, 1)).unwrap();
        assert_eq!(tensor.shape(), &[1, 64, 128, 1]);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
        // right side is fill
        assert_eq!(tensor[[0, 32, 127, 0]], 1.0);
    }

    #[test]
    fn test_invalid_channels_rejected() {
        let image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        assert!(preprocess(&image, &params(8, 4, 2)).is_err());
    }
}
