//! Decoding, input limits and resolution normalization.
//!
//! Decode → limit checks → downscale to the tier's maximum edge length.
//! Images are only ever scaled down; aspect ratio is preserved.

use crate::error::CompositorError;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::num::NonZeroU32;

/// Limits applied to uploaded images before any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    /// Maximum encoded size in bytes
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,
    /// Maximum decoded width × height
    #[serde(default = "default_max_input_pixels")]
    pub max_input_pixels: u64,
}

fn default_max_input_bytes() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_max_input_pixels() -> u64 {
    100_000_000
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            max_input_pixels: default_max_input_pixels(),
        }
    }
}

impl InputLimits {
    pub fn validate_file_size(&self, size: usize) -> Result<(), CompositorError> {
        if size > self.max_input_bytes {
            return Err(CompositorError::invalid_image(format!(
                "file size {} bytes exceeds limit of {} bytes",
                size, self.max_input_bytes
            )));
        }
        Ok(())
    }

    pub fn validate_dimensions(&self, width: u32, height: u32) -> Result<(), CompositorError> {
        if width == 0 || height == 0 {
            return Err(CompositorError::invalid_image(format!(
                "image has zero dimension ({}x{})",
                width, height
            )));
        }
        let pixels = width as u64 * height as u64;
        if pixels > self.max_input_pixels {
            return Err(CompositorError::invalid_image(format!(
                "{}x{} ({} pixels) exceeds limit of {} pixels",
                width, height, pixels, self.max_input_pixels
            )));
        }
        Ok(())
    }
}

fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, CompositorError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CompositorError::invalid_image(e.to_string()))
}

/// Check byte length, format and header dimensions against `limits`
/// without decoding any pixels.
pub fn read_dimensions(data: &[u8], limits: &InputLimits) -> Result<(u32, u32), CompositorError> {
    limits.validate_file_size(data.len())?;

    let (width, height) = reader(data)?
        .into_dimensions()
        .map_err(|e| CompositorError::invalid_image(e.to_string()))?;
    limits.validate_dimensions(width, height)?;
    Ok((width, height))
}

/// Decode image bytes to RGBA after checking them against `limits`.
///
/// Dimensions are read from the header first, so oversized images are
/// rejected before their pixels are allocated.
pub fn decode(data: &[u8], limits: &InputLimits) -> Result<RgbaImage, CompositorError> {
    read_dimensions(data, limits)?;

    let decoded = reader(data)?
        .decode()
        .map_err(|e| CompositorError::invalid_image(e.to_string()))?;
    Ok(decoded.to_rgba8())
}

/// Size that fits `(width, height)` within `max` on its longest edge.
///
/// `floor(dim × max / longest)`, never below 1. Unchanged when it already fits.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max || longest == 0 {
        return (width, height);
    }
    let scale = |dim: u32| ((dim as u64 * max as u64) / longest as u64).max(1) as u32;
    (scale(width), scale(height))
}

/// Downscale `image` so neither edge exceeds `max`.
pub fn normalize(image: &RgbaImage, max: u32) -> Result<RgbaImage, CompositorError> {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(CompositorError::invalid_image("image has zero dimension"));
    }
    if max == 0 {
        return Err(CompositorError::Config(
            "maximum resolution must be positive".to_string(),
        ));
    }

    let (dst_w, dst_h) = target_dimensions(src_w, src_h, max);
    if (dst_w, dst_h) == (src_w, src_h) {
        return Ok(image.clone());
    }

    resize(image, dst_w, dst_h)
}

fn resize(image: &RgbaImage, dst_w: u32, dst_h: u32) -> Result<RgbaImage, CompositorError> {
    let non_zero = |v: u32| {
        NonZeroU32::new(v).ok_or_else(|| CompositorError::invalid_image("image has zero dimension"))
    };

    let src_image = Image::from_vec_u8(
        non_zero(image.width())?,
        non_zero(image.height())?,
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| CompositorError::invalid_image(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(non_zero(dst_w)?, non_zero(dst_h)?, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| CompositorError::invalid_image(format!("Resize operation failed: {:?}", e)))?;

    RgbaImage::from_raw(dst_w, dst_h, dst_image.into_vec())
        .ok_or_else(|| CompositorError::invalid_image("Failed to create output image buffer"))
}
