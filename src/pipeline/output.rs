//! Output encoding.

use crate::error::CompositorError;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
    /// 1-100, JPEG only
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Encode `image`. JPEG drops the alpha channel.
pub fn encode(image: &RgbaImage, settings: &OutputSettings) -> Result<Vec<u8>, CompositorError> {
    let mut buffer = Cursor::new(Vec::new());
    let result = match settings.format {
        OutputFormat::Png => {
            DynamicImage::ImageRgba8(image.clone()).write_to(&mut buffer, ImageOutputFormat::Png)
        }
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            DynamicImage::ImageRgb8(rgb).write_to(
                &mut buffer,
                ImageOutputFormat::Jpeg(settings.jpeg_quality.clamp(1, 100)),
            )
        }
    };
    result.map_err(|e| CompositorError::Encode(format!("{:?} encoding failed: {}", settings.format, e)))?;
    Ok(buffer.into_inner())
}
