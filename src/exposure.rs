//! Statistical auto-exposure.
//!
//! Picks a watermark opacity from the image's luminance statistics: darker,
//! flatter images get a more opaque mark, busy images a slightly stronger one.

use crate::analysis::SceneAnalysis;
use image::RgbaImage;
use serde::Serialize;

pub const MIN_AUTO_OPACITY: f32 = 0.4;
pub const MAX_AUTO_OPACITY: f32 = 0.9;

/// Mean and standard deviation of grayscale luminance, both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LuminanceStats {
    pub mean: f32,
    pub std_dev: f32,
}

/// Everything that went into an auto-opacity decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureReading {
    pub brightness: f32,
    pub contrast: f32,
    pub complexity: f32,
    pub opacity: f32,
}

/// Population statistics over the grayscale conversion of `image`.
///
/// Alpha is ignored. An empty image reports mid-gray with no spread.
pub fn luminance_stats(image: &RgbaImage) -> LuminanceStats {
    let gray = image::imageops::grayscale(image);
    let count = gray.width() as usize * gray.height() as usize;
    if count == 0 {
        return LuminanceStats {
            mean: 0.5,
            std_dev: 0.0,
        };
    }

    let (sum, sum_sq) = gray.pixels().fold((0u64, 0u64), |(s, sq), p| {
        let v = p.0[0] as u64;
        (s + v, sq + v * v)
    });
    let n = count as f64;
    let mean = sum as f64 / n;
    let variance = (sum_sq as f64 / n - mean * mean).max(0.0);

    LuminanceStats {
        mean: (mean / 255.0) as f32,
        std_dev: (variance.sqrt() / 255.0) as f32,
    }
}

/// Scene complexity from the number of dominant colors, saturating at 10.
pub fn complexity(analysis: &SceneAnalysis) -> f32 {
    (analysis.dominant_colors.len() as f32 / 10.0).min(1.0)
}

/// `clamp(0.7 + 0.3(1−b) − 0.2(1−s) + 0.1c, 0.4, 0.9)` with inputs clamped to [0, 1].
pub fn estimate(brightness: f32, contrast: f32, complexity: f32) -> f32 {
    let unit = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 };
    let (b, s, c) = (unit(brightness), unit(contrast), unit(complexity));

    let opacity = 0.7 + 0.3 * (1.0 - b) - 0.2 * (1.0 - s) + 0.1 * c;
    opacity.clamp(MIN_AUTO_OPACITY, MAX_AUTO_OPACITY)
}

/// Measure `image` and compute its auto opacity.
pub fn read_exposure(image: &RgbaImage, analysis: &SceneAnalysis) -> ExposureReading {
    let stats = luminance_stats(image);
    let complexity = complexity(analysis);
    ExposureReading {
        brightness: stats.mean,
        contrast: stats.std_dev,
        complexity,
        opacity: estimate(stats.mean, stats.std_dev, complexity),
    }
}
