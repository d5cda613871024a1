// Resolution normalizer unit tests

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use markforge::resolution::{decode, normalize, target_dimensions, InputLimits};
use markforge::tier::{CapabilityPolicy, Tier};
use markforge::CompositorError;
use std::io::Cursor;

const SIZES: [(u32, u32); 7] = [
    (4000, 3000),
    (3000, 4000),
    (1920, 1080),
    (2161, 10),
    (10, 5000),
    (720, 720),
    (333, 999),
];

#[test]
fn test_normalized_target_never_exceeds_tier_max() {
    let policy = CapabilityPolicy::default();

    for tier in [Tier::Free, Tier::Pro, Tier::Elite] {
        let max = policy.capabilities(tier).max_resolution;
        for (w, h) in SIZES {
            let (tw, th) = target_dimensions(w, h, max);
            assert!(tw <= max && th <= max, "{tier}: {w}x{h} -> {tw}x{th}");
            assert!(tw >= 1 && th >= 1);
            if w <= max && h <= max {
                assert_eq!((tw, th), (w, h), "{tier}: {w}x{h} must not be resized");
            }
        }
    }
}

#[test]
fn test_normalized_aspect_ratio_is_preserved() {
    for (w, h) in [(4000, 3000), (3000, 4000), (1920, 1080), (333, 999)] {
        let (tw, th) = target_dimensions(w, h, 720);
        let before = w as f64 / h as f64;
        let after = tw as f64 / th as f64;
        assert!(
            (before - after).abs() / before < 0.01,
            "{w}x{h} -> {tw}x{th} changed aspect"
        );
    }
}

#[test]
fn test_normalize_real_pixels() {
    let image = RgbaImage::from_pixel(1600, 900, Rgba([120, 80, 40, 255]));
    let normalized = normalize(&image, 1080).unwrap();

    assert_eq!(normalized.dimensions(), (1080, 607));
    // A flat image stays flat after Lanczos resampling
    let pixel = normalized.get_pixel(500, 300);
    for (actual, expected) in pixel.0.iter().zip([120u8, 80, 40, 255]) {
        assert!((*actual as i16 - expected as i16).abs() <= 1);
    }
}

#[test]
fn test_decode_then_normalize_with_limits() {
    let image = RgbaImage::from_pixel(300, 200, Rgba([0, 0, 0, 255]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .unwrap();
    let bytes = buffer.into_inner();

    let decoded = decode(&bytes, &InputLimits::default()).unwrap();
    assert_eq!(normalize(&decoded, 150).unwrap().dimensions(), (150, 100));

    let tight = InputLimits {
        max_input_bytes: 10 * 1024 * 1024,
        max_input_pixels: 300 * 199,
    };
    assert!(matches!(
        decode(&bytes, &tight),
        Err(CompositorError::InvalidImage(_))
    ));
}
