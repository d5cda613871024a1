//! Glyph layer rendering and compositing.
//!
//! A mark is drawn in two steps: the text is rendered onto its own transparent
//! layer (plate, shadow, glyphs, then rotation and blur), and the layer is
//! alpha-composited onto the image with the Porter-Duff "over" operator.
//! Compositing never mutates its input; a new image is returned.
//!
//! # Example
//!
//! ```ignore
//! let layer = render_layer(&face, "© Studio", &GlyphStyle::new(Rgb::white(), 0.7, 36.0))?;
//! let anchor = anchor_from_fractions(90.0, 90.0, image.dimensions(), layer.text_box);
//! let marked = composite(&image, &layer, anchor);
//! ```

use crate::color::Rgb;
use crate::font::FontFace;
use crate::pattern::{PixelAnchor, TextBox};
use crate::placement::SizeClass;
use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Minimum distance between a text box and every image edge.
pub const EDGE_MARGIN: i32 = 10;
pub const SHADOW_OFFSET: i32 = 2;
/// Shadow alpha relative to the mark's opacity.
pub const SHADOW_OPACITY_RATIO: f32 = 0.5;
pub const PLATE_PADDING: u32 = 10;
pub const PLATE_INSET: u32 = 5;
pub const PLATE_OPACITY: f32 = 0.3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlyphError {
    #[error("cannot render empty text")]
    EmptyText,

    #[error("font size must be positive, got {0}")]
    InvalidFontSize(f32),

    #[error("blur sigma must be positive, got {0}")]
    InvalidBlur(f32),
}

/// Font size for an image: `floor(min(W, H) / 20) × multiplier`, truncated.
pub fn font_size(width: u32, height: u32, size: SizeClass) -> u32 {
    let base = width.min(height) / 20;
    // Integer forms of the 0.7 / 1.0 / 1.5 multipliers
    let scaled = match size {
        SizeClass::Small => base * 7 / 10,
        SizeClass::Medium => base,
        SizeClass::Large => base * 3 / 2,
    };
    scaled.max(1)
}

/// How one layer is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphStyle {
    pub color: Rgb,
    /// [0, 1]
    pub opacity: f32,
    /// Pixels
    pub font_size: f32,
    /// Degrees, counter-clockwise
    pub rotation: f32,
    pub shadow: bool,
    /// Semi-transparent black plate behind the text
    pub plate: bool,
    /// Gaussian blur applied to the finished layer
    pub blur_sigma: Option<f32>,
}

impl GlyphStyle {
    pub fn new(color: Rgb, opacity: f32, font_size: f32) -> Self {
        Self {
            color,
            opacity,
            font_size,
            rotation: 0.0,
            shadow: false,
            plate: false,
            blur_sigma: None,
        }
    }
}

/// A rendered, transparent layer holding one copy of the text.
#[derive(Clone)]
pub struct GlyphLayer {
    pub image: RgbaImage,
    /// Measured text box, before rotation
    pub text_box: TextBox,
    /// Layer centre relative to the text box's top-left corner
    center_offset: (f32, f32),
}

impl std::fmt::Debug for GlyphLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphLayer")
            .field("dimensions", &self.image.dimensions())
            .field("text_box", &self.text_box)
            .finish()
    }
}

impl GlyphLayer {
    /// Top-left corner of the layer when its text box is anchored at `anchor`.
    ///
    /// Rotation and blur grow the layer around its centre, so the centre
    /// stays where the un-rotated text box centre would be.
    pub fn origin_for(&self, anchor: PixelAnchor) -> PixelAnchor {
        let cx = anchor.x as f32 + self.center_offset.0;
        let cy = anchor.y as f32 + self.center_offset.1;
        PixelAnchor::new(
            (cx - self.image.width() as f32 / 2.0).round() as i32,
            (cy - self.image.height() as f32 / 2.0).round() as i32,
        )
    }
}

/// Measure `text` as a text box.
pub fn measure(face: &FontFace, text: &str, font_size: f32) -> TextBox {
    let (width, height) = face.measure(text, font_size);
    TextBox { width, height }
}

/// Render `text` onto a transparent layer.
pub fn render_layer(face: &FontFace, text: &str, style: &GlyphStyle) -> Result<GlyphLayer, GlyphError> {
    if text.is_empty() {
        return Err(GlyphError::EmptyText);
    }
    if !style.font_size.is_finite() || style.font_size <= 0.0 {
        return Err(GlyphError::InvalidFontSize(style.font_size));
    }

    let text_box = measure(face, text, style.font_size);
    let pad = if style.plate { PLATE_PADDING } else { 0 };
    let shadow_room = if style.shadow && !style.plate {
        SHADOW_OFFSET as u32
    } else {
        0
    };
    let width = text_box.width + 2 * pad + shadow_room;
    let height = text_box.height + 2 * pad + shadow_room;

    let mut layer = RgbaImage::new(width.max(1), height.max(1));

    if style.plate {
        let plate = Rgb::black().with_opacity(PLATE_OPACITY);
        fill_rect(
            &mut layer,
            PLATE_INSET,
            PLATE_INSET,
            text_box.width + PLATE_PADDING + PLATE_INSET,
            text_box.height + PLATE_PADDING + PLATE_INSET,
            plate,
        );
    }

    let origin = (pad as f32, pad as f32);
    if style.shadow {
        let shadow = Rgb::black().with_opacity(style.opacity * SHADOW_OPACITY_RATIO);
        let shadow_origin = (origin.0 + SHADOW_OFFSET as f32, origin.1 + SHADOW_OFFSET as f32);
        draw_text(&mut layer, face, text, style.font_size, shadow_origin, shadow);
    }
    draw_text(
        &mut layer,
        face,
        text,
        style.font_size,
        origin,
        style.color.with_opacity(style.opacity),
    );

    // Centre of the un-rotated text box area, relative to the box corner.
    let center_offset = (
        width as f32 / 2.0 - pad as f32,
        height as f32 / 2.0 - pad as f32,
    );

    if style.rotation != 0.0 {
        layer = rotate_image(&layer, style.rotation);
    }

    if let Some(sigma) = style.blur_sigma {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(GlyphError::InvalidBlur(sigma));
        }
        let margin = (sigma * 3.0).ceil() as u32;
        layer = image::imageops::blur(&pad_image(&layer, margin), sigma);
    }

    Ok(GlyphLayer {
        image: layer,
        text_box,
        center_offset,
    })
}

/// Anchor a text box at fractional coordinates (percent) of the image,
/// centred on the point, then clamped inside the edge margin.
pub fn anchor_from_fractions(
    fraction_x: f32,
    fraction_y: f32,
    image: (u32, u32),
    text_box: TextBox,
) -> PixelAnchor {
    let x = (fraction_x / 100.0 * image.0 as f32 - text_box.width as f32 / 2.0) as i32;
    let y = (fraction_y / 100.0 * image.1 as f32 - text_box.height as f32 / 2.0) as i32;
    clamp_anchor(PixelAnchor::new(x, y), image, text_box)
}

/// Keep the text box at least [`EDGE_MARGIN`] inside every edge.
///
/// When the box is too large to fit, the top/left margin wins.
pub fn clamp_anchor(anchor: PixelAnchor, image: (u32, u32), text_box: TextBox) -> PixelAnchor {
    let clamp = |v: i32, extent: u32, size: u32| {
        let max = extent as i32 - size as i32 - EDGE_MARGIN;
        v.min(max).max(EDGE_MARGIN)
    };
    PixelAnchor::new(
        clamp(anchor.x, image.0, text_box.width),
        clamp(anchor.y, image.1, text_box.height),
    )
}

/// Composite `layer` onto a copy of `base` with its text box at `anchor`.
pub fn composite(base: &RgbaImage, layer: &GlyphLayer, anchor: PixelAnchor) -> RgbaImage {
    let mut target = base.clone();
    blend_onto(&mut target, &layer.image, layer.origin_for(anchor));
    target
}

/// Stamp `layer` at every anchor onto one transparent overlay.
pub fn stamp_overlay(dimensions: (u32, u32), layer: &GlyphLayer, anchors: &[PixelAnchor]) -> RgbaImage {
    let mut overlay = RgbaImage::new(dimensions.0, dimensions.1);
    for anchor in anchors {
        blend_onto(&mut overlay, &layer.image, layer.origin_for(*anchor));
    }
    overlay
}

/// Composite a full-size overlay onto a copy of `base`.
pub fn apply_overlay(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    let mut target = base.clone();
    blend_onto(&mut target, overlay, PixelAnchor::new(0, 0));
    target
}

/// Blend `source` onto `target` with its top-left at `at`, clipping to bounds.
fn blend_onto(target: &mut RgbaImage, source: &RgbaImage, at: PixelAnchor) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let x_start = at.x.max(0);
    let y_start = at.y.max(0);
    let x_end = (at.x + source.width() as i32).min(target_width);
    let y_end = (at.y + source.height() as i32).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = source.get_pixel((tx - at.x) as u32, (ty - at.y) as u32);
            if src[3] == 0 {
                continue;
            }
            let dst = target.get_pixel_mut(tx as u32, ty as u32);
            *dst = blend_pixels(*dst, *src);
        }
    }
}

/// Draw text in `color`, coverage scaling the color's alpha.
fn draw_text(
    layer: &mut RgbaImage,
    face: &FontFace,
    text: &str,
    font_size: f32,
    origin: (f32, f32),
    color: Rgba<u8>,
) {
    let (width, height) = (layer.width() as i32, layer.height() as i32);
    face.rasterize(text, font_size, origin, |x, y, coverage| {
        if x < 0 || y < 0 || x >= width || y >= height {
            return;
        }
        let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32) as u8;
        let pixel = layer.get_pixel_mut(x as u32, y as u32);
        *pixel = blend_pixels(*pixel, Rgba([color[0], color[1], color[2], alpha]));
    });
}

fn fill_rect(layer: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    for y in y0..y1.min(layer.height()) {
        for x in x0..x1.min(layer.width()) {
            let pixel = layer.get_pixel_mut(x, y);
            *pixel = blend_pixels(*pixel, color);
        }
    }
}

fn pad_image(image: &RgbaImage, margin: u32) -> RgbaImage {
    let mut padded = RgbaImage::new(image.width() + 2 * margin, image.height() + 2 * margin);
    image::imageops::replace(&mut padded, image, margin as i64, margin as i64);
    padded
}

/// Porter-Duff "over": `top` composited onto `bottom`.
pub fn blend_pixels(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;

    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);
    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let result = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Rotate counter-clockwise by `degrees` onto a canvas large enough to hold
/// every corner, sampling bilinearly.
pub fn rotate_image(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let radians = degrees.to_radians();
    let (cos, sin) = (radians.cos(), radians.sin());

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let (cx, cy) = (src_w / 2.0, src_h / 2.0);

    // Screen coordinates have y pointing down, so a counter-clockwise turn
    // maps (x, y) to (x·cos + y·sin, −x·sin + y·cos).
    let corners = [(-cx, -cy), (cx, -cy), (-cx, cy), (cx, cy)];
    let (mut min_x, mut max_x, mut min_y, mut max_y) =
        (f32::INFINITY, f32::NEG_INFINITY, f32::INFINITY, f32::NEG_INFINITY);
    for (x, y) in corners {
        let rx = x * cos + y * sin;
        let ry = -x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    // Tolerance keeps exact quarter turns from gaining a pixel to float error.
    let dst_w = ((max_x - min_x - 1e-3).ceil() as u32).max(1);
    let dst_h = ((max_y - min_y - 1e-3).ceil() as u32).max(1);
    let mut rotated = RgbaImage::new(dst_w, dst_h);
    let (dst_cx, dst_cy) = (dst_w as f32 / 2.0, dst_h as f32 / 2.0);

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f32 + 0.5 - dst_cx;
            let ry = dy as f32 + 0.5 - dst_cy;

            // Inverse rotation back into source space
            let sx = rx * cos - ry * sin + cx - 0.5;
            let sy = rx * sin + ry * cos + cy - 0.5;

            if let Some(pixel) = sample_bilinear(image, sx, sy) {
                rotated.put_pixel(dx, dy, pixel);
            }
        }
    }

    rotated
}

fn sample_bilinear(image: &RgbaImage, sx: f32, sy: f32) -> Option<Rgba<u8>> {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if sx < -0.5 || sy < -0.5 || sx > w - 0.5 || sy > h - 0.5 {
        return None;
    }

    let fetch = |x: f32, y: f32| -> [f32; 4] {
        let xi = (x.max(0.0) as u32).min(image.width() - 1);
        let yi = (y.max(0.0) as u32).min(image.height() - 1);
        let p = image.get_pixel(xi, yi);
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1.0, y0);
    let p01 = fetch(x0, y0 + 1.0);
    let p11 = fetch(x0 + 1.0, y0 + 1.0);

    let mut out = [0u8; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        let top = p00[i] * (1.0 - fx) + p10[i] * fx;
        let bottom = p01[i] * (1.0 - fx) + p11[i] * fx;
        *channel = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}
