//! Rendering strategies.
//!
//! Each strategy takes the normalized image and a [`MarkPlan`] and returns a
//! new marked image together with a record of every layer it composited.
//! These functions are synchronous and CPU bound; the pipeline runs them on
//! the blocking pool.

use super::result::LayerRecord;
use super::RenderStrategy;
use crate::color::parse_hex;
use crate::error::CompositorError;
use crate::font::FontFace;
use crate::glyph::{self, GlyphLayer, GlyphStyle};
use crate::pattern::{self, Canvas, Pattern, PixelAnchor, TextBox};
use crate::placement::PlacementSpec;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Percentage points added to the primary fractions for the decoy, wrapping at 100.
pub const DECOY_FRACTION_SHIFT: f32 = 5.0;
/// Extra decoy displacement as a share of the image width/height.
pub const DECOY_PIXEL_SHIFT: f32 = 0.05;
pub const DECOY_OPACITY_RATIO: f32 = 0.3;
pub const DECOY_COLOR_SHIFT: u8 = 30;
pub const DECOY_FONT_RATIO: f32 = 0.9;
pub const DECOY_BLUR_SIGMA: f32 = 1.0;
/// Contrast factor of the weathering applied by the graffiti strategy.
pub const WEATHERING_CONTRAST: f32 = 0.95;

/// What to draw and how, after placement and exposure are resolved.
#[derive(Debug, Clone)]
pub struct MarkPlan<'a> {
    pub text: &'a str,
    pub face: &'a FontFace,
    pub placement: &'a PlacementSpec,
    /// Caller's shadow toggle after tier clamping
    pub shadow: bool,
    pub pattern: Pattern,
    pub seed: Option<u64>,
    pub dominant_colors: &'a [String],
}

/// A marked image and how it was produced.
#[derive(Debug, Clone)]
pub struct Marked {
    pub image: RgbaImage,
    pub layers: Vec<LayerRecord>,
    pub anchors: Vec<PixelAnchor>,
}

/// Adjusts a marked image to the scene's palette for texture integration.
pub trait ColorAdapter: Send + Sync {
    fn adapt(
        &self,
        image: RgbaImage,
        placement: &PlacementSpec,
        dominant_colors: &[String],
    ) -> Result<RgbaImage, CompositorError>;
}

/// Returns the image unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughAdapter;

impl ColorAdapter for PassThroughAdapter {
    fn adapt(
        &self,
        image: RgbaImage,
        _placement: &PlacementSpec,
        _dominant_colors: &[String],
    ) -> Result<RgbaImage, CompositorError> {
        Ok(image)
    }
}

/// Run `strategy` on `image`.
pub fn apply(
    strategy: RenderStrategy,
    image: &RgbaImage,
    plan: &MarkPlan<'_>,
    adapter: &dyn ColorAdapter,
) -> Result<Marked, CompositorError> {
    debug!(
        strategy = %strategy,
        width = image.width(),
        height = image.height(),
        location = %plan.placement.location,
        "Running render pass"
    );

    match strategy {
        RenderStrategy::Standard => single_pass(strategy, image, plan, plan.shadow, false),
        RenderStrategy::MultiPoint => multi_point(strategy, image, plan),
        RenderStrategy::ContextualGraffiti => {
            let mut marked = single_pass(strategy, image, plan, true, false)?;
            marked.image = reduce_contrast(&marked.image, WEATHERING_CONTRAST);
            Ok(marked)
        }
        RenderStrategy::ContextualSign => single_pass(strategy, image, plan, false, true),
        RenderStrategy::ContextualTexture => {
            let mut marked = single_pass(strategy, image, plan, false, false)?;
            marked.image = adapter.adapt(marked.image, plan.placement, plan.dominant_colors)?;
            Ok(marked)
        }
        RenderStrategy::ContextualOverlay => single_pass(strategy, image, plan, true, false),
        RenderStrategy::Multilayer => multilayer(strategy, image, plan),
    }
}

/// One copy of the mark at the plan's placement.
fn single_pass(
    strategy: RenderStrategy,
    image: &RgbaImage,
    plan: &MarkPlan<'_>,
    shadow: bool,
    plate: bool,
) -> Result<Marked, CompositorError> {
    let dimensions = image.dimensions();
    let font_size = glyph::font_size(dimensions.0, dimensions.1, plan.placement.size);
    let style = GlyphStyle {
        rotation: plan.placement.rotation,
        shadow,
        plate,
        ..GlyphStyle::new(
            parse_hex(&plan.placement.color)?,
            plan.placement.opacity,
            font_size as f32,
        )
    };

    let layer = render(strategy, plan, &style)?;
    let anchor = glyph::anchor_from_fractions(
        plan.placement.x,
        plan.placement.y,
        dimensions,
        layer.text_box,
    );

    Ok(Marked {
        image: glyph::composite(image, &layer, anchor),
        layers: vec![record(anchor, font_size, &style)],
        anchors: vec![anchor],
    })
}

/// The same mark stamped at every anchor of the plan's pattern.
fn multi_point(
    strategy: RenderStrategy,
    image: &RgbaImage,
    plan: &MarkPlan<'_>,
) -> Result<Marked, CompositorError> {
    let dimensions = image.dimensions();
    let font_size = glyph::font_size(dimensions.0, dimensions.1, plan.placement.size);
    let style = GlyphStyle {
        rotation: plan.placement.rotation,
        shadow: plan.shadow,
        ..GlyphStyle::new(
            parse_hex(&plan.placement.color)?,
            plan.placement.opacity,
            font_size as f32,
        )
    };
    let layer = render(strategy, plan, &style)?;

    let mut rng = match plan.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let anchors = pattern_anchors(plan.pattern, dimensions, layer.text_box, &mut rng);

    debug!(pattern = %plan.pattern, count = anchors.len(), "Stamping pattern");

    let overlay = glyph::stamp_overlay(dimensions, &layer, &anchors);
    Ok(Marked {
        image: glyph::apply_overlay(image, &overlay),
        layers: anchors
            .iter()
            .map(|anchor| record(*anchor, font_size, &style))
            .collect(),
        anchors,
    })
}

/// Anchors for `pattern`, all inside the edge margin.
///
/// Random points are sampled on the margin-inset canvas so that the margin
/// clamp never moves them closer together.
fn pattern_anchors(
    pattern: Pattern,
    dimensions: (u32, u32),
    text_box: TextBox,
    rng: &mut StdRng,
) -> Vec<PixelAnchor> {
    let anchors: Vec<PixelAnchor> = match pattern {
        Pattern::Random => {
            let margin = glyph::EDGE_MARGIN as u32;
            let inset = Canvas {
                width: dimensions.0.saturating_sub(2 * margin),
                height: dimensions.1.saturating_sub(2 * margin),
            };
            pattern::random_scatter(text_box, inset, rng)
                .into_iter()
                .map(|a| PixelAnchor::new(a.x + glyph::EDGE_MARGIN, a.y + glyph::EDGE_MARGIN))
                .collect()
        }
        _ => {
            let canvas = Canvas {
                width: dimensions.0,
                height: dimensions.1,
            };
            pattern::layout(pattern, text_box, canvas, rng)
        }
    };

    anchors
        .into_iter()
        .map(|anchor| glyph::clamp_anchor(anchor, dimensions, text_box))
        .collect()
}

/// Primary mark followed by a faint, blurred, displaced decoy.
fn multilayer(
    strategy: RenderStrategy,
    image: &RgbaImage,
    plan: &MarkPlan<'_>,
) -> Result<Marked, CompositorError> {
    let mut marked = single_pass(strategy, image, plan, plan.shadow, false)?;

    let (width, height) = image.dimensions();
    let primary_size = glyph::font_size(width, height, plan.placement.size);
    let decoy_size = ((primary_size as f32 * DECOY_FONT_RATIO) as u32).max(1);
    let style = GlyphStyle {
        blur_sigma: Some(DECOY_BLUR_SIGMA),
        ..GlyphStyle::new(
            parse_hex(&plan.placement.color)?.hue_shift(DECOY_COLOR_SHIFT),
            plan.placement.opacity * DECOY_OPACITY_RATIO,
            decoy_size as f32,
        )
    };
    let layer = render(strategy, plan, &style)?;

    let fraction_x = (plan.placement.x + DECOY_FRACTION_SHIFT) % 100.0;
    let fraction_y = (plan.placement.y + DECOY_FRACTION_SHIFT) % 100.0;
    let shift_x = (width as f32 * DECOY_PIXEL_SHIFT) as i32;
    let shift_y = (height as f32 * DECOY_PIXEL_SHIFT) as i32;
    let raw = PixelAnchor::new(
        (fraction_x / 100.0 * width as f32 - layer.text_box.width as f32 / 2.0) as i32 + shift_x,
        (fraction_y / 100.0 * height as f32 - layer.text_box.height as f32 / 2.0) as i32 + shift_y,
    );
    let anchor = glyph::clamp_anchor(raw, (width, height), layer.text_box);

    marked.image = glyph::composite(&marked.image, &layer, anchor);
    marked.layers.push(record(anchor, decoy_size, &style));
    marked.anchors.push(anchor);
    Ok(marked)
}

/// Pull every RGB channel toward the mean gray level by `factor`.
///
/// `factor` 1.0 leaves the image unchanged and 0.0 yields flat gray. Alpha is
/// preserved.
pub fn reduce_contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    let gray = image::imageops::grayscale(image);
    let count = gray.width() as u64 * gray.height() as u64;
    if count == 0 {
        return image.clone();
    }
    let sum: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (sum as f32 / count as f32).round();

    let mut adjusted = image.clone();
    for pixel in adjusted.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            let value = mean + (*channel as f32 - mean) * factor;
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    adjusted
}

fn render(
    strategy: RenderStrategy,
    plan: &MarkPlan<'_>,
    style: &GlyphStyle,
) -> Result<GlyphLayer, CompositorError> {
    glyph::render_layer(plan.face, plan.text, style)
        .map_err(|e| CompositorError::render_failure(strategy, e.to_string()))
}

fn record(anchor: PixelAnchor, font_size: u32, style: &GlyphStyle) -> LayerRecord {
    LayerRecord {
        anchor_px: anchor,
        font_size,
        color: style.color.to_hex(),
        opacity: style.opacity,
        rotation: style.rotation,
        shadow: style.shadow,
        plate: style.plate,
        blur_sigma: style.blur_sigma,
    }
}
