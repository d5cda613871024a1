//! Loaded font faces and glyph rasterization.
//!
//! Two kinds of face exist: TrueType outlines loaded through `ab_glyph`, and
//! the built-in 8×8 bitmap face used when no font file is available. Both
//! rasterize into coverage values; coloring and blending are left to the
//! caller.

use super::provider::FontUnavailable;
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};

/// Padding added to measured text boxes, in pixels.
const MEASURE_PADDING: u32 = 2;
const BITMAP_CELL: u32 = 8;

#[derive(Clone)]
pub enum FontFace {
    Outline(FontArc),
    /// Built-in 8×8 bitmap glyphs, scaled by an integer factor
    Bitmap,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Outline(_) => f.write_str("Outline"),
            FontFace::Bitmap => f.write_str("Bitmap"),
        }
    }
}

impl FontFace {
    /// Parse TrueType/OpenType bytes.
    pub fn from_bytes(family: &str, bytes: Vec<u8>) -> Result<Self, FontUnavailable> {
        FontArc::try_from_vec(bytes)
            .map(FontFace::Outline)
            .map_err(|e| FontUnavailable::Invalid {
                family: family.to_string(),
                message: e.to_string(),
            })
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, FontFace::Bitmap)
    }

    /// Size of the box `text` occupies at `size` pixels, padding included.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        match self {
            FontFace::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                let mut width = 0.0f32;
                let mut prev: Option<GlyphId> = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = prev {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                (
                    width.ceil().max(0.0) as u32 + MEASURE_PADDING,
                    scaled.height().ceil().max(0.0) as u32 + MEASURE_PADDING,
                )
            }
            FontFace::Bitmap => {
                let cell = BITMAP_CELL * bitmap_scale(size);
                (
                    text.chars().count() as u32 * cell + MEASURE_PADDING,
                    cell + MEASURE_PADDING,
                )
            }
        }
    }

    /// Rasterize `text` with its box's top-left at `origin`.
    ///
    /// `plot(x, y, coverage)` receives every covered pixel, coverage in [0, 1].
    /// Coordinates may fall outside any target; callers clip.
    pub fn rasterize<F>(&self, text: &str, size: f32, origin: (f32, f32), mut plot: F)
    where
        F: FnMut(i32, i32, f32),
    {
        match self {
            FontFace::Outline(font) => {
                let scale = PxScale::from(size);
                let scaled = font.as_scaled(scale);
                let baseline_y = origin.1 + scaled.ascent();
                let mut cursor_x = origin.0;
                let mut prev: Option<GlyphId> = None;

                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = prev {
                        cursor_x += scaled.kern(prev, id);
                    }
                    let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|px, py, coverage| {
                            plot(
                                bounds.min.x as i32 + px as i32,
                                bounds.min.y as i32 + py as i32,
                                coverage,
                            );
                        });
                    }
                    cursor_x += scaled.h_advance(id);
                    prev = Some(id);
                }
            }
            FontFace::Bitmap => {
                let scale = bitmap_scale(size) as i32;
                let cell = BITMAP_CELL as i32 * scale;
                let (ox, oy) = (origin.0 as i32, origin.1 as i32);

                for (index, c) in text.chars().enumerate() {
                    let Some(rows) = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')) else {
                        continue;
                    };
                    let cell_x = ox + index as i32 * cell;
                    for (row, bits) in rows.iter().enumerate() {
                        for col in 0..BITMAP_CELL as i32 {
                            if (bits >> col) & 1 == 0 {
                                continue;
                            }
                            let base_x = cell_x + col * scale;
                            let base_y = oy + row as i32 * scale;
                            for dy in 0..scale {
                                for dx in 0..scale {
                                    plot(base_x + dx, base_y + dy, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Integer upscale factor for the 8×8 bitmap face.
fn bitmap_scale(size: f32) -> u32 {
    ((size / BITMAP_CELL as f32).round() as u32).max(1)
}
