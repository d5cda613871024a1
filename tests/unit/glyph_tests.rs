// Glyph compositor unit tests against a real TrueType face

use image::{Rgba, RgbaImage};
use markforge::color::Rgb;
use markforge::font::FontFace;
use markforge::glyph::{
    anchor_from_fractions, apply_overlay, composite, font_size, render_layer, stamp_overlay,
    GlyphStyle, EDGE_MARGIN,
};
use markforge::pattern::{grid, Canvas};
use markforge::placement::SizeClass;

const FIXTURE: &[u8] = include_bytes!("../fixtures/fonts/DejaVuSansMono.ttf");

fn face() -> FontFace {
    FontFace::from_bytes("DejaVu Sans Mono", FIXTURE.to_vec()).unwrap()
}

fn covered(image: &RgbaImage, x0: i32, y0: i32, w: u32, h: u32) -> usize {
    let mut count = 0;
    for y in y0.max(0)..(y0 + h as i32).min(image.height() as i32) {
        for x in x0.max(0)..(x0 + w as i32).min(image.width() as i32) {
            if image.get_pixel(x as u32, y as u32)[3] > 0 {
                count += 1;
            }
        }
    }
    count
}

#[test]
fn test_font_size_for_full_hd() {
    assert_eq!(font_size(1920, 1080, SizeClass::Small), 37);
    assert_eq!(font_size(1920, 1080, SizeClass::Medium), 54);
    assert_eq!(font_size(1920, 1080, SizeClass::Large), 81);
    assert_eq!(font_size(10, 10, SizeClass::Small), 1);
}

#[test]
fn test_anchors_respect_edge_margin() {
    let face = face();
    let style = GlyphStyle::new(Rgb::white(), 0.7, 24.0);
    let layer = render_layer(&face, "© markforge", &style).unwrap();

    for (w, h) in [(300u32, 200u32), (1920, 1080), (640, 1280)] {
        for (fx, fy) in [(0.0, 0.0), (100.0, 100.0), (0.0, 100.0), (50.0, 50.0)] {
            let anchor = anchor_from_fractions(fx, fy, (w, h), layer.text_box);
            assert!(anchor.x >= EDGE_MARGIN && anchor.y >= EDGE_MARGIN);
            assert!(anchor.x + layer.text_box.width as i32 <= w as i32 - EDGE_MARGIN);
            assert!(anchor.y + layer.text_box.height as i32 <= h as i32 - EDGE_MARGIN);
        }
    }
}

#[test]
fn test_composite_returns_new_image() {
    let face = face();
    let base = RgbaImage::from_pixel(320, 240, Rgba([30, 30, 30, 255]));
    let layer = render_layer(&face, "MARK", &GlyphStyle::new(Rgb::white(), 1.0, 32.0)).unwrap();

    let anchor = anchor_from_fractions(50.0, 50.0, base.dimensions(), layer.text_box);
    let marked = composite(&base, &layer, anchor);

    assert!(base.pixels().all(|p| *p == Rgba([30, 30, 30, 255])));
    let brightened = marked.pixels().filter(|p| p[0] > 200).count();
    assert!(brightened > 50, "only {brightened} bright pixels");
    // Output stays opaque
    assert!(marked.pixels().all(|p| p[3] == 255));
}

#[test]
fn test_overlay_stamps_every_grid_anchor() {
    let face = face();
    let layer = render_layer(&face, "WM", &GlyphStyle::new(Rgb::white(), 0.8, 20.0)).unwrap();
    let canvas = Canvas {
        width: 600,
        height: 400,
    };
    let anchors = grid(layer.text_box, canvas);
    let overlay = stamp_overlay((600, 400), &layer, &anchors);

    for anchor in &anchors {
        assert!(
            covered(&overlay, anchor.x, anchor.y, layer.text_box.width, layer.text_box.height) > 0,
            "nothing stamped at {anchor:?}"
        );
    }

    let base = RgbaImage::from_pixel(600, 400, Rgba([0, 0, 0, 255]));
    let marked = apply_overlay(&base, &overlay);
    assert_ne!(marked, base);
}

#[test]
fn test_shadow_darkens_below_right() {
    let face = face();
    let base = RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255]));
    let style = GlyphStyle {
        shadow: true,
        ..GlyphStyle::new(Rgb::white(), 1.0, 40.0)
    };
    let layer = render_layer(&face, "I", &style).unwrap();
    let anchor = anchor_from_fractions(50.0, 50.0, base.dimensions(), layer.text_box);
    let marked = composite(&base, &layer, anchor);

    // White text on white: only the black shadow can change anything
    assert!(marked.pixels().any(|p| p[0] < 255));
}
