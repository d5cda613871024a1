// End-to-end render scenarios through WatermarkPipeline

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use markforge::analysis::{
    AnalysisUnavailable, SceneAnalysis, SceneAnalyzer, StaticAnalyzer, UnavailableAnalyzer,
};
use markforge::font::{DirectoryFontProvider, FontCache, FontCacheConfig, FontFace};
use markforge::glyph::{self, EDGE_MARGIN};
use markforge::pattern::Pattern;
use markforge::pipeline::{AnalysisSource, OutputFormat, OutputSettings};
use markforge::placement::{Anchor, IntegrationMethod, PositionMode, SizeClass};
use markforge::request::{ProtectionMode, RenderOptions};
use markforge::resolution::InputLimits;
use markforge::{CompositorError, RenderStrategy, Tier, WatermarkPipeline};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/fonts/DejaVuSansMono.ttf"
);

/// Analyzer whose service is always down.
struct FailingAnalyzer;

#[async_trait]
impl SceneAnalyzer for FailingAnalyzer {
    async fn analyze(&self, _: &[u8], _: &str) -> Result<SceneAnalysis, AnalysisUnavailable> {
        Err(AnalysisUnavailable::Transport("connection refused".to_string()))
    }
}

fn encode(image: RgbaImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn flat_png(width: u32, height: u32) -> Vec<u8> {
    encode(RgbaImage::from_pixel(width, height, Rgba([70, 90, 110, 255])))
}

/// Left half black, right half white.
fn split_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    encode(image)
}

/// Font directory holding the fixture face under the given family names.
fn font_dir(families: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for family in families {
        let file = format!("{}.ttf", family.replace(' ', ""));
        std::fs::copy(FIXTURE, dir.path().join(file)).unwrap();
    }
    dir
}

fn pipeline(analyzer: Arc<dyn SceneAnalyzer>, fonts: &TempDir) -> WatermarkPipeline {
    let provider = Arc::new(DirectoryFontProvider::new(fonts.path()));
    WatermarkPipeline::new(analyzer, FontCache::new(provider, FontCacheConfig::default()))
}

fn decode(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

fn analysis_with(integration: IntegrationMethod, x: f32, y: f32) -> SceneAnalysis {
    let mut analysis = SceneAnalysis::default();
    let first = &mut analysis.placement_suggestions[0];
    first.integration_method = integration;
    first.x = x;
    first.y = y;
    analysis
}

#[tokio::test]
async fn test_free_standard_bottom_right_without_analysis_service() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(UnavailableAnalyzer), &fonts);

    let result = pipeline
        .render(&flat_png(640, 480), "© 2024 Studio", Tier::Free, &RenderOptions::default())
        .await
        .unwrap();
    let meta = &result.metadata;

    assert_eq!(meta.analysis_source, AnalysisSource::Default);
    assert_eq!(meta.analysis, SceneAnalysis::default());
    assert_eq!(meta.strategy, RenderStrategy::Standard);
    assert_eq!((meta.placement.x, meta.placement.y), (90.0, 90.0));
    assert_eq!(meta.custom_settings.font, "Arial");
    assert!(!meta.custom_settings.font_fell_back);
    assert_eq!(meta.layers.len(), 1);
    assert!(!meta.layers[0].shadow);
    assert_eq!(meta.layers[0].color, "#FFFFFF");

    let marked = decode(&result.bytes);
    assert_eq!(marked.dimensions(), (640, 480));
    // Top-left quadrant untouched
    assert_eq!(marked.get_pixel(20, 20), &Rgba([70, 90, 110, 255]));

    let json = serde_json::to_value(meta).unwrap();
    assert_eq!(json["custom_settings"]["position"], "bottom-right");
    assert_eq!(json["analysis_source"], "default");
}

#[tokio::test]
async fn test_elite_multilayer_adds_decoy_layer() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(StaticAnalyzer::new(SceneAnalysis::default())), &fonts);
    let options = RenderOptions {
        protection: ProtectionMode::Multilayer,
        position: PositionMode::Named(Anchor::Center),
        color: "#102030".to_string(),
        opacity: 0.6,
        ..RenderOptions::default()
    };

    let result = pipeline
        .render(&flat_png(800, 600), "PROTECTED", Tier::Elite, &options)
        .await
        .unwrap();
    let meta = &result.metadata;

    assert_eq!(meta.strategy, RenderStrategy::Multilayer);
    assert_eq!(meta.analysis_source, AnalysisSource::Service);
    assert_eq!(meta.layers.len(), 2);

    let (primary, decoy) = (&meta.layers[0], &meta.layers[1]);
    assert!((decoy.opacity - primary.opacity * 0.3).abs() < 1e-6);
    assert_eq!(primary.color, "#102030");
    assert_eq!(decoy.color, "#2E3E4E");
    assert_eq!(primary.font_size, 30);
    assert_eq!(decoy.font_size, 27);
    assert_eq!(decoy.blur_sigma, Some(1.0));
}

#[tokio::test]
async fn test_failing_analyzer_falls_back_to_default_suggestion() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(FailingAnalyzer), &fonts);
    let options = RenderOptions {
        position: PositionMode::Auto,
        ..RenderOptions::default()
    };

    let result = pipeline
        .render(&flat_png(500, 500), "auto", Tier::Pro, &options)
        .await
        .unwrap();

    assert_eq!(result.metadata.analysis_source, AnalysisSource::Default);
    assert_eq!(result.metadata.placement.x, 80.0);
    assert_eq!(result.metadata.placement.y, 90.0);
}

#[tokio::test]
async fn test_contextual_graffiti_weathers_image() {
    let fonts = font_dir(&["Arial"]);
    let analyzer = StaticAnalyzer::new(analysis_with(IntegrationMethod::Graffiti, 75.0, 50.0));
    let pipeline = pipeline(Arc::new(analyzer), &fonts);
    let options = RenderOptions {
        position: PositionMode::Auto,
        protection: ProtectionMode::Contextual,
        ..RenderOptions::default()
    };

    let result = pipeline
        .render(&split_png(400, 300), "TAG", Tier::Pro, &options)
        .await
        .unwrap();

    assert_eq!(result.metadata.strategy, RenderStrategy::ContextualGraffiti);
    // Shadow is part of the graffiti look regardless of tier
    assert!(result.metadata.layers[0].shadow);

    let marked = decode(&result.bytes);
    let black = marked.get_pixel(5, 5);
    let white = marked.get_pixel(395, 295);
    assert!(black[0] > 0 && black[0] < 20, "black became {black:?}");
    assert!(white[0] < 255 && white[0] > 235, "white became {white:?}");
}

#[tokio::test]
async fn test_contextual_requires_auto_position() {
    let fonts = font_dir(&["Arial"]);
    let analyzer = StaticAnalyzer::new(analysis_with(IntegrationMethod::Sign, 50.0, 50.0));
    let pipeline = pipeline(Arc::new(analyzer), &fonts);
    let options = RenderOptions {
        protection: ProtectionMode::Contextual,
        ..RenderOptions::default()
    };

    let result = pipeline
        .render(&flat_png(300, 300), "mark", Tier::Elite, &options)
        .await
        .unwrap();
    assert_eq!(result.metadata.strategy, RenderStrategy::Standard);
}

#[tokio::test]
async fn test_grid_pattern_on_square_image() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(UnavailableAnalyzer), &fonts);
    let options = RenderOptions {
        multiple: true,
        pattern: Pattern::Grid,
        ..RenderOptions::default()
    };

    let result = pipeline
        .render(&flat_png(900, 900), "grid", Tier::Pro, &options)
        .await
        .unwrap();
    let meta = &result.metadata;

    assert_eq!(meta.strategy, RenderStrategy::MultiPoint);
    assert_eq!(meta.anchors.len(), 9);
    assert_eq!(meta.custom_settings.pattern, Some(Pattern::Grid));
    for anchor in &meta.anchors {
        assert!(anchor.x >= EDGE_MARGIN && anchor.y >= EDGE_MARGIN);
        assert!(anchor.x < 900 && anchor.y < 900);
    }
}

#[tokio::test]
async fn test_seeded_random_pattern_is_reproducible() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(UnavailableAnalyzer), &fonts);
    let options = RenderOptions {
        multiple: true,
        pattern: Pattern::Random,
        seed: Some(42),
        ..RenderOptions::default()
    };
    let source = flat_png(600, 400);

    let first = pipeline.render(&source, "rnd", Tier::Pro, &options).await.unwrap();
    let second = pipeline.render(&source, "rnd", Tier::Pro, &options).await.unwrap();

    assert!(!first.metadata.anchors.is_empty() && first.metadata.anchors.len() <= 7);
    assert_eq!(first.metadata.anchors, second.metadata.anchors);
    assert_eq!(first.bytes, second.bytes);
}

#[tokio::test]
async fn test_random_pattern_anchors_stay_apart_after_margin() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(UnavailableAnalyzer), &fonts);
    let source = flat_png(600, 400);

    let face = FontFace::from_bytes("Arial", std::fs::read(FIXTURE).unwrap()).unwrap();
    let font_size = glyph::font_size(600, 400, SizeClass::Medium);
    let text_box = glyph::measure(&face, "spread", font_size as f32);
    let min_distance = text_box.width.max(text_box.height) as f64 * 1.5;

    for seed in [1, 2, 3, 17, 99, 1234] {
        let options = RenderOptions {
            multiple: true,
            pattern: Pattern::Random,
            seed: Some(seed),
            ..RenderOptions::default()
        };
        let result = pipeline.render(&source, "spread", Tier::Pro, &options).await.unwrap();
        let anchors = &result.metadata.anchors;
        assert!(!anchors.is_empty());

        for (i, a) in anchors.iter().enumerate() {
            assert!(a.x >= EDGE_MARGIN && a.y >= EDGE_MARGIN, "seed {seed}: {a:?}");
            for b in &anchors[i + 1..] {
                let distance = (((a.x - b.x) as f64).powi(2) + ((a.y - b.y) as f64).powi(2)).sqrt();
                assert!(
                    distance >= min_distance,
                    "seed {seed}: {a:?} and {b:?} are {distance:.2} apart"
                );
            }
        }
    }
}

#[tokio::test]
async fn test_jpeg_output() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(UnavailableAnalyzer), &fonts).with_output(OutputSettings {
        format: OutputFormat::Jpeg,
        jpeg_quality: 85,
    });

    let result = pipeline
        .render(&flat_png(320, 240), "jpeg", Tier::Free, &RenderOptions::default())
        .await
        .unwrap();

    assert_eq!(result.content_type, "image/jpeg");
    assert_eq!(&result.bytes[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_oversized_input_is_rejected() {
    let fonts = font_dir(&["Arial"]);
    let pipeline = pipeline(Arc::new(UnavailableAnalyzer), &fonts).with_limits(InputLimits {
        max_input_bytes: 64,
        max_input_pixels: 100_000_000,
    });

    let err = pipeline
        .render(&flat_png(320, 240), "big", Tier::Elite, &RenderOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CompositorError::InvalidImage(_)));
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn test_concurrent_renders_share_font_cache() {
    let fonts = font_dir(&["Arial", "Roboto"]);
    let pipeline = Arc::new(pipeline(Arc::new(UnavailableAnalyzer), &fonts));
    let options = RenderOptions {
        font: Some("Roboto".to_string()),
        ..RenderOptions::default()
    };
    let source = flat_png(300, 200);

    let renders = (0..4).map(|i| {
        let pipeline = Arc::clone(&pipeline);
        let options = options.clone();
        let source = source.clone();
        tokio::spawn(async move {
            pipeline
                .render(&source, &format!("copy {i}"), Tier::Pro, &options)
                .await
        })
    });

    for handle in renders.collect::<Vec<_>>() {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.metadata.custom_settings.font, "Roboto");
    }

    pipeline.fonts().run_pending_tasks().await;
    assert_eq!(pipeline.fonts().entry_count(), 1);
}
