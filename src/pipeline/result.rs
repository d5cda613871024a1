//! Render output and metadata.

use super::RenderStrategy;
use crate::analysis::SceneAnalysis;
use crate::exposure::ExposureReading;
use crate::pattern::{Pattern, PixelAnchor};
use crate::placement::{PlacementSpec, SizeClass};
use crate::request::ProtectionMode;
use crate::tier::{Downgrade, Tier};
use serde::Serialize;
use std::time::Duration;

/// Where the scene analysis used for a render came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Returned by the configured analysis service
    Service,
    /// The fixed default analysis, used when the service was unavailable
    Default,
}

/// One glyph layer composited onto the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerRecord {
    /// Top-left of the text box, in output pixels
    pub anchor_px: PixelAnchor,
    pub font_size: u32,
    pub color: String,
    pub opacity: f32,
    pub rotation: f32,
    pub shadow: bool,
    pub plate: bool,
    pub blur_sigma: Option<f32>,
}

/// Effective options after tier clamping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSettings {
    pub tier: Tier,
    pub position: String,
    pub size: SizeClass,
    pub opacity: f32,
    pub auto_opacity: bool,
    pub multiple_watermarks: bool,
    /// Only reported when multiple watermarks were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    /// Family actually used to draw the text
    pub font: String,
    pub font_fell_back: bool,
    pub color: String,
    pub shadow: bool,
    pub protection_mode: ProtectionMode,
    pub downgrades: Vec<Downgrade>,
}

/// Everything known about how a mark was produced.
#[derive(Debug, Clone, Serialize)]
pub struct RenderMetadata {
    pub strategy: RenderStrategy,
    pub placement: PlacementSpec,
    pub layers: Vec<LayerRecord>,
    pub anchors: Vec<PixelAnchor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_opacity_value: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure: Option<ExposureReading>,
    pub original_dimensions: (u32, u32),
    pub output_dimensions: (u32, u32),
    /// Milliseconds
    pub processing_time: u64,
    pub analysis_source: AnalysisSource,
    pub analysis: SceneAnalysis,
    pub custom_settings: ResolvedSettings,
}

impl RenderMetadata {
    pub fn builder(strategy: RenderStrategy, settings: ResolvedSettings) -> RenderMetadataBuilder {
        RenderMetadataBuilder::new(strategy, settings)
    }
}

/// Builder for [`RenderMetadata`].
#[derive(Debug)]
pub struct RenderMetadataBuilder {
    strategy: RenderStrategy,
    settings: ResolvedSettings,
    placement: Option<PlacementSpec>,
    layers: Vec<LayerRecord>,
    anchors: Vec<PixelAnchor>,
    exposure: Option<ExposureReading>,
    original_dimensions: (u32, u32),
    output_dimensions: (u32, u32),
    processing_time: Duration,
    analysis_source: AnalysisSource,
    analysis: Option<SceneAnalysis>,
}

impl RenderMetadataBuilder {
    fn new(strategy: RenderStrategy, settings: ResolvedSettings) -> Self {
        Self {
            strategy,
            settings,
            placement: None,
            layers: Vec::new(),
            anchors: Vec::new(),
            exposure: None,
            original_dimensions: (0, 0),
            output_dimensions: (0, 0),
            processing_time: Duration::ZERO,
            analysis_source: AnalysisSource::Default,
            analysis: None,
        }
    }

    pub fn placement(mut self, placement: PlacementSpec) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn layers(mut self, layers: Vec<LayerRecord>) -> Self {
        self.layers = layers;
        self
    }

    pub fn anchors(mut self, anchors: Vec<PixelAnchor>) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn exposure(mut self, exposure: Option<ExposureReading>) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn dimensions(mut self, original: (u32, u32), output: (u32, u32)) -> Self {
        self.original_dimensions = original;
        self.output_dimensions = output;
        self
    }

    pub fn processing_time(mut self, elapsed: Duration) -> Self {
        self.processing_time = elapsed;
        self
    }

    pub fn analysis(mut self, analysis: SceneAnalysis, source: AnalysisSource) -> Self {
        self.analysis = Some(analysis);
        self.analysis_source = source;
        self
    }

    pub fn build(self) -> RenderMetadata {
        let analysis = self.analysis.unwrap_or_default();
        let placement = self
            .placement
            .or_else(|| analysis.placement_suggestions.first().cloned())
            .unwrap_or_else(|| SceneAnalysis::default().placement_suggestions[0].clone());

        RenderMetadata {
            strategy: self.strategy,
            placement,
            layers: self.layers,
            anchors: self.anchors,
            auto_opacity_value: self.exposure.map(|e| e.opacity),
            exposure: self.exposure,
            original_dimensions: self.original_dimensions,
            output_dimensions: self.output_dimensions,
            processing_time: self.processing_time.as_millis() as u64,
            analysis_source: self.analysis_source,
            analysis,
            custom_settings: self.settings,
        }
    }
}

/// Encoded image plus its metadata.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub metadata: RenderMetadata,
}
