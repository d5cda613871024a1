//! Watermark pipeline.
//!
//! [`WatermarkPipeline::render`] turns source image bytes, watermark text,
//! a tier and render options into an encoded, marked image plus metadata:
//!
//! 1. validate the text, options and image header, clamp options to the tier
//! 2. ask the scene analyzer (falling back to the default analysis)
//! 3. resolve the font through the shared cache
//! 4. on the blocking pool: decode, normalize, auto exposure, placement,
//!    the selected [`RenderStrategy`], encode
//!
//! Only the analyzer and the font lookup are awaited; every pixel operation
//! runs inside `spawn_blocking`.

pub mod output;
pub mod protection;
pub mod result;

pub use output::{encode, OutputFormat, OutputSettings};
pub use protection::{ColorAdapter, MarkPlan, Marked, PassThroughAdapter};
pub use result::{AnalysisSource, LayerRecord, RenderMetadata, RenderResult, ResolvedSettings};

use crate::analysis::{analyzer_from_config, SceneAnalysis, SceneAnalyzer};
use crate::config::Config;
use crate::error::CompositorError;
use crate::exposure::{read_exposure, ExposureReading};
use crate::font::{
    DirectoryFontProvider, DownloadingFontProvider, FontCache, FontCacheConfig, FontFace,
    FontProvider,
};
use crate::pattern::PixelAnchor;
use crate::placement::{resolve_placement, IntegrationMethod, PlacementSpec, PlacementStyle, PositionMode};
use crate::request::{validate_text, ProtectionMode, RenderOptions};
use crate::resolution::{self, InputLimits};
use crate::tier::{CapabilityPolicy, ClampedOptions, Tier};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The rendering path chosen for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderStrategy {
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "multi-point")]
    MultiPoint,
    #[serde(rename = "contextual-graffiti")]
    ContextualGraffiti,
    #[serde(rename = "contextual-sign")]
    ContextualSign,
    #[serde(rename = "contextual-texture")]
    ContextualTexture,
    #[serde(rename = "contextual-overlay")]
    ContextualOverlay,
    #[serde(rename = "multilayer")]
    Multilayer,
}

impl RenderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStrategy::Standard => "standard",
            RenderStrategy::MultiPoint => "multi-point",
            RenderStrategy::ContextualGraffiti => "contextual-graffiti",
            RenderStrategy::ContextualSign => "contextual-sign",
            RenderStrategy::ContextualTexture => "contextual-texture",
            RenderStrategy::ContextualOverlay => "contextual-overlay",
            RenderStrategy::Multilayer => "multilayer",
        }
    }

    /// Pick the strategy for a request.
    ///
    /// Precedence: multilayer, then contextual (auto position only), then
    /// multi-point, then standard. `integration` is the method of the
    /// resolved placement and only matters for contextual renders.
    pub fn select(
        protection: ProtectionMode,
        position: PositionMode,
        multiple: bool,
        integration: IntegrationMethod,
    ) -> Self {
        match protection {
            ProtectionMode::Multilayer => RenderStrategy::Multilayer,
            ProtectionMode::Contextual if position == PositionMode::Auto => match integration {
                IntegrationMethod::Graffiti => RenderStrategy::ContextualGraffiti,
                IntegrationMethod::Sign => RenderStrategy::ContextualSign,
                IntegrationMethod::Texture => RenderStrategy::ContextualTexture,
                IntegrationMethod::Overlay => RenderStrategy::ContextualOverlay,
            },
            _ if multiple => RenderStrategy::MultiPoint,
            _ => RenderStrategy::Standard,
        }
    }
}

impl fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders watermarks. Cheap to share behind an `Arc`; the font cache is the
/// only state carried between renders.
#[derive(Clone)]
pub struct WatermarkPipeline {
    analyzer: Arc<dyn SceneAnalyzer>,
    fonts: FontCache,
    policy: CapabilityPolicy,
    limits: InputLimits,
    output: OutputSettings,
    color_adapter: Arc<dyn ColorAdapter>,
}

impl fmt::Debug for WatermarkPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatermarkPipeline")
            .field("fonts", &self.fonts)
            .field("policy", &self.policy)
            .field("limits", &self.limits)
            .field("output", &self.output)
            .finish()
    }
}

impl WatermarkPipeline {
    /// Pipeline with the default tier table, input limits and PNG output.
    pub fn new(analyzer: Arc<dyn SceneAnalyzer>, fonts: FontCache) -> Self {
        Self {
            analyzer,
            fonts,
            policy: CapabilityPolicy::default(),
            limits: InputLimits::default(),
            output: OutputSettings::default(),
            color_adapter: Arc::new(PassThroughAdapter),
        }
    }

    /// Build the pipeline and its collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self, CompositorError> {
        let analyzer = analyzer_from_config(&config.analysis)?;

        let provider: Arc<dyn FontProvider> = if config.fonts.download {
            Arc::new(
                DownloadingFontProvider::new(&config.fonts.directory)
                    .map_err(|e| CompositorError::Config(e.to_string()))?,
            )
        } else {
            Arc::new(DirectoryFontProvider::new(&config.fonts.directory))
        };
        let fonts = FontCache::new(
            provider,
            FontCacheConfig {
                max_entries: config.fonts.max_cache_entries,
                ttl: Duration::from_secs(config.fonts.cache_ttl_seconds),
            },
        );

        Ok(Self::new(analyzer, fonts)
            .with_policy(CapabilityPolicy::with_overrides(
                &config.tiers,
                &config.fonts.default_family,
            ))
            .with_limits(config.limits)
            .with_output(config.output.clone()))
    }

    pub fn with_policy(mut self, policy: CapabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: InputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_output(mut self, output: OutputSettings) -> Self {
        self.output = output;
        self
    }

    pub fn with_color_adapter(mut self, adapter: Arc<dyn ColorAdapter>) -> Self {
        self.color_adapter = adapter;
        self
    }

    pub fn policy(&self) -> &CapabilityPolicy {
        &self.policy
    }

    pub fn fonts(&self) -> &FontCache {
        &self.fonts
    }

    /// Render `text` onto `image` for `tier`.
    ///
    /// Options the tier is not entitled to are downgraded silently and listed
    /// in the metadata; call [`CapabilityPolicy::authorize`] first to reject
    /// them instead.
    pub async fn render(
        &self,
        image: &[u8],
        text: &str,
        tier: Tier,
        options: &RenderOptions,
    ) -> Result<RenderResult, CompositorError> {
        let started = Instant::now();

        let text = validate_text(text)?;
        options.validate()?;
        // Reject undecodable or oversized uploads before the analysis round-trip
        let dimensions = resolution::read_dimensions(image, &self.limits)?;
        debug!(width = dimensions.0, height = dimensions.1, "Accepted upload");

        let ClampedOptions { options, downgrades } = self.policy.clamp(tier, options);
        for downgrade in &downgrades {
            debug!(
                tier = %tier,
                option = downgrade.option,
                requested = %downgrade.requested,
                applied = %downgrade.applied,
                "Option downgraded for tier"
            );
        }

        let (analysis, analysis_source) = match self.analyzer.analyze(image, text).await {
            Ok(analysis) => (analysis, AnalysisSource::Service),
            Err(e) => {
                warn!(error = %e, "Scene analysis unavailable, using default analysis");
                (SceneAnalysis::default(), AnalysisSource::Default)
            }
        };

        let font = self
            .fonts
            .resolve(options.font.as_deref(), self.policy.default_font())
            .await;

        let integration = match options.position {
            PositionMode::Auto => analysis
                .placement_suggestions
                .first()
                .map(|s| s.integration_method)
                .unwrap_or_default(),
            PositionMode::Named(_) => IntegrationMethod::Overlay,
        };
        let strategy =
            RenderStrategy::select(options.protection, options.position, options.multiple, integration);

        let job = RenderJob {
            bytes: image.to_vec(),
            text: text.to_string(),
            options: options.clone(),
            analysis: analysis.clone(),
            face: font.face.clone(),
            max_resolution: self.policy.capabilities(tier).max_resolution,
            limits: self.limits,
            output: self.output.clone(),
            adapter: Arc::clone(&self.color_adapter),
            strategy,
        };
        let drawn = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| CompositorError::render_failure(strategy, format!("render task failed: {e}")))??;

        let settings = ResolvedSettings {
            tier,
            position: options.position.to_string(),
            size: options.size,
            opacity: options.opacity,
            auto_opacity: options.auto_opacity,
            multiple_watermarks: options.multiple,
            pattern: options.multiple.then_some(options.pattern),
            font: font.family,
            font_fell_back: font.fell_back,
            color: options.color.clone(),
            shadow: options.shadow,
            protection_mode: options.protection,
            downgrades,
        };

        let elapsed = started.elapsed();
        let metadata = RenderMetadata::builder(strategy, settings)
            .placement(drawn.placement)
            .layers(drawn.layers)
            .anchors(drawn.anchors)
            .exposure(drawn.exposure)
            .dimensions(drawn.original_dimensions, drawn.output_dimensions)
            .processing_time(elapsed)
            .analysis(analysis, analysis_source)
            .build();

        info!(
            tier = %tier,
            strategy = %strategy,
            layers = metadata.layers.len(),
            width = drawn.output_dimensions.0,
            height = drawn.output_dimensions.1,
            duration_ms = metadata.processing_time,
            "Watermark rendered"
        );

        Ok(RenderResult {
            bytes: drawn.bytes,
            content_type: self.output.format.content_type(),
            metadata,
        })
    }
}

/// Owned inputs of the CPU-bound part of a render.
struct RenderJob {
    bytes: Vec<u8>,
    text: String,
    options: RenderOptions,
    analysis: SceneAnalysis,
    face: FontFace,
    max_resolution: u32,
    limits: InputLimits,
    output: OutputSettings,
    adapter: Arc<dyn ColorAdapter>,
    strategy: RenderStrategy,
}

struct Drawn {
    bytes: Vec<u8>,
    placement: PlacementSpec,
    layers: Vec<LayerRecord>,
    anchors: Vec<PixelAnchor>,
    exposure: Option<ExposureReading>,
    original_dimensions: (u32, u32),
    output_dimensions: (u32, u32),
}

impl RenderJob {
    fn run(self) -> Result<Drawn, CompositorError> {
        let original = resolution::decode(&self.bytes, &self.limits)?;
        let original_dimensions = original.dimensions();
        let image = resolution::normalize(&original, self.max_resolution)?;
        if image.dimensions() != original_dimensions {
            debug!(
                from = ?original_dimensions,
                to = ?image.dimensions(),
                "Normalized source image"
            );
        }

        let style = PlacementStyle {
            color: self.options.color.clone(),
            opacity: self.options.opacity,
            size: self.options.size,
        };
        let mut placement = resolve_placement(self.options.position, &style, &self.analysis);

        let exposure = self
            .options
            .auto_opacity
            .then(|| read_exposure(&image, &self.analysis));
        if let Some(reading) = &exposure {
            debug!(
                brightness = reading.brightness,
                contrast = reading.contrast,
                opacity = reading.opacity,
                "Auto opacity computed"
            );
            placement.opacity = reading.opacity;
        }

        let plan = MarkPlan {
            text: &self.text,
            face: &self.face,
            placement: &placement,
            shadow: self.options.shadow,
            pattern: self.options.pattern,
            seed: self.options.seed,
            dominant_colors: &self.analysis.dominant_colors,
        };
        let marked = protection::apply(self.strategy, &image, &plan, self.adapter.as_ref())?;
        let output_dimensions = marked.image.dimensions();
        let bytes = output::encode(&marked.image, &self.output)?;

        Ok(Drawn {
            bytes,
            placement,
            layers: marked.layers,
            anchors: marked.anchors,
            exposure,
            original_dimensions,
            output_dimensions,
        })
    }
}
