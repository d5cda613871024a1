use anyhow::{anyhow, Context};
use clap::Parser;
use markforge::config::Config;
use markforge::font::DownloadingFontProvider;
use markforge::pattern::Pattern;
use markforge::pipeline::{OutputFormat, WatermarkPipeline};
use markforge::placement::{PositionMode, SizeClass};
use markforge::request::{ProtectionMode, RenderOptions};
use markforge::tier::Tier;
use std::path::{Path, PathBuf};

/// Markforge - tier-aware watermark compositor
#[derive(Parser, Debug)]
#[command(name = "markforge")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Download every registered font family into the font directory and exit
    #[arg(long)]
    fetch_fonts: bool,

    /// Watermark text (1-100 characters)
    #[arg(short, long, required_unless_present_any = ["test", "fetch_fonts"])]
    text: Option<String>,

    /// Caller tier: free, pro or elite
    #[arg(long, default_value = "free")]
    tier: Tier,

    /// Named anchor (e.g. bottom-right) or "auto"
    #[arg(long, default_value = "bottom-right")]
    position: PositionMode,

    /// small, medium or large
    #[arg(long, default_value = "medium")]
    size: SizeClass,

    /// Opacity between 0.1 and 1.0
    #[arg(long, default_value_t = 0.7)]
    opacity: f32,

    /// Derive opacity from image exposure
    #[arg(long)]
    auto_opacity: bool,

    /// Stamp the mark several times following --pattern
    #[arg(long)]
    multiple: bool,

    /// diagonal, grid or random
    #[arg(long, default_value = "diagonal")]
    pattern: Pattern,

    /// Font family
    #[arg(long)]
    font: Option<String>,

    /// Text color as #RRGGBB
    #[arg(long, default_value = "#FFFFFF")]
    color: String,

    /// Draw a drop shadow
    #[arg(long)]
    shadow: bool,

    /// standard, contextual or multilayer
    #[arg(long, default_value = "standard")]
    protection: ProtectionMode,

    /// Seed for the random pattern
    #[arg(long)]
    seed: Option<u64>,

    /// Write render metadata as JSON to this file
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Source image
    #[arg(required_unless_present_any = ["test", "fetch_fonts"])]
    input: Option<PathBuf>,

    /// Destination image (.png, or .jpg/.jpeg for JPEG output)
    #[arg(required_unless_present_any = ["test", "fetch_fonts"])]
    output: Option<PathBuf>,
}

impl Args {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            position: self.position,
            size: self.size,
            opacity: self.opacity,
            auto_opacity: self.auto_opacity,
            multiple: self.multiple,
            pattern: self.pattern,
            font: self.font.clone(),
            color: self.color.clone(),
            shadow: self.shadow,
            protection: self.protection,
            seed: self.seed,
        }
    }
}

fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;

    markforge::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    if args.test {
        tracing::info!(
            font_directory = %config.fonts.directory.display(),
            analysis_endpoint = config.analysis.endpoint.as_deref().unwrap_or("none"),
            "Configuration is valid"
        );
        return Ok(());
    }

    if args.fetch_fonts {
        let provider = DownloadingFontProvider::new(&config.fonts.directory)?;
        let available = provider.download_all().await;
        tracing::info!(
            directory = %config.fonts.directory.display(),
            available,
            "Font download finished"
        );
        return Ok(());
    }

    let (Some(text), Some(input), Some(output)) = (&args.text, &args.input, &args.output) else {
        return Err(anyhow!("--text, INPUT and OUTPUT are required"));
    };

    if is_jpeg_path(output) {
        config.output.format = OutputFormat::Jpeg;
    }

    let pipeline = WatermarkPipeline::from_config(&config).context("Failed to build pipeline")?;
    let options = args.render_options();
    pipeline.policy().authorize(args.tier, &options)?;

    let source = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let result = pipeline.render(&source, text, args.tier, &options).await?;

    tokio::fs::write(output, &result.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(path) = &args.metadata {
        let json = serde_json::to_vec_pretty(&result.metadata)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        strategy = %result.metadata.strategy,
        bytes = result.bytes.len(),
        "Watermark written"
    );

    Ok(())
}
