// Markforge watermark compositor library

pub mod analysis; // Scene analysis model and analyzers
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod exposure; // Auto opacity
pub mod font; // Font registry, providers and cache
pub mod glyph; // Text layers and compositing
pub mod logging;
pub mod pattern; // Multi-point layouts
pub mod pipeline;
pub mod placement;
pub mod request;
pub mod resolution; // Decoding, input limits, normalization
pub mod tier; // Capability policy

pub use error::CompositorError;
pub use pipeline::{RenderResult, RenderStrategy, WatermarkPipeline};
pub use request::RenderOptions;
pub use tier::Tier;
