//! Compositor error types.
//!
//! Pure components (color codec, placement, exposure, pattern layout) raise
//! precisely-typed errors on invalid input. The pipeline only swallows scene
//! analysis unavailability; everything else reaches the caller.

use crate::pipeline::RenderStrategy;
use crate::tier::Tier;
use thiserror::Error;

/// Errors surfaced by a render invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositorError {
    /// Undecodable bytes, zero dimensions or input exceeding configured limits
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Color string is not in `#RRGGBB` form
    #[error("Invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// Watermark text is empty or too long
    #[error("Invalid watermark text: {0}")]
    InvalidText(String),

    /// An option value outside its enumerated set
    #[error("Unsupported {option} '{value}'. Must be one of: {}", .valid.join(", "))]
    UnsupportedOption {
        option: &'static str,
        value: String,
        valid: &'static [&'static str],
    },

    /// Capability-gated feature requested by a tier not entitled to it
    #[error("{feature} is not available on the {tier} tier")]
    TierRestricted { tier: Tier, feature: &'static str },

    /// A compositing or pattern step failed inside a rendering pass
    #[error("Rendering failed in {strategy} pass: {message}")]
    RenderFailure {
        strategy: RenderStrategy,
        message: String,
    },

    /// Output encoding failed
    #[error("Failed to encode output image: {0}")]
    Encode(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CompositorError {
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    pub fn render_failure(strategy: RenderStrategy, message: impl Into<String>) -> Self {
        Self::RenderFailure {
            strategy,
            message: message.into(),
        }
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }

    /// HTTP status a web layer should map this error to.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidImage(_)
            | Self::InvalidColor(_)
            | Self::InvalidText(_)
            | Self::UnsupportedOption { .. } => 400,
            Self::TierRestricted { .. } => 403,
            Self::RenderFailure { .. } | Self::Encode(_) | Self::Config(_) => 500,
        }
    }
}
