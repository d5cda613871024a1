//! Render request options and validation.

use crate::color::parse_hex;
use crate::error::CompositorError;
use crate::pattern::Pattern;
use crate::placement::{PositionMode, SizeClass, MAX_OPACITY, MIN_OPACITY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted watermark text, in characters.
pub const MAX_TEXT_CHARS: usize = 100;

/// Anti-removal protection requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionMode {
    #[default]
    Standard,
    /// Scene-aware integration, effective with `auto` position only
    Contextual,
    /// Primary mark plus a faint decoy layer
    Multilayer,
}

impl ProtectionMode {
    pub const VALID: &'static [&'static str] = &["standard", "contextual", "multilayer"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionMode::Standard => "standard",
            ProtectionMode::Contextual => "contextual",
            ProtectionMode::Multilayer => "multilayer",
        }
    }
}

impl fmt::Display for ProtectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtectionMode {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ProtectionMode::Standard),
            "contextual" => Ok(ProtectionMode::Contextual),
            "multilayer" => Ok(ProtectionMode::Multilayer),
            other => Err(CompositorError::UnsupportedOption {
                option: "protection_mode",
                value: other.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

/// Options of one render invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub position: PositionMode,
    pub size: SizeClass,
    /// [0.1, 1.0]
    pub opacity: f32,
    /// Derive opacity from image statistics instead of `opacity`
    pub auto_opacity: bool,
    /// Stamp the mark at every anchor of `pattern`
    pub multiple: bool,
    pub pattern: Pattern,
    /// Font family; `None` selects the configured default
    pub font: Option<String>,
    /// `#RRGGBB`
    pub color: String,
    pub shadow: bool,
    pub protection: ProtectionMode,
    /// Seed for the random pattern
    pub seed: Option<u64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            position: PositionMode::default(),
            size: SizeClass::Medium,
            opacity: 0.7,
            auto_opacity: false,
            multiple: false,
            pattern: Pattern::Diagonal,
            font: None,
            color: "#FFFFFF".to_string(),
            shadow: false,
            protection: ProtectionMode::Standard,
            seed: None,
        }
    }
}

impl RenderOptions {
    /// Check the options that are not already guaranteed by their types.
    pub fn validate(&self) -> Result<(), CompositorError> {
        parse_hex(&self.color)?;
        if !self.opacity.is_finite() || !(MIN_OPACITY..=MAX_OPACITY).contains(&self.opacity) {
            return Err(CompositorError::UnsupportedOption {
                option: "opacity",
                value: self.opacity.to_string(),
                valid: &["0.1 ..= 1.0"],
            });
        }
        Ok(())
    }
}

/// Trim and check the watermark text. Returns the trimmed text.
pub fn validate_text(text: &str) -> Result<&str, CompositorError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CompositorError::InvalidText(
            "watermark text must not be empty".to_string(),
        ));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(CompositorError::InvalidText(format!(
            "watermark text is {} characters, limit is {}",
            chars, MAX_TEXT_CHARS
        )));
    }
    Ok(trimmed)
}
