//! Placement resolution.
//!
//! Converts a logical position (a named anchor or `auto`) into a
//! [`PlacementSpec`]: anchor fractions in percent of the image plus the
//! style attributes used to render the mark.
//!
//! # Anchors
//!
//! | name | x% | y% |
//! |---|---|---|
//! | top-left | 10 | 10 |
//! | top-center | 50 | 10 |
//! | top-right | 90 | 10 |
//! | left-center | 10 | 50 |
//! | center | 50 | 50 |
//! | right-center | 90 | 50 |
//! | bottom-left | 10 | 90 |
//! | bottom-center | 50 | 90 |
//! | bottom-right | 90 | 90 |

use crate::analysis::SceneAnalysis;
use crate::color::is_valid_hex;
use crate::error::CompositorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_OPACITY: f32 = 0.1;
pub const MAX_OPACITY: f32 = 1.0;
pub const MAX_ROTATION: f32 = 45.0;

/// Named anchor on the 3×3 placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    Center,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::LeftCenter,
        Anchor::Center,
        Anchor::RightCenter,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::LeftCenter => "left-center",
            Anchor::Center => "center",
            Anchor::RightCenter => "right-center",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }

    /// Anchor position as (x%, y%) of the image.
    pub fn fractions(&self) -> (f32, f32) {
        match self {
            Anchor::TopLeft => (10.0, 10.0),
            Anchor::TopCenter => (50.0, 10.0),
            Anchor::TopRight => (90.0, 10.0),
            Anchor::LeftCenter => (10.0, 50.0),
            Anchor::Center => (50.0, 50.0),
            Anchor::RightCenter => (90.0, 50.0),
            Anchor::BottomLeft => (10.0, 90.0),
            Anchor::BottomCenter => (50.0, 90.0),
            Anchor::BottomRight => (90.0, 90.0),
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Lenient lookup: unknown names resolve to bottom-right.
    pub fn lookup(name: &str) -> Self {
        Self::from_name(name).unwrap_or(Anchor::BottomRight)
    }
}

/// Where the caller wants the mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionMode {
    Named(Anchor),
    /// First-ranked scene analysis suggestion
    Auto,
}

impl PositionMode {
    pub const VALID: &'static [&'static str] = &[
        "top-left",
        "top-center",
        "top-right",
        "left-center",
        "center",
        "right-center",
        "bottom-left",
        "bottom-center",
        "bottom-right",
        "auto",
    ];
}

impl Default for PositionMode {
    fn default() -> Self {
        PositionMode::Named(Anchor::BottomRight)
    }
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionMode::Named(anchor) => f.write_str(anchor.as_str()),
            PositionMode::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for PositionMode {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            return Ok(PositionMode::Auto);
        }
        Anchor::from_name(s)
            .map(PositionMode::Named)
            .ok_or_else(|| CompositorError::UnsupportedOption {
                option: "position",
                value: s.to_string(),
                valid: Self::VALID,
            })
    }
}

/// Relative size of the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    #[default]
    Medium,
    Large,
}

impl SizeClass {
    pub const VALID: &'static [&'static str] = &["small", "medium", "large"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }

    /// Multiplier applied to the base font size.
    pub fn multiplier(&self) -> f32 {
        match self {
            SizeClass::Small => 0.7,
            SizeClass::Medium => 1.0,
            SizeClass::Large => 1.5,
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeClass {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(SizeClass::Small),
            "medium" => Ok(SizeClass::Medium),
            "large" => Ok(SizeClass::Large),
            other => Err(CompositorError::UnsupportedOption {
                option: "size",
                value: other.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

/// How a contextual mark blends into the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    #[default]
    Overlay,
    Graffiti,
    Sign,
    Texture,
}

impl IntegrationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationMethod::Overlay => "overlay",
            IntegrationMethod::Graffiti => "graffiti",
            IntegrationMethod::Sign => "sign",
            IntegrationMethod::Texture => "texture",
        }
    }

    /// Lenient parse used for analysis input; unknown values become overlay.
    pub fn lookup(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "graffiti" => IntegrationMethod::Graffiti,
            "sign" => IntegrationMethod::Sign,
            "texture" => IntegrationMethod::Texture,
            _ => IntegrationMethod::Overlay,
        }
    }
}

/// Resolved anchor plus style for one watermark instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Human-readable description of the location
    pub location: String,
    /// Anchor x in percent of image width, [0, 100]
    pub x: f32,
    /// Anchor y in percent of image height, [0, 100]
    pub y: f32,
    pub integration_method: IntegrationMethod,
    /// `#RRGGBB`
    pub color: String,
    /// [0.1, 1.0]
    pub opacity: f32,
    pub size: SizeClass,
    /// Degrees, [-45, 45]
    pub rotation: f32,
    #[serde(default)]
    pub reasoning: String,
}

impl PlacementSpec {
    /// Clamp every numeric field into its valid range and replace a malformed
    /// color with white. Non-finite numbers take the given fallbacks.
    pub fn sanitized(mut self) -> Self {
        self.x = clamp_finite(self.x, 0.0, 100.0, 90.0);
        self.y = clamp_finite(self.y, 0.0, 100.0, 90.0);
        self.opacity = clamp_finite(self.opacity, MIN_OPACITY, MAX_OPACITY, 0.7);
        self.rotation = clamp_finite(self.rotation, -MAX_ROTATION, MAX_ROTATION, 0.0);
        if !is_valid_hex(&self.color) {
            self.color = "#FFFFFF".to_string();
        }
        self
    }
}

fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Caller-chosen style used for named positions.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementStyle {
    pub color: String,
    pub opacity: f32,
    pub size: SizeClass,
}

impl Default for PlacementStyle {
    fn default() -> Self {
        Self {
            color: "#FFFFFF".to_string(),
            opacity: 0.7,
            size: SizeClass::Medium,
        }
    }
}

/// Build the placement for a named anchor with the caller's style.
pub fn named_placement(anchor: Anchor, style: &PlacementStyle) -> PlacementSpec {
    let (x, y) = anchor.fractions();
    PlacementSpec {
        location: anchor.as_str().to_string(),
        x,
        y,
        integration_method: IntegrationMethod::Overlay,
        color: style.color.clone(),
        opacity: style.opacity,
        size: style.size,
        rotation: 0.0,
        reasoning: "Caller-selected position".to_string(),
    }
    .sanitized()
}

/// Resolve a position into a placement.
///
/// `Auto` takes the first-ranked suggestion of `analysis` with its own style.
/// Tier gating for `Auto` happens upstream; this function resolves whatever it
/// is given. An empty suggestion list falls back to bottom-right.
pub fn resolve_placement(
    position: PositionMode,
    style: &PlacementStyle,
    analysis: &SceneAnalysis,
) -> PlacementSpec {
    match position {
        PositionMode::Named(anchor) => named_placement(anchor, style),
        PositionMode::Auto => match analysis.placement_suggestions.first() {
            Some(suggestion) => suggestion.clone().sanitized(),
            None => named_placement(Anchor::BottomRight, style),
        },
    }
}
