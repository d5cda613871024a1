//! Subscription tiers and the capability policy table.
//!
//! Every tier-dependent decision is made here, once per render:
//!
//! - [`CapabilityPolicy::authorize`] rejects capability-gated features
//!   (auto position, multilayer protection). Callers run it before the core.
//! - [`CapabilityPolicy::clamp`] silently downgrades cosmetic options (font,
//!   shadow, color) and defensively re-clamps gated ones, so a caller that
//!   skipped `authorize` still cannot produce tier-violating output.

use crate::error::CompositorError;
use crate::font::registry::{BASE_FONTS, ELITE_FONTS, PRO_FONTS};
use crate::placement::{Anchor, PositionMode};
use crate::request::{ProtectionMode, RenderOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Subscription level of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Elite,
}

impl Tier {
    pub const VALID: &'static [&'static str] = &["free", "pro", "elite"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Elite => "elite",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "elite" => Ok(Tier::Elite),
            other => Err(CompositorError::UnsupportedOption {
                option: "tier",
                value: other.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

/// What a single tier is entitled to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCapabilities {
    /// Longest edge, in pixels, of the rendered image
    pub max_resolution: u32,
    /// Font families the tier may request. The default family is always allowed.
    pub allowed_fonts: Vec<String>,
    pub allow_auto_position: bool,
    pub allow_multilayer: bool,
    pub allow_shadow: bool,
    pub allow_custom_color: bool,
}

impl TierCapabilities {
    pub fn free() -> Self {
        Self {
            max_resolution: 720,
            allowed_fonts: Vec::new(),
            allow_auto_position: false,
            allow_multilayer: false,
            allow_shadow: false,
            allow_custom_color: false,
        }
    }

    pub fn pro() -> Self {
        Self {
            max_resolution: 1080,
            allowed_fonts: BASE_FONTS
                .iter()
                .chain(PRO_FONTS)
                .map(|f| f.to_string())
                .collect(),
            allow_auto_position: true,
            allow_multilayer: true,
            allow_shadow: false,
            allow_custom_color: true,
        }
    }

    pub fn elite() -> Self {
        Self {
            max_resolution: 2160,
            allowed_fonts: BASE_FONTS
                .iter()
                .chain(PRO_FONTS)
                .chain(ELITE_FONTS)
                .map(|f| f.to_string())
                .collect(),
            allow_auto_position: true,
            allow_multilayer: true,
            allow_shadow: true,
            allow_custom_color: true,
        }
    }

    pub fn allows_font(&self, family: &str) -> bool {
        self.allowed_fonts.iter().any(|f| f == family)
    }
}

/// Partial override of a tier's capabilities, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_resolution: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_fonts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_auto_position: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_multilayer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_shadow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_custom_color: Option<bool>,
}

impl TierOverride {
    fn apply(&self, caps: &mut TierCapabilities) {
        if let Some(v) = self.max_resolution {
            caps.max_resolution = v;
        }
        if let Some(v) = &self.allowed_fonts {
            caps.allowed_fonts = v.clone();
        }
        if let Some(v) = self.allow_auto_position {
            caps.allow_auto_position = v;
        }
        if let Some(v) = self.allow_multilayer {
            caps.allow_multilayer = v;
        }
        if let Some(v) = self.allow_shadow {
            caps.allow_shadow = v;
        }
        if let Some(v) = self.allow_custom_color {
            caps.allow_custom_color = v;
        }
    }
}

/// An option that was silently changed because of the caller's tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Downgrade {
    pub option: &'static str,
    pub requested: String,
    pub applied: String,
}

/// Options after tier clamping, with a record of what changed.
#[derive(Debug, Clone)]
pub struct ClampedOptions {
    pub options: RenderOptions,
    pub downgrades: Vec<Downgrade>,
}

/// The tier → capabilities table.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityPolicy {
    free: TierCapabilities,
    pro: TierCapabilities,
    elite: TierCapabilities,
    default_font: String,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self {
            free: TierCapabilities::free(),
            pro: TierCapabilities::pro(),
            elite: TierCapabilities::elite(),
            default_font: crate::font::DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

impl CapabilityPolicy {
    /// Build the default table with per-tier overrides applied.
    pub fn with_overrides(overrides: &HashMap<Tier, TierOverride>, default_font: &str) -> Self {
        let mut policy = Self {
            default_font: default_font.to_string(),
            ..Self::default()
        };
        for (tier, o) in overrides {
            o.apply(policy.capabilities_mut(*tier));
        }
        policy
    }

    pub fn capabilities(&self, tier: Tier) -> &TierCapabilities {
        match tier {
            Tier::Free => &self.free,
            Tier::Pro => &self.pro,
            Tier::Elite => &self.elite,
        }
    }

    fn capabilities_mut(&mut self, tier: Tier) -> &mut TierCapabilities {
        match tier {
            Tier::Free => &mut self.free,
            Tier::Pro => &mut self.pro,
            Tier::Elite => &mut self.elite,
        }
    }

    pub fn default_font(&self) -> &str {
        &self.default_font
    }

    /// Reject capability-gated features the tier is not entitled to.
    pub fn authorize(&self, tier: Tier, options: &RenderOptions) -> Result<(), CompositorError> {
        let caps = self.capabilities(tier);

        if options.protection == ProtectionMode::Multilayer && !caps.allow_multilayer {
            return Err(CompositorError::TierRestricted {
                tier,
                feature: "multilayer protection",
            });
        }
        if options.position == PositionMode::Auto && !caps.allow_auto_position {
            return Err(CompositorError::TierRestricted {
                tier,
                feature: "auto positioning",
            });
        }
        Ok(())
    }

    /// Downgrade everything the tier is not entitled to.
    pub fn clamp(&self, tier: Tier, options: &RenderOptions) -> ClampedOptions {
        let caps = self.capabilities(tier);
        let mut clamped = options.clone();
        let mut downgrades = Vec::new();

        if let Some(family) = &options.font {
            if family != &self.default_font && !caps.allows_font(family) {
                downgrades.push(Downgrade {
                    option: "font",
                    requested: family.clone(),
                    applied: self.default_font.clone(),
                });
                clamped.font = None;
            }
        }

        if options.shadow && !caps.allow_shadow {
            downgrades.push(Downgrade {
                option: "shadow",
                requested: "true".to_string(),
                applied: "false".to_string(),
            });
            clamped.shadow = false;
        }

        if !caps.allow_custom_color && !options.color.eq_ignore_ascii_case("#FFFFFF") {
            downgrades.push(Downgrade {
                option: "color",
                requested: options.color.clone(),
                applied: "#FFFFFF".to_string(),
            });
            clamped.color = "#FFFFFF".to_string();
        }

        if options.position == PositionMode::Auto && !caps.allow_auto_position {
            let fallback = PositionMode::Named(Anchor::BottomRight);
            downgrades.push(Downgrade {
                option: "position",
                requested: options.position.to_string(),
                applied: fallback.to_string(),
            });
            clamped.position = fallback;
        }

        if options.protection == ProtectionMode::Multilayer && !caps.allow_multilayer {
            downgrades.push(Downgrade {
                option: "protection_mode",
                requested: options.protection.to_string(),
                applied: ProtectionMode::Standard.to_string(),
            });
            clamped.protection = ProtectionMode::Standard;
        }

        ClampedOptions {
            options: clamped,
            downgrades,
        }
    }
}
