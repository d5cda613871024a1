// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::CompositorError;
use crate::font::registry;
use crate::pipeline::OutputSettings;
use crate::resolution::InputLimits;
use crate::tier::{Tier, TierOverride};

pub mod analysis;
pub mod fonts;
pub mod logging;

pub use analysis::AnalysisConfig;
pub use fonts::FontsConfig;
pub use logging::{LogFormat, LoggingConfig};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fonts: FontsConfig,
    pub analysis: AnalysisConfig,
    pub limits: InputLimits,
    /// Per-tier capability overrides on top of the built-in table
    pub tiers: HashMap<Tier, TierOverride>,
    pub output: OutputSettings,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, CompositorError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| CompositorError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                CompositorError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| CompositorError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CompositorError> {
        let yaml = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CompositorError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), CompositorError> {
        let invalid = |message: String| Err(CompositorError::Config(message));

        if self.fonts.default_family.trim().is_empty() {
            return invalid("fonts.default_family cannot be empty".to_string());
        }
        if self.fonts.max_cache_entries == 0 {
            return invalid("fonts.max_cache_entries must be greater than 0".to_string());
        }
        if self.fonts.cache_ttl_seconds == 0 {
            return invalid("fonts.cache_ttl_seconds must be greater than 0".to_string());
        }

        if let Some(endpoint) = &self.analysis.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return invalid(format!(
                    "analysis.endpoint '{}' must be an http:// or https:// URL",
                    endpoint
                ));
            }
        }
        if self.analysis.timeout_seconds == 0 {
            return invalid("analysis.timeout_seconds must be greater than 0".to_string());
        }

        if self.limits.max_input_bytes == 0 || self.limits.max_input_pixels == 0 {
            return invalid("limits must be greater than 0".to_string());
        }

        for (tier, tier_override) in &self.tiers {
            if tier_override.max_resolution == Some(0) {
                return invalid(format!("tiers.{}.max_resolution must be greater than 0", tier));
            }
            for family in tier_override.allowed_fonts.iter().flatten() {
                if !registry::is_registered(family) {
                    return invalid(format!(
                        "tiers.{}.allowed_fonts contains unregistered family '{}'",
                        tier, family
                    ));
                }
            }
        }

        if !(1..=100).contains(&self.output.jpeg_quality) {
            return invalid(format!(
                "output.jpeg_quality must be between 1 and 100, got {}",
                self.output.jpeg_quality
            ));
        }

        tracing_subscriber::EnvFilter::try_new(&self.logging.level).map_err(|e| {
            CompositorError::Config(format!(
                "logging.level '{}' is not a valid filter: {}",
                self.logging.level, e
            ))
        })?;

        Ok(())
    }
}
