//! Scene analysis service configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ANALYSIS_TIMEOUT_SECS;

fn default_timeout_seconds() -> u64 {
    DEFAULT_ANALYSIS_TIMEOUT_SECS
}

/// Where to send images for analysis. Without an endpoint every render uses
/// the default analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Sent as a bearer token. Usually `${ANALYSIS_API_KEY}`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}
