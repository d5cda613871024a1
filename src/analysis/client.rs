//! Scene analysis collaborators.
//!
//! The pipeline depends on [`SceneAnalyzer`] only. Any error it returns is
//! treated as "analysis unavailable" and replaced by the default analysis.

use super::SceneAnalysis;
use crate::config::AnalysisConfig;
use crate::error::CompositorError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why no analysis could be obtained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisUnavailable {
    #[error("no scene analysis service configured")]
    NotConfigured,

    #[error("scene analysis request failed: {0}")]
    Transport(String),

    #[error("scene analysis service returned status {0}")]
    Status(u16),

    #[error("scene analysis response could not be parsed: {0}")]
    Malformed(String),
}

/// Produces a scene analysis for an image and the text to be placed on it.
#[async_trait]
pub trait SceneAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &[u8],
        watermark_text: &str,
    ) -> Result<SceneAnalysis, AnalysisUnavailable>;
}

/// Analyzer used when no service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableAnalyzer;

#[async_trait]
impl SceneAnalyzer for UnavailableAnalyzer {
    async fn analyze(&self, _: &[u8], _: &str) -> Result<SceneAnalysis, AnalysisUnavailable> {
        Err(AnalysisUnavailable::NotConfigured)
    }
}

/// Returns a fixed analysis for every image.
#[derive(Debug, Clone)]
pub struct StaticAnalyzer {
    analysis: SceneAnalysis,
}

impl StaticAnalyzer {
    pub fn new(analysis: SceneAnalysis) -> Self {
        Self { analysis }
    }
}

#[async_trait]
impl SceneAnalyzer for StaticAnalyzer {
    async fn analyze(&self, _: &[u8], _: &str) -> Result<SceneAnalysis, AnalysisUnavailable> {
        Ok(self.analysis.clone())
    }
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    image_base64: String,
    watermark_text: &'a str,
}

/// Calls a remote analysis service over HTTP.
///
/// The service receives `{"image_base64": ..., "watermark_text": ...}` and may
/// answer with a JSON analysis or with text containing a fenced JSON block.
#[derive(Debug, Clone)]
pub struct HttpSceneAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpSceneAnalyzer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CompositorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompositorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SceneAnalyzer for HttpSceneAnalyzer {
    async fn analyze(
        &self,
        image: &[u8],
        watermark_text: &str,
    ) -> Result<SceneAnalysis, AnalysisUnavailable> {
        let body = AnalysisRequest {
            image_base64: STANDARD.encode(image),
            watermark_text,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalysisUnavailable::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisUnavailable::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AnalysisUnavailable::Transport(e.to_string()))?;

        SceneAnalysis::from_response_text(&text)
            .ok_or_else(|| AnalysisUnavailable::Malformed("no JSON document in response".into()))
    }
}

/// Build the analyzer described by `config`.
pub fn analyzer_from_config(
    config: &AnalysisConfig,
) -> Result<Arc<dyn SceneAnalyzer>, CompositorError> {
    match &config.endpoint {
        Some(endpoint) => Ok(Arc::new(HttpSceneAnalyzer::new(
            endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?)),
        None => Ok(Arc::new(UnavailableAnalyzer)),
    }
}
