//! Font file providers.
//!
//! A provider turns a family name into a path to a TrueType file. Files live
//! in one directory as `<FamilyWithoutSpaces>.ttf`.

use super::registry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Smallest response body accepted as a font file.
pub const MIN_FONT_BYTES: usize = 1000;

/// Why a font family could not be provided.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FontUnavailable {
    #[error("font family '{0}' is not registered")]
    NotRegistered(String),

    #[error("font file for '{family}' not found at {path}")]
    NotFound { family: String, path: PathBuf },

    #[error("failed to download font '{family}': {message}")]
    Download { family: String, message: String },

    #[error("font file for '{family}' is not a valid font: {message}")]
    Invalid { family: String, message: String },

    #[error("font I/O error: {0}")]
    Io(String),
}

/// Locates the font file for a family.
#[async_trait]
pub trait FontProvider: Send + Sync {
    async fn locate(&self, family: &str) -> Result<PathBuf, FontUnavailable>;
}

/// Looks fonts up in a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryFontProvider {
    dir: PathBuf,
}

impl DirectoryFontProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, family: &str) -> PathBuf {
        self.dir.join(registry::file_name(family))
    }
}

#[async_trait]
impl FontProvider for DirectoryFontProvider {
    async fn locate(&self, family: &str) -> Result<PathBuf, FontUnavailable> {
        let path = self.path_for(family);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(FontUnavailable::NotFound {
                family: family.to_string(),
                path,
            }),
        }
    }
}

/// Directory lookup that downloads registered families on a miss.
///
/// The primary URL is tried before the fallback. Bodies are written to a
/// temporary file in the font directory and renamed into place, so a
/// concurrent reader never sees a partial file and concurrent downloads of
/// the same family simply overwrite each other.
#[derive(Debug, Clone)]
pub struct DownloadingFontProvider {
    local: DirectoryFontProvider,
    client: reqwest::Client,
}

impl DownloadingFontProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FontUnavailable> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("markforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FontUnavailable::Io(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            local: DirectoryFontProvider::new(dir),
            client,
        })
    }

    async fn fetch(&self, family: &str, url: &str) -> Result<Vec<u8>, FontUnavailable> {
        let download_error = |message: String| FontUnavailable::Download {
            family: family.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(format!("HTTP fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(download_error(format!(
                "HTTP request failed with status: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| download_error(format!("Failed to read HTTP body: {e}")))?;

        if body.len() <= MIN_FONT_BYTES {
            return Err(download_error(format!(
                "response of {} bytes is too small to be a font",
                body.len()
            )));
        }
        Ok(body.to_vec())
    }

    /// Download every registered family that is not present yet.
    ///
    /// Returns the number of families available afterwards.
    pub async fn download_all(&self) -> usize {
        let mut available = 0;
        for source in registry::FONT_SOURCES {
            match self.locate(source.family).await {
                Ok(_) => available += 1,
                Err(e) => warn!(family = source.family, error = %e, "Font unavailable"),
            }
        }
        available
    }
}

/// Write `bytes` to `target` through a uniquely named temp file.
pub(crate) async fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), FontUnavailable> {
    let io = |e: std::io::Error| FontUnavailable::Io(format!("{}: {}", target.display(), e));

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io)?;
    }

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{}.{:016x}.tmp", file_name, rand::random::<u64>()));

    tokio::fs::write(&temp, bytes).await.map_err(io)?;
    if let Err(e) = tokio::fs::rename(&temp, target).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(io(e));
    }
    Ok(())
}

#[async_trait]
impl FontProvider for DownloadingFontProvider {
    async fn locate(&self, family: &str) -> Result<PathBuf, FontUnavailable> {
        if let Ok(path) = self.local.locate(family).await {
            return Ok(path);
        }

        let source = registry::lookup(family)
            .ok_or_else(|| FontUnavailable::NotRegistered(family.to_string()))?;
        let target = self.local.path_for(family);

        let mut last_error = None;
        for url in source.urls() {
            debug!(family, url, "Downloading font");
            match self.fetch(family, url).await {
                Ok(bytes) => {
                    write_atomically(&target, &bytes).await?;
                    info!(family, bytes = bytes.len(), "Font downloaded");
                    return Ok(target);
                }
                Err(e) => {
                    warn!(family, url, error = %e, "Font download attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FontUnavailable::Download {
            family: family.to_string(),
            message: "no download URL".to_string(),
        }))
    }
}
