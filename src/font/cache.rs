//! Read-through font cache.
//!
//! Faces are cached per family with LRU eviction and a TTL. Concurrent first
//! lookups of the same family share a single load; failed loads are not
//! cached, so a font that appears later is picked up on the next request.

use super::face::FontFace;
use super::provider::{FontProvider, FontUnavailable};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Name reported for the built-in bitmap face.
pub const BITMAP_FACE_NAME: &str = "builtin-bitmap";

#[derive(Debug, Clone)]
pub struct FontCacheConfig {
    pub max_entries: u64,
    pub ttl: Duration,
}

impl Default for FontCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 32,
            ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

/// The face chosen for a render and how it was reached.
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    /// Family actually used, or [`BITMAP_FACE_NAME`]
    pub family: String,
    pub face: FontFace,
    /// Whether the requested family had to be replaced
    pub fell_back: bool,
}

/// Shared handle to the font cache. Cloning is cheap.
#[derive(Clone)]
pub struct FontCache {
    provider: Arc<dyn FontProvider>,
    faces: Cache<String, FontFace>,
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("entries", &self.faces.entry_count())
            .finish()
    }
}

impl FontCache {
    pub fn new(provider: Arc<dyn FontProvider>, config: FontCacheConfig) -> Self {
        let faces = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { provider, faces }
    }

    /// Load `family`, from cache when possible.
    pub async fn get(&self, family: &str) -> Result<FontFace, Arc<FontUnavailable>> {
        let provider = Arc::clone(&self.provider);
        let name = family.to_string();

        self.faces
            .try_get_with(family.to_string(), async move {
                let path = provider.locate(&name).await?;
                debug!(family = %name, path = %path.display(), "Loading font");
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| FontUnavailable::Io(format!("{}: {}", path.display(), e)))?;
                FontFace::from_bytes(&name, bytes)
            })
            .await
    }

    /// Resolve a face, never failing.
    ///
    /// Tries `requested`, then `default_family`, then the built-in bitmap face.
    pub async fn resolve(&self, requested: Option<&str>, default_family: &str) -> ResolvedFont {
        let requested = requested.filter(|f| !f.is_empty());

        if let Some(family) = requested.filter(|f| *f != default_family) {
            match self.get(family).await {
                Ok(face) => {
                    return ResolvedFont {
                        family: family.to_string(),
                        face,
                        fell_back: false,
                    }
                }
                Err(e) => warn!(family, error = %e, "Requested font unavailable, using default"),
            }
        }

        match self.get(default_family).await {
            Ok(face) => ResolvedFont {
                family: default_family.to_string(),
                face,
                fell_back: requested.is_some_and(|f| f != default_family),
            },
            Err(e) => {
                warn!(
                    family = default_family,
                    error = %e,
                    "Default font unavailable, using built-in bitmap face"
                );
                ResolvedFont {
                    family: BITMAP_FACE_NAME.to_string(),
                    face: FontFace::Bitmap,
                    fell_back: true,
                }
            }
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.faces.entry_count()
    }

    /// Flush pending cache maintenance so `entry_count` is current.
    pub async fn run_pending_tasks(&self) {
        self.faces.run_pending_tasks().await;
    }

    pub async fn clear(&self) {
        self.faces.invalidate_all();
        self.faces.run_pending_tasks().await;
    }
}
