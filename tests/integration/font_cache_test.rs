// Font cache behaviour against a real font directory

use async_trait::async_trait;
use markforge::font::{
    DirectoryFontProvider, FontCache, FontCacheConfig, FontProvider, FontUnavailable,
    BITMAP_FACE_NAME,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/fonts/DejaVuSansMono.ttf"
);

/// Directory provider that counts how often a file is located.
struct CountingProvider {
    inner: DirectoryFontProvider,
    lookups: AtomicUsize,
}

impl CountingProvider {
    fn new(dir: &TempDir) -> Self {
        Self {
            inner: DirectoryFontProvider::new(dir.path()),
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FontProvider for CountingProvider {
    async fn locate(&self, family: &str) -> Result<PathBuf, FontUnavailable> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which concurrent misses can overlap
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.locate(family).await
    }
}

fn font_dir(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for file in files {
        std::fs::copy(FIXTURE, dir.path().join(file)).unwrap();
    }
    dir
}

#[tokio::test]
async fn test_concurrent_misses_load_once() {
    let dir = font_dir(&["Roboto.ttf"]);
    let provider = Arc::new(CountingProvider::new(&dir));
    let cache = FontCache::new(provider.clone(), FontCacheConfig::default());

    let lookups = (0..8).map(|_| {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get("Roboto").await })
    });
    for handle in lookups.collect::<Vec<_>>() {
        let face = handle.await.unwrap().unwrap();
        assert!(!face.is_bitmap());
    }

    assert_eq!(provider.lookups(), 1);
    cache.run_pending_tasks().await;
    assert_eq!(cache.entry_count(), 1);
}

#[tokio::test]
async fn test_failed_loads_are_not_cached() {
    let dir = font_dir(&[]);
    let provider = Arc::new(CountingProvider::new(&dir));
    let cache = FontCache::new(provider.clone(), FontCacheConfig::default());

    let err = cache.get("Lato").await.unwrap_err();
    assert!(matches!(*err, FontUnavailable::NotFound { .. }));

    // The file shows up later and the next lookup finds it
    std::fs::copy(FIXTURE, dir.path().join("Lato.ttf")).unwrap();
    assert!(cache.get("Lato").await.is_ok());
    assert_eq!(provider.lookups(), 2);
}

#[tokio::test]
async fn test_unknown_family_falls_back_to_default() {
    let dir = font_dir(&["Arial.ttf"]);
    let cache = FontCache::new(
        Arc::new(DirectoryFontProvider::new(dir.path())),
        FontCacheConfig::default(),
    );

    let resolved = cache.resolve(Some("Comic Sans"), "Arial").await;
    assert_eq!(resolved.family, "Arial");
    assert!(resolved.fell_back);
    assert!(!resolved.face.is_bitmap());

    let resolved = cache.resolve(None, "Arial").await;
    assert_eq!(resolved.family, "Arial");
    assert!(!resolved.fell_back);
}

#[tokio::test]
async fn test_missing_default_falls_back_to_bitmap() {
    let dir = font_dir(&[]);
    let cache = FontCache::new(
        Arc::new(DirectoryFontProvider::new(dir.path())),
        FontCacheConfig::default(),
    );

    let resolved = cache.resolve(Some("Roboto"), "Arial").await;
    assert_eq!(resolved.family, BITMAP_FACE_NAME);
    assert!(resolved.fell_back);
    assert!(resolved.face.is_bitmap());
}

#[tokio::test]
async fn test_corrupt_file_is_reported_invalid() {
    let dir = font_dir(&[]);
    std::fs::write(dir.path().join("Montserrat.ttf"), b"not a font at all").unwrap();
    let cache = FontCache::new(
        Arc::new(DirectoryFontProvider::new(dir.path())),
        FontCacheConfig::default(),
    );

    let err = cache.get("Montserrat").await.unwrap_err();
    assert!(matches!(*err, FontUnavailable::Invalid { .. }));
}

#[tokio::test]
async fn test_clear_forces_reload() {
    let dir = font_dir(&["Poppins.ttf"]);
    let provider = Arc::new(CountingProvider::new(&dir));
    let cache = FontCache::new(provider.clone(), FontCacheConfig::default());

    cache.get("Poppins").await.unwrap();
    cache.get("Poppins").await.unwrap();
    assert_eq!(provider.lookups(), 1);

    cache.clear().await;
    assert_eq!(cache.entry_count(), 0);

    cache.get("Poppins").await.unwrap();
    assert_eq!(provider.lookups(), 2);
}
