//! Font acquisition and caching.
//!
//! - [`registry`]: the registered families and their download sources
//! - [`provider`]: family name → font file path
//! - [`face`]: loaded faces (outline or built-in bitmap) and rasterization
//! - [`cache`]: shared read-through cache with a never-failing `resolve`

pub mod cache;
pub mod face;
pub mod provider;
pub mod registry;

pub use cache::{FontCache, FontCacheConfig, ResolvedFont, BITMAP_FACE_NAME};
pub use face::FontFace;
pub use provider::{DirectoryFontProvider, DownloadingFontProvider, FontProvider, FontUnavailable};

/// Family used when none is requested or the requested one is unavailable.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
