// Constants module - default values for configuration
//
// Section defaults used by `crate::config`. Rendering constants live beside
// the code that uses them (glyph, exposure, protection).

// =============================================================================
// Font defaults
// =============================================================================

/// Directory holding `<FamilyWithoutSpaces>.ttf` files
pub const DEFAULT_FONT_DIRECTORY: &str = "fonts";

/// Maximum number of loaded faces kept in memory
pub const DEFAULT_FONT_CACHE_ENTRIES: u64 = 32;

/// Time a loaded face stays cached, in seconds (1 hour)
pub const DEFAULT_FONT_CACHE_TTL_SECS: u64 = 3600;

// =============================================================================
// Scene analysis defaults
// =============================================================================

/// HTTP timeout for the scene analysis service, in seconds
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Logging defaults
// =============================================================================

/// Level used when `RUST_LOG` is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";
