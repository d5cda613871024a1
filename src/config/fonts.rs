//! Font configuration.
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_FONT_CACHE_ENTRIES, DEFAULT_FONT_CACHE_TTL_SECS, DEFAULT_FONT_DIRECTORY,
};
use crate::font::DEFAULT_FONT_FAMILY;

fn default_directory() -> PathBuf {
    PathBuf::from(DEFAULT_FONT_DIRECTORY)
}

fn default_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_max_cache_entries() -> u64 {
    DEFAULT_FONT_CACHE_ENTRIES
}

fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_FONT_CACHE_TTL_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontsConfig {
    /// Font file directory (default: ./fonts)
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Family used when none is requested or the requested one is unavailable
    #[serde(default = "default_family")]
    pub default_family: String,
    /// Download registered families that are missing from `directory`
    #[serde(default)]
    pub download: bool,
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: u64,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            default_family: default_family(),
            download: false,
            max_cache_entries: default_max_cache_entries(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}
