//! Engine configuration.
//!
//! The size floors below were tuned empirically against real camera output
//! in the system this engine serves; no documented rationale survives beyond
//! "observed to work", so they are surfaced as configuration instead of
//! constants. The config can be created programmatically or loaded from a
//! TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// One named output target: maximum bounding box plus encode quality.
///
/// Three are defined system-wide (`thumbnail`, `web`, `micro`); callers may
/// override the set through [`EngineConfig::renditions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    /// Rendition name, used in output file naming.
    pub name: String,
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// Maximum output height in pixels.
    pub max_height: u32,
    /// Encode quality (0-100).
    pub quality: u8,
}

impl RenditionSpec {
    pub fn new(name: &str, max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            name: name.to_string(),
            max_width,
            max_height,
            quality,
        }
    }
}

/// Configuration for the extraction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory all rendition paths are written under (and reported
    /// relative to).
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    /// Candidates shorter than this are treated as thumbnail-only artifacts
    /// during selection, unless nothing larger exists.
    #[serde(default = "default_min_candidate_bytes")]
    pub min_candidate_bytes: usize,

    /// A decoded preview whose longest edge clears this floor is accepted
    /// immediately during selection.
    #[serde(default = "default_min_preview_edge")]
    pub min_preview_edge: u32,

    /// Absolute dimension sanity floor applied by the final validation gate.
    /// Lower than `min_preview_edge`: a sub-preview-floor image can still be
    /// accepted as a last resort, a degenerate one cannot.
    #[serde(default = "default_min_valid_edge")]
    pub min_valid_edge: u32,

    /// The rendition set produced for every successfully extracted preview.
    #[serde(default = "default_renditions")]
    pub renditions: Vec<RenditionSpec>,

    /// Hard per-attempt timeout for extraction-style tool invocations.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Hard per-attempt timeout for full demosaic conversion, which is much
    /// slower than embedded-preview extraction.
    #[serde(default = "default_demosaic_timeout_secs")]
    pub demosaic_timeout_secs: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("renditions")
}

fn default_min_candidate_bytes() -> usize {
    16 * 1024
}

fn default_min_preview_edge() -> u32 {
    512
}

fn default_min_valid_edge() -> u32 {
    16
}

fn default_renditions() -> Vec<RenditionSpec> {
    vec![
        RenditionSpec::new("thumbnail", 320, 320, 80),
        RenditionSpec::new("web", 1600, 1600, 82),
        RenditionSpec::new("micro", 32, 32, 45),
    ]
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_demosaic_timeout_secs() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            min_candidate_bytes: default_min_candidate_bytes(),
            min_preview_edge: default_min_preview_edge(),
            min_valid_edge: default_min_valid_edge(),
            renditions: default_renditions(),
            tool_timeout_secs: default_tool_timeout_secs(),
            demosaic_timeout_secs: default_demosaic_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from a TOML string. Missing fields fall back to the
    /// defaults above.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| ExtractError::validation(format!("invalid engine config: {}", e)))
    }

    /// Load a config from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Look up a rendition spec by name.
    pub fn rendition(&self, name: &str) -> Option<&RenditionSpec> {
        self.renditions.iter().find(|r| r.name == name)
    }
}
