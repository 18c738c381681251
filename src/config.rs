//! Watermark configuration module.
//!
//! Handles loading, validating, and merging the `tilemark.toml` file. Stock
//! defaults are serialized to a TOML value, the user file is merged on top
//! key by key, and the result is deserialized and validated. A missing file
//! yields the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [label]
//! template = "#{code}"                 # {code} is replaced with the resolved code
//! fonts = ["arial.ttf", "times.ttf"]   # Tried in order, then the built-in font
//! size_ratio = 0.025                   # Point size as a fraction of the image diagonal
//! font_dirs = []                       # Searched before the system font directories
//!
//! [tiles]
//! pad = 50                             # Gap between tiles, in pixels
//! coverage = "edge-aligned"            # or "expanded"
//!
//! [overlay]
//! alpha = 30                           # Shared by both passes (0-255)
//! passes = [
//!   { dx = 0, dy = 0, fill = [128, 128, 128] },
//!   { dx = 2, dy = 2, fill = [64, 64, 64] },
//! ]
//!
//! [output]
//! quality = 95                         # JPEG quality (1-100)
//! suffix = "_watermark"                # photo.png -> photo_watermark.jpg
//!
//! [batch]
//! size_ratio = 0.04                    # Replaces label.size_ratio for `tilemark batch`
//! coverage = "expanded"                # Replaces tiles.coverage for `tilemark batch`
//!
//! [processing]
//! max_processes = 4                    # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! `tilemark batch` takes its size ratio and coverage from `[batch]`, which
//! defaults to a larger label over the expanded grid.
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [label]
//! template = "@studio #{code}"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CoveragePolicy, Pass, Quality, WatermarkSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "tilemark.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `tilemark.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Label text, fonts and sizing.
    pub label: LabelConfig,
    /// Tile spacing and coverage.
    pub tiles: TilesConfig,
    /// Alpha and draw passes.
    pub overlay: OverlayConfig,
    /// Encoding and output naming.
    pub output: OutputConfig,
    /// Sizing and coverage used by `tilemark batch`.
    pub batch: BatchConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl WatermarkConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, ratio) in [
            ("label.size_ratio", self.label.size_ratio),
            ("batch.size_ratio", self.batch.size_ratio),
        ] {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a positive number"
                )));
            }
        }
        if !self.label.template.contains("{code}") {
            return Err(ConfigError::Validation(
                "label.template must contain {code}".into(),
            ));
        }
        if self.overlay.passes.len() != 2 {
            return Err(ConfigError::Validation(format!(
                "overlay.passes must have exactly 2 entries, got {}",
                self.overlay.passes.len()
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.output.suffix.is_empty() {
            return Err(ConfigError::Validation(
                "output.suffix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The engine parameters described by this config.
    pub fn to_spec(&self) -> WatermarkSpec {
        WatermarkSpec {
            label_template: self.label.template.clone(),
            font_chain: self.label.fonts.clone(),
            size_ratio: self.label.size_ratio,
            pad_px: self.tiles.pad,
            coverage: self.tiles.coverage,
            alpha: self.overlay.alpha,
            passes: self.overlay.passes.clone(),
            quality: Quality::new(self.output.quality),
        }
    }

    /// Engine parameters for `tilemark batch`: [`Self::to_spec`] with the
    /// `[batch]` size ratio and coverage.
    pub fn to_batch_spec(&self) -> WatermarkSpec {
        WatermarkSpec {
            size_ratio: self.batch.size_ratio,
            coverage: self.batch.coverage,
            ..self.to_spec()
        }
    }
}

/// Label text, fonts and sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelConfig {
    pub template: String,
    /// Font names or paths, tried in order.
    pub fonts: Vec<String>,
    pub size_ratio: f64,
    /// Extra font directories, searched before the system ones.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let spec = WatermarkSpec::default();
        Self {
            template: spec.label_template,
            fonts: spec.font_chain,
            size_ratio: spec.size_ratio,
            font_dirs: Vec::new(),
        }
    }
}

/// Tile spacing and coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TilesConfig {
    pub pad: u32,
    pub coverage: CoveragePolicy,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            pad: 50,
            coverage: CoveragePolicy::EdgeAligned,
        }
    }
}

/// Alpha and draw passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub alpha: u8,
    pub passes: Vec<Pass>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            alpha: 30,
            passes: vec![Pass::light(), Pass::shadow()],
        }
    }
}

/// Encoding and output naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub quality: u32,
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            suffix: "_watermark".to_string(),
        }
    }
}

/// Sizing and coverage used by `tilemark batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub size_ratio: f64,
    pub coverage: CoveragePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size_ratio: 0.04,
            coverage: CoveragePolicy::Expanded,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Serialize the stock defaults to a TOML value (the base layer).
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(WatermarkConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<WatermarkConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: WatermarkConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<WatermarkConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `tilemark.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tilemark configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Label
# ---------------------------------------------------------------------------
[label]
# Text drawn in every tile. {code} is replaced with the image's code.
template = "#{code}"

# Fonts tried in order. A name is matched against font files in font_dirs
# and the system font directories (case-insensitive, extension optional);
# a path is loaded directly. When none loads, a small built-in bitmap font
# is used at a fixed size.
fonts = ["arial.ttf", "times.ttf"]

# Point size as a fraction of the image diagonal.
# 0.025 on a 1920x1080 image gives 55 px.
size_ratio = 0.025

# Extra font directories, searched before the system ones.
font_dirs = []

# ---------------------------------------------------------------------------
# Tiles
# ---------------------------------------------------------------------------
[tiles]
# Gap between neighbouring labels, in pixels.
pad = 50

# "edge-aligned": tiles start at the top-left corner (fewest tiles).
# "expanded": tiles span three image widths and heights around the image,
#   so the mark survives any later crop or rotation (about 9x the tiles).
coverage = "edge-aligned"

# ---------------------------------------------------------------------------
# Overlay
# ---------------------------------------------------------------------------
[overlay]
# Opacity of the mark (0-255), shared by both passes.
# Overlapping passes do not add up: the second pass changes the tone only.
alpha = 30

# Exactly two passes per tile: a light one at the tile origin and a darker
# one nudged down-right, giving a soft emboss look.
passes = [
  { dx = 0, dy = 0, fill = [128, 128, 128] },
  { dx = 2, dy = 2, fill = [64, 64, 64] },
]

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best). All outputs are JPEG.
quality = 95

# Appended to the file stem: photo.png -> photo_watermark.jpg
suffix = "_watermark"

# ---------------------------------------------------------------------------
# Batch
# ---------------------------------------------------------------------------
[batch]
# `tilemark batch` uses these instead of label.size_ratio and tiles.coverage:
# a larger label over the expanded grid, so marks survive recipients'
# crops. Set them to 0.025 and "edge-aligned" to match `tilemark stamp`.
# `--coverage` on the command line still wins.
size_ratio = 0.04
coverage = "expanded"

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel image workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
