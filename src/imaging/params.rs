//! Parameter types for the watermark engine.
//!
//! These structs describe *what* mark to stamp, not *how* to rasterize it.
//! They are the interface between configuration (which decides the look of
//! the mark) and the [`operations`](super::operations) that lay out and
//! composite it. A [`WatermarkSpec`] is resolved once and shared read-only
//! by every image in a run.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 95). Clamped on construction.
//! - [`Pass`]: One draw of the label per tile: offset and fill color.
//! - [`CoveragePolicy`]: Spatial range of tile origins (edge-aligned or expanded).
//! - [`WatermarkSpec`]: Everything needed to mark one image, minus the code.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// One draw of the label at every tile, shifted by `(dx, dy)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pass {
    pub dx: i32,
    pub dy: i32,
    /// RGB fill; the alpha comes from [`WatermarkSpec::alpha`].
    pub fill: [u8; 3],
}

impl Pass {
    /// Mid-gray pass at the raw tile origin.
    pub fn light() -> Self {
        Self {
            dx: 0,
            dy: 0,
            fill: [128, 128, 128],
        }
    }

    /// Darker pass nudged down-right, giving the soft emboss look.
    pub fn shadow() -> Self {
        Self {
            dx: 2,
            dy: 2,
            fill: [64, 64, 64],
        }
    }
}

/// Which region the tile grid spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoveragePolicy {
    /// Origins in `[0, W) × [0, H)`. Fewest tiles.
    #[default]
    EdgeAligned,
    /// Origins in `[-W, 2W) × [-H, 2H)`. Survives any later crop or rotation.
    Expanded,
}

impl std::str::FromStr for CoveragePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edge-aligned" | "edge" => Ok(Self::EdgeAligned),
            "expanded" => Ok(Self::Expanded),
            other => Err(format!(
                "unknown coverage policy '{other}' (expected edge-aligned or expanded)"
            )),
        }
    }
}

/// Immutable description of the mark, resolved once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    /// Label text; `{code}` is replaced with the resolved code.
    pub label_template: String,
    /// Font names or paths, tried in order before the built-in font.
    pub font_chain: Vec<String>,
    /// Point size as a fraction of the image diagonal.
    pub size_ratio: f64,
    /// Fixed gap between neighbouring tiles, in pixels.
    pub pad_px: u32,
    pub coverage: CoveragePolicy,
    /// Shared by every pass. Equal alphas do not stack.
    pub alpha: u8,
    pub passes: Vec<Pass>,
    pub quality: Quality,
}

impl WatermarkSpec {
    /// Interpolate `code` into the label template.
    pub fn label_text(&self, code: &str) -> String {
        self.label_template.replace("{code}", code)
    }
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self {
            label_template: "#{code}".to_string(),
            font_chain: vec!["arial.ttf".to_string(), "times.ttf".to_string()],
            size_ratio: 0.025,
            pad_px: 50,
            coverage: CoveragePolicy::EdgeAligned,
            alpha: 30,
            passes: vec![Pass::light(), Pass::shadow()],
            quality: Quality::default(),
        }
    }
}
