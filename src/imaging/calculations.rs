//! Pure calculation functions for label sizing and tile layout.
//!
//! All functions here are pure and testable without any I/O, fonts or images.

use super::params::CoveragePolicy;

/// Measured size of a rendered label, in pixels.
///
/// Produced by the text backend. Treat the values as opaque: they depend on
/// the font engine and are never recomputed from the point size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelBox {
    pub width: u32,
    pub height: u32,
}

/// Top-left draw origin of one tile. May lie outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileOrigin {
    pub x: i32,
    pub y: i32,
}

impl TileOrigin {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This origin shifted by a pass offset.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Font point size for an image: `floor(diagonal × ratio)`.
///
/// # Examples
/// ```
/// # use tilemark::imaging::font_point_size;
/// // 1920x1080 → diagonal ≈ 2202.9 → 2.5% ≈ 55.07
/// assert_eq!(font_point_size(1920, 1080, 0.025), 55);
/// ```
pub fn font_point_size(width: u32, height: u32, size_ratio: f64) -> u32 {
    let diagonal = (width as f64).hypot(height as f64);
    let size = (diagonal * size_ratio).floor();
    if size.is_finite() && size > 0.0 {
        size.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Step between neighbouring tiles on both axes.
///
/// Always at least one pixel, so a zero-sized label with zero padding cannot
/// stall the layout.
pub fn tile_spacing(label: LabelBox, pad_px: u32) -> (u32, u32) {
    let step = |dim: u32| dim.saturating_add(pad_px).max(1);
    (step(label.width), step(label.height))
}

/// Ordered tile origins covering a `width × height` image.
///
/// Row-major: `y` outer, `x` inner, both ascending. The result depends only
/// on the arguments, so re-runs are reproducible.
pub fn tile_grid(
    width: u32,
    height: u32,
    label: LabelBox,
    pad_px: u32,
    coverage: CoveragePolicy,
) -> Vec<TileOrigin> {
    let (step_x, step_y) = tile_spacing(label, pad_px);
    let (xs, ys) = match coverage {
        CoveragePolicy::EdgeAligned => (
            axis_origins(0, width as i64, step_x),
            axis_origins(0, height as i64, step_y),
        ),
        CoveragePolicy::Expanded => (
            axis_origins(-(width as i64), 2 * width as i64, step_x),
            axis_origins(-(height as i64), 2 * height as i64, step_y),
        ),
    };

    let mut origins = Vec::with_capacity(xs.len() * ys.len());
    for &y in &ys {
        for &x in &xs {
            origins.push(TileOrigin::new(x, y));
        }
    }
    origins
}

/// Origins `start, start+step, ...` strictly below `end`.
fn axis_origins(start: i64, end: i64, step: u32) -> Vec<i32> {
    let step = i64::from(step.max(1));
    let clamp = |v: i64| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    let mut values = Vec::new();
    let mut v = start;
    while v < end {
        values.push(clamp(v));
        v += step;
    }
    values
}
