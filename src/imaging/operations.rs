//! High-level watermark operations.
//!
//! These functions combine calculations with backend execution: size the
//! label from the image, measure it, lay out the tiles, draw every pass into
//! an overlay, and composite. They work on decoded images; bytes in and out
//! are handled by [`crate::engine`].

use super::backend::TextBackend;
use super::calculations::{LabelBox, TileOrigin, font_point_size, tile_grid};
use super::codec::to_opaque_rgba;
use super::compositor::{alpha_composite, draw_tiles};
use super::fonts::LabelFont;
use super::params::WatermarkSpec;
use image::{RgbImage, RgbaImage};
use tracing::debug;

/// The label for one image: its text, the font it renders in, and its size.
#[derive(Debug)]
pub struct MeasuredLabel {
    pub text: String,
    pub font: LabelFont,
    pub size: LabelBox,
}

/// Pick the font for a `width × height` image and measure `text` with it.
pub fn measure_label(
    backend: &impl TextBackend,
    spec: &WatermarkSpec,
    width: u32,
    height: u32,
    text: &str,
) -> MeasuredLabel {
    let point_size = font_point_size(width, height, spec.size_ratio);
    let font = backend.load_font(&spec.font_chain, point_size);
    let size = backend.measure(text, &font);
    MeasuredLabel {
        text: text.to_string(),
        font,
        size,
    }
}

/// Tile origins for `label` on a `width × height` image under `spec`.
pub fn plan_tiles(
    spec: &WatermarkSpec,
    width: u32,
    height: u32,
    label: LabelBox,
) -> Vec<TileOrigin> {
    tile_grid(width, height, label, spec.pad_px, spec.coverage)
}

/// Apply the tiled mark to `source`.
///
/// Returns the composited image, still RGBA (opaque). Dimensions match the
/// source exactly.
pub fn stamp(
    backend: &impl TextBackend,
    spec: &WatermarkSpec,
    source: &RgbImage,
    text: &str,
) -> RgbaImage {
    let (width, height) = source.dimensions();
    let label = measure_label(backend, spec, width, height, text);
    let grid = plan_tiles(spec, width, height, label.size);

    debug!(
        width,
        height,
        font = label.font.name(),
        label_w = label.size.width,
        label_h = label.size.height,
        tiles = grid.len(),
        "stamping"
    );

    let mut overlay = RgbaImage::new(width, height);
    draw_tiles(
        backend,
        &mut overlay,
        &label.text,
        &label.font,
        &grid,
        &spec.passes,
        spec.alpha,
    );
    alpha_composite(&to_opaque_rgba(source), &overlay)
}
