//! Overlay drawing and over-compositing.
//!
//! The mark is drawn onto a transparent RGBA overlay the size of the image,
//! then blended over the opaque source in one pass:
//!
//! ```text
//! for each tile origin (row-major):
//!     for each pass:  draw label at origin + (dx, dy) with [fill, alpha]
//! result = src · (1 − a) + overlay · a      (a = overlay alpha / 255)
//! ```
//!
//! ## Ink model
//!
//! Painting interpolates all four overlay channels toward the ink by glyph
//! coverage. A fully covered pixel takes the ink's alpha exactly, whatever
//! was there before, so where the two passes overlap the overlay stays at
//! `alpha` and only the color shifts toward the second pass. Both passes use
//! the same alpha; the second pass changes the tone, not the opacity.

use super::backend::TextBackend;
use super::calculations::TileOrigin;
use super::fonts::LabelFont;
use super::params::Pass;
use image::{Rgba, RgbaImage};

/// Paint one pixel of `layer` toward `ink` by `coverage` (0.0–1.0).
///
/// Out-of-bounds coordinates are ignored.
pub(crate) fn paint_pixel(layer: &mut RgbaImage, x: i64, y: i64, ink: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= layer.width() as i64 || y >= layer.height() as i64 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return;
    }
    let pixel = layer.get_pixel_mut(x as u32, y as u32);
    for c in 0..4 {
        let old = pixel[c] as f32;
        let new = old + (ink[c] as f32 - old) * coverage;
        pixel[c] = new.round().clamp(0.0, 255.0) as u8;
    }
}

/// Draw every pass of the label at every origin, in grid order.
pub fn draw_tiles(
    backend: &impl TextBackend,
    layer: &mut RgbaImage,
    text: &str,
    font: &LabelFont,
    grid: &[TileOrigin],
    passes: &[Pass],
    alpha: u8,
) {
    for &origin in grid {
        for pass in passes {
            let [r, g, b] = pass.fill;
            backend.draw(
                layer,
                text,
                font,
                origin.offset(pass.dx, pass.dy),
                Rgba([r, g, b, alpha]),
            );
        }
    }
}

/// Blend `overlay` over `base` using the overlay's per-pixel alpha.
///
/// `base` is expected to be opaque (it comes from an RGB source), so the
/// result is opaque too. The base image is left untouched.
pub fn alpha_composite(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());
    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        let a = src[3] as f32 / 255.0;
        if a <= 0.0 {
            continue;
        }
        for c in 0..3 {
            let blended = dst[c] as f32 * (1.0 - a) + src[c] as f32 * a;
            dst[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        let out_alpha = a + (dst[3] as f32 / 255.0) * (1.0 - a);
        dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out
}
