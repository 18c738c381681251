//! Production text backend: pure Rust, no system text stack.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Font lookup by name | [`FontCatalog`] (`walkdir` index of font directories) |
//! | Outline font parsing | `ab_glyph::FontVec` |
//! | Layout (advance + kerning) | `ab_glyph::ScaleFont` |
//! | Glyph rasterization | `ab_glyph::OutlinedGlyph::draw` (anti-aliased coverage) |
//! | Built-in bitmap font | `embedded_graphics::mono_font` `FONT_6X10` |
//! | Built-in drawing | `embedded_graphics::text::Text` into an overlay [`DrawTarget`] |

use super::backend::TextBackend;
use super::calculations::{LabelBox, TileOrigin};
use super::compositor::paint_pixel;
use super::fonts::{FontCatalog, LabelFont, builtin_font, resolve_font};
use ab_glyph::{Font, FontVec, Glyph, GlyphId, PxScale, Rect, ScaleFont, point};
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Point, Size};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::{Drawable, Pixel};
use image::{Rgba, RgbaImage};

/// Text backend using `ab_glyph` and `embedded-graphics`.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Default)]
pub struct GlyphBackend {
    catalog: FontCatalog,
}

impl GlyphBackend {
    pub fn new(catalog: FontCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }
}

/// Lay out `text` on one line starting at `(x, y)`, with `y` on the ascent line.
///
/// Returns the positioned glyphs and the total advance width.
fn layout_line(font: &FontVec, scale: PxScale, text: &str, x: f32, y: f32) -> (Vec<Glyph>, f32) {
    let scaled = font.as_scaled(scale);
    let baseline = y + scaled.ascent();
    let mut caret = x;
    let mut prev: Option<GlyphId> = None;
    let mut glyphs = Vec::with_capacity(text.len());

    for c in text.chars().filter(|c| !c.is_control()) {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
        caret += scaled.h_advance(id);
        prev = Some(id);
    }

    (glyphs, caret - x)
}

fn union(a: Rect, b: Rect) -> Rect {
    Rect {
        min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
        max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
    }
}

fn measure_outline(font: &FontVec, scale: PxScale, text: &str) -> LabelBox {
    let (glyphs, advance) = layout_line(font, scale, text, 0.0, 0.0);
    let ink_bounds = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .map(|outlined| outlined.px_bounds())
        .reduce(union);

    match ink_bounds {
        Some(bounds) => LabelBox {
            width: (bounds.max.x - bounds.min.x).ceil().max(0.0) as u32,
            height: (bounds.max.y - bounds.min.y).ceil().max(0.0) as u32,
        },
        // Whitespace only: no ink, fall back to the line box
        None => LabelBox {
            width: advance.ceil().max(0.0) as u32,
            height: font.as_scaled(scale).height().ceil().max(0.0) as u32,
        },
    }
}

fn draw_outline(
    layer: &mut RgbaImage,
    font: &FontVec,
    scale: PxScale,
    text: &str,
    origin: TileOrigin,
    ink: Rgba<u8>,
) {
    let (layer_w, layer_h) = (layer.width() as f32, layer.height() as f32);
    let (glyphs, _) = layout_line(font, scale, text, origin.x as f32, origin.y as f32);

    for glyph in glyphs {
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        if bounds.max.x <= 0.0
            || bounds.max.y <= 0.0
            || bounds.min.x >= layer_w
            || bounds.min.y >= layer_h
        {
            continue;
        }
        let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
        outlined.draw(|gx, gy, coverage| {
            paint_pixel(layer, left + gx as i64, top + gy as i64, ink, coverage);
        });
    }
}

fn builtin_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyle::new(builtin_font(), BinaryColor::On)
}

/// Adapts an overlay to `embedded-graphics`: every lit pixel gets full ink.
struct OverlayTarget<'a> {
    layer: &'a mut RgbaImage,
    ink: Rgba<u8>,
}

impl OriginDimensions for OverlayTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.layer.width(), self.layer.height())
    }
}

impl DrawTarget for OverlayTarget<'_> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if color.is_on() {
                paint_pixel(self.layer, point.x as i64, point.y as i64, self.ink, 1.0);
            }
        }
        Ok(())
    }
}

impl TextBackend for GlyphBackend {
    fn load_font(&self, chain: &[String], point_size: u32) -> LabelFont {
        resolve_font(&self.catalog, chain, point_size)
    }

    fn measure(&self, text: &str, font: &LabelFont) -> LabelBox {
        match (font, font.px_scale()) {
            (LabelFont::Outline { font, .. }, Some(scale)) => measure_outline(font, scale, text),
            _ => {
                let metrics = builtin_style().measure_string(text, Point::zero(), Baseline::Top);
                LabelBox {
                    width: metrics.bounding_box.size.width,
                    height: metrics.bounding_box.size.height,
                }
            }
        }
    }

    fn draw(
        &self,
        layer: &mut RgbaImage,
        text: &str,
        font: &LabelFont,
        origin: TileOrigin,
        ink: Rgba<u8>,
    ) {
        match (font, font.px_scale()) {
            (LabelFont::Outline { font, .. }, Some(scale)) => {
                draw_outline(layer, font, scale, text, origin, ink)
            }
            _ => {
                let mut target = OverlayTarget { layer, ink };
                Text::with_baseline(
                    text,
                    Point::new(origin.x, origin.y),
                    builtin_style(),
                    Baseline::Top,
                )
                .draw(&mut target)
                .unwrap_or_else(|never| match never {});
            }
        }
    }
}
