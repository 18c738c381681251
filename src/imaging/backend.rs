//! Text backend trait: the boundary to fonts and glyph rasterization.
//!
//! The [`TextBackend`] trait defines the three capabilities the engine needs
//! from a text stack: load a font by name with fallback, measure a label,
//! and draw a label into an overlay. Everything else (sizing, layout,
//! compositing, encoding) is backend-agnostic.
//!
//! The production implementation is
//! [`GlyphBackend`](super::glyph_backend::GlyphBackend), built on `ab_glyph`
//! for outline fonts and `embedded-graphics` for the built-in bitmap font.

use super::calculations::{LabelBox, TileOrigin};
use super::fonts::LabelFont;
use image::{Rgba, RgbaImage};

/// Trait for text backends.
///
/// `Sync` so one backend can serve every image of a parallel batch.
pub trait TextBackend: Sync {
    /// Resolve the first loadable font of `chain` at `point_size`.
    ///
    /// Must always return a usable font, falling back to
    /// [`LabelFont::Builtin`] when nothing in the chain loads.
    fn load_font(&self, chain: &[String], point_size: u32) -> LabelFont;

    /// Bounding box of `text` rendered with `font`.
    fn measure(&self, text: &str, font: &LabelFont) -> LabelBox;

    /// Paint `text` into `layer` with its top-left line box at `origin`.
    ///
    /// `ink` carries the fill color and alpha. Pixels outside the layer are
    /// clipped silently.
    fn draw(
        &self,
        layer: &mut RgbaImage,
        text: &str,
        font: &LabelFont,
        origin: TileOrigin,
        ink: Rgba<u8>,
    );
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::compositor::paint_pixel;
    use std::sync::Mutex;

    /// Mock backend with a fixed label size that records every call.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// `draw` fills the label box with `ink`, so compositing tests see
    /// deterministic pixels without any font installed.
    pub struct MockBackend {
        pub label: LabelBox,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        LoadFont {
            chain: Vec<String>,
            point_size: u32,
        },
        Measure(String),
        Draw {
            text: String,
            origin: TileOrigin,
            ink: [u8; 4],
        },
    }

    impl MockBackend {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                label: LabelBox { width, height },
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn draws(&self) -> Vec<(String, TileOrigin, [u8; 4])> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Draw { text, origin, ink } => Some((text, origin, ink)),
                    _ => None,
                })
                .collect()
        }
    }

    impl TextBackend for MockBackend {
        fn load_font(&self, chain: &[String], point_size: u32) -> LabelFont {
            self.operations.lock().unwrap().push(RecordedOp::LoadFont {
                chain: chain.to_vec(),
                point_size,
            });
            LabelFont::Builtin
        }

        fn measure(&self, text: &str, _font: &LabelFont) -> LabelBox {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Measure(text.to_string()));
            self.label
        }

        fn draw(
            &self,
            layer: &mut RgbaImage,
            text: &str,
            _font: &LabelFont,
            origin: TileOrigin,
            ink: Rgba<u8>,
        ) {
            self.operations.lock().unwrap().push(RecordedOp::Draw {
                text: text.to_string(),
                origin,
                ink: ink.0,
            });
            for dy in 0..self.label.height as i64 {
                for dx in 0..self.label.width as i64 {
                    paint_pixel(layer, origin.x as i64 + dx, origin.y as i64 + dy, ink, 1.0);
                }
            }
        }
    }

    #[test]
    fn mock_records_load_and_measure() {
        let backend = MockBackend::new(120, 30);
        let font = backend.load_font(&["arial.ttf".to_string()], 55);
        let size = backend.measure("#ab12cd", &font);

        assert!(font.is_builtin());
        assert_eq!(size, LabelBox { width: 120, height: 30 });

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::LoadFont { point_size: 55, .. }));
        assert!(matches!(&ops[1], RecordedOp::Measure(t) if t == "#ab12cd"));
    }

    #[test]
    fn mock_draw_clips_to_layer() {
        let backend = MockBackend::new(4, 4);
        let mut layer = RgbaImage::new(3, 3);
        backend.draw(
            &mut layer,
            "x",
            &LabelFont::Builtin,
            TileOrigin::new(-2, 1),
            Rgba([10, 20, 30, 40]),
        );

        // Columns 0..2 of rows 1..3 are painted; nothing panics off-canvas.
        assert_eq!(layer.get_pixel(0, 1).0, [10, 20, 30, 40]);
        assert_eq!(layer.get_pixel(1, 2).0, [10, 20, 30, 40]);
        assert_eq!(layer.get_pixel(2, 2).0, [0, 0, 0, 0]);
        assert_eq!(layer.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
