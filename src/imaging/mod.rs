//! Watermark imaging: pure Rust, no system graphics stack.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` → RGB |
//! | **Font lookup** | `walkdir` font directory index |
//! | **Outline text** | `ab_glyph` layout + coverage rasterizer |
//! | **Fallback text** | `embedded-graphics` built-in bitmap font |
//! | **Composite** | over-operator on an RGBA overlay |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for font sizing and tile layout (unit testable)
//! - **Parameters**: Data structures describing the mark
//! - **Fonts**: Font catalog and the fallback chain
//! - **Backend**: [`TextBackend`] trait + [`GlyphBackend`]
//! - **Compositor**: Overlay painting and alpha compositing
//! - **Codec**: Decode, flatten, JPEG encode, atomic writes
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod codec;
mod compositor;
pub mod fonts;
pub mod glyph_backend;
pub mod operations;
mod params;

pub use backend::TextBackend;
pub use calculations::{LabelBox, TileOrigin, font_point_size, tile_grid, tile_spacing};
pub use codec::CodecError;
pub use compositor::alpha_composite;
pub use fonts::{FontCatalog, LabelFont, resolve_font};
pub use glyph_backend::GlyphBackend;
pub use operations::{MeasuredLabel, measure_label, plan_tiles, stamp};
pub use params::{CoveragePolicy, Pass, Quality, WatermarkSpec};
