//! # tilemark
//!
//! Stamps a repeating, semi-transparent identification mark across raster
//! images, so every distributed copy can be traced back to the code it was
//! issued under while the picture stays readable.
//!
//! # Architecture: One Engine, Several Entry Points
//!
//! Every image goes through the same stateless pipeline:
//!
//! ```text
//! bytes ─ decode ─▶ RGB ─ size + measure label ─▶ tile grid ─ draw passes ─▶ overlay
//!                                                                              │
//! JPEG ◀─ encode ─ flatten ◀─────────────── over-composite onto source ◀──────┘
//! ```
//!
//! The entry points differ only in how they pick the code and where the
//! bytes come from:
//!
//! - **`stamp`**: one file, explicit or random-short code.
//! - **`batch`**: a directory in parallel, content-derived codes plus an
//!   audit log by default.
//! - **[`engine::watermark`]**: the library call, bytes in and bytes out.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The engine: sizing, tile layout, fonts, text backend, compositing, codec |
//! | [`code`] | Code strategies: explicit, random-short, content-derived |
//! | [`engine`] | [`engine::Watermarker`]: decode → stamp → encode, plus file I/O |
//! | [`batch`] | Parallel directory runner with per-image failure isolation |
//! | [`audit`] | Append-only `code,original_filename` CSV log |
//! | [`naming`] | Supported input extensions and output file names |
//! | [`stats`] | JSON usage statistics, passed explicitly |
//! | [`config`] | `tilemark.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Passes, One Alpha
//!
//! Each tile is drawn twice: mid-gray at the origin, darker gray at `(+2, +2)`.
//! Both passes use the same alpha and overlapping pixels do not accumulate
//! opacity, so the second pass shifts the tone but never makes the mark
//! stronger. Marks stay faint at any alpha setting.
//!
//! ## Fonts Without a System Text Stack
//!
//! Fonts are found by file name under the configured and platform font
//! directories and rasterized with `ab_glyph`. When nothing in the chain
//! loads, a bitmap font compiled into the binary takes over, so stamping
//! never fails for lack of fonts. That fallback has a fixed size and does not
//! scale with the image.
//!
//! ## JPEG-Only Output
//!
//! Whatever the input format, outputs are 3-channel JPEG at one quality
//! setting. Alpha is dropped, not blended against a backdrop. Files are written
//! to a temporary path and renamed, so an interrupted run never leaves a
//! half-written image.

pub mod audit;
pub mod batch;
pub mod code;
pub mod config;
pub mod engine;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod stats;

pub use engine::{Watermarker, watermark};

#[cfg(test)]
pub(crate) mod test_helpers;
