//! Image decoding, flattening and JPEG encoding.
//!
//! Input is any format the `image` crate can sniff from its bytes (JPEG, PNG,
//! BMP, TIFF, WebP). Sources with an alpha channel are reduced to RGB by
//! dropping alpha before the mark is applied. Output is always baseline
//! 3-channel JPEG.

use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage, RgbImage};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
}

/// Decode raw bytes into an opaque RGB image.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, CodecError> {
    let img = image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// Widen an RGB image to fully opaque RGBA for compositing.
pub fn to_opaque_rgba(img: &RgbImage) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        Rgba([r, g, b, 255])
    })
}

/// Drop the alpha channel.
pub fn flatten(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, _] = img.get_pixel(x, y).0;
        image::Rgb([r, g, b])
    })
}

/// Encode as JPEG at `quality`.
pub fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.value())
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out)
}

/// Write `bytes` to `path` via a temp file in the same directory.
///
/// Readers never observe a partially written output file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
