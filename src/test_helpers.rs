//! Shared test utilities: synthetic images, encoded in memory or on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = solid_png(120, 80, [255, 255, 255]);
//! let img = gradient(40, 30);
//! write_image(&dir.join("a.png"), &img, ImageFormat::Png);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Encode any image to bytes in `format`.
pub fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A single-color RGB image.
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(rgb))
}

/// A smooth RGB gradient, so JPEG encoding has something to compress.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

/// PNG bytes of a single-color RGB image.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(solid(width, height, rgb)), ImageFormat::Png)
}

/// PNG bytes of an RGBA image.
pub fn rgba_png(img: RgbaImage) -> Vec<u8> {
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Write `img` to `path` in `format`.
pub fn write_image(path: &Path, img: &RgbImage, format: ImageFormat) {
    DynamicImage::ImageRgb8(img.clone())
        .save_with_format(path, format)
        .unwrap();
}
