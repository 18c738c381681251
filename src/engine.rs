//! The watermark operation: bytes in, marked JPEG bytes and code out.
//!
//! ```text
//! Decoded → Labeled → Tiled → Composited → Encoded
//! ```
//!
//! Each image passes through the stages once, in order. A [`Watermarker`]
//! holds only read-only state (the [`WatermarkSpec`] and the text backend with its font
//! index), so one instance can serve a whole parallel batch. Failures abort
//! the current image only.

use crate::code::{CodeStrategy, resolve_code};
use crate::imaging::codec::{self, CodecError};
use crate::imaging::{FontCatalog, GlyphBackend, TextBackend, WatermarkSpec, stamp};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl WatermarkError {
    /// True when the input was not a readable image.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Codec(CodecError::Decode(_)))
    }
}

/// One marked image.
#[derive(Debug, Clone)]
pub struct Watermarked {
    /// Encoded JPEG.
    pub bytes: Vec<u8>,
    pub code: String,
    pub width: u32,
    pub height: u32,
}

/// Applies one [`WatermarkSpec`] to any number of images.
pub struct Watermarker<B: TextBackend = GlyphBackend> {
    spec: WatermarkSpec,
    backend: B,
}

impl Watermarker<GlyphBackend> {
    /// Production engine: indexes `font_dirs` plus the platform font directories.
    pub fn new(spec: WatermarkSpec, font_dirs: &[PathBuf]) -> Self {
        Self::with_backend(spec, GlyphBackend::new(FontCatalog::scan(font_dirs)))
    }
}

impl<B: TextBackend> Watermarker<B> {
    pub fn with_backend(spec: WatermarkSpec, backend: B) -> Self {
        Self { spec, backend }
    }

    pub fn spec(&self) -> &WatermarkSpec {
        &self.spec
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mark an encoded image. The code comes from `strategy`.
    pub fn watermark(
        &self,
        image_bytes: &[u8],
        strategy: &CodeStrategy,
    ) -> Result<Watermarked, WatermarkError> {
        let source = codec::decode(image_bytes)?;
        let code = strategy.resolve();
        let text = self.spec.label_text(&code);
        debug!(code = %code, width = source.width(), height = source.height(), "decoded");

        let composited = stamp(&self.backend, &self.spec, &source, &text);
        let flat = codec::flatten(&composited);
        let bytes = codec::encode_jpeg(&flat, self.spec.quality)?;
        debug!(code = %code, bytes = bytes.len(), "encoded");

        Ok(Watermarked {
            bytes,
            code,
            width: flat.width(),
            height: flat.height(),
        })
    }

    /// Read `source`, mark it, and write the JPEG atomically to `dest`.
    pub fn watermark_file(
        &self,
        source: &Path,
        dest: &Path,
        strategy: &CodeStrategy,
    ) -> Result<Watermarked, WatermarkError> {
        let input = std::fs::read(source).map_err(|e| WatermarkError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        let marked = self.watermark(&input, strategy)?;
        codec::write_atomic(dest, &marked.bytes)?;
        Ok(marked)
    }
}

/// One-shot form of [`Watermarker::watermark`].
///
/// An explicit `code` is used verbatim, even when empty; otherwise a random-short
/// code is generated. `spec` defaults to [`WatermarkSpec::default`]. Builds a
/// font index on every call, so batch callers should keep a [`Watermarker`].
pub fn watermark(
    image_bytes: &[u8],
    code: Option<&str>,
    spec: Option<&WatermarkSpec>,
) -> Result<(Vec<u8>, String), WatermarkError> {
    let spec = spec.cloned().unwrap_or_default();
    let strategy = CodeStrategy::Explicit(resolve_code(code, &CodeStrategy::RandomShort));
    let marked = Watermarker::new(spec, &[]).watermark(image_bytes, &strategy)?;
    Ok((marked.bytes, marked.code))
}
