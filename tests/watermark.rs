//! End-to-end checks against the public API.
//!
//! Everything here runs with an empty font catalog, so results do not
//! depend on which fonts the machine has installed: labels render in the
//! builtin bitmap font.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use tempfile::TempDir;
use tilemark::Watermarker;
use tilemark::batch::{BatchOptions, run_batch};
use tilemark::code::{CodeStrategy, content_derived};
use tilemark::imaging::{
    CoveragePolicy, FontCatalog, GlyphBackend, TextBackend, TileOrigin, WatermarkSpec,
    font_point_size, tile_grid, tile_spacing,
};

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn photo(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 7 * 30) as u8])
    })
}

fn png(img: RgbImage) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

fn offline_engine(spec: WatermarkSpec) -> Watermarker<GlyphBackend> {
    Watermarker::with_backend(spec, GlyphBackend::new(FontCatalog::empty()))
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn full_hd_edge_aligned_layout() {
    let spec = WatermarkSpec::default();
    let backend = GlyphBackend::new(FontCatalog::empty());

    let point_size = font_point_size(1920, 1080, spec.size_ratio);
    assert_eq!(point_size, 55);

    let font = backend.load_font(&spec.font_chain, point_size);
    let label = backend.measure(&spec.label_text("ab12cd"), &font);
    let (step_x, step_y) = tile_spacing(label, spec.pad_px);
    assert_eq!(step_x, label.width + 50);
    assert_eq!(step_y, label.height + 50);

    let grid = tile_grid(1920, 1080, label, spec.pad_px, CoveragePolicy::EdgeAligned);
    assert_eq!(grid[0], TileOrigin::new(0, 0));
    assert_eq!(grid[1], TileOrigin::new(step_x as i32, 0));
    assert!(grid.iter().all(|o| o.x < 1920 && o.y < 1080));

    let rows = grid.iter().filter(|o| o.x == 0).count() as u32;
    assert_eq!(rows, 1080u32.div_ceil(step_y));
}

#[test]
fn expanded_layout_reaches_beyond_frame() {
    let spec = WatermarkSpec::default();
    let backend = GlyphBackend::new(FontCatalog::empty());
    let font = backend.load_font(&spec.font_chain, 20);
    let label = backend.measure("#ab12cd", &font);

    let grid = tile_grid(300, 200, label, spec.pad_px, CoveragePolicy::Expanded);
    assert_eq!(grid[0], TileOrigin::new(-300, -200));
    assert!(grid.iter().any(|o| o.x >= 300));
    assert!(grid.iter().any(|o| o.y >= 200));
}

#[test]
fn tiny_image_gets_single_tile() {
    let spec = WatermarkSpec::default();
    let backend = GlyphBackend::new(FontCatalog::empty());
    let font = backend.load_font(&spec.font_chain, font_point_size(10, 10, spec.size_ratio));
    let label = backend.measure("#ab12cd", &font);

    let grid = tile_grid(10, 10, label, spec.pad_px, CoveragePolicy::EdgeAligned);
    assert_eq!(grid, vec![TileOrigin::new(0, 0)]);
}

// =============================================================================
// Watermarking
// =============================================================================

#[test]
fn tiny_image_is_stamped() {
    let marked = offline_engine(WatermarkSpec::default())
        .watermark(&png(photo(10, 10)), &CodeStrategy::Explicit("ab12cd".into()))
        .unwrap();
    assert_eq!((marked.width, marked.height), (10, 10));
    assert_eq!(marked.code, "ab12cd");
}

#[test]
fn missing_fonts_fall_back_to_builtin() {
    let spec = WatermarkSpec {
        font_chain: vec!["nonexistent1".into(), "nonexistent2".into()],
        ..WatermarkSpec::default()
    };
    let marked = offline_engine(spec)
        .watermark(&png(photo(200, 120)), &CodeStrategy::RandomShort)
        .unwrap();
    assert_eq!((marked.width, marked.height), (200, 120));
}

#[test]
fn output_is_rgb_jpeg_with_source_dimensions() {
    let engine = offline_engine(WatermarkSpec::default());
    let rgba = RgbaImage::from_pixel(97, 61, Rgba([40, 90, 160, 100]));
    let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);

    let marked = engine
        .watermark(&bytes, &CodeStrategy::Explicit("c0ffee".into()))
        .unwrap();
    assert_eq!(image::guess_format(&marked.bytes).unwrap(), ImageFormat::Jpeg);

    let decoded = image::load_from_memory(&marked.bytes).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
    assert_eq!((decoded.width(), decoded.height()), (97, 61));
}

#[test]
fn mark_changes_pixels() {
    let white = RgbImage::from_pixel(160, 90, Rgb([255, 255, 255]));
    let marked = offline_engine(WatermarkSpec::default())
        .watermark(&png(white), &CodeStrategy::Explicit("ab12cd".into()))
        .unwrap();
    let decoded = image::load_from_memory(&marked.bytes).unwrap().to_rgb8();
    assert!(decoded.pixels().any(|p| p[0] < 250));
}

#[test]
fn same_input_and_code_give_same_bytes() {
    let engine = offline_engine(WatermarkSpec::default());
    let input = png(photo(240, 160));
    let strategy = CodeStrategy::Explicit("ab12cd".into());

    let first = engine.watermark(&input, &strategy).unwrap();
    let second = engine.watermark(&input, &strategy).unwrap();
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn content_code_depends_only_on_filename() {
    let engine = offline_engine(WatermarkSpec::default());
    let strategy = CodeStrategy::ContentDerived {
        filename: "holiday.png".into(),
    };

    let a = engine.watermark(&png(photo(50, 50)), &strategy).unwrap();
    let b = engine.watermark(&png(photo(80, 30)), &strategy).unwrap();
    assert_eq!(a.code, b.code);
    assert_eq!(a.code, content_derived("holiday.png"));
}

#[test]
fn undecodable_bytes_are_rejected() {
    let err = offline_engine(WatermarkSpec::default())
        .watermark(b"definitely not an image", &CodeStrategy::RandomShort)
        .unwrap_err();
    assert!(err.is_decode());
}

// =============================================================================
// Batch
// =============================================================================

#[test]
fn batch_marks_directory_and_writes_audit() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("input");
    let output = tmp.path().join("output");
    std::fs::create_dir_all(&input).unwrap();

    photo(64, 48).save(input.join("one.png")).unwrap();
    photo(32, 32).save(input.join("two.png")).unwrap();
    std::fs::write(input.join("broken.jpg"), b"not a jpeg").unwrap();
    std::fs::write(input.join("readme.txt"), b"ignored").unwrap();

    let engine = offline_engine(WatermarkSpec::default());
    let result = run_batch(&engine, &BatchOptions::new(input.clone(), output.clone()), None).unwrap();

    assert_eq!(result.summary.attempted, 3);
    assert_eq!(result.summary.succeeded, 2);
    assert_eq!(result.summary.failed, 1);
    assert!(output.join("one_watermark.jpg").exists());
    assert!(output.join("two_watermark.jpg").exists());
    assert!(!output.join("broken_watermark.jpg").exists());

    let log = std::fs::read_to_string(result.audit_path.unwrap()).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines[0], "code,original_filename");
    assert_eq!(lines.len(), 3);
    assert!(lines.contains(&format!("{},one.png", content_derived("one.png")).as_str()));
    assert!(lines.contains(&format!("{},two.png", content_derived("two.png")).as_str()));
}
