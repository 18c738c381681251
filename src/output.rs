//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Batch
//!
//! ```text
//! Watermarking 3 images from photos/
//! 001 IMG_0001.jpg → IMG_0001_watermark.jpg
//!     Code: 3f9a1c
//! 002 IMG_0002.png → IMG_0002_watermark.jpg
//!     Code: 0be21d
//! 003 broken.jpg FAILED
//!     Error: Failed to decode image: ...
//!
//! Done: 3 attempted, 2 succeeded, 1 failed
//!     Audit log: out/watermark_log.csv
//! ```
//!
//! Images finish in parallel, so lines arrive in completion order; the
//! positional index identifies each image's place in the sorted input.
//!
//! ## Stamp
//!
//! ```text
//! photo.png → photo_watermark.jpg
//!     Code: 9c1e04aa
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchResult};
use crate::stats::UsageStats;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total, input_dir } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!(
                "Watermarking {} {} from {}",
                total,
                noun,
                input_dir.display()
            )]
        }
        BatchEvent::ImageDone {
            index,
            filename,
            output,
            code,
        } => vec![
            format!(
                "{} {} \u{2192} {}",
                format_index(*index),
                filename,
                display_name(output)
            ),
            format!("{}Code: {}", indent(1), code),
        ],
        BatchEvent::ImageFailed {
            index,
            filename,
            message,
        } => vec![
            format!("{} {} FAILED", format_index(*index), filename),
            format!("{}Error: {}", indent(1), message),
        ],
        BatchEvent::AuditFailed { filename, message } => {
            vec![format!("{}Audit: {} not logged: {}", indent(1), filename, message)]
        }
        BatchEvent::Skipped { index, filename } => {
            vec![format!("{} {} skipped", format_index(*index), filename)]
        }
    }
}

/// Format the end-of-run summary.
pub fn format_batch_summary(result: &BatchResult) -> Vec<String> {
    let mut lines = vec![String::new(), format!("Done: {}", result.summary)];
    if let Some(audit) = &result.audit_path {
        lines.push(format!("{}Audit log: {}", indent(1), audit.display()));
    }
    lines
}

pub fn print_batch_summary(result: &BatchResult) {
    for line in format_batch_summary(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Stamp
// ============================================================================

/// Format the result of marking one file.
pub fn format_stamp_result(source: &Path, output: &Path, code: &str) -> Vec<String> {
    vec![
        format!("{} \u{2192} {}", display_name(source), output.display()),
        format!("{}Code: {}", indent(1), code),
    ]
}

pub fn print_stamp_result(source: &Path, output: &Path, code: &str) {
    for line in format_stamp_result(source, output, code) {
        println!("{}", line);
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Format usage statistics, most recent history entry first.
pub fn format_stats(stats: &UsageStats) -> Vec<String> {
    let mut lines = vec![format!("Images processed: {}", stats.total_images)];
    lines.push(format!(
        "Last processed: {}",
        stats.last_processed.as_deref().unwrap_or("never")
    ));
    if !stats.processing_history.is_empty() {
        lines.push("Recent".to_string());
        for entry in stats.processing_history.iter().rev() {
            lines.push(format!(
                "{}{}  {}  {}",
                indent(1),
                entry.timestamp,
                entry.code,
                entry.filename
            ));
        }
    }
    lines
}

pub fn print_stats(stats: &UsageStats) {
    for line in format_stats(stats) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchSummary, Processed};
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    // =========================================================================
    // Batch events
    // =========================================================================

    #[test]
    fn started_line_pluralizes() {
        let one = format_batch_event(&BatchEvent::Started {
            total: 1,
            input_dir: PathBuf::from("photos"),
        });
        let many = format_batch_event(&BatchEvent::Started {
            total: 3,
            input_dir: PathBuf::from("photos"),
        });
        assert_eq!(one, vec!["Watermarking 1 image from photos"]);
        assert_eq!(many, vec!["Watermarking 3 images from photos"]);
    }

    #[test]
    fn image_done_shows_output_name_and_code() {
        let lines = format_batch_event(&BatchEvent::ImageDone {
            index: 2,
            filename: "IMG_0002.png".into(),
            output: PathBuf::from("out/IMG_0002_watermark.jpg"),
            code: "0be21d".into(),
        });
        assert_eq!(
            lines,
            vec!["002 IMG_0002.png → IMG_0002_watermark.jpg", "    Code: 0be21d"]
        );
    }

    #[test]
    fn image_failed_shows_error() {
        let lines = format_batch_event(&BatchEvent::ImageFailed {
            index: 3,
            filename: "broken.jpg".into(),
            message: "Failed to decode image: bad header".into(),
        });
        assert_eq!(lines[0], "003 broken.jpg FAILED");
        assert_eq!(lines[1], "    Error: Failed to decode image: bad header");
    }

    #[test]
    fn audit_failure_and_skip_lines() {
        let audit = format_batch_event(&BatchEvent::AuditFailed {
            filename: "a.jpg".into(),
            message: "disk full".into(),
        });
        assert_eq!(audit, vec!["    Audit: a.jpg not logged: disk full"]);

        let skipped = format_batch_event(&BatchEvent::Skipped {
            index: 9,
            filename: "z.jpg".into(),
        });
        assert_eq!(skipped, vec!["009 z.jpg skipped"]);
    }

    #[test]
    fn summary_includes_audit_path() {
        let result = BatchResult {
            summary: BatchSummary {
                attempted: 3,
                succeeded: 2,
                failed: 1,
                skipped: 0,
            },
            processed: vec![Processed {
                filename: "a.jpg".into(),
                output: PathBuf::from("out/a_watermark.jpg"),
                code: "abc123".into(),
            }],
            audit_path: Some(PathBuf::from("out/watermark_log.csv")),
        };
        let lines = format_batch_summary(&result);
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Done: 3 attempted, 2 succeeded, 1 failed");
        assert_eq!(lines[2], "    Audit log: out/watermark_log.csv");
    }

    #[test]
    fn summary_without_audit() {
        let result = BatchResult {
            summary: BatchSummary::default(),
            processed: Vec::new(),
            audit_path: None,
        };
        assert_eq!(format_batch_summary(&result).len(), 2);
    }

    // =========================================================================
    // Stamp and stats
    // =========================================================================

    #[test]
    fn stamp_result_lines() {
        let lines = format_stamp_result(
            Path::new("in/photo.png"),
            Path::new("photo_watermark.jpg"),
            "9c1e04aa",
        );
        assert_eq!(lines, vec!["photo.png → photo_watermark.jpg", "    Code: 9c1e04aa"]);
    }

    #[test]
    fn empty_stats() {
        let lines = format_stats(&UsageStats::default());
        assert_eq!(lines, vec!["Images processed: 0", "Last processed: never"]);
    }

    #[test]
    fn stats_history_newest_first() {
        let mut stats = UsageStats::default();
        stats.record("a.jpg", "aaa", "2024-01-01 00:00:00");
        stats.record("b.jpg", "bbb", "2024-01-02 00:00:00");
        let lines = format_stats(&stats);
        assert_eq!(lines[0], "Images processed: 2");
        assert_eq!(lines[1], "Last processed: 2024-01-02 00:00:00");
        assert_eq!(lines[2], "Recent");
        assert_eq!(lines[3], "    2024-01-02 00:00:00  bbb  b.jpg");
        assert_eq!(lines[4], "    2024-01-01 00:00:00  aaa  a.jpg");
    }
}
