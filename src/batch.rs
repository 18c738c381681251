//! Directory batch runner.
//!
//! Marks every supported image in one directory (non-recursive) and writes
//! `<stem><suffix>.jpg` files to an output directory created on demand.
//!
//! Inputs that differ only in extension (`a.png`, `a.jpg`) map to the same
//! output name. The first in sorted order keeps it; the others fail without
//! being processed, so no output is ever overwritten within a run.
//!
//! ## Codes
//!
//! | `--codes` | Strategy | Audit log |
//! |---|---|---|
//! | `content` (default) | content-derived from the file name | `watermark_log.csv`, recreated per run |
//! | `stem` | explicit: the file stem | none |
//! | `random` | random-short | none |
//!
//! ## Failure model
//!
//! Each image is independent. A decode or encode failure is reported for
//! that file and the batch carries on; an audit write failure is reported
//! but the already written image counts as a success. Only problems that
//! make the whole run impossible (missing input directory, uncreatable
//! output directory or audit file) surface as [`BatchError`].
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel using [rayon](https://docs.rs/rayon).
//! Setting the cancel flag stops new images from starting; images already
//! in flight finish and are persisted atomically. [`cancel_on_interrupt`]
//! wires the flag to Ctrl-C.

use crate::audit::{AUDIT_FILENAME, AuditError, AuditLog};
use crate::code::CodeStrategy;
use crate::engine::Watermarker;
use crate::imaging::TextBackend;
use crate::naming::{is_supported_image, output_file_name};
use rayon::prelude::*;
use signal_hook::consts::SIGINT;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Where each image's code comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodeSource {
    #[default]
    Content,
    Stem,
    Random,
}

impl CodeSource {
    fn strategy(self, path: &Path, filename: &str) -> CodeStrategy {
        match self {
            Self::Content => CodeStrategy::ContentDerived {
                filename: filename.to_string(),
            },
            Self::Stem => CodeStrategy::Explicit(
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            Self::Random => CodeStrategy::RandomShort,
        }
    }
}

impl std::str::FromStr for CodeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content" => Ok(Self::Content),
            "stem" => Ok(Self::Stem),
            "random" => Ok(Self::Random),
            other => Err(format!(
                "unknown code source '{other}' (expected content, stem or random)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub codes: CodeSource,
    /// Appended to each output file stem.
    pub suffix: String,
    /// Write `watermark_log.csv` when codes are content-derived.
    pub write_audit: bool,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            codes: CodeSource::default(),
            suffix: "_watermark".to_string(),
            write_audit: true,
            cancel: None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Progress events for the CLI printer thread.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
        input_dir: PathBuf,
    },
    ImageDone {
        /// 1-based position in the sorted input list.
        index: usize,
        filename: String,
        output: PathBuf,
        code: String,
    },
    ImageFailed {
        index: usize,
        filename: String,
        message: String,
    },
    AuditFailed {
        filename: String,
        message: String,
    },
    Skipped {
        index: usize,
        filename: String,
    },
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Images that were started (succeeded + failed).
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Not started because the run was cancelled.
    pub skipped: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} succeeded, {} failed",
            self.attempted, self.succeeded, self.failed
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// One successfully marked image.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub filename: String,
    pub output: PathBuf,
    pub code: String,
}

#[derive(Debug)]
pub struct BatchResult {
    pub summary: BatchSummary,
    /// In input order.
    pub processed: Vec<Processed>,
    pub audit_path: Option<PathBuf>,
}

enum Outcome {
    Done(Processed),
    Failed,
    Skipped,
}

/// One input and the output it is written to.
struct Job<'a> {
    path: &'a Path,
    dest: PathBuf,
    /// Earlier input that already claimed `dest`.
    clash: Option<String>,
}

/// A cancel flag raised by the first Ctrl-C.
///
/// In-flight images still finish. A second Ctrl-C while the flag is set
/// exits the process with status 1.
pub fn cancel_on_interrupt() -> std::io::Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    // Must run before the flag is set by the same signal.
    signal_hook::flag::register_conditional_shutdown(SIGINT, 1, Arc::clone(&cancel))?;
    signal_hook::flag::register(SIGINT, Arc::clone(&cancel))?;
    Ok(cancel)
}

/// Supported images directly inside `dir`, sorted by file name.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::InputNotFound(dir.to_path_buf()));
    }
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_supported_image(p))
        .collect();
    images.sort();
    Ok(images)
}

/// Output paths for `images`, in order.
///
/// Output names are compared case-insensitively, since `A.png` and `a.jpg`
/// collide on case-insensitive file systems.
fn plan_outputs<'a>(images: &'a [PathBuf], options: &BatchOptions) -> Vec<Job<'a>> {
    let mut claimed: HashMap<String, String> = HashMap::new();
    images
        .iter()
        .map(|path| {
            let name = output_file_name(path, &options.suffix);
            let clash = match claimed.entry(name.to_lowercase()) {
                Entry::Occupied(first) => Some(first.get().clone()),
                Entry::Vacant(slot) => {
                    slot.insert(file_name(path));
                    None
                }
            };
            Job {
                path,
                dest: options.output_dir.join(name),
                clash,
            }
        })
        .collect()
}

fn send(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn process_one<B: TextBackend>(
    watermarker: &Watermarker<B>,
    options: &BatchOptions,
    audit: Option<&AuditLog>,
    events: &Option<Sender<BatchEvent>>,
    index: usize,
    job: &Job<'_>,
) -> Outcome {
    let filename = file_name(job.path);
    if options.is_cancelled() {
        send(events, BatchEvent::Skipped { index, filename });
        return Outcome::Skipped;
    }

    let dest = job.dest.clone();
    if let Some(first) = &job.clash {
        let message = format!("{} is already the output of {first}", dest.display());
        warn!(file = %filename, %message, "output name clash");
        send(
            events,
            BatchEvent::ImageFailed {
                index,
                filename,
                message,
            },
        );
        return Outcome::Failed;
    }

    let strategy = options.codes.strategy(job.path, &filename);
    match watermarker.watermark_file(job.path, &dest, &strategy) {
        Ok(marked) => {
            if let Some(Err(e)) = audit.map(|log| log.append(&marked.code, &filename)) {
                warn!(file = %filename, error = %e, "audit append failed");
                send(
                    events,
                    BatchEvent::AuditFailed {
                        filename: filename.clone(),
                        message: e.to_string(),
                    },
                );
            }
            send(
                events,
                BatchEvent::ImageDone {
                    index,
                    filename: filename.clone(),
                    output: dest.clone(),
                    code: marked.code.clone(),
                },
            );
            Outcome::Done(Processed {
                filename,
                output: dest,
                code: marked.code,
            })
        }
        Err(e) => {
            warn!(file = %filename, error = %e, "image failed");
            send(
                events,
                BatchEvent::ImageFailed {
                    index,
                    filename,
                    message: e.to_string(),
                },
            );
            Outcome::Failed
        }
    }
}

/// Mark every image in `options.input_dir`.
///
/// Progress goes to `events` when given. Per-image failures are counted in
/// the summary, never returned as `Err`.
pub fn run_batch<B: TextBackend>(
    watermarker: &Watermarker<B>,
    options: &BatchOptions,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, BatchError> {
    let images = collect_images(&options.input_dir)?;
    std::fs::create_dir_all(&options.output_dir)?;

    let audit = if options.write_audit && options.codes == CodeSource::Content {
        Some(AuditLog::create(&options.output_dir.join(AUDIT_FILENAME))?)
    } else {
        None
    };

    Ok(process_images(
        watermarker,
        options,
        &images,
        audit.as_ref(),
        events,
    ))
}

/// Process `images` into `options.output_dir`, recording codes in `audit`.
fn process_images<B: TextBackend>(
    watermarker: &Watermarker<B>,
    options: &BatchOptions,
    images: &[PathBuf],
    audit: Option<&AuditLog>,
    events: Option<Sender<BatchEvent>>,
) -> BatchResult {
    info!(
        images = images.len(),
        input = %options.input_dir.display(),
        output = %options.output_dir.display(),
        "batch started"
    );
    send(
        &events,
        BatchEvent::Started {
            total: images.len(),
            input_dir: options.input_dir.clone(),
        },
    );

    let jobs = plan_outputs(images, options);
    let outcomes: Vec<Outcome> = jobs
        .par_iter()
        .enumerate()
        .map_with(events, |events, (i, job)| {
            process_one(watermarker, options, audit, events, i + 1, job)
        })
        .collect();

    let mut summary = BatchSummary::default();
    let mut processed = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Done(p) => {
                summary.succeeded += 1;
                processed.push(p);
            }
            Outcome::Failed => summary.failed += 1,
            Outcome::Skipped => summary.skipped += 1,
        }
    }
    summary.attempted = summary.succeeded + summary.failed;
    info!(%summary, "batch finished");

    BatchResult {
        summary,
        processed,
        audit_path: audit.map(|a| a.path().to_path_buf()),
    }
}
