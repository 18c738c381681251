use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tilemark::audit::AuditLog;
use tilemark::batch::{self, BatchOptions, CodeSource};
use tilemark::code::{CodeStrategy, resolve_code};
use tilemark::config::{self, DEFAULT_CONFIG_FILE, WatermarkConfig};
use tilemark::imaging::CoveragePolicy;
use tilemark::naming::output_file_name;
use tilemark::stats::UsageStats;
use tilemark::{Watermarker, output};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilemark")]
#[command(about = "Stamp a tiled, traceable watermark across images")]
#[command(long_about = "\
Stamp a tiled, traceable watermark across images

Every output carries a faint, repeating label such as '#3f9a1c' covering the
whole frame, so each copy can be traced back to the code it was issued under.

Codes:
  stamp --code X     the code you give, verbatim
  stamp              8 random hex characters
  batch              6 hex characters derived from the file name, logged to
                     watermark_log.csv in the output directory

All outputs are JPEG: photo.png -> photo_watermark.jpg
Batch runs use a larger label over an expanded grid by default ([batch] in
tilemark.toml).

Run 'tilemark gen-config' to generate a documented tilemark.toml.
Set RUST_LOG=tilemark=debug for per-stage diagnostics.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watermark a single image
    Stamp {
        /// Image to watermark
        input: PathBuf,
        /// Output file (default: <stem><suffix>.jpg next to the input)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Code to stamp (default: random 8-character code)
        #[arg(long)]
        code: Option<String>,
        /// Tile coverage: edge-aligned or expanded (overrides config)
        #[arg(long)]
        coverage: Option<CoveragePolicy>,
        /// Append the code and file name to this CSV audit log
        #[arg(long)]
        audit: Option<PathBuf>,
        /// Record the image in this usage statistics file
        #[arg(long)]
        stats: Option<PathBuf>,
    },
    /// Watermark every image in a directory
    Batch {
        /// Directory with source images (not recursive)
        #[arg(long, default_value = "input")]
        input: PathBuf,
        /// Directory for watermarked images (created if missing)
        #[arg(long, default_value = "output")]
        output: PathBuf,
        /// Code source: content, stem or random
        #[arg(long, default_value = "content")]
        codes: CodeSource,
        /// Tile coverage: edge-aligned or expanded (overrides config)
        #[arg(long)]
        coverage: Option<CoveragePolicy>,
        /// Do not write watermark_log.csv
        #[arg(long)]
        no_audit: bool,
        /// Record processed images in this usage statistics file
        #[arg(long)]
        stats: Option<PathBuf>,
    },
    /// Print a stock tilemark.toml with all options documented
    GenConfig,
    /// Show usage statistics
    Stats {
        /// Statistics file
        #[arg(long, default_value = "stats.json")]
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Stamp {
            input,
            output: out,
            code,
            coverage,
            audit,
            stats,
        } => {
            let config = config::load_config(&cli.config)?;
            let watermarker = build_watermarker(&config, coverage);
            let dest = out.unwrap_or_else(|| {
                input.with_file_name(output_file_name(&input, &config.output.suffix))
            });
            let code = resolve_code(code.as_deref(), &CodeStrategy::RandomShort);
            let marked = watermarker.watermark_file(&input, &dest, &CodeStrategy::Explicit(code))?;

            let filename = display_file_name(&input);
            if let Some(audit_path) = audit {
                // Image already written: report the failure, keep the result.
                if let Err(e) = AuditLog::open_append(&audit_path)
                    .and_then(|log| log.append(&marked.code, &filename))
                {
                    tracing::warn!(error = %e, "audit append failed");
                    eprintln!("Warning: {e}");
                }
            }
            if let Some(stats_path) = stats {
                let mut usage = UsageStats::load(&stats_path);
                usage.record_now(&filename, &marked.code);
                usage.save(&stats_path)?;
            }
            output::print_stamp_result(&input, &dest, &marked.code);
        }
        Command::Batch {
            input,
            output: out,
            codes,
            coverage,
            no_audit,
            stats,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let watermarker = build_batch_watermarker(&config, coverage);

            let cancel = batch::cancel_on_interrupt()?;

            let options = BatchOptions {
                input_dir: input,
                output_dir: out,
                codes,
                suffix: config.output.suffix.clone(),
                write_audit: !no_audit,
                cancel: Some(cancel),
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::run_batch(&watermarker, &options, Some(tx));
            printer.join().ok();
            let result = result?;

            if let Some(stats_path) = stats {
                let mut usage = UsageStats::load(&stats_path);
                for processed in &result.processed {
                    usage.record_now(&processed.filename, &processed.code);
                }
                usage.save(&stats_path)?;
            }
            output::print_batch_summary(&result);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Stats { file } => {
            output::print_stats(&UsageStats::load(&file));
        }
    }

    Ok(())
}

/// Diagnostics to stderr, filtered by `RUST_LOG` (default `tilemark=info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tilemark=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn build_watermarker(config: &WatermarkConfig, coverage: Option<CoveragePolicy>) -> Watermarker {
    let mut spec = config.to_spec();
    if let Some(coverage) = coverage {
        spec.coverage = coverage;
    }
    Watermarker::new(spec, &config.label.font_dirs)
}

/// Like [`build_watermarker`], with the `[batch]` size and coverage.
fn build_batch_watermarker(
    config: &WatermarkConfig,
    coverage: Option<CoveragePolicy>,
) -> Watermarker {
    let mut spec = config.to_batch_spec();
    if let Some(coverage) = coverage {
        spec.coverage = coverage;
    }
    Watermarker::new(spec, &config.label.font_dirs)
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
