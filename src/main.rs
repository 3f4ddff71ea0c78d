//! dirlisthash - inventory a directory tree with optional SHA1/MD5 digests.
//!
//! Usage:
//!   dirlisthash [ROOT]                     CSV report with SHA1 digests
//!   dirlisthash ROOT --hash both           SHA1 and MD5
//!   dirlisthash ROOT --format both         CSV and SQLite reports
//!   dirlisthash ROOT --db out.db           SQLite report at an explicit path
//!   dirlisthash --help                     Show help

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing_subscriber::EnvFilter;

use dirlisthash::{
    DEFAULT_CHUNK_SIZE, HashMode, Inventory, OutputTarget, RunConfig, RunOutcome, WalkProgress,
    default_report_stem,
};

#[derive(Parser)]
#[command(
    name = "dirlisthash",
    version,
    about = "Inventory a directory tree with optional SHA1/MD5 digests",
    long_about = "dirlisthash walks a directory depth-first and writes one row per file and \
                  directory (type, path, name, size, digests, timestamps) to CSV and/or SQLite.\n\n\
                  Entries that cannot be read are reported as warnings; the walk continues."
)]
struct Cli {
    /// Directory to inventory (defaults to current directory)
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Digests to compute for files
    #[arg(long, value_enum, default_value = "sha1")]
    hash: HashArg,

    /// Report formats to write [default: csv, or whatever --csv/--db name]
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Directory for generated report names
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Explicit CSV report path (enables CSV output)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Explicit SQLite report path (enables SQLite output)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Read chunk size for hashing, in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Hashing threads (1 = sequential, 0 = one per CPU)
    #[arg(short = 'j', long, default_value_t = 1)]
    threads: usize,

    /// CSV field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Show a live progress spinner
    #[arg(short, long)]
    progress: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    summary: SummaryFormat,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HashArg {
    None,
    Sha1,
    Md5,
    Both,
}

impl From<HashArg> for HashMode {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::None => HashMode::None,
            HashArg::Sha1 => HashMode::Sha1,
            HashArg::Md5 => HashMode::Md5,
            HashArg::Both => HashMode::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Sqlite,
    Both,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum SummaryFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = build_config(&cli)?;
    let outputs = config.outputs.clone();

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing current entries...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let inventory = Inventory::new(config)
        .context("Invalid configuration")?
        .with_interrupt(interrupt);

    let json = matches!(cli.summary, SummaryFormat::Json);
    let started = Local::now();
    status(json, &format!("Process started at: {}", started.format("%Y-%m-%d %H:%M:%S")));

    let reporter = cli
        .progress
        .then(|| ProgressReporter::spawn(inventory.subscribe()));

    let result = inventory.run();

    if let Some(reporter) = reporter {
        reporter.finish();
    }

    let outcome = result.context("Inventory failed")?;

    let finished = Local::now();
    status(json, &format!("Process finished at: {}", finished.format("%Y-%m-%d %H:%M:%S")));
    status(json, &format!("Total duration: {}", format_duration(outcome.summary.duration)));

    match cli.summary {
        SummaryFormat::Text => print_summary(&outcome, &outputs),
        SummaryFormat::Json => print_json(&outcome, &outputs)?,
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dirlisthash=debug,warn")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dirlisthash=info,warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Translate arguments into a run config with resolved output paths.
fn build_config(cli: &Cli) -> Result<RunConfig> {
    let delimiter = u8::try_from(cli.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| eyre!("Delimiter must be a single ASCII character"))?;

    let named_root = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());
    let stem = default_report_stem(&named_root, &Local::now().naive_local());
    let default_path = |ext: &str| cli.output_dir.join(format!("{stem}.{ext}"));

    let (want_csv, want_db) = selected_formats(cli);
    let mut outputs = Vec::new();
    if want_csv {
        let path = cli.csv.clone().unwrap_or_else(|| default_path("csv"));
        outputs.push(OutputTarget::tabular(path));
    }
    if want_db {
        let path = cli.db.clone().unwrap_or_else(|| default_path("db"));
        outputs.push(OutputTarget::database(path));
    }

    RunConfig::builder()
        .root(cli.root.clone())
        .hash_mode(HashMode::from(cli.hash))
        .outputs(outputs)
        .chunk_size(cli.chunk_size)
        .threads(cli.threads)
        .delimiter(delimiter)
        .build()
        .context("Invalid configuration")
}

/// Formats to write as `(csv, sqlite)`.
///
/// An explicit `--csv` or `--db` path always enables its format. Without
/// `--format`, only the explicitly named formats are written, falling back
/// to CSV when neither is named.
fn selected_formats(cli: &Cli) -> (bool, bool) {
    let explicit = (cli.csv.is_some(), cli.db.is_some());
    match cli.format {
        Some(FormatArg::Csv) => (true, explicit.1),
        Some(FormatArg::Sqlite) => (explicit.0, true),
        Some(FormatArg::Both) => (true, true),
        None if explicit == (false, false) => (true, false),
        None => explicit,
    }
}

/// Spinner fed from the walk's progress channel.
struct ProgressReporter {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    fn spawn(mut rx: broadcast::Receiver<WalkProgress>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
            {
                bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            bar.enable_steady_tick(Duration::from_millis(100));

            let mut latest: Option<WalkProgress> = None;
            while !thread_stop.load(Ordering::SeqCst) {
                match rx.try_recv() {
                    Ok(progress) => latest = Some(progress),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Closed) => break,
                    Err(TryRecvError::Empty) => {
                        if let Some(progress) = latest.take() {
                            bar.set_message(progress_message(&progress));
                        }
                        thread::sleep(Duration::from_millis(50));
                    }
                }
            }

            bar.finish_and_clear();
        });

        Self { stop, handle }
    }

    fn finish(self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.handle.join();
    }
}

fn progress_message(progress: &WalkProgress) -> String {
    format!(
        "Dirs: {} | Files: {} | Size: {} | Rate: {:.0}/s, {}/s | Warnings: {} | {}",
        progress.directories,
        progress.files,
        format_size(progress.bytes),
        progress.entries_per_second(),
        format_size(progress.bytes_per_second() as u64),
        progress.warnings,
        truncate(&progress.current_path.display().to_string(), 60),
    )
}

/// Timing lines go to stderr when stdout carries JSON.
fn status(json: bool, line: &str) {
    if json {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn print_summary(outcome: &RunOutcome, outputs: &[OutputTarget]) {
    let summary = &outcome.summary;

    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", summary.root.display());
    println!(
        " {} files, {} directories, {}",
        summary.files,
        summary.directories,
        format_size(summary.total_bytes)
    );
    println!(" {} files hashed", summary.hashed_files);
    if summary.interrupted {
        println!(" Interrupted before the walk completed");
    }
    println!("{}", "─".repeat(60));

    if summary.has_warnings() {
        println!();
        println!(
            " {} warning(s): {} skipped, {} without digests",
            summary.warning_count(),
            summary.skipped_count(),
            summary.partial_count()
        );
        for (kind, count) in summary.warnings_by_kind() {
            println!("   {kind:<16} {count}");
        }
    }

    println!();
    for target in outputs {
        let failed = outcome
            .sink_failures
            .iter()
            .any(|e| e.destination() == Some(target.path.as_path()));
        let marker = if failed { "FAILED" } else { "written" };
        println!(" {} ({}): {}", target.path.display(), target.format, marker);
    }
    for failure in &outcome.sink_failures {
        println!("   {failure}");
    }
}

fn print_json(outcome: &RunOutcome, outputs: &[OutputTarget]) -> Result<()> {
    let report = serde_json::json!({
        "summary": outcome.summary,
        "warnings_by_kind": outcome.summary.warnings_by_kind(),
        "outputs": outputs,
        "sink_failures": outcome
            .sink_failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        "success": outcome.is_success(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// `H:MM:SS.mmm`
fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{}:{:02}:{:02}.{:03}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        duration.subsec_millis()
    )
}

/// Keep the tail of a long path.
fn truncate(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(len - (max_len - 1)).collect();
        format!("…{tail}")
    }
}
