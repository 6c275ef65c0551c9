//! # CLI Module
//!
//! Command-line interface for the batch tools.
//!
//! ## Usage
//! ```bash
//! # Find duplicate files
//! altesse scan ~/Downloads
//!
//! # Delete duplicates, keeping one copy of each
//! altesse clean ~/Downloads --dry-run
//! altesse clean ~/Downloads --workers 4
//!
//! # Convert images
//! altesse convert *.png --out-dir converted --format webp
//!
//! # Rename files in place
//! altesse rename *.jpg --new-name holiday --dry-run
//!
//! # Show how much space conversions saved
//! altesse stats --output json
//! ```

use altesse_tools::core::converter::{BatchConverter, ConvertOptions, OutputFormat};
use altesse_tools::core::duplicates::DuplicateSet;
use altesse_tools::core::hasher::DigestAlgorithm;
use altesse_tools::core::parallel::{CancellationToken, PoolConfig};
use altesse_tools::core::reaper::{DuplicateReaper, ReapPlan};
use altesse_tools::core::rename::{BatchRenamer, RenameOptions};
use altesse_tools::core::scanner::DuplicateScanner;
use altesse_tools::error::Result;
use altesse_tools::events::{ConvertEvent, Event, EventChannel, EventReceiver, ReapEvent, ScanEvent};
use altesse_tools::stats::{StatsStore, StatsSummary};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::warn;

/// Altesse Tools - duplicate cleanup and bulk image conversion
#[derive(Parser, Debug)]
#[command(name = "altesse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find files with identical content
    Scan {
        /// Directory to scan
        root: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: Output,
    },

    /// Delete duplicate files, keeping the first copy of each group
    Clean {
        /// Directory to clean
        root: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Show what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Number of deletion workers (default: one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: Output,
    },

    /// Convert images to another format
    Convert {
        /// Images to convert
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Folder for converted files
        #[arg(long)]
        out_dir: PathBuf,

        /// Target format: png, jpeg, webp, avif, bmp, tiff
        #[arg(short, long, default_value = "jpeg", value_parser = parse_format)]
        format: OutputFormat,

        /// Quality for JPEG and AVIF (1-100, 0 = default)
        #[arg(short, long, default_value_t = altesse_tools::core::converter::DEFAULT_QUALITY)]
        quality: u8,

        /// Maximum quality for AVIF
        #[arg(long)]
        lossless: bool,

        /// PNG compression level (0-9)
        #[arg(long, default_value_t = altesse_tools::core::converter::DEFAULT_PNG_LEVEL)]
        png_level: u8,

        /// Number of conversion workers (default: CPUs, at most 8)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Statistics file (default: Documents/AltesseTools/stats.json)
        #[arg(long)]
        stats_file: Option<PathBuf>,

        /// Do not record usage statistics
        #[arg(long)]
        no_stats: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: Output,
    },

    /// Rename files or folders in place, keeping their extensions
    Rename {
        /// Files or folders to rename, numbered in this order
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Replace the whole name (numbered name_000, name_001, ... for several files)
        #[arg(long, default_value = "")]
        new_name: String,

        /// Text placed before the name or number
        #[arg(long, default_value = "")]
        prefix: String,

        /// Text placed after the name
        #[arg(long, default_value = "")]
        suffix: String,

        /// Text to replace in each name
        #[arg(long, default_value = "")]
        replace: String,

        /// Replacement for --replace
        #[arg(long, default_value = "")]
        with: String,

        /// Number the files from here (prefix + number)
        #[arg(long)]
        start: Option<u32>,

        /// Minimum digits for numbers
        #[arg(long, default_value_t = 0)]
        padding: usize,

        /// Show the new names without renaming anything
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: Output,
    },

    /// Show conversion statistics
    Stats {
        /// Statistics file (default: Documents/AltesseTools/stats.json)
        #[arg(long)]
        stats_file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: Output,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Digest algorithm
    #[arg(short, long, default_value = "blake3")]
    algorithm: Algorithm,

    /// Skip hidden files and directories
    #[arg(long)]
    skip_hidden: bool,

    /// Ignore files smaller than this many bytes
    #[arg(long, default_value_t = 0)]
    min_size: u64,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,
}

impl ScanArgs {
    fn scanner(&self) -> DuplicateScanner {
        DuplicateScanner::builder()
            .algorithm(self.algorithm.into())
            .include_hidden(!self.skip_hidden)
            .min_size(self.min_size)
            .follow_symlinks(self.follow_symlinks)
            .build()
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// BLAKE3 - cryptographic (default)
    Blake3,
    /// XXH3 - faster, non-cryptographic
    Xxh3,
}

impl From<Algorithm> for DigestAlgorithm {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Blake3 => DigestAlgorithm::Blake3,
            Algorithm::Xxh3 => DigestAlgorithm::Xxh3,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Output {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    altesse_tools::init_tracing(if cli.verbose { "debug" } else { "warn" });

    match cli.command {
        Commands::Scan { root, scan, output } => run_scan(&root, &scan, output),
        Commands::Clean {
            root,
            scan,
            dry_run,
            workers,
            output,
        } => run_clean(&root, &scan, dry_run, workers, output),
        Commands::Convert {
            paths,
            out_dir,
            format,
            quality,
            lossless,
            png_level,
            workers,
            stats_file,
            no_stats,
            output,
        } => {
            let options = ConvertOptions::new(format)
                .with_quality(quality)
                .with_lossless(lossless)
                .with_png_level(png_level);
            let stats = if no_stats {
                None
            } else {
                Some(stats_file.unwrap_or_else(StatsStore::default_location))
            };
            run_convert(&paths, &out_dir, &options, workers, stats, output)
        }
        Commands::Rename {
            paths,
            new_name,
            prefix,
            suffix,
            replace,
            with,
            start,
            padding,
            dry_run,
            output,
        } => {
            let options = RenameOptions {
                new_name,
                prefix,
                suffix,
                replace,
                with,
                start_number: start,
                padding,
            };
            run_rename(&paths, options, dry_run, output)
        }
        Commands::Stats { stats_file, output } => {
            run_stats(&stats_file.unwrap_or_else(StatsStore::default_location), output)
        }
    }
}

fn pool_config(workers: Option<usize>, fallback: PoolConfig) -> Result<PoolConfig> {
    match workers {
        Some(count) => Ok(PoolConfig::new(count)?),
        None => Ok(fallback),
    }
}

fn progress_bar(output: Output, template: &str) -> Option<ProgressBar> {
    if !matches!(output, Output::Pretty) {
        return None;
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    Some(pb)
}

/// Drive a progress bar from events until every sender is dropped.
fn spawn_progress(receiver: EventReceiver, progress: Option<ProgressBar>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else { continue };
            match event {
                Event::Scan(ScanEvent::Progress(p)) => {
                    pb.set_position(p.files_hashed as u64);
                    pb.set_message(
                        p.current_path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                            .into_owned(),
                    );
                }
                Event::Scan(ScanEvent::Completed(_)) | Event::Scan(ScanEvent::Failed { .. }) => {
                    pb.finish_and_clear();
                }
                Event::Reap(ReapEvent::Started { targets }) => {
                    pb.reset();
                    pb.set_length(targets as u64);
                }
                Event::Reap(ReapEvent::Deleted { .. }) => pb.inc(1),
                Event::Reap(ReapEvent::Completed { .. }) => pb.finish_and_clear(),
                Event::Convert(ConvertEvent::Started { total, .. }) => {
                    pb.set_length(total as u64);
                }
                Event::Convert(ConvertEvent::Progress(p)) => {
                    pb.set_position(p.current as u64);
                    pb.set_message(
                        p.path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                            .into_owned(),
                    );
                }
                Event::Convert(ConvertEvent::Completed { .. }) => pb.finish_and_clear(),
                _ => {}
            }
        }
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
    })
}

fn print_header(term: &Term, output: Output, title: &str) {
    if matches!(output, Output::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style(title).bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

fn scan_with_progress(root: &Path, args: &ScanArgs, output: Output) -> Result<DuplicateSet> {
    let scanner = args.scanner();
    if matches!(output, Output::Pretty) {
        let algorithm: DigestAlgorithm = args.algorithm.into();
        Term::stderr()
            .write_line(&format!(
                "  Scanning {} ({})",
                display_path(root),
                style(algorithm.description()).dim()
            ))
            .ok();
    }
    let (sender, receiver) = EventChannel::new();
    let events = spawn_progress(
        receiver,
        progress_bar(output, "{spinner:.green} {pos} files hashed {msg}"),
    );

    let result = scanner.scan_with_events(root, &sender);

    drop(sender);
    events.join().ok();

    Ok(result?.normalized())
}

fn run_scan(root: &Path, args: &ScanArgs, output: Output) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output, "Altesse Duplicate Scan");

    let duplicates = scan_with_progress(root, args, output)?;

    match output {
        Output::Pretty => print_pretty_groups(&term, &duplicates),
        Output::Json => print_json(&duplicates),
        Output::Minimal => print_minimal_targets(&ReapPlan::from_set(&duplicates)),
    }

    Ok(())
}

fn run_clean(
    root: &Path,
    args: &ScanArgs,
    dry_run: bool,
    workers: Option<usize>,
    output: Output,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output, "Altesse Duplicate Cleanup");

    let duplicates = scan_with_progress(root, args, output)?;
    let reaper = DuplicateReaper::new(pool_config(workers, PoolConfig::uncapped())?)?;
    let plan = reaper.plan(&duplicates);

    if dry_run {
        match output {
            Output::Pretty => {
                print_pretty_groups(&term, &duplicates);
                term.write_line(&format!(
                    "{} {} files would be deleted, freeing {}",
                    style("Dry run:").yellow().bold(),
                    style(plan.targets.len()).cyan(),
                    style(format_bytes(plan.reclaimable_bytes())).yellow()
                ))
                .ok();
            }
            Output::Json => print_json(&plan),
            Output::Minimal => print_minimal_targets(&plan),
        }
        return Ok(());
    }

    let (sender, receiver) = EventChannel::new();
    let events = spawn_progress(
        receiver,
        progress_bar(output, "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} deleted"),
    );

    let outcome = reaper.execute(&plan, &sender, &CancellationToken::new());

    drop(sender);
    events.join().ok();

    match output {
        Output::Pretty => {
            term.write_line(&format!(
                "{} Deleted {} of {} duplicate files",
                style("✓").green().bold(),
                style(outcome.deleted.len()).cyan(),
                plan.targets.len()
            ))
            .ok();
        }
        Output::Json => print_json(&serde_json::json!({
            "deleted": outcome.deleted,
            "error": outcome.error.as_ref().map(|e| e.to_string()),
        })),
        Output::Minimal => {
            for path in &outcome.deleted {
                println!("{}", path.display());
            }
        }
    }

    outcome.into_result()?;
    Ok(())
}

fn run_convert(
    paths: &[PathBuf],
    out_dir: &Path,
    options: &ConvertOptions,
    workers: Option<usize>,
    stats_file: Option<PathBuf>,
    output: Output,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output, "Altesse Image Converter");

    let mut converter = BatchConverter::new(pool_config(workers, PoolConfig::default())?)?;
    if let Some(path) = stats_file {
        converter = converter.with_recorder(Arc::new(StatsStore::open(path)));
    }

    let (sender, receiver) = EventChannel::new();
    let events = spawn_progress(
        receiver,
        progress_bar(output, "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}"),
    );

    let result = converter.convert_to_folder_with_events(paths, out_dir, options, &sender);

    drop(sender);
    events.join().ok();

    let written = result?;

    match output {
        Output::Pretty => {
            term.write_line(&format!(
                "{} Converted {} files to {} in {}",
                style("✓").green().bold(),
                style(written.len()).cyan(),
                style(options.format).yellow(),
                out_dir.display()
            ))
            .ok();
        }
        Output::Json => print_json(&written),
        Output::Minimal => {
            for path in &written {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn run_rename(
    paths: &[PathBuf],
    options: RenameOptions,
    dry_run: bool,
    output: Output,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output, "Altesse Batch Rename");

    let renamer = BatchRenamer::new(options);
    let planned = renamer.plan(paths)?;
    let renamed = if dry_run {
        planned
    } else {
        renamer.rename(paths)?
    };

    match output {
        Output::Pretty => {
            for (from, to) in paths.iter().zip(&renamed) {
                term.write_line(&format!(
                    "  {} → {}",
                    display_path(from),
                    style(to.file_name().unwrap_or_default().to_string_lossy()).green()
                ))
                .ok();
            }
            let verb = if dry_run { "Would rename" } else { "Renamed" };
            term.write_line(&format!(
                "{} {} {} files",
                style("✓").green().bold(),
                verb,
                style(renamed.len()).cyan()
            ))
            .ok();
        }
        Output::Json => print_json(&renamed),
        Output::Minimal => {
            for path in &renamed {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn run_stats(stats_file: &Path, output: Output) -> Result<()> {
    let summary = StatsStore::open(stats_file).summary()?;

    match output {
        Output::Pretty => print_pretty_stats(&Term::stdout(), &summary),
        Output::Json => print_json(&summary),
        Output::Minimal => println!("{}", summary.total_converted),
    }

    Ok(())
}

fn print_pretty_groups(term: &Term, duplicates: &DuplicateSet) {
    term.write_line(&format!(
        "  {} duplicate groups, {} redundant files",
        style(duplicates.len()).cyan(),
        style(duplicates.duplicate_count()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    if duplicates.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
        return;
    }

    for (i, (digest, paths)) in duplicates.iter().enumerate() {
        term.write_line(&format!(
            "  {} {} ({} files)",
            style(format!("Group {}:", i + 1)).bold(),
            style(&digest[..digest.len().min(12)]).dim(),
            paths.len()
        ))
        .ok();

        for (idx, path) in paths.iter().enumerate() {
            let marker = if idx == 0 {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            term.write_line(&format!("    {} {}", marker, display_path(path)))
                .ok();
        }
        term.write_line("").ok();
    }
}

fn print_pretty_stats(term: &Term, summary: &StatsSummary) {
    term.write_line(&format!(
        "{}",
        style("Conversion Statistics").bold().underlined()
    ))
    .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} files converted",
        style(summary.total_converted).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} → {}",
        format_bytes(summary.total_original_size),
        format_bytes(summary.total_compressed_size)
    ))
    .ok();
    term.write_line(&format!(
        "  Saved the equivalent of {} CDs or {} floppy disks",
        style(summary.total_saved_cd).yellow(),
        style(summary.total_saved_floppy).yellow()
    ))
    .ok();

    if !summary.formats.is_empty() {
        term.write_line("").ok();
        for (format, stats) in &summary.formats {
            term.write_line(&format!(
                "  {:<6} {:>6} files  {} → {}",
                style(format).bold(),
                stats.count,
                format_bytes(stats.original_size),
                format_bytes(stats.final_size)
            ))
            .ok();
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(error) => warn!(%error, "failed to serialize output"),
    }
}

fn print_minimal_targets(plan: &ReapPlan) {
    for path in &plan.targets {
        println!("{}", path.display());
    }
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(&home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
