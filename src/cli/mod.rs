//! # CLI Module
//!
//! Command-line interface for the near-duplicate image finder.
//!
//! ## Usage
//! ```bash
//! # Scan a directory for near-duplicates
//! dif scan ~/Pictures
//!
//! # Stricter threshold, 128x128 fingerprints
//! dif scan ~/Pictures --threshold 0.1 --high-fidelity
//!
//! # Merge chains of matches into single groups
//! dif scan ~/Pictures --mode transitive
//!
//! # JSON output
//! dif scan ~/Pictures --output json
//!
//! # Print fingerprints
//! dif fingerprint a.jpg b.jpg
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_dup_finder::core::config::{DetectionConfig, GroupingMode, HashSize};
use image_dup_finder::core::fingerprint::{HashAlgorithmKind, ProviderConfig};
use image_dup_finder::core::pipeline::{Pipeline, PipelineResult};
use image_dup_finder::core::scanner::ScanConfig;
use image_dup_finder::error::Result;
use image_dup_finder::events::{
    Event, EventChannel, FingerprintEvent, GroupEvent, PipelineEvent,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

/// dif - find visually near-identical images
#[derive(Parser, Debug)]
#[command(name = "dif")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan directories for near-duplicate images
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Fingerprint grid size (fingerprints have size² bits)
        #[arg(long, default_value_t = 8, conflicts_with = "high_fidelity")]
        hash_size: u32,

        /// Use 128x128 fingerprints (slower, finer)
        #[arg(long)]
        high_fidelity: bool,

        /// Maximum fraction of differing bits (0 = identical only, 1 = everything)
        #[arg(short, long, default_value_t = 0.2)]
        threshold: f64,

        /// How matches are grouped
        #[arg(short, long, default_value = "directional")]
        mode: Mode,

        /// Fingerprint algorithm to use
        #[arg(short, long, default_value = "perceptual")]
        algorithm: Algorithm,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Maximum directory depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Run on a single thread
        #[arg(long)]
        sequential: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the fingerprint of each file as hex
    Fingerprint {
        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Fingerprint grid size
        #[arg(long, default_value_t = 8)]
        hash_size: u32,

        /// Fingerprint algorithm to use
        #[arg(short, long, default_value = "perceptual")]
        algorithm: Algorithm,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Perceptual Hash - DCT based, most robust to edits (default)
    Perceptual,
    /// Difference Hash - brightness gradients
    Difference,
    /// Average Hash - fast, good for exact duplicates
    Average,
}

impl From<Algorithm> for HashAlgorithmKind {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Perceptual => HashAlgorithmKind::Perceptual,
            Algorithm::Difference => HashAlgorithmKind::Difference,
            Algorithm::Average => HashAlgorithmKind::Average,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Attach later images to the earliest image they match
    Directional,
    /// Merge chains of matches into one group
    Transitive,
}

impl From<Mode> for GroupingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Directional => GroupingMode::Directional,
            Mode::Transitive => GroupingMode::Transitive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            hash_size,
            high_fidelity,
            threshold,
            mode,
            algorithm,
            output,
            include_hidden,
            follow_symlinks,
            max_depth,
            sequential,
            verbose,
        } => {
            image_dup_finder::init_tracing(verbose);

            let hash_size = if high_fidelity {
                HashSize::HIGH_FIDELITY.get()
            } else {
                hash_size
            };
            let detection = DetectionConfig::from_raw(hash_size, threshold)?.with_mode(mode.into());
            let scan_config = ScanConfig {
                follow_symlinks,
                include_hidden,
                max_depth,
            };

            run_scan(
                paths,
                detection,
                algorithm.into(),
                scan_config,
                !sequential,
                output,
                verbose,
            )
        }
        Commands::Fingerprint {
            files,
            hash_size,
            algorithm,
        } => {
            image_dup_finder::init_tracing(false);
            run_fingerprint(&files, HashSize::new(hash_size)?, algorithm.into());
            Ok(())
        }
    }
}

fn run_scan(
    paths: Vec<PathBuf>,
    detection: DetectionConfig,
    algorithm: HashAlgorithmKind,
    scan_config: ScanConfig,
    parallel: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    // Print header
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("dif").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} {}, hash size {}, threshold {}, {} grouping",
            style("Using").dim(),
            algorithm,
            detection.hash_size,
            detection.threshold,
            detection.mode
        ))
        .ok();
        term.write_line("").ok();
    }

    let pipeline = Pipeline::builder(detection)
        .paths(paths)
        .algorithm(algorithm)
        .scan_config(scan_config)
        .parallel(parallel)
        .build();

    // Only the pretty output has a progress bar to feed
    let result = if matches!(output, OutputFormat::Pretty) {
        run_with_progress(&pipeline, verbose)?
    } else {
        pipeline.run()?
    };

    // Output results
    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, verbose),
        OutputFormat::Json => print_json_results(&result)?,
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

/// Run the pipeline while an event thread drives an indicatif bar
fn run_with_progress(pipeline: &Pipeline, verbose: bool) -> Result<PipelineResult> {
    let (sender, receiver) = EventChannel::new();

    let pb = ProgressBar::new(0);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(bar_style.progress_chars("█▓░"));
    }

    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Fingerprint(FingerprintEvent::Started { total_images })
                | Event::Group(GroupEvent::Started { total_images }) => {
                    pb.set_length(total_images as u64);
                    pb.set_position(0);
                }
                Event::Fingerprint(FingerprintEvent::Progress(p))
                | Event::Group(GroupEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Fingerprint(FingerprintEvent::Failed { path }) if verbose => {
                    pb.println(format!(
                        "  {} {}",
                        style("could not read").red(),
                        display_path(&path)
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Dropping the sender ends the event thread's loop
    drop(sender);
    event_thread.join().ok();

    result
}

fn run_fingerprint(files: &[PathBuf], hash_size: HashSize, algorithm: HashAlgorithmKind) {
    let provider = ProviderConfig::new().algorithm(algorithm).build();
    let term = Term::stderr();

    for file in files {
        match provider.fingerprint_file(file, hash_size) {
            Ok(fingerprint) => println!("{}  {}", fingerprint.to_hex(), file.display()),
            Err(e) => {
                term.write_line(&format!("{} {}", style("error:").red().bold(), e))
                    .ok();
            }
        }
    }
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images scanned in {:.1}s",
        style(result.total_images).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    if !result.failed.is_empty() {
        term.write_line(&format!(
            "  {} images could not be read",
            style(result.failed.len()).red()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} duplicate groups found",
        style(result.groups.len()).cyan()
    ))
    .ok();

    let duplicates = unique_duplicates(result);
    term.write_line(&format!(
        "  {} duplicate images",
        style(duplicates.len()).cyan()
    ))
    .ok();

    let savings: u64 = duplicates
        .iter()
        .filter_map(|path| std::fs::metadata(path).ok())
        .map(|m| m.len())
        .sum();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(savings)).yellow()
    ))
    .ok();

    if verbose {
        for error in &result.errors {
            term.write_line(&format!("  {} {}", style("warning:").yellow(), error))
                .ok();
        }
    }

    term.write_line("").ok();

    // Show groups
    if result.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
    } else {
        term.write_line(&format!(
            "{}",
            style("Duplicate Groups:").bold().underlined()
        ))
        .ok();
        term.write_line("").ok();

        for (i, group) in result.groups.iter().enumerate() {
            let heading = group
                .best_match()
                .map(|m| m.to_string())
                .unwrap_or_default();
            term.write_line(&format!(
                "  {} {} ({} images)",
                style(format!("Group {}:", i + 1)).bold(),
                style(heading).yellow(),
                group.members.len() + 1,
            ))
            .ok();

            term.write_line(&format!(
                "    {} {}",
                style("★").green(),
                display_path(&group.representative)
            ))
            .ok();

            for member in &group.members {
                term.write_line(&format!(
                    "    {} {} {}",
                    style("○").dim(),
                    display_path(&member.path),
                    style(format!(
                        "({:.1}% similar, {})",
                        (1.0 - member.distance) * 100.0,
                        member.match_type
                    ))
                    .dim()
                ))
                .ok();
            }

            term.write_line("").ok();
        }
    }

    // Footer
    term.write_line(&format!(
        "{}",
        style("No files were modified. Review carefully before taking action.").dim()
    ))
    .ok();
}

fn print_json_results(result: &PipelineResult) -> Result<()> {
    let output = serde_json::json!({
        "total_images": result.total_images,
        "failed": result.failed,
        "errors": result.errors,
        "duplicate_groups": result.groups.len(),
        "duplicate_count": result.groups.duplicate_count(),
        "duration_ms": result.duration_ms,
        "groups": result.groups,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_minimal_results(result: &PipelineResult) {
    for path in unique_duplicates(result) {
        println!("{}", path.display());
    }
}

/// Member paths across all groups, first occurrence only.
///
/// Directional groups may share members.
fn unique_duplicates(result: &PipelineResult) -> Vec<&Path> {
    let mut seen = HashSet::new();
    result
        .groups
        .iter()
        .flat_map(|g| g.member_paths())
        .filter(|path| seen.insert(*path))
        .collect()
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir()
        .as_deref()
        .and_then(|home| path.strip_prefix(home).ok())
    {
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
