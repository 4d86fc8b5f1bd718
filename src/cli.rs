//! Command-line interface for java-reviewer.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{ReviewConfig, DEFAULT_CONFIG_NAMES};
use crate::detect::{DetectorKind, Runner};
use crate::diff::{attribution, GitRepository};
use crate::files;
use crate::report::{self, Format};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_SKIPPED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Java code review facts.
///
/// Locates method declarations, variables, calls, string literals, control
/// flow and generic constructions in Java sources, and maps the changes
/// between two git revisions onto line ranges.
#[derive(Parser)]
#[command(name = "java-reviewer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a Java file or directory
    Scan(ScanArgs),
    /// List the changes between two revisions
    Diff(DiffArgs),
    /// Report findings on the lines changed between two revisions
    Changed(ChangedArgs),
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: Format,

    /// Substring for the raw_text_match detector
    #[arg(short, long)]
    pub needle: Option<String>,

    /// Run only these detectors (repeatable)
    #[arg(short, long = "detector", value_name = "KIND")]
    pub detectors: Vec<DetectorKind>,

    /// Scan files with syntax errors instead of skipping them
    #[arg(long)]
    pub lenient: bool,
}

/// Arguments for the diff command.
#[derive(Parser)]
pub struct DiffArgs {
    /// Repository path
    pub repo: PathBuf,
    /// Old revision
    pub old: String,
    /// New revision
    pub new: String,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: Format,
}

/// Arguments for the changed command.
#[derive(Parser)]
pub struct ChangedArgs {
    /// Repository path
    pub repo: PathBuf,
    /// Old revision
    pub old: String,
    /// New revision
    pub new: String,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: Format,

    /// Substring for the raw_text_match detector
    #[arg(short, long)]
    pub needle: Option<String>,
}

/// Load the config and apply command-line overrides.
fn load_config(
    explicit: Option<&Path>,
    needle: Option<&str>,
    detectors: &[DetectorKind],
    lenient: bool,
) -> anyhow::Result<(ReviewConfig, Option<PathBuf>)> {
    let cwd = std::env::current_dir()?;
    let (mut config, path) = ReviewConfig::load(explicit, &cwd)?;
    if path.is_none() {
        tracing::debug!("no config found (looked for {})", DEFAULT_CONFIG_NAMES.join(", "));
    }

    if let Some(needle) = needle {
        config.raw_needle = needle.to_string();
    }
    if !detectors.is_empty() {
        config.detectors = detectors.to_vec();
    }
    if lenient {
        config.allow_syntax_errors = true;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;
    Ok((config, path))
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let (config, config_path) = match load_config(
        args.config.as_deref(),
        args.needle.as_deref(),
        &args.detectors,
        args.lenient,
    ) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Resolve path
    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = files::collect_java_files(&abs_path, &config)?;
    if files.is_empty() {
        eprintln!("Warning: no Java files to scan");
        return Ok(EXIT_SUCCESS);
    }
    tracing::info!(files = files.len(), root = %abs_path.display(), "scanning");

    let report = Runner::from_config(&config).run(&files);

    match args.format {
        Format::Json => report::write_scan_json(&abs_path, config_path.as_deref(), &report)?,
        Format::Pretty => report::write_scan_pretty(&abs_path, config_path.as_deref(), &report),
    }

    if report.has_skipped() {
        Ok(EXIT_SKIPPED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the diff command.
pub fn run_diff(args: &DiffArgs) -> anyhow::Result<i32> {
    let entries = match GitRepository::open(&args.repo).and_then(|r| r.changes(&args.old, &args.new)) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match args.format {
        Format::Json => report::write_changes_json(&args.repo, &args.old, &args.new, &entries)?,
        Format::Pretty => report::write_changes_pretty(&args.repo, &args.old, &args.new, &entries),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the changed command.
pub fn run_changed(args: &ChangedArgs) -> anyhow::Result<i32> {
    let (config, _) = match load_config(args.config.as_deref(), args.needle.as_deref(), &[], false) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let repo = match GitRepository::open(&args.repo) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let runner = Runner::from_config(&config);
    let include = |path: &str| path.ends_with(".java") && !config.is_path_excluded(Path::new(path));
    let report = match attribution::scan_changed(&repo, &args.old, &args.new, &runner, include) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match args.format {
        Format::Json => report::write_changed_json(repo.root(), &args.old, &args.new, &report)?,
        Format::Pretty => report::write_changed_pretty(repo.root(), &args.old, &args.new, &report),
    }

    if report.has_skipped() {
        Ok(EXIT_SKIPPED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
