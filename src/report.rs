//! Output formatting for review results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::detect::{DetectorKind, FileReport, Finding, FindingSet, ScanReport, SkippedFile};
use crate::diff::{ChangeEntry, ChangeKind};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Pretty,
    Json,
}

// =============================================================================
// JSON Format
// =============================================================================

/// Findings of a scan, with paths relative to the scanned root.
#[derive(Debug, Serialize)]
pub struct JsonScanReport {
    pub version: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revisions: Option<JsonRevisions>,
    pub files_scanned: usize,
    pub total_findings: usize,
    pub counts: BTreeMap<DetectorKind, usize>,
    pub files: Vec<JsonFile>,
    pub skipped: Vec<JsonSkipped>,
}

/// Revision pair of a `changed` run.
#[derive(Debug, Serialize)]
pub struct JsonRevisions {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Serialize)]
pub struct JsonFile {
    pub path: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_syntax_errors: bool,
    pub findings: FindingSet,
}

#[derive(Debug, Serialize)]
pub struct JsonSkipped {
    pub path: String,
    pub reason: String,
}

/// Change entries between two revisions.
#[derive(Debug, Serialize)]
pub struct JsonDiffReport<'a> {
    pub version: String,
    pub repo: String,
    pub old: String,
    pub new: String,
    pub entries: &'a [ChangeEntry],
}

/// Build the JSON view of a scan. `base_path` is stripped from file paths.
pub fn scan_json(base_path: &Path, config_path: Option<&Path>, report: &ScanReport) -> JsonScanReport {
    JsonScanReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: base_path.to_string_lossy().to_string(),
        config: config_path.map(|p| p.to_string_lossy().to_string()),
        revisions: None,
        files_scanned: report.files.len(),
        total_findings: report.total_findings(),
        counts: report.counts(),
        files: report
            .files
            .iter()
            .map(|f| file_to_json(f, base_path))
            .collect(),
        skipped: report
            .skipped
            .iter()
            .map(|s| skipped_to_json(s, base_path))
            .collect(),
    }
}

/// Write scan results in JSON format.
pub fn write_scan_json(base_path: &Path, config_path: Option<&Path>, report: &ScanReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&scan_json(base_path, config_path, report))?;
    println!("{}", json);
    Ok(())
}

/// Write findings on changed lines in JSON format.
pub fn write_changed_json(repo: &Path, old: &str, new: &str, report: &ScanReport) -> anyhow::Result<()> {
    let mut json = scan_json(repo, None, report);
    json.revisions = Some(JsonRevisions {
        old: old.to_string(),
        new: new.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Write change entries in JSON format.
pub fn write_changes_json(repo: &Path, old: &str, new: &str, entries: &[ChangeEntry]) -> anyhow::Result<()> {
    let report = JsonDiffReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        repo: repo.to_string_lossy().to_string(),
        old: old.to_string(),
        new: new.to_string(),
        entries,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn file_to_json(file: &FileReport, base_path: &Path) -> JsonFile {
    JsonFile {
        path: make_relative_path(&file.path, base_path),
        has_syntax_errors: file.has_syntax_errors,
        findings: file.findings.clone(),
    }
}

fn skipped_to_json(skipped: &SkippedFile, base_path: &Path) -> JsonSkipped {
    JsonSkipped {
        path: make_relative_path(&skipped.path, base_path),
        reason: skipped.reason.clone(),
    }
}

fn make_relative_path(file: &Path, base_path: &Path) -> String {
    if base_path.as_os_str().is_empty() {
        return file.to_string_lossy().to_string();
    }

    // If they're the same (single file scan), return just the filename
    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string_lossy().to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file.to_string_lossy().to_string())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// One line of pretty output for a finding, without colors:
/// `name`, the matched text and the enclosing type when present, then the span.
pub fn describe_finding(finding: &Finding) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(name) = &finding.name {
        parts.push(name.clone());
    }
    if let Some(text) = &finding.text {
        // raw text matches carry the needle, which says nothing per line
        if finding.kind != DetectorKind::RawTextMatch {
            parts.push(format!("{:?}", text));
        }
    }
    if let Some(ty) = &finding.enclosing_type {
        parts.push(format!("in {}", ty));
    }
    let location = if finding.span.start == finding.span.end {
        format!("line {}", finding.span)
    } else {
        format!("lines {}", finding.span)
    };
    if parts.is_empty() {
        location
    } else {
        format!("{}, {}", parts.join(", "), location)
    }
}

/// Write scan results in pretty (human-readable) format.
pub fn write_scan_pretty(base_path: &Path, config_path: Option<&Path>, report: &ScanReport) {
    write_header();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", base_path.display());
    print!("  {}", "Config:   ".dimmed());
    match config_path {
        Some(p) => println!("{}", p.display()),
        None => println!("{}", "(defaults)".dimmed()),
    }
    println!();

    write_files(report, base_path);
    write_summary(report);
}

/// Write findings on changed lines in pretty format.
pub fn write_changed_pretty(repo: &Path, old: &str, new: &str, report: &ScanReport) {
    write_header();

    print!("  {}", "Repository: ".dimmed());
    println!("{}", repo.display());
    print!("  {}", "Changes:    ".dimmed());
    println!("{} {} {}", old, "..".dimmed(), new);
    println!();

    write_files(report, repo);
    write_summary(report);
}

/// Write change entries in pretty format.
pub fn write_changes_pretty(repo: &Path, old: &str, new: &str, entries: &[ChangeEntry]) {
    write_header();

    print!("  {}", "Repository: ".dimmed());
    println!("{}", repo.display());
    print!("  {}", "Changes:    ".dimmed());
    println!("{} {} {}", old, "..".dimmed(), new);
    println!();

    if entries.is_empty() {
        println!("  {}", "No changes.".dimmed());
        println!();
        return;
    }

    for entry in entries {
        print!("    ");
        write_change_tag(entry.kind);
        match (&entry.old_path, &entry.new_path) {
            (Some(old_path), Some(new_path)) if old_path != new_path => {
                println!("{} {} {}", old_path.blue(), "->".dimmed(), new_path.blue())
            }
            _ => println!("{}", entry.path().blue()),
        }
        for hunk in &entry.hunks {
            println!(
                "            {} {} {}",
                hunk.old.to_string().dimmed(),
                "->".dimmed(),
                hunk.new
            );
        }
    }
    println!();
    println!(
        "  {} {}",
        entries.len(),
        if entries.len() == 1 { "entry" } else { "entries" }
    );
    println!();
}

fn write_header() {
    println!();
    print!("  ");
    print!("{}", "java-reviewer".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn write_change_tag(kind: ChangeKind) {
    let tag = format!("{:<7}", kind.as_str().to_uppercase());
    match kind {
        ChangeKind::Add => print!("{} ", tag.green()),
        ChangeKind::Delete => print!("{} ", tag.red()),
        ChangeKind::Modify => print!("{} ", tag.yellow()),
        ChangeKind::Rename | ChangeKind::Copy => print!("{} ", tag.cyan()),
    }
}

fn write_files(report: &ScanReport, base_path: &Path) {
    for file in &report.files {
        if file.findings.is_empty() {
            continue;
        }
        print!("  {}", make_relative_path(&file.path, base_path).blue().bold());
        if file.has_syntax_errors {
            print!("  {}", "(recovered from syntax errors)".yellow());
        }
        println!();

        for (kind, findings) in file.findings.iter() {
            for finding in findings {
                println!("    {:<22} {}", kind.label().dimmed(), describe_finding(finding));
            }
        }
        println!();
    }

    if report.has_skipped() {
        println!("  {} ({}):", "Skipped".yellow().bold(), report.skipped.len());
        for skipped in &report.skipped {
            print!("    {}", make_relative_path(&skipped.path, base_path).blue());
            println!();
            println!("            {}", skipped.reason.dimmed());
        }
        println!();
    }
}

fn write_summary(report: &ScanReport) {
    let counts = report.counts();
    if counts.values().any(|c| *c > 0) {
        println!("  {}", "Summary:".bold());
        for (kind, count) in counts.iter().filter(|(_, c)| **c > 0) {
            println!("    {:<32} {:>5}", kind.as_str(), count);
        }
        println!();
    }

    let files = report.files.len();
    let status = format!(
        "{} file{} scanned, {} finding{}",
        files,
        if files == 1 { "" } else { "s" },
        report.total_findings(),
        if report.total_findings() == 1 { "" } else { "s" }
    );
    if report.has_skipped() {
        println!(
            "  {} {}, {}",
            "✗".yellow(),
            status,
            format!("{} skipped", report.skipped.len()).yellow()
        );
    } else {
        println!("  {} {}", "✓".green(), status);
    }
    println!();
}
