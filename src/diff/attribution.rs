//! Split findings by whether they sit on lines a change touched.

use crate::detect::{Finding, FindingSet, Runner, ScanReport};

use super::{ChangeKind, DiffError, GitRepository, LineRangeEdit};

/// Findings of one file, partitioned by the file's new-side hunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub changed: Vec<Finding>,
    pub unchanged: Vec<Finding>,
}

/// A finding is changed when its span shares a line with a non-empty
/// new-side range. Findings without a known span are never changed.
pub fn is_changed(finding: &Finding, hunks: &[LineRangeEdit]) -> bool {
    hunks
        .iter()
        .any(|h| finding.span.overlaps_lines(h.new.begin, h.new.end))
}

/// Partition findings, keeping their relative order on both sides.
pub fn attribute<I>(findings: I, hunks: &[LineRangeEdit]) -> Attribution
where
    I: IntoIterator<Item = Finding>,
{
    let (changed, unchanged) = findings.into_iter().partition(|f| is_changed(f, hunks));
    Attribution { changed, unchanged }
}

/// Drop every finding of the set that no hunk touches.
pub fn retain_changed(findings: &mut FindingSet, hunks: &[LineRangeEdit]) {
    findings.retain(|f| is_changed(f, hunks));
}

/// Scan the new revision of every changed file accepted by `include` and
/// keep only the findings on changed lines.
///
/// Deleted entries and entries without changed lines are ignored. Paths in
/// the report are `repo`-root joined.
/// A file that fails to parse is recorded as skipped.
pub fn scan_changed<F>(
    repo: &GitRepository,
    old_rev: &str,
    new_rev: &str,
    runner: &Runner,
    include: F,
) -> Result<ScanReport, DiffError>
where
    F: Fn(&str) -> bool,
{
    let mut report = ScanReport::default();

    for entry in repo.changes(old_rev, new_rev)? {
        if entry.kind == ChangeKind::Delete {
            continue;
        }
        let Some(path) = entry.new_path.as_deref() else {
            continue;
        };
        if !include(path) {
            continue;
        }
        // nothing can land on a change without lines (submodules, binaries,
        // whitespace-only edits), and gitlinks have no blob to read
        if entry.hunks.is_empty() {
            tracing::debug!(path, "no changed lines");
            continue;
        }

        let source = repo.show_file(new_rev, path)?;
        match runner.scan_source(repo.root().join(path), &source) {
            Ok(mut file) => {
                retain_changed(&mut file.findings, &entry.hunks);
                report.files.push(file);
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping file");
                report.skipped.push(err.into());
            }
        }
    }

    report.files.sort_by(|a, b| a.path.cmp(&b.path));
    report.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(report)
}
