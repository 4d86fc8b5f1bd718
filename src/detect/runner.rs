//! Detection runner that scans Java files with a configured detector set.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ReviewConfig;
use crate::syntax::{parse_with, ParseError, ParseOptions};

use super::{detect_all, DetectorKind, FindingSet};

/// Needle used by the raw-text detector unless configured otherwise.
pub const DEFAULT_NEEDLE: &str = " = ";

/// Why a single file could not be scanned.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot read {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl ScanError {
    pub fn path(&self) -> &Path {
        match self {
            ScanError::SourceUnreadable { path, .. } | ScanError::Parse { path, .. } => path,
        }
    }
}

/// Findings for one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub findings: FindingSet,
    /// Set when the file only parsed thanks to error recovery.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_syntax_errors: bool,
}

/// A file left out of the report, with the diagnostic that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl From<ScanError> for SkippedFile {
    fn from(err: ScanError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// Result of scanning a set of files. One bad file never hides the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub files: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
}

impl ScanReport {
    pub fn total_findings(&self) -> usize {
        self.files.iter().map(|f| f.findings.len()).sum()
    }

    /// Finding counts per detector across all files.
    pub fn counts(&self) -> BTreeMap<DetectorKind, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            for (kind, findings) in file.findings.iter() {
                *counts.entry(kind).or_insert(0) += findings.len();
            }
        }
        counts
    }

    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Scans files with a fixed detector set.
#[derive(Debug, Clone)]
pub struct Runner {
    detectors: Vec<DetectorKind>,
    needle: Option<String>,
    options: ParseOptions,
    parallel: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// A runner with every detector enabled and the default needle.
    pub fn new() -> Self {
        Self {
            detectors: DetectorKind::ALL.to_vec(),
            needle: Some(DEFAULT_NEEDLE.to_string()),
            options: ParseOptions::default(),
            parallel: true,
        }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self {
            detectors: config.enabled_detectors(),
            needle: Some(config.raw_needle.clone()),
            options: config.parse_options(),
            parallel: config.parallel,
        }
    }

    pub fn detectors(mut self, kinds: &[DetectorKind]) -> Self {
        self.detectors = kinds.to_vec();
        self
    }

    /// Set the raw-text needle. `None` turns raw-text matching into a no-op.
    pub fn needle(mut self, needle: Option<&str>) -> Self {
        self.needle = needle.map(str::to_string);
        self
    }

    pub fn parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn enabled(&self) -> &[DetectorKind] {
        &self.detectors
    }

    /// Scan source text already in memory. `path` only labels the report.
    pub fn scan_source<P: Into<PathBuf>>(&self, path: P, source: &str) -> Result<FileReport, ScanError> {
        let path = path.into();
        let tree = match parse_with(source, self.options) {
            Ok(tree) => tree,
            Err(source) => return Err(ScanError::Parse { path, source }),
        };
        let findings = detect_all(&tree, source, &self.detectors, self.needle.as_deref());

        tracing::debug!(
            path = %path.display(),
            findings = findings.len(),
            recovered = tree.has_errors,
            "scanned file"
        );

        Ok(FileReport {
            path,
            findings,
            has_syntax_errors: tree.has_errors,
        })
    }

    /// Read and scan one file. Bytes that are not UTF-8 (Latin-1 sources,
    /// say) are replaced with U+FFFD rather than failing the file.
    pub fn scan_file(&self, path: &Path) -> Result<FileReport, ScanError> {
        let bytes = fs::read(path).map_err(|source| ScanError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = source {
            tracing::debug!(path = %path.display(), "source is not valid UTF-8, decoded lossily");
        }
        self.scan_source(path, &source)
    }

    /// Scan every file, in parallel when enabled. Reports are sorted by path.
    pub fn run(&self, files: &[PathBuf]) -> ScanReport {
        let results: Vec<Result<FileReport, ScanError>> = if self.parallel {
            use rayon::prelude::*;
            files.par_iter().map(|p| self.scan_file(p)).collect()
        } else {
            files.iter().map(|p| self.scan_file(p)).collect()
        };

        let mut report = ScanReport::default();
        for result in results {
            match result {
                Ok(file) => report.files.push(file),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping file");
                    report.skipped.push(err.into());
                }
            }
        }
        report.files.sort_by(|a, b| a.path.cmp(&b.path));
        report.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        report
    }
}
