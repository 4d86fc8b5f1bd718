//! Change listing between two revisions of a git repository.
//!
//! [`changes`] resolves both revisions, lists the entries that differ
//! (with rename and copy detection) and, for every entry that still exists
//! on the new side, the line ranges that changed. Whitespace-only edits do
//! not produce ranges. The repository is only read.

pub mod attribution;
mod git;
mod hunks;

use std::fmt;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use git::GitRepository;
pub use hunks::parse_hunks;

/// Errors from listing changes. Each one aborts only the current request.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("cannot resolve revision `{0}`")]
    UnresolvableRevision(String),
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },
    #[error("cannot run git: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected git output: {0}")]
    MalformedOutput(String),
}

/// How an entry changed between the two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Delete,
    Modify,
    Rename,
    Copy,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Delete => "delete",
            ChangeKind::Modify => "modify",
            ChangeKind::Rename => "rename",
            ChangeKind::Copy => "copy",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1-indexed half-open line range `[begin, end)`. An empty range marks the
/// position where lines were inserted or removed on the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub begin: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end);
        Self { begin, end }
    }

    /// Range described by a unified-diff `start,count` pair. A zero count
    /// names the line *after which* the edit happened.
    pub fn from_unified(start: usize, count: usize) -> Self {
        if count == 0 {
            Self::new(start + 1, start + 1)
        } else {
            Self::new(start, start + count)
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn contains(&self, line: usize) -> bool {
        self.begin <= line && line < self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.begin, self.end)
    }
}

/// One hunk: the old-side lines replaced by the new-side lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRangeEdit {
    pub old: LineRange,
    pub new: LineRange,
}

/// A path that differs between two revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Absent for additions.
    pub old_path: Option<String>,
    /// Absent for deletions.
    pub new_path: Option<String>,
    pub kind: ChangeKind,
    /// Empty for deletions, submodules, added binaries and whitespace-only
    /// edits.
    pub hunks: Vec<LineRangeEdit>,
}

impl ChangeEntry {
    /// The path the entry is best known by: the new path unless deleted.
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }
}

/// List the changes between `old_rev` and `new_rev` in the repository at `repo`.
pub fn changes<P: AsRef<Path>>(
    repo: P,
    old_rev: &str,
    new_rev: &str,
) -> Result<Vec<ChangeEntry>, DiffError> {
    GitRepository::open(repo)?.changes(old_rev, new_rev)
}
