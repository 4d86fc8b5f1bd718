//! java-reviewer - facts for reviewing Java code.
//!
//! Java sources are parsed with tree-sitter and lowered into an owned
//! syntax tree. Independent detectors walk that tree and report where
//! declarations, calls, literals and control-flow constructs sit, each
//! finding tagged with a line span and, where it applies, a name and the
//! enclosing type. A git diff correlator turns the changes between two
//! revisions into per-file line ranges, which can be used to keep only
//! the findings on changed lines.
//!
//! # Architecture
//!
//! - `syntax`: Java parsing, the lowered tree and line positions
//! - `detect`: Detectors, findings and the multi-file runner
//! - `diff`: Change entries and hunks between two revisions, attribution
//! - `config`: YAML configuration
//! - `files`: Source file enumeration
//! - `report`: Output formatting (pretty, JSON)
//! - `cli`: Command-line interface

pub mod cli;
pub mod config;
pub mod detect;
pub mod diff;
pub mod files;
pub mod report;
pub mod syntax;

pub use config::ReviewConfig;
pub use detect::{detect, detect_all, DetectorKind, Finding, FindingSet, Runner, ScanReport};
pub use diff::{changes, ChangeEntry, ChangeKind, DiffError, GitRepository, LineRange, LineRangeEdit};
pub use syntax::{parse, ParseError, Position, Span, SyntaxTree};
