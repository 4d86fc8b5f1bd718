//! Line positions and spans shared by every detector and the diff correlator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel used when rendering or serializing an unknown line.
pub const UNKNOWN_LINE: i64 = -1;

/// A 1-indexed source line, or unknown.
///
/// Serializes as a plain integer, with unknown lines written as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Position {
    line: Option<usize>,
}

impl Position {
    /// A known position. Line 0 is not a valid 1-indexed line and maps to unknown.
    pub fn at(line: usize) -> Self {
        Self {
            line: if line == 0 { None } else { Some(line) },
        }
    }

    pub const fn unknown() -> Self {
        Self { line: None }
    }

    /// The 1-indexed line, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn is_known(&self) -> bool {
        self.line.is_some()
    }

    /// The line with unknown mapped to [`UNKNOWN_LINE`].
    pub fn line_or_sentinel(&self) -> i64 {
        self.line.map(|l| l as i64).unwrap_or(UNKNOWN_LINE)
    }
}

impl From<i64> for Position {
    fn from(value: i64) -> Self {
        if value < 1 {
            Position::unknown()
        } else {
            Position::at(value as usize)
        }
    }
}

impl From<Position> for i64 {
    fn from(value: Position) -> Self {
        value.line_or_sentinel()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line_or_sentinel())
    }
}

/// Start/end line pair locating a node or finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A span covering the given 1-indexed lines.
    pub fn lines(start: usize, end: usize) -> Self {
        Self::new(Position::at(start), Position::at(end))
    }

    pub fn unknown() -> Self {
        Self::new(Position::unknown(), Position::unknown())
    }

    /// Span of a tree-sitter node.
    ///
    /// Nodes inserted by error recovery (`MISSING`) have no real location
    /// in the source and get an unknown span.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        if node.is_missing() {
            return Self::unknown();
        }
        let start = node.start_position();
        let end = node.end_position();
        // tree-sitter rows are 0-indexed
        Self::lines(start.row + 1, end.row + 1)
    }

    pub fn start_line(&self) -> Option<usize> {
        self.start.line()
    }

    pub fn end_line(&self) -> Option<usize> {
        self.end.line()
    }

    /// Both endpoints known.
    pub fn is_known(&self) -> bool {
        self.start.is_known() && self.end.is_known()
    }

    /// Whether the span shares at least one line with the half-open range `[begin, end)`.
    /// Spans with an unknown endpoint never overlap anything.
    pub fn overlaps_lines(&self, begin: usize, end: usize) -> bool {
        match (self.start.line(), self.end.line()) {
            (Some(s), Some(e)) => begin < end && s < end && begin <= e,
            _ => false,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
