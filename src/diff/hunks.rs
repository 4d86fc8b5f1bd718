//! Hunk headers of `git diff -U0` output.

use lazy_static::lazy_static;
use regex::Regex;

use super::{DiffError, LineRange, LineRangeEdit};

lazy_static! {
    /// `@@ -start[,count] +start[,count] @@`; a missing count means 1.
    static ref HUNK_HEADER: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap();
}

/// Collect one edit per hunk header, in output order. Body lines are ignored.
pub fn parse_hunks(diff: &str) -> Result<Vec<LineRangeEdit>, DiffError> {
    let mut edits = Vec::new();
    for line in diff.lines().filter(|l| l.starts_with("@@")) {
        let caps = HUNK_HEADER
            .captures(line)
            .ok_or_else(|| DiffError::MalformedOutput(format!("bad hunk header: {}", line)))?;

        let number = |idx: usize, default: usize| -> Result<usize, DiffError> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| DiffError::MalformedOutput(format!("bad hunk header: {}", line))),
                None => Ok(default),
            }
        };

        edits.push(LineRangeEdit {
            old: LineRange::from_unified(number(1, 0)?, number(2, 1)?),
            new: LineRange::from_unified(number(3, 0)?, number(4, 1)?),
        });
    }
    Ok(edits)
}
