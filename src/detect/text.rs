//! Substring search over raw source lines.

use crate::syntax::Span;

use super::{DetectorKind, Finding};

/// Lines (1-indexed) whose text contains `needle`. A line with several
/// occurrences is reported once.
pub fn detect_text_matches(source: &str, needle: &str) -> Vec<Finding> {
    source_lines(source)
        .into_iter()
        .enumerate()
        .filter(|(_, line)| line.contains(needle))
        .map(|(idx, _)| {
            Finding::new(DetectorKind::RawTextMatch, Span::lines(idx + 1, idx + 1)).with_text(needle)
        })
        .collect()
}

/// Split on `\n`, `\r\n` and a lone `\r`. A trailing terminator does not
/// start another line.
fn source_lines(source: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = source;
    while !rest.is_empty() {
        match rest.find(|c: char| c == '\n' || c == '\r') {
            Some(end) => {
                lines.push(&rest[..end]);
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}
