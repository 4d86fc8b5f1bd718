//! Control-flow detectors: `if`, `else` and `return`.

use crate::syntax::{Ancestors, NodeKind, SyntaxNode, SyntaxTree};

use super::{scan, DetectorKind, Finding};

pub fn detect_if_statements(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::IfStatement)
}

/// Else branches, located at the statement following `else`. An
/// `else if` is reported as an else branch and as an if statement.
pub fn detect_else_branches(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::ElseBranch)
}

pub fn detect_return_statements(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::ReturnStatement)
}

pub(super) fn visit_statement(
    kind: DetectorKind,
    node: &SyntaxNode,
    ancestors: &Ancestors,
    out: &mut Vec<Finding>,
) {
    let matched = matches!(
        (kind, &node.kind),
        (DetectorKind::IfStatement, NodeKind::IfStatement)
            | (DetectorKind::ElseBranch, NodeKind::ElseBranch)
            | (DetectorKind::ReturnStatement, NodeKind::ReturnStatement)
    );
    if matched {
        out.push(Finding::new(kind, node.span).in_type(ancestors.enclosing_type()));
    }
}
