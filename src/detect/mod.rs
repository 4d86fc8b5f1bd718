//! Pattern detectors over Java syntax trees.
//!
//! Every detector is a pure function from a [`SyntaxTree`] to the findings
//! it produces, in pre-order traversal order. [`detect_all`] runs several
//! detectors in one traversal and keeps their results apart; the output is
//! the same as running each detector on its own.

mod declarations;
mod expressions;
mod runner;
mod statements;
mod text;
mod types;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::syntax::{Ancestors, SyntaxNode, SyntaxTree};

pub use declarations::{
    detect_boolean_methods, detect_boolean_variables, detect_method_parameters, detect_methods,
    detect_non_void_methods, detect_numeric_variables, detect_private_methods,
    detect_private_static_methods, detect_variables, BOOLEAN_RETURN_TYPES,
    BOOLEAN_VARIABLE_TYPES, NUMERIC_TYPES,
};
pub use expressions::{
    detect_chained_method_calls, detect_generic_constructions, detect_method_calls,
    detect_string_literals,
};
pub use runner::{FileReport, Runner, ScanError, ScanReport, SkippedFile, DEFAULT_NEEDLE};
pub use statements::{detect_else_branches, detect_if_statements, detect_return_statements};
pub use text::detect_text_matches;
pub use types::{DetectorKind, Finding};

/// Run a single detector. `needle` is only read by [`DetectorKind::RawTextMatch`],
/// which finds nothing without one.
pub fn detect(kind: DetectorKind, tree: &SyntaxTree, source: &str, needle: Option<&str>) -> Vec<Finding> {
    if kind.is_textual() {
        return needle
            .map(|n| detect_text_matches(source, n))
            .unwrap_or_default();
    }
    scan(tree, kind)
}

/// Run several detectors with a single traversal.
pub fn detect_all(
    tree: &SyntaxTree,
    source: &str,
    kinds: &[DetectorKind],
    needle: Option<&str>,
) -> FindingSet {
    let mut by_kind: BTreeMap<DetectorKind, Vec<Finding>> =
        kinds.iter().map(|k| (*k, Vec::new())).collect();
    let tree_kinds: Vec<DetectorKind> = by_kind.keys().copied().filter(|k| !k.is_textual()).collect();

    if !tree_kinds.is_empty() {
        tree.walk(|node, ancestors| {
            for kind in &tree_kinds {
                if let Some(out) = by_kind.get_mut(kind) {
                    visit(*kind, node, ancestors, out);
                }
            }
        });
    }

    if let (Some(out), Some(needle)) = (by_kind.get_mut(&DetectorKind::RawTextMatch), needle) {
        *out = detect_text_matches(source, needle);
    }

    FindingSet { by_kind }
}

/// Findings of one detection pass, grouped by detector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingSet {
    by_kind: BTreeMap<DetectorKind, Vec<Finding>>,
}

impl FindingSet {
    /// Findings of one detector; empty if it did not run.
    pub fn get(&self, kind: DetectorKind) -> &[Finding] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Detectors that ran, in [`DetectorKind`] order.
    pub fn kinds(&self) -> impl Iterator<Item = DetectorKind> + '_ {
        self.by_kind.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DetectorKind, &[Finding])> {
        self.by_kind.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// All findings, grouped by detector.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.by_kind.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only findings matching the predicate. Detectors stay listed.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Finding) -> bool,
    {
        for findings in self.by_kind.values_mut() {
            findings.retain(|f| keep(f));
        }
    }
}

pub(crate) fn scan(tree: &SyntaxTree, kind: DetectorKind) -> Vec<Finding> {
    let mut out = Vec::new();
    tree.walk(|node, ancestors| visit(kind, node, ancestors, &mut out));
    out
}

fn visit(kind: DetectorKind, node: &SyntaxNode, ancestors: &Ancestors, out: &mut Vec<Finding>) {
    match kind {
        DetectorKind::MethodDeclaration
        | DetectorKind::NonVoidMethod
        | DetectorKind::PrivateMethod
        | DetectorKind::PrivateStaticMethod
        | DetectorKind::BooleanMethod
        | DetectorKind::MethodParameter => declarations::visit_method(kind, node, ancestors, out),
        DetectorKind::FieldOrVariable
        | DetectorKind::NumericVariable
        | DetectorKind::BooleanVariable => declarations::visit_declarator(kind, node, ancestors, out),
        DetectorKind::MethodCall | DetectorKind::ChainedMethodCall => {
            expressions::visit_call(kind, node, ancestors, out)
        }
        DetectorKind::StringLiteral => expressions::visit_string_literal(node, out),
        DetectorKind::GenericConstructionWithArgs => {
            expressions::visit_object_creation(node, ancestors, out)
        }
        DetectorKind::IfStatement | DetectorKind::ElseBranch | DetectorKind::ReturnStatement => {
            statements::visit_statement(kind, node, ancestors, out)
        }
        DetectorKind::RawTextMatch => {}
    }
}
