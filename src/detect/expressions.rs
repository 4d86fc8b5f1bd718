//! Expression detectors: calls, call chains, string literals and generic
//! constructions.

use crate::syntax::{Ancestors, NodeKind, SyntaxNode, SyntaxTree};

use super::{scan, DetectorKind, Finding};

pub fn detect_method_calls(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::MethodCall)
}

/// Calls reached through the receiver chain of another call.
///
/// Every call is a starting point, so in `a.b().c().d()` the step `b()`
/// is reported from both `c()` and `d()`. Overlapping reports for chains
/// deeper than two calls are expected.
pub fn detect_chained_method_calls(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::ChainedMethodCall)
}

pub fn detect_string_literals(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::StringLiteral)
}

/// `new T<A>()` assigned straight to a variable declarator. Empty diamonds
/// and constructions passed as arguments or returned are not reported.
pub fn detect_generic_constructions(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::GenericConstructionWithArgs)
}

pub(super) fn visit_call(
    kind: DetectorKind,
    node: &SyntaxNode,
    ancestors: &Ancestors,
    out: &mut Vec<Finding>,
) {
    let NodeKind::MethodCall { name, .. } = &node.kind else {
        return;
    };

    match kind {
        DetectorKind::MethodCall => out.push(
            Finding::new(kind, node.span)
                .named(name.as_str())
                .in_type(ancestors.enclosing_type()),
        ),
        DetectorKind::ChainedMethodCall => {
            let mut current = node;
            while let Some(receiver) = current.receiver() {
                let NodeKind::MethodCall { text, .. } = &receiver.kind else {
                    break;
                };
                out.push(Finding::new(kind, receiver.span).with_text(text.as_str()));
                current = receiver;
            }
        }
        _ => {}
    }
}

pub(super) fn visit_string_literal(node: &SyntaxNode, out: &mut Vec<Finding>) {
    if let NodeKind::StringLiteral { value } = &node.kind {
        out.push(Finding::new(DetectorKind::StringLiteral, node.span).with_text(value.as_str()));
    }
}

pub(super) fn visit_object_creation(
    node: &SyntaxNode,
    ancestors: &Ancestors,
    out: &mut Vec<Finding>,
) {
    let NodeKind::ObjectCreation {
        type_text,
        type_argument_count,
    } = &node.kind
    else {
        return;
    };
    if *type_argument_count == 0 {
        return;
    }
    let assigned = ancestors
        .parent()
        .map(|p| matches!(p.kind, NodeKind::VariableDeclarator { .. }))
        .unwrap_or(false);
    if assigned {
        out.push(
            Finding::new(DetectorKind::GenericConstructionWithArgs, node.span)
                .named(type_text.as_str())
                .in_type(ancestors.enclosing_type()),
        );
    }
}
