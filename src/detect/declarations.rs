//! Declaration detectors: methods, variables and parameters.
//!
//! Type comparisons are literal matches on the declared type token as
//! written. No alias or inference is resolved, so `var ok = true` is not
//! a boolean variable and `java.lang.Boolean` is not `Boolean`.

use crate::syntax::{Ancestors, NodeKind, SyntaxNode, SyntaxTree};

use super::{scan, DetectorKind, Finding};

/// Declared types counted as numeric.
pub const NUMERIC_TYPES: &[&str] = &["double", "Double", "int", "Integer", "float"];

/// Declared types counted as boolean variables.
pub const BOOLEAN_VARIABLE_TYPES: &[&str] = &["boolean"];

/// Return types counted as boolean methods.
pub const BOOLEAN_RETURN_TYPES: &[&str] = &["boolean", "Boolean"];

pub fn detect_methods(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::MethodDeclaration)
}

pub fn detect_non_void_methods(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::NonVoidMethod)
}

pub fn detect_private_methods(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::PrivateMethod)
}

pub fn detect_private_static_methods(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::PrivateStaticMethod)
}

pub fn detect_boolean_methods(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::BooleanMethod)
}

pub fn detect_variables(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::FieldOrVariable)
}

pub fn detect_numeric_variables(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::NumericVariable)
}

pub fn detect_boolean_variables(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::BooleanVariable)
}

pub fn detect_method_parameters(tree: &SyntaxTree) -> Vec<Finding> {
    scan(tree, DetectorKind::MethodParameter)
}

/// Method-derived detectors.
pub(super) fn visit_method(
    kind: DetectorKind,
    node: &SyntaxNode,
    ancestors: &Ancestors,
    out: &mut Vec<Finding>,
) {
    let NodeKind::MethodDeclaration {
        name,
        return_type,
        modifiers,
        parameters,
    } = &node.kind
    else {
        return;
    };

    let matched = match kind {
        DetectorKind::MethodDeclaration => true,
        DetectorKind::NonVoidMethod => return_type != "void",
        DetectorKind::PrivateMethod => modifiers.is_private(),
        DetectorKind::PrivateStaticMethod => modifiers.is_private() && modifiers.is_static(),
        DetectorKind::BooleanMethod => BOOLEAN_RETURN_TYPES.contains(&return_type.as_str()),
        DetectorKind::MethodParameter => {
            let enclosing = ancestors.enclosing_type();
            out.extend(parameters.iter().map(|param| {
                Finding::new(DetectorKind::MethodParameter, param.span)
                    .named(param.name.as_str())
                    .in_type(enclosing)
                    .with_text(param.declared_type.as_str())
            }));
            return;
        }
        _ => false,
    };

    if matched {
        out.push(
            Finding::new(kind, node.span)
                .named(name.as_str())
                .in_type(ancestors.enclosing_type()),
        );
    }
}

/// Variable-declarator detectors. One finding per declarator.
pub(super) fn visit_declarator(
    kind: DetectorKind,
    node: &SyntaxNode,
    ancestors: &Ancestors,
    out: &mut Vec<Finding>,
) {
    let NodeKind::VariableDeclarator {
        name,
        declared_type,
        ..
    } = &node.kind
    else {
        return;
    };

    let finding = || {
        Finding::new(kind, node.span)
            .named(name.as_str())
            .in_type(ancestors.enclosing_type())
    };

    match kind {
        DetectorKind::FieldOrVariable => out.push(finding()),
        DetectorKind::NumericVariable if NUMERIC_TYPES.contains(&declared_type.as_str()) => {
            out.push(finding().with_text(declared_type.as_str()))
        }
        DetectorKind::BooleanVariable
            if BOOLEAN_VARIABLE_TYPES.contains(&declared_type.as_str()) =>
        {
            out.push(finding().with_text(declared_type.as_str()))
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn names(findings: &[Finding]) -> Vec<(&str, i64)> {
        findings
            .iter()
            .map(|f| (f.name.as_deref().unwrap_or(""), f.line()))
            .collect()
    }

    const SERVICE: &str = r#"
package demo;

public class Service {
    private int retries = 3;
    private final boolean verbose = false;

    public boolean isReady() { return true; }

    private static Boolean flag() { return null; }

    private void reset(int count, String label) {
        double ratio = 0.5;
        var inferred = true;
        Integer boxed = 1, other = 2;
    }

    static class Inner {
        float weight;
        long ignored;
    }
}
"#;

    #[test]
    fn test_method_declarations() {
        let tree = parse(SERVICE).unwrap();

        let all = detect_methods(&tree);
        assert_eq!(names(&all), vec![("isReady", 8), ("flag", 10), ("reset", 12)]);
        assert!(all.iter().all(|f| f.enclosing_type.as_deref() == Some("Service")));

        assert_eq!(
            names(&detect_non_void_methods(&tree)),
            vec![("isReady", 8), ("flag", 10)]
        );
        assert_eq!(
            names(&detect_private_methods(&tree)),
            vec![("flag", 10), ("reset", 12)]
        );
        assert_eq!(names(&detect_private_static_methods(&tree)), vec![("flag", 10)]);
        assert_eq!(
            names(&detect_boolean_methods(&tree)),
            vec![("isReady", 8), ("flag", 10)]
        );
    }

    #[test]
    fn test_variables_use_declared_type() {
        let tree = parse(SERVICE).unwrap();

        let numeric = detect_numeric_variables(&tree);
        assert_eq!(
            names(&numeric),
            vec![
                ("retries", 5),
                ("ratio", 13),
                ("boxed", 15),
                ("other", 15),
                ("weight", 19)
            ]
        );
        assert_eq!(numeric[0].text.as_deref(), Some("int"));

        // `var inferred = true` is not a declared boolean
        assert_eq!(names(&detect_boolean_variables(&tree)), vec![("verbose", 6)]);

        let all = detect_variables(&tree);
        assert_eq!(all.len(), 8);
        let weight = all.iter().find(|f| f.name.as_deref() == Some("weight")).unwrap();
        assert_eq!(weight.enclosing_type.as_deref(), Some("Inner"));
    }

    #[test]
    fn test_method_parameters_in_declaration_order() {
        let tree = parse(SERVICE).unwrap();
        let params = detect_method_parameters(&tree);
        assert_eq!(names(&params), vec![("count", 12), ("label", 12)]);
        assert_eq!(params[1].text.as_deref(), Some("String"));
    }

    #[test]
    fn test_is_ready_scenario() {
        let tree = parse("class A {\n\n    public boolean isReady(){ return true; }\n}\n").unwrap();
        assert_eq!(names(&detect_boolean_methods(&tree)), vec![("isReady", 3)]);
        assert_eq!(names(&detect_non_void_methods(&tree)), vec![("isReady", 3)]);
    }
}
