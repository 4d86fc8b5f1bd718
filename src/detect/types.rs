//! Core types for detection results.

use serde::{Deserialize, Serialize};

use crate::syntax::Span;

/// The patterns detectors recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    MethodDeclaration,
    NonVoidMethod,
    PrivateMethod,
    PrivateStaticMethod,
    BooleanMethod,
    FieldOrVariable,
    NumericVariable,
    BooleanVariable,
    MethodParameter,
    MethodCall,
    ChainedMethodCall,
    StringLiteral,
    IfStatement,
    ElseBranch,
    ReturnStatement,
    GenericConstructionWithArgs,
    RawTextMatch,
}

impl DetectorKind {
    /// Every detector, in reporting order.
    pub const ALL: [DetectorKind; 17] = [
        DetectorKind::MethodDeclaration,
        DetectorKind::NonVoidMethod,
        DetectorKind::PrivateMethod,
        DetectorKind::PrivateStaticMethod,
        DetectorKind::BooleanMethod,
        DetectorKind::FieldOrVariable,
        DetectorKind::NumericVariable,
        DetectorKind::BooleanVariable,
        DetectorKind::MethodParameter,
        DetectorKind::MethodCall,
        DetectorKind::ChainedMethodCall,
        DetectorKind::StringLiteral,
        DetectorKind::IfStatement,
        DetectorKind::ElseBranch,
        DetectorKind::ReturnStatement,
        DetectorKind::GenericConstructionWithArgs,
        DetectorKind::RawTextMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::MethodDeclaration => "method_declaration",
            DetectorKind::NonVoidMethod => "non_void_method",
            DetectorKind::PrivateMethod => "private_method",
            DetectorKind::PrivateStaticMethod => "private_static_method",
            DetectorKind::BooleanMethod => "boolean_method",
            DetectorKind::FieldOrVariable => "field_or_variable",
            DetectorKind::NumericVariable => "numeric_variable",
            DetectorKind::BooleanVariable => "boolean_variable",
            DetectorKind::MethodParameter => "method_parameter",
            DetectorKind::MethodCall => "method_call",
            DetectorKind::ChainedMethodCall => "chained_method_call",
            DetectorKind::StringLiteral => "string_literal",
            DetectorKind::IfStatement => "if_statement",
            DetectorKind::ElseBranch => "else_branch",
            DetectorKind::ReturnStatement => "return_statement",
            DetectorKind::GenericConstructionWithArgs => "generic_construction_with_args",
            DetectorKind::RawTextMatch => "raw_text_match",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        DetectorKind::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Short label used in pretty output.
    pub fn label(&self) -> &'static str {
        match self {
            DetectorKind::MethodDeclaration => "METHOD",
            DetectorKind::NonVoidMethod => "NON VOID METHOD",
            DetectorKind::PrivateMethod => "PRIVATE METHOD",
            DetectorKind::PrivateStaticMethod => "PRIVATE STATIC METHOD",
            DetectorKind::BooleanMethod => "BOOL METHOD",
            DetectorKind::FieldOrVariable => "VARIABLE",
            DetectorKind::NumericVariable => "NUM",
            DetectorKind::BooleanVariable => "BOOL",
            DetectorKind::MethodParameter => "METHOD ARG",
            DetectorKind::MethodCall => "METHOD CALL",
            DetectorKind::ChainedMethodCall => "CHAINED METHOD CALL",
            DetectorKind::StringLiteral => "HARDCODED STRING",
            DetectorKind::IfStatement => "IF STATEMENT",
            DetectorKind::ElseBranch => "ELSE STATEMENT",
            DetectorKind::ReturnStatement => "RETURN STATEMENT",
            DetectorKind::GenericConstructionWithArgs => "NON EMPTY DIAMOND",
            DetectorKind::RawTextMatch => "TEXT MATCH",
        }
    }

    /// Whether this detector reads raw lines instead of the syntax tree.
    pub fn is_textual(&self) -> bool {
        matches!(self, DetectorKind::RawTextMatch)
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectorKind::parse(s).ok_or_else(|| format!("unknown detector: {}", s))
    }
}

/// One reported occurrence of a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: DetectorKind,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Finding {
    pub fn new(kind: DetectorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            name: None,
            enclosing_type: None,
            text: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_type(mut self, enclosing_type: Option<&str>) -> Self {
        self.enclosing_type = enclosing_type.map(str::to_string);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Start line, or `-1` when unknown.
    pub fn line(&self) -> i64 {
        self.span.start.line_or_sentinel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in DetectorKind::ALL {
            assert_eq!(DetectorKind::parse(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(DetectorKind::parse("nope"), None);
    }

    #[test]
    fn test_finding_omits_empty_fields() {
        let finding = Finding::new(DetectorKind::ReturnStatement, Span::lines(3, 3));
        let json = serde_json::to_string(&finding).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"return_statement","span":{"start":3,"end":3}}"#
        );
        assert_eq!(finding.line(), 3);
    }
}
