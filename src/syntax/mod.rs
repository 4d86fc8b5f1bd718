//! Typed syntax trees for Java sources.
//!
//! The tree-sitter concrete tree is lowered into an owned [`SyntaxTree`]
//! whose nodes carry a [`NodeKind`] sum type. Only the constructs the
//! detectors look at get their own variant; everything else is
//! [`NodeKind::Other`] and exists to keep the nesting intact.
//!
//! Ownership flows strictly parent -> children. Parent lookup happens
//! during traversal: [`SyntaxTree::walk`] hands every visited node the
//! stack of its ancestors.

pub mod java;
mod position;

pub use java::{parse, parse_with, ParseError, ParseOptions};
pub use position::{Position, Span, UNKNOWN_LINE};

/// Kind of type declaration enclosing members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// Where a variable declarator was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaratorOrigin {
    Field,
    Local,
    Constant,
    ForEach,
    Resource,
}

/// Modifier keywords of a method declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    keywords: Vec<String>,
}

impl Modifiers {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    pub fn is_private(&self) -> bool {
        self.has("private")
    }

    pub fn is_static(&self) -> bool {
        self.has("static")
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// A formal parameter of a method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub declared_type: String,
    pub span: Span,
}

/// The constructs detectors distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    CompilationUnit,
    TypeDeclaration {
        name: String,
        kind: TypeKind,
    },
    MethodDeclaration {
        name: String,
        return_type: String,
        modifiers: Modifiers,
        parameters: Vec<Parameter>,
    },
    VariableDeclarator {
        name: String,
        declared_type: String,
        origin: DeclaratorOrigin,
    },
    /// A method invocation. When `has_receiver` is set the receiver
    /// expression is the first child.
    MethodCall {
        name: String,
        has_receiver: bool,
        text: String,
    },
    ObjectCreation {
        type_text: String,
        type_argument_count: usize,
    },
    StringLiteral {
        value: String,
    },
    IfStatement,
    /// The statement following `else`, wrapped so it can be found directly.
    ElseBranch,
    ReturnStatement,
    Other,
}

/// A node of the lowered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    /// Receiver expression of a method call, if the call has one.
    pub fn receiver(&self) -> Option<&SyntaxNode> {
        match self.kind {
            NodeKind::MethodCall {
                has_receiver: true, ..
            } => self.children.first(),
            _ => None,
        }
    }

    /// Name of a declaration node, if it has one.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::TypeDeclaration { name, .. }
            | NodeKind::MethodDeclaration { name, .. }
            | NodeKind::VariableDeclarator { name, .. }
            | NodeKind::MethodCall { name, .. } => Some(name),
            _ => None,
        }
    }
}

// Children are dropped from a work list, not recursively: long operator
// chains nest thousands of levels deep.
impl Drop for SyntaxNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    pub root: SyntaxNode,
    /// Whether error recovery was needed (only in lenient mode).
    pub has_errors: bool,
}

impl SyntaxTree {
    pub fn new(root: SyntaxNode) -> Self {
        Self {
            root,
            has_errors: false,
        }
    }

    /// Pre-order traversal, parent before children, in source order.
    pub fn walk<'t, F>(&'t self, mut visit: F)
    where
        F: FnMut(&'t SyntaxNode, &Ancestors<'_, 't>),
    {
        // `pending[i]` yields the children of `ancestors[i]` not yet visited
        let mut ancestors: Vec<&'t SyntaxNode> = Vec::new();
        let mut pending: Vec<std::slice::Iter<'t, SyntaxNode>> = Vec::new();

        visit(&self.root, &Ancestors { stack: &[] });
        ancestors.push(&self.root);
        pending.push(self.root.children.iter());

        while let Some(children) = pending.last_mut() {
            match children.next() {
                Some(child) => {
                    visit(child, &Ancestors { stack: &ancestors });
                    ancestors.push(child);
                    pending.push(child.children.iter());
                }
                None => {
                    pending.pop();
                    ancestors.pop();
                }
            }
        }
    }

    /// Collect every node in traversal order.
    pub fn nodes(&self) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        self.walk(|node, _| out.push(node));
        out
    }
}

/// Borrowed view of a node's ancestors, nearest last.
pub struct Ancestors<'a, 't> {
    stack: &'a [&'t SyntaxNode],
}

impl<'a, 't> Ancestors<'a, 't> {
    pub fn parent(&self) -> Option<&'t SyntaxNode> {
        self.stack.last().copied()
    }

    /// Nearest ancestor matching the predicate.
    pub fn find<P>(&self, predicate: P) -> Option<&'t SyntaxNode>
    where
        P: Fn(&SyntaxNode) -> bool,
    {
        self.stack.iter().rev().copied().find(|n| predicate(n))
    }

    /// Name of the nearest enclosing type declaration.
    pub fn enclosing_type(&self) -> Option<&'t str> {
        self.find(|n| matches!(n.kind, NodeKind::TypeDeclaration { .. }))
            .and_then(|n| n.name())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind, line: usize) -> SyntaxNode {
        SyntaxNode::new(kind, Span::lines(line, line))
    }

    fn sample_tree() -> SyntaxTree {
        let call = node(
            NodeKind::MethodCall {
                name: "run".to_string(),
                has_receiver: false,
                text: "run()".to_string(),
            },
            3,
        );
        let method = node(
            NodeKind::MethodDeclaration {
                name: "go".to_string(),
                return_type: "void".to_string(),
                modifiers: Modifiers::new(["public"]),
                parameters: Vec::new(),
            },
            2,
        )
        .with_children(vec![call]);
        let class = node(
            NodeKind::TypeDeclaration {
                name: "Job".to_string(),
                kind: TypeKind::Class,
            },
            1,
        )
        .with_children(vec![method]);
        SyntaxTree::new(node(NodeKind::CompilationUnit, 1).with_children(vec![class]))
    }

    #[test]
    fn test_walk_is_preorder() {
        let tree = sample_tree();
        let names: Vec<_> = tree.nodes().iter().map(|n| n.name().unwrap_or("-")).collect();
        assert_eq!(names, vec!["-", "Job", "go", "run"]);
    }

    #[test]
    fn test_ancestor_lookup() {
        let tree = sample_tree();
        let mut seen = Vec::new();
        tree.walk(|node, ancestors| {
            if let NodeKind::MethodCall { name, .. } = &node.kind {
                seen.push((
                    name.clone(),
                    ancestors.enclosing_type().map(str::to_string),
                    ancestors.parent().and_then(|p| p.name()).map(str::to_string),
                    ancestors.depth(),
                ));
            }
        });
        assert_eq!(
            seen,
            vec![(
                "run".to_string(),
                Some("Job".to_string()),
                Some("go".to_string()),
                3
            )]
        );
    }

    #[test]
    fn test_deep_tree_walks_and_drops() {
        const DEPTH: usize = 200_000;
        let mut chain = node(NodeKind::ReturnStatement, 1);
        for _ in 0..DEPTH {
            chain = SyntaxNode::new(NodeKind::Other, Span::lines(1, 1)).with_children(vec![chain]);
        }
        let tree = SyntaxTree::new(chain);

        let mut visited = 0;
        let mut deepest = 0;
        tree.walk(|node, ancestors| {
            visited += 1;
            if node.kind == NodeKind::ReturnStatement {
                deepest = ancestors.depth();
            }
        });
        assert_eq!(visited, DEPTH + 1);
        assert_eq!(deepest, DEPTH);
        drop(tree);
    }

    #[test]
    fn test_modifiers() {
        let m = Modifiers::new(["private", "static", "final"]);
        assert!(m.is_private());
        assert!(m.is_static());
        assert!(!Modifiers::default().is_private());
    }
}
