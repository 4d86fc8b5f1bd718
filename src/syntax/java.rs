//! Java parsing with tree-sitter and lowering into [`SyntaxTree`].

use std::time::Duration;

use tree_sitter::{Language, Node, Parser};

use super::{
    DeclaratorOrigin, Modifiers, NodeKind, Parameter, Position, Span, SyntaxNode, SyntaxTree,
    TypeKind,
};

/// Source that is not valid Java.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// Line of the first syntax error, if it could be located.
    pub line: Position,
    pub message: String,
}

impl ParseError {
    fn new(line: Position, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Keep the error-recovered tree instead of failing on syntax errors.
    pub allow_errors: bool,
    /// Give up on a single file after this long.
    pub timeout: Option<Duration>,
}

/// Parse Java source, failing on any syntax error.
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    parse_with(source, ParseOptions::default())
}

/// Parse Java source with explicit options.
pub fn parse_with(source: &str, options: ParseOptions) -> Result<SyntaxTree, ParseError> {
    let language: Language = tree_sitter_java::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::new(Position::unknown(), format!("loading Java grammar: {}", e)))?;
    if let Some(timeout) = options.timeout {
        parser.set_timeout_micros(timeout.as_micros() as u64);
    }

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::new(Position::unknown(), "parse did not complete"))?;
    let root = tree.root_node();

    let has_errors = root.has_error();
    if has_errors && !options.allow_errors {
        return Err(match first_error(root) {
            Some(node) => describe_error(node, source.as_bytes()),
            None => ParseError::new(Position::unknown(), "syntax error"),
        });
    }

    let lowering = Lowering {
        source: source.as_bytes(),
    };
    Ok(SyntaxTree {
        root: lowering.lower(root),
        has_errors,
    })
}

/// First ERROR or MISSING node in pre-order.
fn first_error(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

fn describe_error(node: Node, source: &[u8]) -> ParseError {
    let line = Position::at(node.start_position().row + 1);
    if node.is_missing() {
        return ParseError::new(line, format!("missing `{}`", node.kind()));
    }
    let text = node.utf8_text(source).unwrap_or("");
    let snippet: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let snippet: String = snippet.chars().take(40).collect();
    if snippet.is_empty() {
        ParseError::new(line, "unexpected end of input")
    } else {
        ParseError::new(line, format!("unexpected `{}`", snippet))
    }
}

/// Concrete-to-typed tree conversion. Only named nodes are kept.
///
/// Lowering loops over an explicit stack of half-built nodes and never
/// recurses, however deeply the source nests.
struct Lowering<'s> {
    source: &'s [u8],
}

/// A typed node whose children are still to be lowered.
struct Pending<'t> {
    node: SyntaxNode,
    children: Vec<Child<'t>>,
}

impl<'t> Pending<'t> {
    fn leaf(node: SyntaxNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

enum Child<'t> {
    /// A concrete node, lowered by kind.
    Lower(Node<'t>),
    /// A node built by the parent's lowering (declarators, else branches).
    Typed(Pending<'t>),
}

/// Stack entry of the lowering loop.
struct Frame<'t> {
    node: SyntaxNode,
    rest: std::vec::IntoIter<Child<'t>>,
}

impl<'t> From<Pending<'t>> for Frame<'t> {
    fn from(pending: Pending<'t>) -> Self {
        Self {
            node: pending.node,
            rest: pending.children.into_iter(),
        }
    }
}

fn named_children(node: Node) -> Vec<Child> {
    let mut cursor = node.walk();
    let children: Vec<Child> = node.named_children(&mut cursor).map(Child::Lower).collect();
    children
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn field_text(&self, node: Node, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
            .unwrap_or_default()
    }

    fn lower(&self, root: Node) -> SyntaxNode {
        let mut stack: Vec<Frame> = vec![self.shell(root).into()];

        while let Some(mut frame) = stack.pop() {
            match frame.rest.next() {
                Some(child) => {
                    let pending = match child {
                        Child::Lower(node) => self.shell(node),
                        Child::Typed(pending) => pending,
                    };
                    stack.push(frame);
                    stack.push(pending.into());
                }
                None => match stack.last_mut() {
                    Some(parent) => parent.node.children.push(frame.node),
                    None => return frame.node,
                },
            }
        }
        // the root frame always returns above
        SyntaxNode::new(NodeKind::CompilationUnit, Span::from_node(root))
    }

    /// Lower one node without descending: its own kind and span, plus the
    /// children still to visit.
    fn shell<'t>(&self, node: Node<'t>) -> Pending<'t> {
        match node.kind() {
            "program" => self.plain(NodeKind::CompilationUnit, node),
            "class_declaration" => self.type_declaration(node, TypeKind::Class),
            "interface_declaration" => self.type_declaration(node, TypeKind::Interface),
            "enum_declaration" => self.type_declaration(node, TypeKind::Enum),
            "record_declaration" => self.type_declaration(node, TypeKind::Record),
            "annotation_type_declaration" => self.type_declaration(node, TypeKind::Annotation),
            "method_declaration" => self.method_declaration(node),
            "field_declaration" => self.declaration(node, DeclaratorOrigin::Field),
            "local_variable_declaration" => self.declaration(node, DeclaratorOrigin::Local),
            "constant_declaration" => self.declaration(node, DeclaratorOrigin::Constant),
            "enhanced_for_statement" => self.enhanced_for(node),
            "resource" => self.resource(node),
            "method_invocation" => self.method_invocation(node),
            "object_creation_expression" => self.object_creation(node),
            "string_literal" => self.string_literal(node),
            "if_statement" => self.if_statement(node),
            "return_statement" => self.plain(NodeKind::ReturnStatement, node),
            _ => self.plain(NodeKind::Other, node),
        }
    }

    fn plain<'t>(&self, kind: NodeKind, node: Node<'t>) -> Pending<'t> {
        Pending {
            node: SyntaxNode::new(kind, Span::from_node(node)),
            children: named_children(node),
        }
    }

    fn type_declaration<'t>(&self, node: Node<'t>, kind: TypeKind) -> Pending<'t> {
        let name = self.field_text(node, "name");
        self.plain(NodeKind::TypeDeclaration { name, kind }, node)
    }

    fn method_declaration<'t>(&self, node: Node<'t>) -> Pending<'t> {
        let name = self.field_text(node, "name");
        // `int values()[]` is legal and means `int[]`
        let return_type = format!(
            "{}{}",
            self.field_text(node, "type"),
            compact(&self.field_text(node, "dimensions"))
        );

        let mut cursor = node.walk();
        let modifiers = node
            .named_children(&mut cursor)
            .find(|n| n.kind() == "modifiers")
            .map(|n| self.modifiers(n))
            .unwrap_or_default();

        let parameters = node
            .child_by_field_name("parameters")
            .map(|n| self.parameters(n))
            .unwrap_or_default();

        self.plain(
            NodeKind::MethodDeclaration {
                name,
                return_type,
                modifiers,
                parameters,
            },
            node,
        )
    }

    fn modifiers(&self, node: Node) -> Modifiers {
        let mut cursor = node.walk();
        let keywords: Vec<String> = node
            .children(&mut cursor)
            .filter(|n| !n.is_named())
            .map(|n| self.text(n).to_string())
            .collect();
        Modifiers::new(keywords)
    }

    fn parameters(&self, node: Node) -> Vec<Parameter> {
        let mut cursor = node.walk();
        let params: Vec<Parameter> = node
            .named_children(&mut cursor)
            .filter_map(|param| match param.kind() {
                "formal_parameter" => Some(Parameter {
                    name: self.field_text(param, "name"),
                    declared_type: format!(
                        "{}{}",
                        self.field_text(param, "type"),
                        compact(&self.field_text(param, "dimensions"))
                    ),
                    span: Span::from_node(param),
                }),
                "spread_parameter" => Some(self.spread_parameter(param)),
                // receiver parameters (`Foo this`) are not real parameters
                _ => None,
            })
            .collect();
        params
    }

    fn spread_parameter(&self, node: Node) -> Parameter {
        let mut cursor = node.walk();
        let mut declared_type = String::new();
        let mut name = String::new();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "modifiers" => {}
                "variable_declarator" => name = self.field_text(child, "name"),
                _ if declared_type.is_empty() => declared_type = self.text(child).to_string(),
                _ => {}
            }
        }
        Parameter {
            name,
            declared_type: format!("{}...", declared_type),
            span: Span::from_node(node),
        }
    }

    /// Field, local and constant declarations: the type lives on the
    /// declaration, each declarator gets its own node.
    fn declaration<'t>(&self, node: Node<'t>, origin: DeclaratorOrigin) -> Pending<'t> {
        let base_type = self.field_text(node, "type");
        let mut cursor = node.walk();
        let children: Vec<Child<'t>> = node
            .named_children(&mut cursor)
            .map(|child| {
                if child.kind() == "variable_declarator" {
                    Child::Typed(self.declarator(child, &base_type, origin))
                } else {
                    Child::Lower(child)
                }
            })
            .collect();
        Pending {
            node: SyntaxNode::new(NodeKind::Other, Span::from_node(node)),
            children,
        }
    }

    fn declarator<'t>(&self, node: Node<'t>, base_type: &str, origin: DeclaratorOrigin) -> Pending<'t> {
        let kind = NodeKind::VariableDeclarator {
            name: self.field_text(node, "name"),
            declared_type: format!(
                "{}{}",
                base_type,
                compact(&self.field_text(node, "dimensions"))
            ),
            origin,
        };
        self.plain(kind, node)
    }

    /// `for (int x : xs)` declares `x` without a declarator node.
    fn enhanced_for<'t>(&self, node: Node<'t>) -> Pending<'t> {
        let Some(name) = node.child_by_field_name("name") else {
            return self.plain(NodeKind::Other, node);
        };
        let declared_type = format!(
            "{}{}",
            self.field_text(node, "type"),
            compact(&self.field_text(node, "dimensions"))
        );

        let mut cursor = node.walk();
        let children: Vec<Child<'t>> = node
            .named_children(&mut cursor)
            .map(|child| {
                if child.id() == name.id() {
                    Child::Typed(Pending::leaf(SyntaxNode::new(
                        NodeKind::VariableDeclarator {
                            name: self.text(name).to_string(),
                            declared_type: declared_type.clone(),
                            origin: DeclaratorOrigin::ForEach,
                        },
                        Span::from_node(name),
                    )))
                } else {
                    Child::Lower(child)
                }
            })
            .collect();
        Pending {
            node: SyntaxNode::new(NodeKind::Other, Span::from_node(node)),
            children,
        }
    }

    /// try-with-resources entry. Only `Type name = value` declares a variable.
    fn resource<'t>(&self, node: Node<'t>) -> Pending<'t> {
        let Some(name) = node.child_by_field_name("name") else {
            return self.plain(NodeKind::Other, node);
        };
        let dimensions = node.child_by_field_name("dimensions");
        let value = node.child_by_field_name("value");
        let owned_by_declarator = |child: Node| {
            child.id() == name.id()
                || dimensions.map(|d| d.id()) == Some(child.id())
                || value.map(|v| v.id()) == Some(child.id())
        };

        let mut children = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if !owned_by_declarator(child) {
                children.push(Child::Lower(child));
            }
        }

        let declared_type = format!(
            "{}{}",
            self.field_text(node, "type"),
            compact(&self.field_text(node, "dimensions"))
        );
        let span = Span::new(Span::from_node(name).start, Span::from_node(node).end);
        children.push(Child::Typed(Pending {
            node: SyntaxNode::new(
                NodeKind::VariableDeclarator {
                    name: self.text(name).to_string(),
                    declared_type,
                    origin: DeclaratorOrigin::Resource,
                },
                span,
            ),
            children: [Some(name), dimensions, value]
                .into_iter()
                .flatten()
                .map(Child::Lower)
                .collect(),
        }));

        Pending {
            node: SyntaxNode::new(NodeKind::Other, Span::from_node(node)),
            children,
        }
    }

    fn method_invocation<'t>(&self, node: Node<'t>) -> Pending<'t> {
        let object = node.child_by_field_name("object");

        let mut children = Vec::new();
        if let Some(receiver) = object {
            children.push(Child::Lower(receiver));
        }
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if object.map(|o| o.id()) != Some(child.id()) {
                children.push(Child::Lower(child));
            }
        }

        Pending {
            node: SyntaxNode::new(
                NodeKind::MethodCall {
                    name: self.field_text(node, "name"),
                    has_receiver: object.is_some(),
                    text: self.text(node).to_string(),
                },
                Span::from_node(node),
            ),
            children,
        }
    }

    fn object_creation<'t>(&self, node: Node<'t>) -> Pending<'t> {
        let (type_text, type_argument_count) = match node.child_by_field_name("type") {
            Some(ty) => (self.text(ty).to_string(), type_argument_count(ty)),
            None => (String::new(), 0),
        };
        self.plain(
            NodeKind::ObjectCreation {
                type_text,
                type_argument_count,
            },
            node,
        )
    }

    fn string_literal<'t>(&self, node: Node<'t>) -> Pending<'t> {
        let text = self.text(node);
        // text blocks are a separate literal kind
        if text.starts_with("\"\"\"") {
            return self.plain(NodeKind::Other, node);
        }
        let inner = text.strip_prefix('"').unwrap_or(text);
        let value = inner.strip_suffix('"').unwrap_or(inner).to_string();
        Pending::leaf(SyntaxNode::new(
            NodeKind::StringLiteral { value },
            Span::from_node(node),
        ))
    }

    fn if_statement<'t>(&self, node: Node<'t>) -> Pending<'t> {
        let alternative = node.child_by_field_name("alternative");
        let is_alternative = |child: Node| alternative.map(|a| a.id()) == Some(child.id());
        let mut cursor = node.walk();
        // `else ;` has an anonymous empty statement as its branch
        let children: Vec<Child<'t>> = node
            .children(&mut cursor)
            .filter(|child| child.is_named() || is_alternative(*child))
            .map(|child| {
                if is_alternative(child) {
                    Child::Typed(Pending {
                        node: SyntaxNode::new(NodeKind::ElseBranch, Span::from_node(child)),
                        children: vec![Child::Lower(child)],
                    })
                } else {
                    Child::Lower(child)
                }
            })
            .collect();
        Pending {
            node: SyntaxNode::new(NodeKind::IfStatement, Span::from_node(node)),
            children,
        }
    }
}

/// Number of explicit type arguments on a constructed type (`<>` has none).
fn type_argument_count(ty: Node) -> usize {
    if ty.kind() != "generic_type" {
        return 0;
    }
    let mut cursor = ty.walk();
    let Some(args) = ty
        .named_children(&mut cursor)
        .find(|n| n.kind() == "type_arguments")
    else {
        return 0;
    };
    let mut cursor = args.walk();
    let count = args
        .named_children(&mut cursor)
        .filter(|n| !matches!(n.kind(), "line_comment" | "block_comment"))
        .count();
    count
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
