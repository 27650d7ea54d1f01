//! Immutable syntax arena handed to the front end by the parser.
//!
//! Nodes keep their children as `(Slot, element)` pairs in source order, so
//! consumers address children by role instead of by position.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::diag::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuation,
    IntegerLiteral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// Type-node kinds. This is the one list both the migration scan and the
/// builder dispatch match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Identifier,
    Member,
    Array,
    Dictionary,
    Function,
    Tuple,
    Optional,
    ImplicitlyUnwrappedOptional,
    Metatype,
    Composition,
    SomeOrAny,
    Suppressed,
    PackElement,
    PackExpansion,
    Attributed,
    ClassRestriction,
    NamedOpaqueReturn,
    Missing,
}

impl TypeKind {
    pub const ALL: [TypeKind; 18] = [
        TypeKind::Identifier,
        TypeKind::Member,
        TypeKind::Array,
        TypeKind::Dictionary,
        TypeKind::Function,
        TypeKind::Tuple,
        TypeKind::Optional,
        TypeKind::ImplicitlyUnwrappedOptional,
        TypeKind::Metatype,
        TypeKind::Composition,
        TypeKind::SomeOrAny,
        TypeKind::Suppressed,
        TypeKind::PackElement,
        TypeKind::PackExpansion,
        TypeKind::Attributed,
        TypeKind::ClassRestriction,
        TypeKind::NamedOpaqueReturn,
        TypeKind::Missing,
    ];

    /// Whether the native builder handles this kind.
    pub const fn is_migrated(self) -> bool {
        !matches!(self, TypeKind::NamedOpaqueReturn | TypeKind::Missing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    SourceFile,
    Declaration,
    Type(TypeKind),
    GenericArgumentClause,
    GenericArgument,
    TupleTypeElement,
    CompositionElement,
    AttributeList,
    Attribute,
    AttributeArguments,
    IfConfigClause,
    ThrowsClause,
    ReturnClause,
    /// A node the parser produced but could not classify.
    Unknown,
}

impl SyntaxKind {
    pub fn type_kind(self) -> Option<TypeKind> {
        match self {
            SyntaxKind::Type(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Role of a child within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Root,
    Item,
    Name,
    GenericArguments,
    LeftAngle,
    RightAngle,
    Argument,
    TrailingComma,
    Base,
    Period,
    LeftSquare,
    RightSquare,
    Element,
    Key,
    Colon,
    Value,
    LeftParen,
    RightParen,
    Elements,
    AsyncKeyword,
    ThrowsClause,
    ThrowsKeyword,
    ThrownType,
    ReturnClause,
    Arrow,
    ReturnType,
    FirstName,
    SecondName,
    Type,
    Ellipsis,
    QuestionMark,
    ExclamationMark,
    MetatypeKeyword,
    SomeOrAnyKeyword,
    Constraint,
    Ampersand,
    Tilde,
    EachKeyword,
    Pack,
    RepeatKeyword,
    Pattern,
    Specifier,
    Attributes,
    AtSign,
    AttributeName,
    Arguments,
    ClassKeyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntaxElement {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub slot: Slot,
    pub element: SyntaxElement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub kind: SyntaxKind,
    pub parent: Option<NodeId>,
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) tokens: Vec<Token>,
}

impl SyntaxTree {
    /// Whether every id is in range and parent links agree with child lists.
    /// Trees from `SyntaxTreeBuilder` always are; deserialized ones are
    /// checked before use. Children are numbered after their parent, which
    /// also rules out cycles.
    pub fn is_well_formed(&self) -> bool {
        let node_count = self.nodes.len();
        let token_count = self.tokens.len();
        self.nodes.iter().enumerate().all(|(idx, data)| {
            let parent_ok = data.parent.is_none_or(|p| (p.0 as usize) < idx);
            parent_ok
                && data.children.iter().all(|child| match child.element {
                    SyntaxElement::Node(id) => {
                        let c = id.0 as usize;
                        c > idx && c < node_count && self.nodes[c].parent == Some(NodeId(idx as u32))
                    }
                    SyntaxElement::Token(id) => {
                        let t = id.0 as usize;
                        t < token_count && self.tokens[t].parent == Some(NodeId(idx as u32))
                    }
                })
        })
    }

    pub fn contains(&self, node: NodeId) -> bool {
        (node.0 as usize) < self.nodes.len()
    }

    pub fn root(&self) -> Option<NodeId> {
        // The builder always creates the root first.
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, node: NodeId) -> SyntaxKind {
        self.nodes[node.0 as usize].kind
    }

    pub fn type_kind(&self, node: NodeId) -> Option<TypeKind> {
        self.kind(node).type_kind()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0 as usize].parent
    }

    pub fn children(&self, node: NodeId) -> &[Child] {
        &self.nodes[node.0 as usize].children
    }

    pub fn token(&self, token: TokenId) -> &Token {
        &self.tokens[token.0 as usize]
    }

    pub fn token_parent(&self, token: TokenId) -> Option<NodeId> {
        self.token(token).parent
    }

    pub fn child_node(&self, node: NodeId, slot: Slot) -> Option<NodeId> {
        self.children(node)
            .iter()
            .find_map(|child| match child.element {
                SyntaxElement::Node(id) if child.slot == slot => Some(id),
                _ => None,
            })
    }

    pub fn child_nodes(&self, node: NodeId, slot: Slot) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .filter_map(move |child| match child.element {
                SyntaxElement::Node(id) if child.slot == slot => Some(id),
                _ => None,
            })
    }

    pub fn child_token(&self, node: NodeId, slot: Slot) -> Option<&Token> {
        self.children(node)
            .iter()
            .find_map(|child| match child.element {
                SyntaxElement::Token(id) if child.slot == slot => Some(self.token(id)),
                _ => None,
            })
    }

    /// Leftmost token under `node`, if any.
    pub fn first_token(&self, node: NodeId) -> Option<TokenId> {
        self.children(node).iter().find_map(|child| match child.element {
            SyntaxElement::Token(id) => Some(id),
            SyntaxElement::Node(id) => self.first_token(id),
        })
    }

    pub fn last_token(&self, node: NodeId) -> Option<TokenId> {
        self.children(node)
            .iter()
            .rev()
            .find_map(|child| match child.element {
                SyntaxElement::Token(id) => Some(id),
                SyntaxElement::Node(id) => self.last_token(id),
            })
    }

    pub fn span(&self, node: NodeId) -> Span {
        match (self.first_token(node), self.last_token(node)) {
            (Some(first), Some(last)) => self.token(first).span.to(self.token(last).span),
            _ => Span::default(),
        }
    }

    /// Concatenated token text of `node`, without trivia.
    pub fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        for child in self.children(node) {
            match child.element {
                SyntaxElement::Token(id) => out.push_str(&self.token(id).text),
                SyntaxElement::Node(id) => self.collect_text(id, out),
            }
        }
    }
}

/// A parsed file's syntax tree together with the type nodes to build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub tree: SyntaxTree,
    pub types: Vec<NodeId>,
}

impl SyntaxFile {
    pub fn new(tree: SyntaxTree, types: Vec<NodeId>) -> Self {
        Self {
            file: None,
            tree,
            types,
        }
    }

    /// First listed node that is missing from the tree or is not a type
    /// node.
    pub fn invalid_type_root(&self) -> Option<NodeId> {
        self.types
            .iter()
            .copied()
            .find(|&node| !self.tree.contains(node) || self.tree.type_kind(node).is_none())
    }
}
