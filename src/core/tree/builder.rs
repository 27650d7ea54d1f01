//! Incremental construction of a `SyntaxTree`.
//!
//! Nodes are opened and closed in source order; tokens and trivia advance a
//! running position so every token gets an accurate span.

use crate::core::diag::{Position, Span};
use crate::core::tree::{
    Child, NodeData, NodeId, Slot, SyntaxElement, SyntaxKind, SyntaxTree, Token, TokenId, TokenKind,
};

#[derive(Debug, Default)]
pub struct SyntaxTreeBuilder {
    tree: SyntaxTree,
    stack: Vec<NodeId>,
    pos: Position,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a node in `slot` of the current node. The first node opened is
    /// the root and its slot is ignored.
    pub fn start_node(&mut self, slot: Slot, kind: SyntaxKind) -> NodeId {
        let id = NodeId(self.tree.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.tree.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.tree.nodes[parent.0 as usize].children.push(Child {
                slot,
                element: SyntaxElement::Node(id),
            });
        }
        self.stack.push(id);
        id
    }

    pub fn finish_node(&mut self) {
        let closed = self.stack.pop();
        debug_assert!(closed.is_some(), "finish_node without start_node");
    }

    pub fn token(&mut self, slot: Slot, kind: TokenKind, text: &str) -> TokenId {
        let id = TokenId(self.tree.tokens.len() as u32);
        let start = self.pos;
        self.advance(text);
        let parent = self.stack.last().copied();
        self.tree.tokens.push(Token {
            kind,
            text: text.to_string(),
            span: Span::new(start, self.pos),
            parent,
        });
        if let Some(parent) = parent {
            self.tree.nodes[parent.0 as usize].children.push(Child {
                slot,
                element: SyntaxElement::Token(id),
            });
        }
        id
    }

    pub fn ident(&mut self, slot: Slot, text: &str) -> TokenId {
        self.token(slot, TokenKind::Identifier, text)
    }

    pub fn keyword(&mut self, slot: Slot, text: &str) -> TokenId {
        self.token(slot, TokenKind::Keyword, text)
    }

    pub fn punct(&mut self, slot: Slot, text: &str) -> TokenId {
        self.token(slot, TokenKind::Punctuation, text)
    }

    /// Skips source text that produces no token (whitespace, comments).
    pub fn trivia(&mut self, text: &str) {
        self.advance(text);
    }

    pub fn space(&mut self) {
        self.trivia(" ");
    }

    pub fn finish(self) -> SyntaxTree {
        debug_assert!(self.stack.is_empty(), "unclosed syntax nodes");
        self.tree
    }

    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            self.pos.offset += ch.len_utf8();
            if ch == '\n' {
                self.pos.line += 1;
                self.pos.column = 1;
            } else {
                self.pos.column += 1;
            }
        }
    }
}
