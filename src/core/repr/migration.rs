//! Decides whether a type node may be built natively.
//!
//! An unmigrated node kind is always legacy. Otherwise the walk starts at the
//! node's first token and climbs parent links up to the node itself, passing
//! through clause and element nodes. Any unmigrated type kind on that chain
//! sends the whole node to the legacy builder, so a node is never built
//! natively underneath an enclosing shape the native builder cannot
//! represent.

use crate::core::tree::{NodeId, SyntaxKind, SyntaxTree, TypeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    Native,
    Legacy(LegacyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyReason {
    UnmigratedKind(NodeId, TypeKind),
    UnknownNode(NodeId),
    NoTokens,
}

pub fn check_migration(tree: &SyntaxTree, node: NodeId) -> Migration {
    if let SyntaxKind::Type(kind) = tree.kind(node)
        && !kind.is_migrated()
    {
        return Migration::Legacy(LegacyReason::UnmigratedKind(node, kind));
    }
    let Some(first) = tree.first_token(node) else {
        return Migration::Legacy(LegacyReason::NoTokens);
    };

    let mut current = tree.token_parent(first);
    while let Some(id) = current {
        match tree.kind(id) {
            SyntaxKind::Type(kind) if !kind.is_migrated() => {
                return Migration::Legacy(LegacyReason::UnmigratedKind(id, kind));
            }
            SyntaxKind::Unknown => return Migration::Legacy(LegacyReason::UnknownNode(id)),
            // Clause and element nodes are climbed through.
            _ => {}
        }
        if id == node {
            return Migration::Native;
        }
        current = tree.parent(id);
    }

    // Ran off the root without meeting `node`: the token was not under it.
    Migration::Legacy(LegacyReason::NoTokens)
}

pub fn is_migrated(tree: &SyntaxTree, node: NodeId) -> bool {
    check_migration(tree, node) == Migration::Native
}
