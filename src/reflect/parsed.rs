//! A source file parsed for reflection.

use std::path::PathBuf;

use tree_sitter::{Node, Tree};

/// Parse tree of one source file together with the bytes it was built from.
///
/// Handles are extracted eagerly, so a `ParsedFile` is dropped as soon as the
/// file's declarations are registered.
pub struct ParsedFile {
    pub tree: Tree,
    pub source: Vec<u8>,
    /// Canonical path, recorded on every handle taken from this file.
    pub path: PathBuf,
}

impl ParsedFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Text covered by `node`; empty if it is not valid UTF-8.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Text of a named field of `node`, if present.
    pub fn field_text(&self, node: Node, field: &str) -> Option<&str> {
        node.child_by_field_name(field).map(|n| self.node_text(n))
    }
}
