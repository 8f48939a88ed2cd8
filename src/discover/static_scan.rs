//! Discovery by parsing files without registering them.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use super::ClassLoader;
use crate::error::{Error, Result};
use crate::reflect::{ParsedFile, Runtime, RustReflector};

/// Tree-sitter query for type declarations.
const DECLARATION_QUERY: &str = r#"
(struct_item
  name: (type_identifier) @name
) @decl

(enum_item
  name: (type_identifier) @name
) @decl

(union_item
  name: (type_identifier) @name
) @decl

(trait_item
  name: (type_identifier) @name
) @decl
"#;

static REFLECTOR: Lazy<RustReflector> = Lazy::new(RustReflector::new);

/// Finds type declarations syntactically.
///
/// Only items at file level or inside inline modules count; names are
/// qualified with the module path. Identifiers in expressions (method calls
/// such as `a.union(b)`, paths, struct literals), strings and comments are
/// never reported. Each discovered type is queued for autoload, so files are
/// registered only when something is reflected from them.
///
/// Files are parsed in parallel; the result keeps input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticScan;

impl StaticScan {
    pub fn new() -> Self {
        Self
    }

    /// Type names declared in a file.
    pub fn scan_file(&self, path: &Path) -> Result<Vec<String>> {
        let source = fs::read(path).map_err(|e| Error::io(path, e))?;
        self.scan_source(path, &source)
    }

    /// Type names declared in `source`.
    ///
    /// Fails with [`Error::NotSource`] when the text holds no Rust item at all
    /// and with [`Error::Syntax`] when it is Rust with syntax errors.
    pub fn scan_source(&self, path: &Path, source: &[u8]) -> Result<Vec<String>> {
        let parsed = REFLECTOR.parse(path, source)?;
        let root = parsed.tree.root_node();

        if root.has_error() {
            return Err(syntax_error(&parsed, root));
        }

        let query = Query::new(REFLECTOR.language(), DECLARATION_QUERY)
            .map_err(|e| Error::Parse(e.to_string()))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, root, &parsed.source[..]);

        let mut names = Vec::new();
        while let Some(m) = matches.next() {
            let mut name = None;
            let mut decl = None;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "name" => name = Some(parsed.node_text(capture.node)),
                    "decl" => decl = Some(capture.node),
                    _ => {}
                }
            }

            if let (Some(name), Some(decl)) = (name, decl) {
                if let Some(module) = module_path(&parsed, decl) {
                    names.push(if module.is_empty() {
                        name.to_string()
                    } else {
                        format!("{}::{}", module, name)
                    });
                }
            }
        }

        Ok(names)
    }
}

impl ClassLoader for StaticScan {
    fn discover(&self, files: &[PathBuf], runtime: &Runtime) -> Result<Vec<String>> {
        let scanned: Vec<Result<Vec<String>>> =
            files.par_iter().map(|file| self.scan_file(file)).collect();

        let mut names = Vec::new();
        for (file, result) in files.iter().zip(scanned) {
            let declared = result?;
            tracing::debug!(file = %file.display(), types = declared.len(), "scanned file");
            for name in declared {
                runtime.autoload(&name, file);
                names.push(name);
            }
        }

        Ok(names)
    }
}

/// Inline module path of an item, or `None` when it is nested in a body
/// other than a module (function block, impl, trait).
fn module_path(parsed: &ParsedFile, decl: Node) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = decl.parent()?;

    loop {
        match current.kind() {
            "source_file" => break,
            "declaration_list" => {
                let owner = current.parent()?;
                if owner.kind() != "mod_item" {
                    return None;
                }
                segments.push(parsed.field_text(owner, "name")?);
                current = owner.parent()?;
            }
            _ => return None,
        }
    }

    segments.reverse();
    Some(segments.join("::"))
}

fn syntax_error(parsed: &ParsedFile, root: Node) -> Error {
    let mut cursor = root.walk();
    let has_item = root
        .named_children(&mut cursor)
        .any(|child| is_item(child.kind()) && !child.has_error());

    if !has_item {
        return Error::NotSource {
            path: parsed.path.clone(),
        };
    }

    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    Error::Syntax {
        path: parsed.path.clone(),
        line: position.row + 1,
        column: position.column + 1,
    }
}

fn is_item(kind: &str) -> bool {
    match kind {
        "attribute_item" | "inner_attribute_item" => false,
        "use_declaration" | "macro_definition" => true,
        _ => kind.ends_with("_item"),
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
