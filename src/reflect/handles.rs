//! Reflective handles for declarations extracted from source.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Module scope an item was declared in.
///
/// Shared by every item of the same module so tag names written in source
/// can be resolved against the module's `use` declarations.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// File the module lives in.
    pub file: PathBuf,
    /// Inline module path (`a::b`), empty at file level.
    pub namespace: String,
    /// Imported name -> fully qualified path.
    pub imports: HashMap<String, String>,
}

impl Scope {
    /// Qualify a name declared in this scope.
    pub fn qualify(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.namespace, name)
        }
    }

    /// Resolve a path as written in source to its fully qualified form.
    ///
    /// The first segment goes through the module's imports; otherwise the
    /// path is relative to the module. A leading `::` (or `\`) and `crate::`
    /// make the path absolute, `self::` is dropped, `super::` pops one
    /// namespace segment.
    pub fn resolve(&self, path: &str) -> String {
        let path = path.trim().replace('\\', "::");
        if let Some(absolute) = path.strip_prefix("::") {
            return absolute.to_string();
        }
        let path = path.as_str();

        if let Some(rest) = path.strip_prefix("crate::") {
            return rest.to_string();
        }
        if let Some(rest) = path.strip_prefix("self::") {
            return self.qualify(rest);
        }
        if path.starts_with("super::") {
            let mut namespace: Vec<&str> = if self.namespace.is_empty() {
                Vec::new()
            } else {
                self.namespace.split("::").collect()
            };
            let mut rest = path;
            while let Some(stripped) = rest.strip_prefix("super::") {
                namespace.pop();
                rest = stripped;
            }
            namespace.push(rest);
            return namespace.join("::");
        }

        let (head, tail) = match path.split_once("::") {
            Some((head, tail)) => (head, Some(tail)),
            None => (path, None),
        };

        match (self.imports.get(head), tail) {
            (Some(full), Some(tail)) => format!("{}::{}", full, tail),
            (Some(full), None) => full.clone(),
            (None, _) => self.qualify(path),
        }
    }
}

/// One raw `#[...]` attribute as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Attribute path as written (`Sample`, `tags::Sample`).
    pub path: String,
    /// Argument text without the outer delimiters, if the attribute has any.
    pub arguments: Option<String>,
    /// Line of the attribute (1-indexed).
    pub line: usize,
}

/// Undecoded metadata attached to a declaration.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Outer attributes in source order.
    pub attributes: Vec<RawAttribute>,
    /// Doc comment lines with comment markers stripped.
    pub docs: Vec<String>,
    /// Line of the first doc comment (1-indexed), 0 when there are none.
    pub docs_line: usize,
    /// Scope used to resolve tag names.
    pub scope: Arc<Scope>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.docs.is_empty()
    }
}

/// Kind of type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Struct,
    Enum,
    Union,
    Trait,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Struct => "struct",
            ClassKind::Enum => "enum",
            ClassKind::Union => "union",
            ClassKind::Trait => "trait",
        }
    }

    /// Traits cannot be instantiated, so they are the abstract types.
    pub fn is_abstract(&self) -> bool {
        matches!(self, ClassKind::Trait)
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A type together with all of its members.
#[derive(Debug, Clone, Serialize)]
pub struct ClassHandle {
    /// Fully qualified name.
    pub name: String,
    pub kind: ClassKind,
    pub file: PathBuf,
    pub span: Span,
    #[serde(skip)]
    pub metadata: Metadata,
    /// Methods in declaration order: impl blocks first, then provided trait methods.
    #[serde(skip)]
    pub methods: Vec<Arc<MethodHandle>>,
    #[serde(skip)]
    pub properties: Vec<Arc<PropertyHandle>>,
    /// Enum variants followed by associated constants.
    #[serde(skip)]
    pub constants: Vec<Arc<ConstantHandle>>,
}

impl ClassHandle {
    pub fn is_abstract(&self) -> bool {
        self.kind.is_abstract()
    }

    /// Unqualified type name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }
}

/// A method or a free function.
#[derive(Debug, Clone, Serialize)]
pub struct MethodHandle {
    pub name: String,
    /// Declaring type for methods, `None` for free functions.
    pub class: Option<String>,
    pub file: PathBuf,
    pub span: Span,
    /// Signature-only declaration (no body).
    pub is_abstract: bool,
    #[serde(skip)]
    pub metadata: Metadata,
    #[serde(skip)]
    pub parameters: Vec<Arc<ParameterHandle>>,
}

impl MethodHandle {
    /// `Type::method` for methods, the namespaced path for functions.
    pub fn qualified_name(&self) -> String {
        match &self.class {
            Some(class) => format!("{}::{}", class, self.name),
            None => self.metadata.scope.qualify(&self.name),
        }
    }
}

/// A named struct or union field.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyHandle {
    pub name: String,
    pub class: String,
    /// Field type as written.
    pub type_name: String,
    pub span: Span,
    #[serde(skip)]
    pub metadata: Metadata,
}

/// Where a constant comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantKind {
    /// Enum variant.
    Variant,
    /// Associated `const` in an impl block.
    Associated,
}

/// An enum variant or associated constant.
#[derive(Debug, Clone, Serialize)]
pub struct ConstantHandle {
    pub name: String,
    pub class: String,
    pub kind: ConstantKind,
    pub span: Span,
    #[serde(skip)]
    pub metadata: Metadata,
}

/// A non-`self` parameter of a method or function.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterHandle {
    /// Binding name (`value` for `mut value: u8`), or the pattern text.
    pub name: String,
    /// Zero-based position among the non-`self` parameters.
    pub position: usize,
    /// Parameter type as written.
    pub type_name: String,
    /// Qualified name of the owning method or function.
    pub function: String,
    pub span: Span,
    #[serde(skip)]
    pub metadata: Metadata,
}

/// Borrowed view over any reflective handle.
///
/// Member-kind dispatch is done by matching on this closed set.
#[derive(Debug, Clone, Copy)]
pub enum Reflector<'a> {
    Class(&'a ClassHandle),
    Method(&'a MethodHandle),
    Property(&'a PropertyHandle),
    Constant(&'a ConstantHandle),
    Parameter(&'a ParameterHandle),
}

impl<'a> Reflector<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Reflector::Class(c) => &c.name,
            Reflector::Method(m) => &m.name,
            Reflector::Property(p) => &p.name,
            Reflector::Constant(c) => &c.name,
            Reflector::Parameter(p) => &p.name,
        }
    }

    pub fn metadata(&self) -> &'a Metadata {
        match self {
            Reflector::Class(c) => &c.metadata,
            Reflector::Method(m) => &m.metadata,
            Reflector::Property(p) => &p.metadata,
            Reflector::Constant(c) => &c.metadata,
            Reflector::Parameter(p) => &p.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(namespace: &str, imports: &[(&str, &str)]) -> Scope {
        Scope {
            file: PathBuf::from("lib.rs"),
            namespace: namespace.to_string(),
            imports: imports
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_resolve_through_imports() {
        let s = scope("app", &[("Sample", "fixtures::Sample"), ("tags", "fixtures::tags")]);
        assert_eq!(s.resolve("Sample"), "fixtures::Sample");
        assert_eq!(s.resolve("tags::Route"), "fixtures::tags::Route");
        assert_eq!(s.resolve("Other"), "app::Other");
    }

    #[test]
    fn test_resolve_relative_prefixes() {
        let s = scope("a::b", &[]);
        assert_eq!(s.resolve("crate::x::Tag"), "x::Tag");
        assert_eq!(s.resolve("::x::Tag"), "x::Tag");
        assert_eq!(s.resolve("self::Tag"), "a::b::Tag");
        assert_eq!(s.resolve("super::Tag"), "a::Tag");
        assert_eq!(s.resolve("super::super::Tag"), "Tag");
        assert_eq!(s.resolve(r"\x\Tag"), "x::Tag");
    }

    #[test]
    fn test_class_kind_abstract() {
        assert!(ClassKind::Trait.is_abstract());
        assert!(!ClassKind::Struct.is_abstract());
        assert!(!ClassKind::Enum.is_abstract());
    }
}
