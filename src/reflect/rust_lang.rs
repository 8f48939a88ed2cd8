//! Rust declaration extractor using tree-sitter.
//!
//! Extracts:
//! - Struct/enum/union/trait declarations with their fields and variants
//! - Impl blocks (methods, associated constants)
//! - Free functions and their parameters
//! - Attributes and doc comments preceding each item
//! - Use declarations per module (for tag name resolution)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tree_sitter::{Language, Node, Parser};

use super::handles::{
    ClassKind, ConstantHandle, ConstantKind, Metadata, MethodHandle, ParameterHandle,
    PropertyHandle, RawAttribute, Scope, Span,
};
use super::ParsedFile;
use crate::error::{Error, Result};

/// A type declaration before impl blocks are merged in.
#[derive(Debug, Clone)]
pub(crate) struct TypeDecl {
    pub name: String,
    pub kind: ClassKind,
    pub span: Span,
    pub file: PathBuf,
    pub metadata: Metadata,
    pub properties: Vec<Arc<PropertyHandle>>,
    pub constants: Vec<Arc<ConstantHandle>>,
    /// Only populated for traits.
    pub methods: Vec<Arc<MethodHandle>>,
}

/// An impl block, keyed by the resolved path of its self type.
#[derive(Debug, Clone)]
pub(crate) struct ImplDecl {
    pub target: String,
    pub trait_name: Option<String>,
    pub methods: Vec<Arc<MethodHandle>>,
    pub constants: Vec<Arc<ConstantHandle>>,
}

/// Everything a single file declares.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileDecls {
    pub types: Vec<TypeDecl>,
    pub impls: Vec<ImplDecl>,
    pub functions: Vec<Arc<MethodHandle>>,
}

/// A child node together with the attributes and doc comments preceding it.
struct Annotated<'t> {
    node: Node<'t>,
    attributes: Vec<RawAttribute>,
    docs: Vec<String>,
    docs_line: usize,
}

impl Annotated<'_> {
    fn metadata(&self, scope: &Arc<Scope>) -> Metadata {
        Metadata {
            attributes: self.attributes.clone(),
            docs: self.docs.clone(),
            docs_line: self.docs_line,
            scope: Arc::clone(scope),
        }
    }
}

enum AttributeItem {
    Tag(RawAttribute),
    Doc(String),
}

/// Rust declaration extractor.
pub struct RustReflector {
    language: Language,
}

impl RustReflector {
    /// Create a new Rust reflector.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_rust::LANGUAGE.into(),
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| Error::Parse(e.to_string()))?;
        Ok(parser)
    }

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Syntax errors still produce a tree with ERROR nodes.
    pub fn parse(&self, path: &Path, source: &[u8]) -> Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| {
            Error::Parse(format!("failed to parse Rust source: {}", path.display()))
        })?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_path_buf(),
        })
    }

    /// Extract all declarations from a parsed file.
    pub(crate) fn extract(&self, parsed: &ParsedFile) -> FileDecls {
        let mut decls = FileDecls::default();
        self.extract_module(parsed, parsed.tree.root_node(), String::new(), &mut decls);
        decls
    }

    fn extract_module(
        &self,
        parsed: &ParsedFile,
        container: Node,
        namespace: String,
        decls: &mut FileDecls,
    ) {
        let imports = extract_imports(parsed, container, &namespace);
        let scope = Arc::new(Scope {
            file: parsed.path.clone(),
            namespace,
            imports,
        });

        for item in annotated_children(parsed, container) {
            match item.node.kind() {
                "struct_item" => {
                    decls
                        .types
                        .extend(self.type_decl(parsed, &item, &scope, ClassKind::Struct));
                }
                "union_item" => {
                    decls
                        .types
                        .extend(self.type_decl(parsed, &item, &scope, ClassKind::Union));
                }
                "enum_item" => {
                    decls
                        .types
                        .extend(self.type_decl(parsed, &item, &scope, ClassKind::Enum));
                }
                "trait_item" => {
                    decls
                        .types
                        .extend(self.type_decl(parsed, &item, &scope, ClassKind::Trait));
                }
                "impl_item" => {
                    decls.impls.extend(self.impl_decl(parsed, &item, &scope));
                }
                "function_item" => {
                    decls
                        .functions
                        .extend(self.method_handle(parsed, &item, None, &scope).map(Arc::new));
                }
                "mod_item" => {
                    let name = parsed.field_text(item.node, "name");
                    if let (Some(name), Some(body)) = (name, item.node.child_by_field_name("body")) {
                        self.extract_module(parsed, body, scope.qualify(name), decls);
                    }
                }
                _ => {}
            }
        }
    }

    fn type_decl(
        &self,
        parsed: &ParsedFile,
        item: &Annotated,
        scope: &Arc<Scope>,
        kind: ClassKind,
    ) -> Option<TypeDecl> {
        let name = scope.qualify(parsed.field_text(item.node, "name")?);
        let mut decl = TypeDecl {
            name,
            kind,
            span: Span::from_node(item.node),
            file: parsed.path.clone(),
            metadata: item.metadata(scope),
            properties: Vec::new(),
            constants: Vec::new(),
            methods: Vec::new(),
        };

        let body = match item.node.child_by_field_name("body") {
            Some(body) => body,
            None => return Some(decl),
        };

        for member in annotated_children(parsed, body) {
            match member.node.kind() {
                // Tuple struct bodies have no field_declaration nodes.
                "field_declaration" => {
                    if let Some(field) = parsed.field_text(member.node, "name") {
                        decl.properties.push(Arc::new(PropertyHandle {
                            name: field.to_string(),
                            class: decl.name.clone(),
                            type_name: parsed.field_text(member.node, "type").unwrap_or("").to_string(),
                            span: Span::from_node(member.node),
                            metadata: member.metadata(scope),
                        }));
                    }
                }
                "enum_variant" => {
                    if let Some(variant) = parsed.field_text(member.node, "name") {
                        decl.constants.push(Arc::new(ConstantHandle {
                            name: variant.to_string(),
                            class: decl.name.clone(),
                            kind: ConstantKind::Variant,
                            span: Span::from_node(member.node),
                            metadata: member.metadata(scope),
                        }));
                    }
                }
                "function_item" | "function_signature_item" => {
                    let class = decl.name.clone();
                    decl.methods
                        .extend(self.method_handle(parsed, &member, Some(&class), scope).map(Arc::new));
                }
                _ => {}
            }
        }

        Some(decl)
    }

    fn impl_decl(&self, parsed: &ParsedFile, item: &Annotated, scope: &Arc<Scope>) -> Option<ImplDecl> {
        let target = scope.resolve(&type_path(parsed, item.node.child_by_field_name("type")?));
        let trait_name = item
            .node
            .child_by_field_name("trait")
            .map(|t| scope.resolve(&type_path(parsed, t)));

        let mut decl = ImplDecl {
            target,
            trait_name,
            methods: Vec::new(),
            constants: Vec::new(),
        };

        if let Some(body) = item.node.child_by_field_name("body") {
            for member in annotated_children(parsed, body) {
                match member.node.kind() {
                    "function_item" | "function_signature_item" => {
                        let class = decl.target.clone();
                        decl.methods
                            .extend(self.method_handle(parsed, &member, Some(&class), scope).map(Arc::new));
                    }
                    "const_item" => {
                        if let Some(name) = parsed.field_text(member.node, "name") {
                            decl.constants.push(Arc::new(ConstantHandle {
                                name: name.to_string(),
                                class: decl.target.clone(),
                                kind: ConstantKind::Associated,
                                span: Span::from_node(member.node),
                                metadata: member.metadata(scope),
                            }));
                        }
                    }
                    _ => {}
                }
            }
        }

        Some(decl)
    }

    fn method_handle(
        &self,
        parsed: &ParsedFile,
        item: &Annotated,
        class: Option<&str>,
        scope: &Arc<Scope>,
    ) -> Option<MethodHandle> {
        let name = parsed.field_text(item.node, "name")?.to_string();
        let owner = match class {
            Some(class) => format!("{}::{}", class, name),
            None => scope.qualify(&name),
        };

        let mut parameters: Vec<Arc<ParameterHandle>> = Vec::new();
        if let Some(params) = item.node.child_by_field_name("parameters") {
            for mut param in annotated_children(parsed, params) {
                // self_parameter, variadic and bare-type parameters carry no binding
                if param.node.kind() != "parameter" {
                    continue;
                }

                let mut cursor = param.node.walk();
                let inner: Vec<_> = param
                    .node
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "attribute_item")
                    .collect();
                for attr in inner {
                    if let Some(AttributeItem::Tag(raw)) = raw_attribute(parsed, attr) {
                        param.attributes.push(raw);
                    }
                }

                parameters.push(Arc::new(ParameterHandle {
                    name: parsed.field_text(param.node, "pattern").unwrap_or("_").to_string(),
                    position: parameters.len(),
                    type_name: parsed.field_text(param.node, "type").unwrap_or("").to_string(),
                    function: owner.clone(),
                    span: Span::from_node(param.node),
                    metadata: param.metadata(scope),
                }));
            }
        }

        Some(MethodHandle {
            name,
            class: class.map(str::to_string),
            file: parsed.path.clone(),
            span: Span::from_node(item.node),
            is_abstract: item.node.child_by_field_name("body").is_none(),
            metadata: item.metadata(scope),
            parameters,
        })
    }
}

impl Default for RustReflector {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a container's named children into items, attaching the attributes
/// and doc comments that precede each one.
fn annotated_children<'t>(parsed: &ParsedFile, container: Node<'t>) -> Vec<Annotated<'t>> {
    let mut cursor = container.walk();
    let mut items = Vec::new();
    let mut attributes = Vec::new();
    let mut docs: Vec<String> = Vec::new();
    let mut docs_line = 0;

    for child in container.named_children(&mut cursor) {
        match child.kind() {
            "attribute_item" => match raw_attribute(parsed, child) {
                Some(AttributeItem::Tag(attr)) => attributes.push(attr),
                Some(AttributeItem::Doc(text)) => {
                    if docs.is_empty() {
                        docs_line = child.start_position().row + 1;
                    }
                    docs.extend(text.lines().map(|l| l.trim().to_string()));
                }
                None => {}
            },
            "line_comment" | "block_comment" => {
                if let Some(lines) = doc_comment_lines(parsed.node_text(child)) {
                    if docs.is_empty() {
                        docs_line = child.start_position().row + 1;
                    }
                    docs.extend(lines);
                }
            }
            "inner_attribute_item" => {}
            _ => {
                items.push(Annotated {
                    node: child,
                    attributes: std::mem::take(&mut attributes),
                    docs: std::mem::take(&mut docs),
                    docs_line,
                });
                docs_line = 0;
            }
        }
    }

    items
}

fn raw_attribute(parsed: &ParsedFile, item: Node) -> Option<AttributeItem> {
    let mut cursor = item.walk();
    let attr = item
        .named_children(&mut cursor)
        .find(|n| n.kind() == "attribute")?;
    let path = parsed.node_text(attr.named_child(0)?).to_string();

    if path == "doc" {
        let value = attr.child_by_field_name("value")?;
        return Some(AttributeItem::Doc(unquote(parsed.node_text(value)).to_string()));
    }

    // `#[Tag = value]` carries a single positional argument
    let arguments = match attr.child_by_field_name("arguments") {
        Some(tt) => Some(strip_delimiters(parsed.node_text(tt)).to_string()),
        None => attr
            .child_by_field_name("value")
            .map(|value| parsed.node_text(value).to_string()),
    };

    Some(AttributeItem::Tag(RawAttribute {
        path,
        arguments,
        line: item.start_position().row + 1,
    }))
}

/// Lines of an outer doc comment, or `None` for ordinary comments.
fn doc_comment_lines(text: &str) -> Option<Vec<String>> {
    if let Some(rest) = text.strip_prefix("///") {
        if rest.starts_with('/') {
            return None;
        }
        return Some(vec![strip_one_space(rest).trim_end().to_string()]);
    }

    if let Some(rest) = text.strip_prefix("/**") {
        if rest.starts_with('*') || rest.starts_with('/') {
            return None;
        }
        let body = rest.strip_suffix("*/").unwrap_or(rest);
        return Some(
            body.lines()
                .map(|line| {
                    let line = line.trim_start();
                    let line = line.strip_prefix('*').unwrap_or(line);
                    strip_one_space(line).trim_end().to_string()
                })
                .collect(),
        );
    }

    None
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

fn strip_delimiters(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some('('), Some(')')) | (Some('['), Some(']')) | (Some('{'), Some('}')) => {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    let text = text.trim_start_matches('r').trim_matches('#');
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Path of a type node with generic arguments removed.
fn type_path(parsed: &ParsedFile, node: Node) -> String {
    let node = if node.kind() == "generic_type" {
        node.child_by_field_name("type").unwrap_or(node)
    } else {
        node
    };
    let text = parsed.node_text(node);
    text.split('<').next().unwrap_or(text).trim().to_string()
}

/// Collect `use` declarations of one module into alias -> qualified path.
fn extract_imports(parsed: &ParsedFile, container: Node, namespace: &str) -> HashMap<String, String> {
    let mut imports = HashMap::new();
    let mut cursor = container.walk();

    for child in container.named_children(&mut cursor) {
        if child.kind() != "use_declaration" {
            continue;
        }
        if let Some(argument) = child.child_by_field_name("argument") {
            collect_use(parsed, argument, "", &mut imports);
        }
    }

    let base = Scope {
        namespace: namespace.to_string(),
        ..Scope::default()
    };
    imports
        .into_iter()
        .filter(|(alias, _)| alias != "_")
        .map(|(alias, path)| (alias, normalize_use_path(&base, &path)))
        .collect()
}

fn collect_use(parsed: &ParsedFile, node: Node, prefix: &str, imports: &mut HashMap<String, String>) {
    let join = |path: &str| {
        if prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}::{}", prefix, path)
        }
    };

    match node.kind() {
        "identifier" => {
            let name = parsed.node_text(node);
            imports.insert(name.to_string(), join(name));
        }
        "self" => {
            // `use a::b::{self}` imports `b`
            if let Some(alias) = prefix.rsplit("::").next().filter(|a| !a.is_empty()) {
                imports.insert(alias.to_string(), prefix.to_string());
            }
        }
        "scoped_identifier" => {
            if let Some(name) = parsed.field_text(node, "name") {
                imports.insert(name.to_string(), join(parsed.node_text(node)));
            }
        }
        "use_as_clause" => {
            if let (Some(path), Some(alias)) =
                (parsed.field_text(node, "path"), parsed.field_text(node, "alias"))
            {
                imports.insert(alias.to_string(), join(path));
            }
        }
        "scoped_use_list" => {
            let inner = match parsed.field_text(node, "path") {
                Some(path) => join(path),
                None => prefix.to_string(),
            };
            if let Some(list) = node.child_by_field_name("list") {
                collect_use(parsed, list, &inner, imports);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            for child in children {
                collect_use(parsed, child, prefix, imports);
            }
        }
        _ => {}
    }
}

/// `use` paths are crate-absolute unless they start with `self::`/`super::`.
fn normalize_use_path(base: &Scope, path: &str) -> String {
    if path.starts_with("self::") || path.starts_with("super::") {
        return base.resolve(path);
    }
    let path = path.trim_start_matches("::");
    path.strip_prefix("crate::").unwrap_or(path).to_string()
}
