//! Decoded tags and their arguments.

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use syn::ext::IdentExt;
use syn::parse::{ParseStream, Parser};
use syn::{
    braced, bracketed, token, Expr, ExprGroup, ExprLit, ExprParen, ExprPath, ExprUnary, Ident,
    Lit, LitStr, Token, UnOp,
};

/// Fully qualified tag class identifier (`fixtures::Sample`).
///
/// Paths are normalized: `\` separators become `::`, a leading `::` or
/// `crate::` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TagClass(String);

impl TagClass {
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim().replace('\\', "::");
        let path = path.trim_start_matches("::");
        let path = path.strip_prefix("crate::").unwrap_or(path);
        TagClass(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TagClass {
    fn from(path: &str) -> Self {
        TagClass::new(path)
    }
}

impl From<String> for TagClass {
    fn from(path: String) -> Self {
        TagClass::new(path)
    }
}

/// What an aggregate is built for: the tag classes requested and the
/// parameter names of interest (`None` keeps every parameter).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagQuery {
    pub classes: Vec<TagClass>,
    pub arguments: Option<Vec<String>>,
}

impl TagQuery {
    pub fn new<I, T>(classes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TagClass>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Option<Vec<String>>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Whether parameter `name` passes the interest filter.
    pub fn accepts_parameter(&self, name: &str) -> bool {
        match &self.arguments {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }
}

/// A literal tag argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Bare path or identifier (`Level::High`).
    Path(String),
    List(Vec<TagValue>),
    Map(IndexMap<String, TagValue>),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(s) | TagValue::Path(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TagValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Float(f) => Some(*f),
            TagValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// One argument of a tag, positional when `name` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub name: Option<String>,
    pub value: TagValue,
}

/// A decoded tag attached to a declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub class: TagClass,
    pub arguments: Vec<Argument>,
    /// Source line the tag was written on (1-indexed).
    pub line: usize,
}

impl Tag {
    pub fn new(class: TagClass, arguments: Vec<Argument>, line: usize) -> Self {
        Self {
            class,
            arguments,
            line,
        }
    }

    /// Named argument.
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.arguments
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| &a.value)
    }

    /// The `index`-th positional argument.
    pub fn positional(&self, index: usize) -> Option<&TagValue> {
        self.arguments
            .iter()
            .filter(|a| a.name.is_none())
            .nth(index)
            .map(|a| &a.value)
    }

    /// The default value: first positional argument, else the one named `value`.
    pub fn value(&self) -> Option<&TagValue> {
        self.positional(0).or_else(|| self.get("value"))
    }

    /// Arguments as a JSON object; positional arguments land under `value`
    /// (a list when there are several).
    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::new();
        let positional: Vec<Value> = self
            .arguments
            .iter()
            .filter(|a| a.name.is_none())
            .map(|a| a.value.to_json())
            .collect();

        match positional.len() {
            0 => {}
            1 => {
                object.insert("value".to_string(), positional[0].clone());
            }
            _ => {
                object.insert("value".to_string(), Value::Array(positional));
            }
        }

        for argument in &self.arguments {
            if let Some(name) = &argument.name {
                object.insert(name.clone(), argument.value.to_json());
            }
        }

        Value::Object(object)
    }

    /// Decode the arguments into a payload type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.to_json())
    }
}

type Entry = (Option<String>, TagValue);

/// Comma separated entries up to the end of `input`.
fn entries(input: ParseStream) -> syn::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    while !input.is_empty() {
        entries.push(entry(input)?);
        if input.is_empty() {
            break;
        }
        input.parse::<Token![,]>()?;
    }
    Ok(entries)
}

/// `name = value`, `name: value` or a bare value.
fn entry(input: ParseStream) -> syn::Result<Entry> {
    let keyed = (input.peek(Ident::peek_any) || input.peek(LitStr))
        && (input.peek2(Token![=]) || input.peek2(Token![:]))
        && !input.peek2(Token![==])
        && !input.peek2(Token![::]);
    if !keyed {
        return Ok((None, value(input)?));
    }

    let name = if input.peek(LitStr) {
        input.parse::<LitStr>()?.value()
    } else {
        Ident::parse_any(input)?.unraw().to_string()
    };
    if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
    } else {
        input.parse::<Token![:]>()?;
    }
    Ok((Some(name), value(input)?))
}

fn value(input: ParseStream) -> syn::Result<TagValue> {
    if input.peek(token::Bracket) {
        let content;
        bracketed!(content in input);
        let entries = entries(&content)?;
        if entries.iter().any(|(k, _)| k.is_some()) {
            return Err(content.error("named entries are not allowed in [..] lists"));
        }
        return Ok(TagValue::List(entries.into_iter().map(|(_, v)| v).collect()));
    }

    // `{..}` is not a Rust expression; read it as a list or a map
    if input.peek(token::Brace) {
        let content;
        braced!(content in input);
        let entries = entries(&content)?;
        return if !entries.is_empty() && entries.iter().all(|(k, _)| k.is_some()) {
            Ok(TagValue::Map(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| k.map(|k| (k, v)))
                    .collect(),
            ))
        } else if entries.iter().all(|(k, _)| k.is_none()) {
            Ok(TagValue::List(entries.into_iter().map(|(_, v)| v).collect()))
        } else {
            Err(content.error("mixed keyed and positional entries in {..}"))
        };
    }

    expression(&input.parse::<Expr>()?)
}

fn expression(expr: &Expr) -> syn::Result<TagValue> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => literal(lit, false),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match expr.as_ref() {
            Expr::Lit(ExprLit { lit, .. }) => literal(lit, true),
            other => Err(syn::Error::new_spanned(other, "expected a number after '-'")),
        },
        Expr::Path(ExprPath {
            qself: None, path, ..
        }) => Ok(TagValue::Path(
            path.segments
                .iter()
                .map(|segment| segment.ident.unraw().to_string())
                .collect::<Vec<_>>()
                .join("::"),
        )),
        Expr::Paren(ExprParen { expr, .. }) | Expr::Group(ExprGroup { expr, .. }) => {
            expression(expr)
        }
        other => Err(syn::Error::new_spanned(other, "unsupported tag argument")),
    }
}

fn literal(lit: &Lit, negative: bool) -> syn::Result<TagValue> {
    let value = match lit {
        Lit::Int(int) => {
            let value = int.base10_parse::<i64>()?;
            return Ok(TagValue::Int(if negative { -value } else { value }));
        }
        Lit::Float(float) => {
            let value = float.base10_parse::<f64>()?;
            return Ok(TagValue::Float(if negative { -value } else { value }));
        }
        Lit::Str(s) => TagValue::Str(s.value()),
        Lit::Char(c) => TagValue::Str(c.value().to_string()),
        Lit::Bool(b) => TagValue::Bool(b.value),
        other => return Err(syn::Error::new(other.span(), "unsupported literal")),
    };
    if negative {
        return Err(syn::Error::new(lit.span(), "only numbers can be negated"));
    }
    Ok(value)
}

/// Parse the text between a tag's parentheses.
///
/// Accepts positional values and `name = value` / `name: value` pairs,
/// separated by commas. Values are Rust literals, paths, `[..]` lists or
/// `{..}` list/map literals.
pub fn parse_arguments(text: &str) -> Result<Vec<Argument>, String> {
    Ok(entries
        .parse_str(text)
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|(name, value)| Argument { name, value })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(args: &str) -> Tag {
        Tag::new(TagClass::new("Sample"), parse_arguments(args).unwrap(), 1)
    }

    #[test]
    fn test_tag_class_normalized() {
        assert_eq!(TagClass::new(r"\Fixtures\Sample").as_str(), "Fixtures::Sample");
        assert_eq!(TagClass::new("::a::B").as_str(), "a::B");
        assert_eq!(TagClass::new("crate::a::B").as_str(), "a::B");
        assert_eq!(TagClass::new("a::B").short_name(), "B");
    }

    #[test]
    fn test_parse_positional_and_named() {
        let t = tag(r#""handler", priority = 5, enabled: true"#);
        assert_eq!(t.value(), Some(&TagValue::Str("handler".to_string())));
        assert_eq!(t.get("priority"), Some(&TagValue::Int(5)));
        assert_eq!(t.get("enabled"), Some(&TagValue::Bool(true)));
        assert!(t.get("missing").is_none());
    }

    #[test]
    fn test_parse_value_fallback_to_named() {
        let t = tag(r#"value = "x""#);
        assert_eq!(t.value().and_then(TagValue::as_str), Some("x"));
    }

    #[test]
    fn test_parse_literals() {
        let t = tag(r##"-3, 2.5, 0x10, Level::High, r#"raw "quoted""#, 's', 5u8, "tab\t""##);
        assert_eq!(t.positional(0), Some(&TagValue::Int(-3)));
        assert_eq!(t.positional(1), Some(&TagValue::Float(2.5)));
        assert_eq!(t.positional(2), Some(&TagValue::Int(16)));
        assert_eq!(t.positional(3), Some(&TagValue::Path("Level::High".to_string())));
        assert_eq!(t.positional(4).and_then(TagValue::as_str), Some(r#"raw "quoted""#));
        assert_eq!(t.positional(5).and_then(TagValue::as_str), Some("s"));
        assert_eq!(t.positional(6), Some(&TagValue::Int(5)));
        assert_eq!(t.positional(7).and_then(TagValue::as_str), Some("tab\t"));
    }

    #[test]
    fn test_parse_integer_radixes_and_separators() {
        let t = tag("0b101, 0o17, 1_000, -0x1F, 25e-1");
        assert_eq!(t.positional(0), Some(&TagValue::Int(5)));
        assert_eq!(t.positional(1), Some(&TagValue::Int(15)));
        assert_eq!(t.positional(2), Some(&TagValue::Int(1000)));
        assert_eq!(t.positional(3), Some(&TagValue::Int(-31)));
        assert_eq!(t.positional(4), Some(&TagValue::Float(2.5)));
    }

    #[test]
    fn test_parse_keyword_names() {
        let t = tag(r#"type = "route", r#match = true"#);
        assert_eq!(t.get("type").and_then(TagValue::as_str), Some("route"));
        assert_eq!(t.get("match"), Some(&TagValue::Bool(true)));
    }

    #[test]
    fn test_parse_lists_and_maps() {
        let t = tag(r#"methods = ["GET", "POST"], options = {"a": 1, b = 2}, set = {"x", "y"}"#);
        assert_eq!(
            t.get("methods"),
            Some(&TagValue::List(vec![
                TagValue::Str("GET".to_string()),
                TagValue::Str("POST".to_string())
            ]))
        );
        match t.get("options") {
            Some(TagValue::Map(map)) => {
                assert_eq!(map.get("a"), Some(&TagValue::Int(1)));
                assert_eq!(map.get("b"), Some(&TagValue::Int(2)));
            }
            other => panic!("expected map, got {:?}", other),
        }
        assert!(matches!(t.get("set"), Some(TagValue::List(v)) if v.len() == 2));
    }

    #[test]
    fn test_parse_empty_and_trailing_comma() {
        assert!(parse_arguments("").unwrap().is_empty());
        assert_eq!(parse_arguments(r#""a","#).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_arguments(r#""unterminated"#).is_err());
        assert!(parse_arguments(r#""a" "b""#).is_err());
        assert!(parse_arguments("[1, 2").is_err());
        assert!(parse_arguments("name = ").is_err());
        assert!(parse_arguments("#").is_err());
        assert!(parse_arguments("1 + 2").is_err());
        assert!(parse_arguments(r#"-"a""#).is_err());
        assert!(parse_arguments("'multi'").is_err());
    }

    #[test]
    fn test_to_json_and_deserialize() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Payload {
            value: String,
            #[serde(default)]
            priority: i64,
        }

        let t = tag(r#""x", priority = 5"#);
        assert_eq!(
            t.to_json(),
            serde_json::json!({"value": "x", "priority": 5})
        );
        let payload: Payload = t.deserialize().unwrap();
        assert_eq!(
            payload,
            Payload {
                value: "x".to_string(),
                priority: 5
            }
        );

        let many = tag(r#""a", "b""#);
        assert_eq!(many.to_json(), serde_json::json!({"value": ["a", "b"]}));
    }

    #[test]
    fn test_query_parameter_filter() {
        let all = TagQuery::new(["Sample"]);
        assert!(all.accepts_parameter("anything"));

        let filtered = TagQuery::new(["Sample"]).with_arguments(Some(vec!["id".to_string()]));
        assert!(filtered.accepts_parameter("id"));
        assert!(!filtered.accepts_parameter("other"));
    }
}
