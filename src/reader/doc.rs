//! Reader for `@Tag(...)` annotations written in doc comments.

use lazy_static::lazy_static;
use regex::Regex;

use super::tag::{parse_arguments, Tag, TagClass};
use super::Reader;
use crate::reflect::{
    ClassHandle, ConstantHandle, Metadata, MethodHandle, ParameterHandle, PropertyHandle,
};

lazy_static! {
    /// `@Name` at the start of a line or after whitespace. `\` separators are accepted.
    static ref TAG_PATTERN: Regex =
        Regex::new(r"(?m)(?:^|\s)@((?:\\|::)?[A-Za-z_][A-Za-z0-9_]*(?:(?:\\|::)[A-Za-z_][A-Za-z0-9_]*)*)")
            .unwrap();
}

/// Decodes docblock-style tags from doc comments.
///
/// ```text
/// /// Handles the index route.
/// ///
/// /// @Sample("index", priority = 5)
/// ```
///
/// Names resolve through the module's imports like attribute paths do.
/// Arguments may span several lines.
#[derive(Debug, Clone, Default)]
pub struct DocReader;

impl DocReader {
    pub fn new() -> Self {
        Self
    }

    fn tags(&self, metadata: &Metadata, class: &TagClass) -> Vec<Tag> {
        if metadata.docs.is_empty() {
            return Vec::new();
        }

        let text = metadata.docs.join("\n");
        let mut tags = Vec::new();

        for captures in TAG_PATTERN.captures_iter(&text) {
            let Some(name) = captures.get(1) else {
                continue;
            };
            if TagClass::new(metadata.scope.resolve(name.as_str())) != *class {
                continue;
            }

            let line = metadata.docs_line + text[..name.start()].matches('\n').count();
            let rest = &text[name.end()..];
            let arguments = if rest.starts_with('(') {
                match balanced(rest) {
                    Some(inner) => parse_arguments(inner),
                    None => Err("unbalanced parentheses".to_string()),
                }
            } else {
                Ok(Vec::new())
            };

            match arguments {
                Ok(arguments) => tags.push(Tag::new(class.clone(), arguments, line)),
                Err(e) => tracing::warn!(
                    tag = %class,
                    file = %metadata.scope.file.display(),
                    line,
                    error = %e,
                    "skipping malformed doc tag"
                ),
            }
        }

        tags
    }
}

/// Text between the `(` starting `text` and its matching `)`.
fn balanced(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

impl Reader for DocReader {
    fn class_tags(&self, class: &ClassHandle, tag: &TagClass) -> Vec<Tag> {
        self.tags(&class.metadata, tag)
    }

    fn method_tags(&self, method: &MethodHandle, tag: &TagClass) -> Vec<Tag> {
        self.tags(&method.metadata, tag)
    }

    fn property_tags(&self, property: &PropertyHandle, tag: &TagClass) -> Vec<Tag> {
        self.tags(&property.metadata, tag)
    }

    fn constant_tags(&self, constant: &ConstantHandle, tag: &TagClass) -> Vec<Tag> {
        self.tags(&constant.metadata, tag)
    }

    /// Parameters carry no doc comments.
    fn parameter_tags(&self, _parameter: &ParameterHandle, _tag: &TagClass) -> Vec<Tag> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TagValue;
    use crate::testing::runtime_with;

    #[test]
    fn test_reads_doc_tags() {
        let (_dir, runtime) = runtime_with(
            r#"
use fixtures::Sample;

/// Router for the public site.
///
/// @Sample("group", priority = 2)
/// @param ignored
pub struct Router {
    /** @Sample(name="routes") */
    routes: Vec<String>,
}

impl Router {
    /// @Sample(
    ///     "multi",
    ///     priority = 3
    /// )
    /// @Sample("second")
    pub fn handle(&self) {}
}
"#,
        );
        let reader = DocReader::new();
        let class = TagClass::new("fixtures::Sample");
        let router = runtime.reflect_class("Router").unwrap();

        let tags = reader.class_tags(&router, &class);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value().and_then(TagValue::as_str), Some("group"));
        assert_eq!(tags[0].line, 6);

        let fields = reader.property_tags(&router.properties[0], &class);
        assert_eq!(fields[0].get("name").and_then(TagValue::as_str), Some("routes"));

        let methods = reader.method_tags(&router.methods[0], &class);
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].get("priority"), Some(&TagValue::Int(3)));
        assert_eq!(methods[1].line, methods[0].line + 4);
    }

    #[test]
    fn test_backslash_names_and_emails() {
        let (_dir, runtime) = runtime_with(
            r#"
/// Contact admin@example.com for details.
/// @\fixtures\Sample("x")
pub struct Contact;
"#,
        );
        let reader = DocReader::new();
        let contact = runtime.reflect_class("Contact").unwrap();

        let tags = reader.class_tags(&contact, &TagClass::new("fixtures::Sample"));
        assert_eq!(tags.len(), 1);
        assert!(reader
            .class_tags(&contact, &TagClass::new("example"))
            .is_empty());
    }

    #[test]
    fn test_unbalanced_tag_skipped() {
        let (_dir, runtime) = runtime_with(
            r#"
/// @Sample("open"
pub struct Broken;
"#,
        );
        let reader = DocReader::new();
        let broken = runtime.reflect_class("Broken").unwrap();
        assert!(reader.class_tags(&broken, &TagClass::new("Sample")).is_empty());
    }

    #[test]
    fn test_balanced_ignores_parens_in_strings() {
        assert_eq!(balanced(r#"("a)", (1))"#), Some(r#""a)", (1)"#));
        assert_eq!(balanced("(open"), None);
        assert_eq!(balanced("(')', '(')"), Some("')', '('"));
    }

    #[test]
    fn test_char_arguments_hold_parens() {
        let (_dir, runtime) = runtime_with(
            r#"
/// @Sample(')', separator = '(')
pub struct Delimited;
"#,
        );
        let reader = DocReader::new();
        let delimited = runtime.reflect_class("Delimited").unwrap();

        let tags = reader.class_tags(&delimited, &TagClass::new("Sample"));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value().and_then(TagValue::as_str), Some(")"));
        assert_eq!(tags[0].get("separator").and_then(TagValue::as_str), Some("("));
    }
}
