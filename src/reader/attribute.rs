//! Reader for native `#[Tag(...)]` attributes.

use super::tag::{parse_arguments, Tag, TagClass};
use super::Reader;
use crate::reflect::{
    ClassHandle, ConstantHandle, Metadata, MethodHandle, ParameterHandle, PropertyHandle,
};

/// Decodes outer attributes whose resolved path equals the requested class.
///
/// `#[Sample("x", priority = 5)]` in a module that imports
/// `fixtures::Sample` matches the class `fixtures::Sample`.
#[derive(Debug, Clone, Default)]
pub struct AttributeReader;

impl AttributeReader {
    pub fn new() -> Self {
        Self
    }

    fn tags(&self, metadata: &Metadata, class: &TagClass) -> Vec<Tag> {
        metadata
            .attributes
            .iter()
            .filter(|attr| TagClass::new(metadata.scope.resolve(&attr.path)) == *class)
            .filter_map(|attr| {
                let arguments = match attr.arguments.as_deref() {
                    Some(text) => match parse_arguments(text) {
                        Ok(arguments) => arguments,
                        Err(e) => {
                            tracing::warn!(
                                tag = %class,
                                file = %metadata.scope.file.display(),
                                line = attr.line,
                                error = %e,
                                "skipping malformed attribute"
                            );
                            return None;
                        }
                    },
                    None => Vec::new(),
                };
                Some(Tag::new(class.clone(), arguments, attr.line))
            })
            .collect()
    }
}

impl Reader for AttributeReader {
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

    fn parameter_tags(&self, parameter: &ParameterHandle, tag: &TagClass) -> Vec<Tag> {
        self.tags(&parameter.metadata, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TagValue;
    use crate::testing::runtime_with;

    #[test]
    fn test_reads_imported_attribute() {
        let (_dir, runtime) = runtime_with(
            r#"
use fixtures::Sample;

#[derive(Debug)]
#[Sample("group", priority = 2)]
#[Other("ignored")]
pub struct Router {
    #[Sample(name = "routes")]
    routes: Vec<String>,
}

impl Router {
    #[Sample("first")]
    #[Sample("second")]
    pub fn handle(&self, #[Sample] id: u32) {}
}
"#,
        );
        let reader = AttributeReader::new();
        let class = TagClass::new("fixtures::Sample");
        let router = runtime.reflect_class("Router").unwrap();

        let tags = reader.class_tags(&router, &class);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value(), Some(&TagValue::Str("group".to_string())));
        assert_eq!(tags[0].get("priority"), Some(&TagValue::Int(2)));
        assert_eq!(tags[0].line, 5);

        let fields = reader.property_tags(&router.properties[0], &class);
        assert_eq!(fields[0].get("name").and_then(TagValue::as_str), Some("routes"));

        let method = &router.methods[0];
        let values: Vec<_> = reader
            .method_tags(method, &class)
            .iter()
            .filter_map(|t| t.value().and_then(TagValue::as_str).map(str::to_string))
            .collect();
        assert_eq!(values, vec!["first", "second"]);

        let params = reader.parameter_tags(&method.parameters[0], &class);
        assert_eq!(params.len(), 1);
        assert!(params[0].arguments.is_empty());
    }

    #[test]
    fn test_unimported_name_does_not_match() {
        let (_dir, runtime) = runtime_with("#[Sample(\"x\")] pub struct Plain;");
        let reader = AttributeReader::new();
        let plain = runtime.reflect_class("Plain").unwrap();

        assert!(reader
            .class_tags(&plain, &TagClass::new("fixtures::Sample"))
            .is_empty());
        assert_eq!(reader.class_tags(&plain, &TagClass::new("Sample")).len(), 1);
    }

    #[test]
    fn test_name_value_attribute_is_positional() {
        let (_dir, runtime) = runtime_with("#[Sample = \"x\"] pub struct Assigned;");
        let reader = AttributeReader::new();
        let assigned = runtime.reflect_class("Assigned").unwrap();

        let tags = reader.class_tags(&assigned, &TagClass::new("Sample"));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value().and_then(TagValue::as_str), Some("x"));
        assert!(tags[0].get("value").is_none());
    }

    #[test]
    fn test_malformed_arguments_skipped() {
        let (_dir, runtime) = runtime_with(
            r#"
#[Sample("ok")]
#[Sample("a" "b")]
pub struct Mixed;
"#,
        );
        let reader = AttributeReader::new();
        let mixed = runtime.reflect_class("Mixed").unwrap();
        let tags = reader.class_tags(&mixed, &TagClass::new("Sample"));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value().and_then(TagValue::as_str), Some("ok"));
    }
}
