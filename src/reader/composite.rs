//! Readers combining several backends.

use std::sync::Arc;

use super::tag::{Tag, TagClass};
use super::Reader;
use crate::reflect::{ClassHandle, ConstantHandle, MethodHandle, ParameterHandle, PropertyHandle};

/// Concatenates the tags of every inner reader, in reader order.
#[derive(Clone)]
pub struct MergeReader {
    readers: Vec<Arc<dyn Reader>>,
}

impl MergeReader {
    pub fn new(readers: Vec<Arc<dyn Reader>>) -> Self {
        Self { readers }
    }

    fn collect<F>(&self, read: F) -> Vec<Tag>
    where
        F: Fn(&dyn Reader) -> Vec<Tag>,
    {
        self.readers.iter().flat_map(|r| read(r.as_ref())).collect()
    }
}

impl Reader for MergeReader {
    fn class_tags(&self, class: &ClassHandle, tag: &TagClass) -> Vec<Tag> {
        self.collect(|r| r.class_tags(class, tag))
    }

    fn method_tags(&self, method: &MethodHandle, tag: &TagClass) -> Vec<Tag> {
        self.collect(|r| r.method_tags(method, tag))
    }

    fn property_tags(&self, property: &PropertyHandle, tag: &TagClass) -> Vec<Tag> {
        self.collect(|r| r.property_tags(property, tag))
    }

    fn constant_tags(&self, constant: &ConstantHandle, tag: &TagClass) -> Vec<Tag> {
        self.collect(|r| r.constant_tags(constant, tag))
    }

    fn parameter_tags(&self, parameter: &ParameterHandle, tag: &TagClass) -> Vec<Tag> {
        self.collect(|r| r.parameter_tags(parameter, tag))
    }
}

/// Answers with the first inner reader that finds anything.
#[derive(Clone)]
pub struct SelectiveReader {
    readers: Vec<Arc<dyn Reader>>,
}

impl SelectiveReader {
    pub fn new(readers: Vec<Arc<dyn Reader>>) -> Self {
        Self { readers }
    }

    fn first<F>(&self, read: F) -> Vec<Tag>
    where
        F: Fn(&dyn Reader) -> Vec<Tag>,
    {
        self.readers
            .iter()
            .map(|r| read(r.as_ref()))
            .find(|tags| !tags.is_empty())
            .unwrap_or_default()
    }
}

impl Reader for SelectiveReader {
    fn class_tags(&self, class: &ClassHandle, tag: &TagClass) -> Vec<Tag> {
        self.first(|r| r.class_tags(class, tag))
    }

    fn method_tags(&self, method: &MethodHandle, tag: &TagClass) -> Vec<Tag> {
        self.first(|r| r.method_tags(method, tag))
    }

    fn property_tags(&self, property: &PropertyHandle, tag: &TagClass) -> Vec<Tag> {
        self.first(|r| r.property_tags(property, tag))
    }

    fn constant_tags(&self, constant: &ConstantHandle, tag: &TagClass) -> Vec<Tag> {
        self.first(|r| r.constant_tags(constant, tag))
    }

    fn parameter_tags(&self, parameter: &ParameterHandle, tag: &TagClass) -> Vec<Tag> {
        self.first(|r| r.parameter_tags(parameter, tag))
    }
}

#[cfg(all(test, feature = "native-attributes"))]
mod tests {
    use super::*;
    use crate::reader::{read, AttributeReader, DocReader, TagValue};
    use crate::reflect::Reflector;
    use crate::testing::runtime_with;

    const SOURCE: &str = r#"
/// @Sample("doc")
#[Sample("attribute")]
pub struct Both;

/// @Sample("doc only")
pub struct DocOnly;
"#;

    fn readers() -> Vec<Arc<dyn Reader>> {
        vec![Arc::new(AttributeReader::new()), Arc::new(DocReader::new())]
    }

    fn values(tags: &[Tag]) -> Vec<&str> {
        tags.iter()
            .filter_map(|t| t.value().and_then(TagValue::as_str))
            .collect()
    }

    #[test]
    fn test_merge_concatenates() {
        let (_dir, runtime) = runtime_with(SOURCE);
        let reader = MergeReader::new(readers());
        let both = runtime.reflect_class("Both").unwrap();

        let tags = reader.class_tags(&both, &TagClass::new("Sample"));
        assert_eq!(values(&tags), vec!["attribute", "doc"]);
    }

    #[test]
    fn test_selective_first_match_wins() {
        let (_dir, runtime) = runtime_with(SOURCE);
        let reader = SelectiveReader::new(readers());
        let class = TagClass::new("Sample");

        let both = runtime.reflect_class("Both").unwrap();
        assert_eq!(values(&reader.class_tags(&both, &class)), vec!["attribute"]);

        let doc_only = runtime.reflect_class("DocOnly").unwrap();
        assert_eq!(values(&reader.class_tags(&doc_only, &class)), vec!["doc only"]);
    }

    #[test]
    fn test_read_concatenates_per_class() {
        let (_dir, runtime) = runtime_with(
            r#"
#[Second("b")]
#[First("a")]
#[Second("c")]
pub struct Ordered;
"#,
        );
        let ordered = runtime.reflect_class("Ordered").unwrap();
        let reader = AttributeReader::new();

        let tags = read(
            &reader,
            Reflector::Class(&ordered),
            &[TagClass::new("First"), TagClass::new("Second")],
        );
        assert_eq!(values(&tags), vec!["a", "b", "c"]);
    }
}
