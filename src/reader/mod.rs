//! Tag readers.
//!
//! A [`Reader`] decodes the tags of one class attached to a reflected
//! declaration. Readers are interchangeable: native attributes
//! (`#[Sample(..)]`), doc comment tags (`@Sample(..)`) or a composite of both
//! yield the same [`Tag`] values for equivalent source.

#[cfg(feature = "native-attributes")]
mod attribute;
mod composite;
mod doc;
mod tag;

use std::sync::Arc;

use crate::reflect::{
    ClassHandle, ConstantHandle, MethodHandle, ParameterHandle, PropertyHandle, Reflector,
};

#[cfg(feature = "native-attributes")]
pub use attribute::AttributeReader;
pub use composite::{MergeReader, SelectiveReader};
pub use doc::DocReader;
pub use tag::{parse_arguments, Argument, Tag, TagClass, TagQuery, TagValue};

/// Decodes tags of a given class, one operation per member kind.
pub trait Reader: Send + Sync {
    fn class_tags(&self, class: &ClassHandle, tag: &TagClass) -> Vec<Tag>;

    fn method_tags(&self, method: &MethodHandle, tag: &TagClass) -> Vec<Tag>;

    fn property_tags(&self, property: &PropertyHandle, tag: &TagClass) -> Vec<Tag>;

    fn constant_tags(&self, constant: &ConstantHandle, tag: &TagClass) -> Vec<Tag>;

    fn parameter_tags(&self, parameter: &ParameterHandle, tag: &TagClass) -> Vec<Tag>;
}

/// Read every requested tag class from `target`.
///
/// Results are concatenated per class, in the order of `classes`.
pub fn read(reader: &dyn Reader, target: Reflector<'_>, classes: &[TagClass]) -> Vec<Tag> {
    let mut tags = Vec::new();
    for class in classes {
        tags.extend(match target {
            Reflector::Class(handle) => reader.class_tags(handle, class),
            Reflector::Method(handle) => reader.method_tags(handle, class),
            Reflector::Property(handle) => reader.property_tags(handle, class),
            Reflector::Constant(handle) => reader.constant_tags(handle, class),
            Reflector::Parameter(handle) => reader.parameter_tags(handle, class),
        });
    }
    tags
}

/// The built-in reader used when none is supplied, if compiled in.
pub fn default_reader() -> Option<Arc<dyn Reader>> {
    #[cfg(feature = "native-attributes")]
    {
        Some(Arc::new(AttributeReader::new()))
    }
    #[cfg(not(feature = "native-attributes"))]
    {
        None
    }
}
