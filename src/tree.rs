//! Builds tag records for reflected types and functions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reader::{read, Reader, TagQuery};
use crate::record::{ClassRecord, ConstantRecord, FunctionRecord, MethodRecord, PropertyRecord, ParameterRecord};
use crate::reflect::{ClassHandle, MethodHandle, Reflector};

/// What to do with abstract types (traits) among the resolved elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbstractPolicy {
    /// Leave them out of every aggregate.
    #[default]
    Exclude,
    /// Fail the build with [`Error::AbstractType`].
    Reject,
}

/// Walks a type's members and collects their tags.
///
/// Members are visited methods first, then fields, then constants, each in
/// declaration order. Abstract methods are skipped.
pub struct TreeBuilder<'a> {
    reader: &'a dyn Reader,
    policy: AbstractPolicy,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(reader: &'a dyn Reader, policy: AbstractPolicy) -> Self {
        Self { reader, policy }
    }

    /// Record for a type, or `None` when nothing in it is tagged.
    pub fn build_class(&self, class: &Arc<ClassHandle>, query: &TagQuery) -> Result<Option<ClassRecord>> {
        if class.is_abstract() {
            return match self.policy {
                AbstractPolicy::Exclude => {
                    tracing::debug!(class = %class.name, kind = %class.kind, "excluding abstract type");
                    Ok(None)
                }
                AbstractPolicy::Reject => Err(Error::AbstractType(class.name.clone())),
            };
        }

        let tags = read(self.reader, Reflector::Class(class), &query.classes);

        let methods = class
            .methods
            .iter()
            .filter(|method| !method.is_abstract)
            .filter_map(|method| self.method_record(method, query))
            .collect();

        let properties = class
            .properties
            .iter()
            .filter_map(|property| {
                let tags = read(self.reader, Reflector::Property(property), &query.classes);
                (!tags.is_empty()).then(|| PropertyRecord {
                    reflection: Arc::clone(property),
                    tags,
                })
            })
            .collect();

        let constants = class
            .constants
            .iter()
            .filter_map(|constant| {
                let tags = read(self.reader, Reflector::Constant(constant), &query.classes);
                (!tags.is_empty()).then(|| ConstantRecord {
                    reflection: Arc::clone(constant),
                    tags,
                })
            })
            .collect();

        let record = ClassRecord {
            reflection: Arc::clone(class),
            tags,
            methods,
            properties,
            constants,
        };

        Ok((!record.is_empty()).then_some(record))
    }

    /// Record for a free function, or `None` when nothing in it is tagged.
    pub fn build_function(&self, function: &Arc<MethodHandle>, query: &TagQuery) -> Option<FunctionRecord> {
        self.method_record(function, query)
    }

    fn method_record(&self, method: &Arc<MethodHandle>, query: &TagQuery) -> Option<MethodRecord> {
        let tags = read(self.reader, Reflector::Method(method), &query.classes);

        let parameters = method
            .parameters
            .iter()
            .filter(|parameter| query.accepts_parameter(&parameter.name))
            .filter_map(|parameter| {
                let tags = read(self.reader, Reflector::Parameter(parameter), &query.classes);
                (!tags.is_empty()).then(|| ParameterRecord {
                    reflection: Arc::clone(parameter),
                    tags,
                })
            })
            .collect();

        let record = MethodRecord {
            reflection: Arc::clone(method),
            tags,
            parameters,
        };

        (!record.is_empty()).then_some(record)
    }
}
