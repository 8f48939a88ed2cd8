//! Hierarchical tag records and the aggregate handed to listeners.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::reader::Tag;
use crate::reflect::{ClassHandle, ConstantHandle, MethodHandle, ParameterHandle, PropertyHandle};

/// Tags found on one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterRecord {
    pub reflection: Arc<ParameterHandle>,
    pub tags: Vec<Tag>,
}

/// Tags found on one field.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyRecord {
    pub reflection: Arc<PropertyHandle>,
    pub tags: Vec<Tag>,
}

/// Tags found on one enum variant or associated constant.
#[derive(Debug, Clone, Serialize)]
pub struct ConstantRecord {
    pub reflection: Arc<ConstantHandle>,
    pub tags: Vec<Tag>,
}

/// Tags found on a method (or free function) and its parameters.
#[derive(Debug, Clone, Serialize)]
pub struct MethodRecord {
    pub reflection: Arc<MethodHandle>,
    pub tags: Vec<Tag>,
    /// Only parameters with at least one tag, in declaration order.
    pub parameters: Vec<ParameterRecord>,
}

impl MethodRecord {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.parameters.is_empty()
    }
}

/// A free function has the same shape as a method without an owner.
pub type FunctionRecord = MethodRecord;

/// Tags found on a type and its members.
#[derive(Debug, Clone, Serialize)]
pub struct ClassRecord {
    pub reflection: Arc<ClassHandle>,
    pub tags: Vec<Tag>,
    pub methods: Vec<MethodRecord>,
    pub properties: Vec<PropertyRecord>,
    pub constants: Vec<ConstantRecord>,
}

impl ClassRecord {
    pub fn name(&self) -> &str {
        &self.reflection.name
    }

    /// No tags on the type and no tagged member.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.methods.is_empty()
            && self.properties.is_empty()
            && self.constants.is_empty()
    }
}

/// Record of one resolved element.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Class(ClassRecord),
    Function(FunctionRecord),
}

impl Record {
    /// Element identity: the type path or the function path.
    pub fn name(&self) -> String {
        self.key().name().to_string()
    }

    pub fn key(&self) -> RecordKey {
        match self {
            Record::Class(class) => RecordKey::Type(class.reflection.name.clone()),
            Record::Function(function) => RecordKey::Function(function.reflection.qualified_name()),
        }
    }

    pub fn as_class(&self) -> Option<&ClassRecord> {
        match self {
            Record::Class(class) => Some(class),
            Record::Function(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionRecord> {
        match self {
            Record::Function(function) => Some(function),
            Record::Class(_) => None,
        }
    }
}

/// Identity of a record. Types and functions live in separate namespaces,
/// so a type and a function may share a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Type(String),
    Function(String),
}

impl RecordKey {
    pub fn name(&self) -> &str {
        match self {
            RecordKey::Type(name) | RecordKey::Function(name) => name,
        }
    }
}

/// Pruned records for every resolved element, in resolution order.
///
/// Serializes as a list of records, each tagged with its `kind`.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    records: IndexMap<RecordKey, Record>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; the first record for an element wins.
    pub fn insert(&mut self, record: Record) {
        self.records.entry(record.key()).or_insert(record);
    }

    /// First record named `name`, type or function.
    pub fn get(&self, name: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|(key, _)| key.name() == name)
            .map(|(_, record)| record)
    }

    pub fn class(&self, name: &str) -> Option<&ClassRecord> {
        self.records
            .get(&RecordKey::Type(name.to_string()))
            .and_then(Record::as_class)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionRecord> {
        self.records
            .get(&RecordKey::Function(name.to_string()))
            .and_then(Record::as_function)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.keys().any(|key| key.name() == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(RecordKey::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.records.iter()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassRecord> {
        self.records.values().filter_map(Record::as_class)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.records.values().filter_map(Record::as_function)
    }

    /// JSON rendering for ad-hoc inspection.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.values())
    }
}

impl<'a> IntoIterator for &'a Aggregate {
    type Item = (&'a RecordKey, &'a Record);
    type IntoIter = indexmap::map::Iter<'a, RecordKey, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
