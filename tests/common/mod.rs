//! Shared fixtures for the integration tests.
//!
//! `SampleListener` folds `fixtures::Sample` tags into a [`SampleCollector`]:
//! class-level tags act as groups that prefix the names (and add their
//! priority to) every tagged member. A type tagged only at class level is
//! collected under its own name.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use tagscan::{Aggregate, Listener, Record, Tag, TagClass};

pub const SAMPLE: &str = "fixtures::Sample";

pub fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/annotation")
}

pub fn fixture(path: &str) -> String {
    testdata_path().join(path).to_string_lossy().to_string()
}

/// Payload of a `Sample` tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sample {
    #[serde(alias = "value")]
    pub name: String,
    #[serde(default)]
    pub priority: i64,
}

impl Sample {
    pub fn from_tag(tag: &Tag) -> anyhow::Result<Self> {
        let sample: Sample = tag.deserialize()?;
        if sample.name.is_empty() {
            anyhow::bail!("Sample.name must not be empty (line {})", tag.line);
        }
        Ok(sample)
    }
}

/// What a collected name was declared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    Class(String),
    Method(String),
    Property(String),
    Constant(String),
    Parameter(String),
    Function(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    pub handler: Handler,
    pub priority: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleCollector {
    pub collected: BTreeMap<String, Collected>,
}

impl SampleCollector {
    pub fn add(&mut self, sample: &Sample, handler: Handler, group: Option<&Sample>) {
        let (name, priority) = match group {
            Some(group) => (
                format!("{}_{}", group.name, sample.name),
                sample.priority + group.priority,
            ),
            None => (sample.name.clone(), sample.priority),
        };
        self.collected.insert(name, Collected { handler, priority });
    }

    pub fn names(&self) -> Vec<&str> {
        self.collected.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Collected> {
        self.collected.get(name)
    }
}

pub struct SampleListener {
    name: String,
}

impl SampleListener {
    pub fn new() -> Self {
        Self {
            name: "sample".to_string(),
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Default for SampleListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for SampleListener {
    type Output = SampleCollector;

    fn name(&self) -> &str {
        &self.name
    }

    fn annotations(&self) -> Vec<TagClass> {
        vec![TagClass::new(SAMPLE)]
    }

    fn arguments(&self) -> Option<Vec<String>> {
        Some(vec!["parameter".to_string()])
    }

    fn on_annotation(&self, annotations: &Aggregate) -> anyhow::Result<SampleCollector> {
        let mut collector = SampleCollector::default();

        for (_, record) in annotations {
            match record {
                Record::Class(class) => {
                    let mut members: Vec<(Sample, Handler)> = Vec::new();
                    for method in &class.methods {
                        let handler = Handler::Method(method.reflection.qualified_name());
                        for tag in &method.tags {
                            members.push((Sample::from_tag(tag)?, handler.clone()));
                        }
                    }
                    for property in &class.properties {
                        let handler =
                            Handler::Property(format!("{}::{}", class.name(), property.reflection.name));
                        for tag in &property.tags {
                            members.push((Sample::from_tag(tag)?, handler.clone()));
                        }
                    }
                    for constant in &class.constants {
                        let handler =
                            Handler::Constant(format!("{}::{}", class.name(), constant.reflection.name));
                        for tag in &constant.tags {
                            members.push((Sample::from_tag(tag)?, handler.clone()));
                        }
                    }
                    for method in &class.methods {
                        for parameter in &method.parameters {
                            let handler = Handler::Parameter(format!(
                                "{}::{}",
                                parameter.reflection.function, parameter.reflection.name
                            ));
                            for tag in &parameter.tags {
                                members.push((Sample::from_tag(tag)?, handler.clone()));
                            }
                        }
                    }

                    let groups = class
                        .tags
                        .iter()
                        .map(Sample::from_tag)
                        .collect::<anyhow::Result<Vec<_>>>()?;

                    if members.is_empty() {
                        for group in &groups {
                            collector.add(group, Handler::Class(class.name().to_string()), None);
                        }
                    } else if groups.is_empty() {
                        for (sample, handler) in &members {
                            collector.add(sample, handler.clone(), None);
                        }
                    } else {
                        for group in &groups {
                            for (sample, handler) in &members {
                                collector.add(sample, handler.clone(), Some(group));
                            }
                        }
                    }
                }
                Record::Function(function) => {
                    let name = function.reflection.qualified_name();
                    for tag in &function.tags {
                        collector.add(&Sample::from_tag(tag)?, Handler::Function(name.clone()), None);
                    }
                    for parameter in &function.parameters {
                        let handler =
                            Handler::Parameter(format!("{}::{}", name, parameter.reflection.name));
                        for tag in &parameter.tags {
                            collector.add(&Sample::from_tag(tag)?, handler.clone(), None);
                        }
                    }
                }
            }
        }

        Ok(collector)
    }
}

pub fn collector(loaded: &tagscan::Loaded) -> &SampleCollector {
    loaded
        .downcast_ref::<SampleCollector>()
        .expect("result should be a SampleCollector")
}
