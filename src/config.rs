//! Loader configuration.
//!
//! ```yaml
//! resources:
//!   - src/handlers
//!   - app::Router
//! extensions: [rs]
//! excluded_paths:
//!   - "**/generated/**"
//! discovery: static      # or "load"
//! reader: merge          # attribute | doc | merge | selective; omit for the built-in reader
//! on_abstract: exclude   # or "reject"
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::discover::Discovery;
use crate::error::{Error, Result};
use crate::reader::{DocReader, MergeReader, Reader, SelectiveReader};
use crate::tree::AbstractPolicy;

#[cfg(feature = "native-attributes")]
use crate::reader::AttributeReader;

/// Top-level loader configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Directories, files, type paths or function paths.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Source file extensions without the dot (default: `["rs"]`).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Glob patterns for paths to skip when scanning directories.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub discovery: Discovery,
    /// Reader backend; the built-in attribute reader when absent.
    #[serde(default)]
    pub reader: Option<ReaderKind>,
    #[serde(default)]
    pub on_abstract: AbstractPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            extensions: default_extensions(),
            excluded_paths: Vec::new(),
            discovery: Discovery::default(),
            reader: None,
            on_abstract: AbstractPolicy::default(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["rs".to_string()]
}

impl LoaderConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text.
    pub fn parse_str(content: &str) -> Result<Self> {
        let config: LoaderConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

/// Reader backends selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    /// Native `#[Tag(..)]` attributes.
    Attribute,
    /// `@Tag(..)` in doc comments.
    Doc,
    /// Attributes and doc tags concatenated.
    Merge,
    /// Attributes when present, doc tags otherwise.
    Selective,
}

impl ReaderKind {
    pub fn build(&self) -> Result<Arc<dyn Reader>> {
        let reader: Arc<dyn Reader> = match self {
            ReaderKind::Attribute => attribute_reader()?,
            ReaderKind::Doc => doc_reader(),
            ReaderKind::Merge => Arc::new(MergeReader::new(vec![attribute_reader()?, doc_reader()])),
            ReaderKind::Selective => {
                Arc::new(SelectiveReader::new(vec![attribute_reader()?, doc_reader()]))
            }
        };
        Ok(reader)
    }
}

fn doc_reader() -> Arc<dyn Reader> {
    Arc::new(DocReader::new())
}

#[cfg(feature = "native-attributes")]
fn attribute_reader() -> Result<Arc<dyn Reader>> {
    Ok(Arc::new(AttributeReader::new()))
}

#[cfg(not(feature = "native-attributes"))]
fn attribute_reader() -> Result<Arc<dyn Reader>> {
    Err(Error::NoReader)
}

/// Validate a configuration.
pub fn validate(config: &LoaderConfig) -> Result<()> {
    if config.extensions.is_empty() {
        return Err(Error::Config("extensions must not be empty".to_string()));
    }
    for ext in &config.extensions {
        let ext = ext.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(Error::Config(format!("invalid extension {:?}", ext)));
        }
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern).map_err(|e| {
            Error::Config(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
        })?;
    }

    for resource in &config.resources {
        if resource.trim().is_empty() {
            return Err(Error::Config("resources must not contain empty entries".to_string()));
        }
    }

    Ok(())
}
