//! Error types for tag discovery and aggregation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a loader construction or a build.
///
/// Resolution misses (unknown locators, files without declarations) are not
/// errors; they simply contribute nothing to the aggregate.
#[derive(Error, Debug)]
pub enum Error {
    /// No reader was supplied and the built-in attribute reader is not compiled in.
    #[error("no tag reader configured and native attribute support is disabled")]
    NoReader,
    /// A resolved type is abstract while the loader rejects abstract types.
    #[error("tags from type {0:?} cannot be read as it is abstract")]
    AbstractType(String),
    /// A scanned file holds no Rust items at all (markup, plain text, ...).
    #[error("{} does not contain Rust source", .path.display())]
    NotSource { path: PathBuf },
    /// A scanned file is Rust but does not parse cleanly.
    #[error("syntax error in {} at {line}:{column}", .path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The tree-sitter grammar or a query failed to load.
    #[error("parser setup failed: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A listener's reducer failed.
    #[error("listener {name:?} failed: {source}")]
    Listener {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
