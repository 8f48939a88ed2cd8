//! Tagscan - tag discovery and aggregation for Rust source.
//!
//! Tagscan finds declarative tags attached to types, methods, fields,
//! constants, parameters and free functions, builds a hierarchical record per
//! element and hands the aggregate to listeners that reduce it into their own
//! result types.
//!
//! Tags are written either as native attributes or as doc comment
//! annotations:
//!
//! ```text
//! use crate::routing::Route;
//!
//! #[Route("/users", priority = 5)]
//! pub struct Users;
//!
//! impl Users {
//!     /// @Route("/users/list")
//!     pub fn list(&self, #[Route("id")] id: u32) {}
//! }
//! ```
//!
//! # Architecture
//!
//! Source is never compiled or executed; tree-sitter parses it.
//!
//! - `locate`: Classifies resource strings (directory, file, type, function)
//! - `discover`: Turns source files into declared type names
//! - `reflect`: Runtime symbol table and reflective handles
//! - `reader`: Tag readers (attributes, doc comments, composites)
//! - `tree`: Builds per-element records
//! - `loader`: Listener registry, dispatch and result cache
//! - `config`: YAML configuration
//!
//! # Example
//!
//! ```no_run
//! use tagscan::{Aggregate, AnnotationLoader, Listener, TagClass};
//!
//! struct Routes;
//!
//! impl Listener for Routes {
//!     type Output = usize;
//!
//!     fn annotations(&self) -> Vec<TagClass> {
//!         vec![TagClass::new("routing::Route")]
//!     }
//!
//!     fn on_annotation(&self, aggregate: &Aggregate) -> anyhow::Result<usize> {
//!         Ok(aggregate.len())
//!     }
//! }
//!
//! # fn main() -> tagscan::Result<()> {
//! let mut loader = AnnotationLoader::new(None)?;
//! loader.resource(["src/handlers"]).listener(Routes, Some("routes"));
//!
//! let results = loader.load(&["routes"])?;
//! let count = results[0].downcast_ref::<usize>();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discover;
pub mod error;
pub mod listener;
pub mod loader;
pub mod locate;
pub mod reader;
pub mod record;
pub mod reflect;
pub mod tree;

#[cfg(test)]
mod testing;

pub use config::{LoaderConfig, ReaderKind};
pub use discover::{ClassLoader, Discovery, FnClassLoader, LoadAndDiff, StaticScan};
pub use error::{Error, Result};
pub use listener::Listener;
pub use loader::{AnnotationLoader, Loaded};
pub use locate::{Locator, SourceFilter};
pub use reader::{
    DocReader, MergeReader, Reader, SelectiveReader, Tag, TagClass, TagQuery, TagValue,
};
pub use record::{
    Aggregate, ClassRecord, ConstantRecord, FunctionRecord, MethodRecord, ParameterRecord,
    PropertyRecord, Record, RecordKey,
};
pub use reflect::Runtime;
pub use tree::{AbstractPolicy, TreeBuilder};

#[cfg(feature = "native-attributes")]
pub use reader::AttributeReader;
