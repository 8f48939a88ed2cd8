//! Discovery of the types declared by candidate source files.
//!
//! Two strategies are provided:
//! - [`StaticScan`] (default): parses files without registering them and
//!   queues each declared type for lazy autoload.
//! - [`LoadAndDiff`]: includes every file into the runtime and reports the
//!   types that became known. Inclusion is permanent.
//!
//! Either can be replaced by any [`ClassLoader`], including a plain closure
//! wrapped in [`FnClassLoader`].

mod load_diff;
mod static_scan;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reflect::Runtime;

pub use load_diff::LoadAndDiff;
pub use static_scan::StaticScan;

/// Turns source files into the qualified names of the types they declare.
pub trait ClassLoader: Send + Sync {
    fn discover(&self, files: &[PathBuf], runtime: &Runtime) -> Result<Vec<String>>;
}

/// A caller-supplied discovery function.
///
/// The function is responsible for making the names it returns known to the
/// runtime (for example by calling [`Runtime::include`]).
pub struct FnClassLoader<F> {
    discover: F,
}

impl<F> FnClassLoader<F>
where
    F: Fn(&[PathBuf]) -> Vec<String> + Send + Sync,
{
    pub fn new(discover: F) -> Self {
        Self { discover }
    }
}

impl<F> ClassLoader for FnClassLoader<F>
where
    F: Fn(&[PathBuf]) -> Vec<String> + Send + Sync,
{
    fn discover(&self, files: &[PathBuf], _runtime: &Runtime) -> Result<Vec<String>> {
        Ok((self.discover)(files))
    }
}

/// Built-in strategy selector, as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discovery {
    #[default]
    Static,
    Load,
}

impl Discovery {
    pub fn class_loader(&self) -> Box<dyn ClassLoader> {
        match self {
            Discovery::Static => Box::new(StaticScan::new()),
            Discovery::Load => Box::new(LoadAndDiff::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_class_loader() {
        let loader = FnClassLoader::new(|files: &[PathBuf]| {
            files
                .iter()
                .filter_map(|f| f.file_stem().map(|s| s.to_string_lossy().to_string()))
                .collect()
        });
        let runtime = Runtime::new();
        let names = loader
            .discover(&[PathBuf::from("a/One.rs"), PathBuf::from("Two.rs")], &runtime)
            .unwrap();
        assert_eq!(names, vec!["One", "Two"]);
    }
}
