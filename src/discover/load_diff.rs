//! Discovery by including files into the runtime.

use std::path::PathBuf;

use super::ClassLoader;
use crate::error::Result;
use crate::reflect::Runtime;

/// Includes each file and reports the types it added to the runtime.
///
/// This registers every declaration permanently. A file included earlier
/// (by this strategy, an autoload or a direct [`Runtime::include`]) reports
/// the types that were new when it was first included, so repeated builds
/// see the same names. Unreadable files contribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadAndDiff;

impl LoadAndDiff {
    pub fn new() -> Self {
        Self
    }
}

impl ClassLoader for LoadAndDiff {
    fn discover(&self, files: &[PathBuf], runtime: &Runtime) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for file in files {
            let before = runtime.declared_types().len();
            match runtime.include(file) {
                Ok(true) => names.extend(runtime.declared_types().into_iter().skip(before)),
                Ok(false) => names.extend(runtime.types_declared_in(file)),
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "skipping file");
                }
            }
        }

        Ok(names)
    }
}
