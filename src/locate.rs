//! Classification of resource strings.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::reflect::Runtime;

/// What a resource string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A directory scanned recursively for source files.
    Directory(PathBuf),
    /// A single source file.
    File(PathBuf),
    /// A type known to the runtime.
    Type(String),
    /// A free function known to the runtime.
    Function(String),
    /// Nothing matched; the resource is skipped.
    Unresolved(String),
}

/// Which files count as source files.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extensions: Vec<String>,
    excluded: GlobSet,
}

impl SourceFilter {
    /// Accept files with one of `extensions` (without the dot) that match
    /// none of the `excluded` globs.
    pub fn new(extensions: &[String], excluded: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in excluded {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::Config(format!("invalid exclusion glob {:?}: {}", pattern, e)))?;
            builder.add(glob);
        }
        let excluded = builder
            .build()
            .map_err(|e| Error::Config(format!("invalid exclusion globs: {}", e)))?;

        Ok(Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            excluded,
        })
    }

    fn has_extension(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.extensions.iter().any(|e| e == ext)
    }

    fn is_excluded(&self, path: &Path, root: Option<&Path>) -> bool {
        if self.excluded.is_match(path) {
            return true;
        }
        root.and_then(|root| path.strip_prefix(root).ok())
            .is_some_and(|relative| self.excluded.is_match(relative))
    }

    /// Whether a single file is accepted.
    pub fn accepts(&self, path: &Path) -> bool {
        self.has_extension(path) && !self.is_excluded(path, None)
    }

    /// Source files under `dir`, recursively, sorted by path.
    ///
    /// Symlinks are not followed. An empty directory yields nothing.
    pub fn source_files(&self, dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.has_extension(path) && !self.is_excluded(path, Some(dir)))
            .collect()
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self {
            extensions: vec!["rs".to_string()],
            excluded: GlobSet::empty(),
        }
    }
}

/// Filesystem checks only: a directory, or an accepted source file.
pub fn classify_path(resource: &str, filter: &SourceFilter) -> Option<Locator> {
    let path = Path::new(resource);
    if path.is_dir() {
        return Some(Locator::Directory(path.to_path_buf()));
    }
    if path.is_file() && filter.accepts(path) {
        return Some(Locator::File(path.to_path_buf()));
    }
    None
}

/// Symbol checks: a known type, then a known function.
///
/// Checking a type may autoload the file that declares it.
pub fn classify_symbol(resource: &str, runtime: &Runtime) -> Locator {
    let name = resource.trim().replace('\\', "::");
    let name = name.trim_start_matches("::");

    if runtime.type_exists(name) {
        return Locator::Type(name.to_string());
    }
    if runtime.function_exists(name) {
        return Locator::Function(name.to_string());
    }

    tracing::debug!(resource, "unresolved resource skipped");
    Locator::Unresolved(resource.to_string())
}

/// Classify one resource string.
pub fn resolve(resource: &str, filter: &SourceFilter, runtime: &Runtime) -> Locator {
    classify_path(resource, filter).unwrap_or_else(|| classify_symbol(resource, runtime))
}
