//! Helpers shared by unit tests.

use std::fs;

use tempfile::TempDir;

use crate::reflect::Runtime;

/// A runtime with `source` included as `lib.rs` of a temporary directory.
pub(crate) fn runtime_with(source: &str) -> (TempDir, Runtime) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lib.rs");
    fs::write(&path, source).unwrap();

    let runtime = Runtime::new();
    runtime.include(&path).unwrap();
    (dir, runtime)
}
