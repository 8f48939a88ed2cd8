//! Runtime symbol table for reflected declarations.
//!
//! The Runtime provides:
//! - Permanent registration of parsed files ("including" a file)
//! - Lazy autoload of files registered by a static scan
//! - Lookup of types and free functions by qualified name
//! - Memoized class handles with impl blocks merged in

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use super::handles::{ClassHandle, ClassKind, MethodHandle};
use super::rust_lang::{FileDecls, ImplDecl, RustReflector, TypeDecl};
use crate::error::{Error, Result};

#[derive(Default)]
struct State {
    /// Included files -> types they declared, in include order.
    files: IndexMap<PathBuf, Vec<String>>,
    types: IndexMap<String, TypeDecl>,
    impls: Vec<ImplDecl>,
    functions: IndexMap<String, Arc<MethodHandle>>,
    /// Type name -> file that declares it, for files not yet included.
    autoload: IndexMap<String, PathBuf>,
    /// Assembled handles; cleared whenever a file is included.
    classes: HashMap<String, Arc<ClassHandle>>,
}

impl State {
    fn register(&mut self, path: PathBuf, decls: FileDecls) {
        let mut declared = Vec::new();

        for decl in decls.types {
            if let Some(existing) = self.types.get(&decl.name) {
                tracing::warn!(
                    name = %decl.name,
                    file = %path.display(),
                    first = %existing.file.display(),
                    "duplicate type declaration ignored"
                );
                continue;
            }
            declared.push(decl.name.clone());
            self.types.insert(decl.name.clone(), decl);
        }

        for function in decls.functions {
            let name = function.qualified_name();
            if self.functions.contains_key(&name) {
                tracing::warn!(name = %name, file = %path.display(), "duplicate function declaration ignored");
                continue;
            }
            self.functions.insert(name, function);
        }

        self.impls.extend(decls.impls);
        self.autoload.retain(|_, file| *file != path);
        self.files.insert(path, declared);
        self.classes.clear();
    }

    fn assemble(&self, name: &str) -> Option<ClassHandle> {
        let decl = self.types.get(name)?;
        let impls: Vec<&ImplDecl> = self.impls.iter().filter(|i| i.target == name).collect();

        let mut methods = decl.methods.clone();
        let mut constants = decl.constants.clone();
        for block in &impls {
            methods.extend(block.methods.iter().cloned());
            constants.extend(block.constants.iter().cloned());
        }

        // Provided trait methods the impl does not override.
        for block in &impls {
            let Some(trait_decl) = block.trait_name.as_ref().and_then(|t| self.types.get(t)) else {
                continue;
            };
            if trait_decl.kind != ClassKind::Trait {
                continue;
            }
            for provided in trait_decl.methods.iter().filter(|m| !m.is_abstract) {
                if !block.methods.iter().any(|m| m.name == provided.name) {
                    methods.push(Arc::clone(provided));
                }
            }
        }

        Some(ClassHandle {
            name: decl.name.clone(),
            kind: decl.kind,
            file: decl.file.clone(),
            span: decl.span.clone(),
            metadata: decl.metadata.clone(),
            methods,
            properties: decl.properties.clone(),
            constants,
        })
    }
}

/// Symbol table of every declaration the process has seen.
///
/// Including a file is irreversible: its declarations stay registered for the
/// lifetime of the runtime, and a file is included at most once.
pub struct Runtime {
    reflector: RustReflector,
    state: RwLock<State>,
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self {
            reflector: RustReflector::new(),
            state: RwLock::new(State::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse a file and register its declarations.
    ///
    /// Returns `false` when the file was already included.
    pub fn include<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let path = path.as_ref();
        let path = path.canonicalize().map_err(|e| Error::io(path, e))?;

        if self.read().files.contains_key(&path) {
            return Ok(false);
        }

        let source = fs::read(&path).map_err(|e| Error::io(&path, e))?;
        let parsed = self.reflector.parse(&path, &source)?;
        let decls = self.reflector.extract(&parsed);

        let mut state = self.write();
        if state.files.contains_key(&path) {
            return Ok(false);
        }
        tracing::debug!(
            file = %path.display(),
            types = decls.types.len(),
            functions = decls.functions.len(),
            "included file"
        );
        state.register(path, decls);
        Ok(true)
    }

    /// Whether a file has been included.
    pub fn is_included<P: AsRef<Path>>(&self, path: P) -> bool {
        self.read().files.contains_key(&canonical(path.as_ref()))
    }

    /// Every registered type name, in registration order.
    pub fn declared_types(&self) -> Vec<String> {
        self.read().types.keys().cloned().collect()
    }

    /// Types registered by the given file when it was first included.
    pub fn types_declared_in<P: AsRef<Path>>(&self, path: P) -> Vec<String> {
        self.read()
            .files
            .get(&canonical(path.as_ref()))
            .cloned()
            .unwrap_or_default()
    }

    /// Register `path` as the file declaring `name` without parsing it yet.
    pub fn autoload<P: AsRef<Path>>(&self, name: &str, path: P) {
        let path = canonical(path.as_ref());
        let mut state = self.write();
        if state.types.contains_key(name) || state.files.contains_key(&path) {
            return;
        }
        state.autoload.entry(name.to_string()).or_insert(path);
    }

    /// Include every file still pending autoload.
    ///
    /// Impl blocks may live in other files than their type, so pending files
    /// are included together before anything is reflected.
    fn flush_autoload(&self) {
        let pending: Vec<PathBuf> = {
            let state = self.read();
            let mut files: Vec<PathBuf> = Vec::new();
            for file in state.autoload.values() {
                if !files.contains(file) {
                    files.push(file.clone());
                }
            }
            files
        };

        for file in pending {
            if let Err(e) = self.include(&file) {
                tracing::warn!(file = %file.display(), error = %e, "autoload failed");
                self.write().autoload.retain(|_, f| *f != file);
            }
        }
    }

    /// Whether a type is known, autoloading it if needed.
    pub fn type_exists(&self, name: &str) -> bool {
        {
            let state = self.read();
            if state.types.contains_key(name) {
                return true;
            }
            if !state.autoload.contains_key(name) {
                return false;
            }
        }
        self.flush_autoload();
        self.read().types.contains_key(name)
    }

    /// Whether a free function is known.
    pub fn function_exists(&self, name: &str) -> bool {
        if self.read().functions.contains_key(name) {
            return true;
        }
        if self.read().autoload.is_empty() {
            return false;
        }
        self.flush_autoload();
        self.read().functions.contains_key(name)
    }

    /// Reflect a type with its impl blocks merged in.
    pub fn reflect_class(&self, name: &str) -> Option<Arc<ClassHandle>> {
        if let Some(handle) = self.read().classes.get(name) {
            return Some(Arc::clone(handle));
        }
        if !self.type_exists(name) {
            return None;
        }
        if !self.read().autoload.is_empty() {
            self.flush_autoload();
        }

        let mut state = self.write();
        if let Some(handle) = state.classes.get(name) {
            return Some(Arc::clone(handle));
        }
        let handle = Arc::new(state.assemble(name)?);
        state.classes.insert(name.to_string(), Arc::clone(&handle));
        Some(handle)
    }

    /// Reflect a free function.
    pub fn reflect_function(&self, name: &str) -> Option<Arc<MethodHandle>> {
        if !self.function_exists(name) {
            return None;
        }
        self.read().functions.get(name).cloned()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
