//! Static reflection over Rust source.
//!
//! Source files are parsed with tree-sitter and their declarations are
//! registered in a [`Runtime`], which hands out shared reflective handles.

mod handles;
mod parsed;
mod runtime;
mod rust_lang;

pub use handles::{
    ClassHandle, ClassKind, ConstantHandle, ConstantKind, Metadata, MethodHandle,
    ParameterHandle, PropertyHandle, RawAttribute, Reflector, Scope, Span,
};
pub use parsed::ParsedFile;
pub use runtime::Runtime;
pub use rust_lang::RustReflector;
