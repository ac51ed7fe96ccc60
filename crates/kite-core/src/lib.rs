//! Core shared types for Kite.
//!
//! This crate is intentionally small: positions and ranges, the class-model
//! vocabulary shared by the index, member and source layers, and helpers for
//! working with fully-qualified class names.

mod fs;
mod name;
mod text;

pub use fs::{canonicalize_if_possible, collect_files_with_extension, collect_source_files};
pub use name::{
    binary_to_source_name, erase_generics, inner_class_candidates, internal_to_binary,
    is_reserved_word, package_name, simple_name, ClassKind, Visibility,
};
pub use text::{Position, SourceRange};

/// Kite version string, used to gate persisted artifacts.
pub const KITE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The universal root of every supertype chain.
pub const ROOT_TYPE: &str = "java.lang.Object";

/// Separator between an enclosing class and its nested class in binary names.
pub const INNER_CLASS_MARKER: char = '$';

/// File extension of analyzed source files.
pub const SOURCE_FILE_EXTENSION: &str = "java";
