//! Metadata-only reader for JVM class files.
//!
//! Only what the symbol index needs is decoded: the class header, the field
//! and method tables, and the `Signature` / `InnerClasses` attributes. Code
//! attributes are skipped without inspection.

#![forbid(unsafe_code)]

mod classfile;
mod constant_pool;
mod descriptor;
mod error;
mod reader;

pub use crate::classfile::{access, ClassFile, ClassMember, InnerClassInfo};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{ClassFileError, Result};
