//! Classpath scanning and the class table.
//!
//! A [`ClasspathIndex`] owns the registered entries (class directories, jars
//! and jmods). Building it reads class-file metadata from every entry, in
//! classpath order with the standard library first, and publishes an
//! immutable [`ClassTable`] that answers FQCN, simple-name and supertype
//! queries. Per-entry stubs are cached on disk keyed by the entry's
//! fingerprint, so unchanged jars are not re-read on the next start.

mod entry;
mod error;
mod index;
mod jdk;
mod persist;
mod scan;
mod stub;
mod table;

pub use entry::ClasspathEntry;
pub use error::{ClasspathError, Result};
pub use index::{ClasspathIndex, IndexOptions, IndexReport};
pub use jdk::JdkInstallation;
pub use stub::{ClassStub, MemberStub};
pub use table::{ClassIndex, ClassOrigin, ClassTable};
