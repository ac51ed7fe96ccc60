//! Parsed source files and their cache.
//!
//! The scope tree model ([`ParsedSource`] and friends) is what the external
//! front end ([`SourceParser`]) produces for one file. [`SourceCache`] keeps
//! one live tree per file, gated by the file's content checksum, with
//! persisted snapshots as a second tier.

mod cache;
mod error;
mod model;
mod parser;
mod query;

pub use cache::{SourceCache, SourceCacheOptions};
pub use error::{Result, SourceError};
pub use model::{
    BlockScope, FieldAccess, MethodCall, MethodDecl, ParsedSource, TypeReference, TypeScope,
    Variable,
};
pub use parser::SourceParser;
pub use query::Site;
