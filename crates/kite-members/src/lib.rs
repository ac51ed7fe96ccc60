//! Flattened member sets.
//!
//! [`MemberCache::get_members`] combines a class's own fields, methods and
//! constructors with everything it inherits along its supertype chain and
//! interfaces, nearest declaration first, and caches the result in memory
//! with a persisted second tier.

mod cache;
mod descriptor;
mod flatten;

pub use cache::{resolve_class_name, MemberCache, MemberSet};
pub use descriptor::{short_type_name, MemberDescriptor, MemberKind, SignatureKey};
pub use flatten::flatten;
