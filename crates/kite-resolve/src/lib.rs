//! Declaration and reference search.
//!
//! A query runs an ordered list of strategies over the scope tree of the
//! file under the cursor (reserved word, field access, method or
//! constructor call, declaration sites, type name, local variable); the
//! first one that finds something decides the result. Reference search turns
//! that result into a [`SearchCondition`] and scans every known source file
//! in parallel.

mod compat;
mod condition;
mod declaration;
mod hierarchy;
mod lookup;
mod resolver;

pub use compat::{arguments_compatible, is_assignable};
pub use condition::{ConditionKind, SearchCondition};
pub use declaration::{Declaration, DeclarationKind, Reference};
pub use hierarchy::TypeHierarchy;
pub use lookup::{first_found, Lookup};
pub use resolver::Resolver;
