//! Utilities shared by Kite tests.
//!
//! Fixtures are built in-process: class files are assembled byte by byte and
//! archives are written with `zip`, so no JDK is needed to run the suites.

mod class_file;
pub mod env;
mod jar;

#[cfg(feature = "sources")]
mod sources;

pub use class_file::ClassFileBuilder;
pub use env::{env_lock, EnvVarGuard};
pub use jar::{write_class_dir, write_jar, write_jmod};

#[cfg(feature = "sources")]
pub use sources::*;
