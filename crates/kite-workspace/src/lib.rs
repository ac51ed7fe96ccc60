//! The project-level entry point.
//!
//! A [`Workspace`] wires one project's class index, member cache, source
//! cache and resolver together, owns their persisted state under the
//! project's cache directory and turns file watcher notifications into cache
//! invalidations. Long-running work (index rebuilds, full compiles) runs on a
//! single [`BackgroundTrigger`] that ignores triggers while busy.

mod error;
mod events;
mod hook;
mod trigger;
mod workspace;

pub use error::{Result, WorkspaceError};
pub use events::{ChangeCategory, FileChange, FileChangeKind};
pub use hook::{CompileHook, NoopCompileHook};
pub use trigger::BackgroundTrigger;
pub use workspace::{CacheStatus, Workspace};
