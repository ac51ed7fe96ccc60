use std::path::Path;

/// Callbacks into the build side of the backend.
///
/// `full_compile` runs on the background trigger thread and must block until
/// the compiled output is on disk; the class index is rebuilt right after.
pub trait CompileHook: Send + Sync {
    fn full_compile(&self) {}

    /// A source file was created, changed on disk or deleted.
    fn source_changed(&self, _path: &Path) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCompileHook;

impl CompileHook for NoopCompileHook {}
