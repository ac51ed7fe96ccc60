use std::path::Path;

use crate::error::Result;
use crate::model::ParsedSource;

/// The language front end: turns one file's text into its scope tree.
///
/// Implementations must be deterministic for a given `(path, text)`; the
/// cache relies on that to serve persisted trees in place of a re-parse.
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path, text: &str) -> Result<ParsedSource>;
}

impl<F> SourceParser for F
where
    F: Fn(&Path, &str) -> Result<ParsedSource> + Send + Sync,
{
    fn parse(&self, path: &Path, text: &str) -> Result<ParsedSource> {
        self(path, text)
    }
}
