use serde::{Deserialize, Serialize};

/// A position in a source file, 1-based line and 1-based column.
///
/// This matches the coordinates editors send with every request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// An inclusive range in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub begin: Position,
    pub end: Position,
}

impl SourceRange {
    #[inline]
    pub const fn new(begin: Position, end: Position) -> Self {
        Self { begin, end }
    }

    /// A range covering `len` columns of a single line starting at `column`.
    pub fn on_line(line: u32, column: u32, len: u32) -> Self {
        Self {
            begin: Position::new(line, column),
            end: Position::new(line, column + len.saturating_sub(1)),
        }
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        self.begin <= pos && pos <= self.end
    }

    #[inline]
    pub fn contains_line(&self, line: u32) -> bool {
        self.begin.line <= line && line <= self.end.line
    }

    /// Whether `other` lies completely inside `self`.
    pub fn encloses(&self, other: &SourceRange) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }
}
