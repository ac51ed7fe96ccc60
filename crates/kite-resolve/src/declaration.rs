use std::path::PathBuf;

use kite_core::{ClassKind, Position, SourceRange};
use kite_members::MemberKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    ReservedWord,
    Field,
    Method,
    Constructor,
    Type(ClassKind),
    LocalVariable,
    Parameter,
}

impl From<MemberKind> for DeclarationKind {
    fn from(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Field => DeclarationKind::Field,
            MemberKind::Method => DeclarationKind::Method,
            MemberKind::Constructor => DeclarationKind::Constructor,
        }
    }
}

/// What the symbol under the cursor resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// The declaring class for members and types' package for types;
    /// `Class#method` for locals and parameters.
    pub scope: String,
    /// `public java.lang.String greet()`, `class app.Greeter`, `int count`.
    pub signature: String,
    pub kind: DeclarationKind,
    /// Index of the call argument containing the cursor, `-1` when the
    /// cursor is not inside an argument list.
    pub argument_index: i32,
    /// Where the declaration is written, when it comes from a source file.
    pub location: Option<Reference>,
}

/// A place in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    pub path: PathBuf,
    pub range: SourceRange,
}

impl Reference {
    pub fn new(path: impl Into<PathBuf>, range: SourceRange) -> Self {
        Self {
            path: path.into(),
            range,
        }
    }

    pub fn position(&self) -> Position {
        self.range.begin
    }

    pub fn line(&self) -> u32 {
        self.range.begin.line
    }

    pub fn column(&self) -> u32 {
        self.range.begin.column
    }
}
