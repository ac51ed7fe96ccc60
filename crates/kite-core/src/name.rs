use serde::{Deserialize, Serialize};

use crate::INNER_CLASS_MARKER;

/// The kind of a class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    /// Derive the kind from class-file access flags.
    pub fn from_access_flags(flags: u16) -> Self {
        const ACC_INTERFACE: u16 = 0x0200;
        const ACC_ANNOTATION: u16 = 0x2000;
        const ACC_ENUM: u16 = 0x4000;

        if flags & ACC_ANNOTATION != 0 {
            ClassKind::Annotation
        } else if flags & ACC_INTERFACE != 0 {
            ClassKind::Interface
        } else if flags & ACC_ENUM != 0 {
            ClassKind::Enum
        } else {
            ClassKind::Class
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Annotation => "@interface",
        }
    }
}

/// Member and class visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    pub fn from_access_flags(flags: u16) -> Self {
        const ACC_PUBLIC: u16 = 0x0001;
        const ACC_PRIVATE: u16 = 0x0002;
        const ACC_PROTECTED: u16 = 0x0004;

        if flags & ACC_PUBLIC != 0 {
            Visibility::Public
        } else if flags & ACC_PRIVATE != 0 {
            Visibility::Private
        } else if flags & ACC_PROTECTED != 0 {
            Visibility::Protected
        } else {
            Visibility::Package
        }
    }

    /// The modifier keyword, empty for package-private.
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "",
            Visibility::Private => "private",
        }
    }
}

/// `java/util/Map$Entry` -> `java.util.Map$Entry`.
pub fn internal_to_binary(internal: &str) -> String {
    internal.replace('/', ".")
}

/// `java.util.Map$Entry` -> `java.util.Map.Entry`.
pub fn binary_to_source_name(binary: &str) -> String {
    binary.replace(INNER_CLASS_MARKER, ".")
}

/// The unqualified name of a class, with enclosing classes stripped.
///
/// `java.util.Map$Entry` -> `Entry`, `String` -> `String`.
pub fn simple_name(fqcn: &str) -> &str {
    let fqcn = fqcn.rsplit('.').next().unwrap_or(fqcn);
    fqcn.rsplit(INNER_CLASS_MARKER).next().unwrap_or(fqcn)
}

/// The package part of a binary class name, empty for the default package.
pub fn package_name(fqcn: &str) -> &str {
    match fqcn.rsplit_once('.') {
        Some((pkg, _)) => pkg,
        None => "",
    }
}

/// Candidate binary names for a dotted name that may refer to a nested class.
///
/// Dots are replaced by the inner-class marker one at a time from the right,
/// so `a.Outer.Inner` yields `a.Outer$Inner` then `a$Outer$Inner`.
pub fn inner_class_candidates(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = name.to_string();
    while let Some(idx) = current.rfind('.') {
        current.replace_range(idx..idx + 1, "$");
        out.push(current.clone());
    }
    out
}

/// Strip generic type arguments: `java.util.Map<K, java.util.List<V>>[]` -> `java.util.Map[]`.
pub fn erase_generics(name: &str) -> String {
    if !name.contains('<') {
        return name.trim().to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for ch in name.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}

const RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "false",
    "final", "finally", "float", "for", "goto", "if", "implements", "import", "instanceof",
    "int", "interface", "long", "native", "new", "null", "package", "private", "protected",
    "public", "return", "short", "static", "strictfp", "super", "switch", "synchronized",
    "this", "throw", "throws", "transient", "true", "try", "void", "volatile", "while",
];

pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.binary_search(&word).is_ok()
}
