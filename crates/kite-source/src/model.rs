use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kite_cache::Fingerprint;
use kite_core::{ClassKind, SourceRange};
use serde::{Deserialize, Serialize};

/// The scope tree of one source file, as produced by the front end.
///
/// Type names inside the tree are binary FQCNs (`app.Outer$Inner`) when the
/// front end could resolve them, and the spelled name otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSource {
    pub path: PathBuf,
    /// Checksum of the content the tree was parsed from.
    pub checksum: Option<Fingerprint>,
    /// Empty for the default package.
    pub package: String,
    /// Single-type imports: simple name -> FQCN.
    pub imports: BTreeMap<String, String>,
    /// On-demand imports (`import java.util.*;`), by package.
    pub wildcard_imports: Vec<String>,
    /// Top-level type declarations.
    pub types: Vec<TypeScope>,
    /// Stands in for a file that does not exist.
    pub placeholder: bool,
}

impl ParsedSource {
    pub fn new(path: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            checksum: None,
            package: package.into(),
            imports: BTreeMap::new(),
            wildcard_imports: Vec::new(),
            types: Vec::new(),
            placeholder: false,
        }
    }

    pub fn placeholder(path: impl Into<PathBuf>) -> Self {
        Self {
            placeholder: true,
            ..Self::new(path, "")
        }
    }

    pub fn with_import(mut self, fqcn: &str) -> Self {
        let simple = kite_core::simple_name(fqcn).to_string();
        self.imports.insert(simple, fqcn.to_string());
        self
    }

    pub fn with_wildcard_import(mut self, package: &str) -> Self {
        self.wildcard_imports.push(package.to_string());
        self
    }

    pub fn with_type(mut self, scope: TypeScope) -> Self {
        self.types.push(scope);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every type scope in the file, outer types before their nested ones.
    pub fn all_types(&self) -> Vec<&TypeScope> {
        let mut out = Vec::new();
        let mut stack: Vec<&TypeScope> = self.types.iter().rev().collect();
        while let Some(scope) = stack.pop() {
            out.push(scope);
            stack.extend(scope.types.iter().rev());
        }
        out
    }

    pub fn declares_type(&self, fqcn: &str) -> bool {
        self.all_types().iter().any(|scope| scope.name == fqcn)
    }
}

/// A class, interface, enum or annotation declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeScope {
    /// Binary FQCN.
    pub name: String,
    pub kind: ClassKind,
    pub range: SourceRange,
    /// Range of the declared simple name.
    pub name_range: SourceRange,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    /// Field declarations.
    pub fields: Vec<Variable>,
    /// Method bodies, initializers and other blocks.
    pub blocks: Vec<BlockScope>,
    /// Nested and local types.
    pub types: Vec<TypeScope>,
}

impl TypeScope {
    pub fn new(name: impl Into<String>, kind: ClassKind, range: SourceRange, name_range: SourceRange) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            name_range,
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            blocks: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn extends(mut self, super_class: &str) -> Self {
        self.super_class = Some(super_class.to_string());
        self
    }

    pub fn implements(mut self, iface: &str) -> Self {
        self.interfaces.push(iface.to_string());
        self
    }

    pub fn with_field(mut self, field: Variable) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_block(mut self, block: BlockScope) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_type(mut self, scope: TypeScope) -> Self {
        self.types.push(scope);
        self
    }

    pub fn simple_name(&self) -> &str {
        kite_core::simple_name(&self.name)
    }

    /// Method declarations directly in this type.
    pub fn methods(&self) -> impl Iterator<Item = (&BlockScope, &MethodDecl)> + '_ {
        self.blocks
            .iter()
            .filter_map(|block| block.method.as_ref().map(|decl| (block, decl)))
    }
}

/// A block: a method body, an initializer or a nested statement block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockScope {
    pub range: SourceRange,
    /// Set when the block is a method or constructor body.
    pub method: Option<MethodDecl>,
    /// Declarations (including parameters) and usages of local variables.
    pub variables: Vec<Variable>,
    pub field_accesses: Vec<FieldAccess>,
    pub method_calls: Vec<MethodCall>,
    pub type_references: Vec<TypeReference>,
    pub blocks: Vec<BlockScope>,
}

impl BlockScope {
    pub fn new(range: SourceRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn method(decl: MethodDecl, range: SourceRange) -> Self {
        Self {
            range,
            method: Some(decl),
            ..Self::default()
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_field_access(mut self, access: FieldAccess) -> Self {
        self.field_accesses.push(access);
        self
    }

    pub fn with_call(mut self, call: MethodCall) -> Self {
        self.method_calls.push(call);
        self
    }

    pub fn with_type_reference(mut self, reference: TypeReference) -> Self {
        self.type_references.push(reference);
        self
    }

    pub fn with_block(mut self, block: BlockScope) -> Self {
        self.blocks.push(block);
        self
    }
}

/// A local variable, parameter or field occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Declared type; for usages the type of the referenced declaration.
    pub ty: String,
    /// Range of the name token.
    pub range: SourceRange,
    /// `true` for the declaration, `false` for a usage.
    pub is_def: bool,
    pub is_parameter: bool,
}

impl Variable {
    pub fn def(name: &str, ty: &str, range: SourceRange) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
            range,
            is_def: true,
            is_parameter: false,
        }
    }

    pub fn param(name: &str, ty: &str, range: SourceRange) -> Self {
        Self {
            is_parameter: true,
            ..Self::def(name, ty, range)
        }
    }

    pub fn usage(name: &str, ty: &str, range: SourceRange) -> Self {
        Self {
            is_def: false,
            ..Self::def(name, ty, range)
        }
    }
}

/// `expr.name` where `name` is a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAccess {
    pub name: String,
    /// The class the front end resolved the access against, when known.
    pub declaring_class: Option<String>,
    pub range: SourceRange,
}

impl FieldAccess {
    pub fn new(name: &str, declaring_class: Option<&str>, range: SourceRange) -> Self {
        Self {
            name: name.to_string(),
            declaring_class: declaring_class.map(str::to_string),
            range,
        }
    }
}

/// A method or constructor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Method name; the simple class name for constructor calls.
    pub name: String,
    pub declaring_class: Option<String>,
    /// Static argument types; empty strings where unknown.
    pub arg_types: Vec<String>,
    /// Range of each argument expression.
    pub arg_ranges: Vec<SourceRange>,
    /// Range of the name token.
    pub range: SourceRange,
    pub is_constructor: bool,
}

impl MethodCall {
    pub fn new(name: &str, declaring_class: Option<&str>, range: SourceRange) -> Self {
        Self {
            name: name.to_string(),
            declaring_class: declaring_class.map(str::to_string),
            arg_types: Vec::new(),
            arg_ranges: Vec::new(),
            range,
            is_constructor: false,
        }
    }

    pub fn constructor(declaring_class: &str, range: SourceRange) -> Self {
        Self {
            is_constructor: true,
            ..Self::new(kite_core::simple_name(declaring_class), Some(declaring_class), range)
        }
    }

    pub fn with_arg(mut self, ty: &str, range: SourceRange) -> Self {
        self.arg_types.push(ty.to_string());
        self.arg_ranges.push(range);
        self
    }

    /// Index of the argument whose range contains `pos`.
    pub fn argument_index_at(&self, pos: kite_core::Position) -> Option<usize> {
        self.arg_ranges.iter().position(|range| range.contains(pos))
    }
}

/// A method or constructor declaration heading a [`BlockScope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub name_range: SourceRange,
    pub param_types: Vec<String>,
    /// `None` for constructors.
    pub return_type: Option<String>,
    pub is_varargs: bool,
    pub is_static: bool,
}

impl MethodDecl {
    pub fn new(name: &str, return_type: &str, name_range: SourceRange) -> Self {
        Self {
            name: name.to_string(),
            name_range,
            param_types: Vec::new(),
            return_type: Some(return_type.to_string()),
            is_varargs: false,
            is_static: false,
        }
    }

    pub fn constructor(class_simple_name: &str, name_range: SourceRange) -> Self {
        Self {
            return_type: None,
            ..Self::new(class_simple_name, "", name_range)
        }
    }

    pub fn with_param(mut self, ty: &str) -> Self {
        self.param_types.push(ty.to_string());
        self
    }

    pub fn with_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }
}

/// A use of a type name (`Greeter g`, `new Greeter()`, `Greeter.class`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeReference {
    /// Resolved FQCN, or the spelled name.
    pub name: String,
    pub range: SourceRange,
}

impl TypeReference {
    pub fn new(name: &str, range: SourceRange) -> Self {
        Self {
            name: name.to_string(),
            range,
        }
    }
}
