use kite_core::Position;

use crate::model::{
    BlockScope, FieldAccess, MethodCall, MethodDecl, ParsedSource, TypeReference, TypeScope,
    Variable,
};

/// Package whose types are visible without an import.
const IMPLICIT_PACKAGE: &str = "java.lang";

/// One access, call, variable or type occurrence in a file.
#[derive(Debug, Clone, Copy)]
pub enum Site<'a> {
    FieldAccess {
        owner: &'a TypeScope,
        access: &'a FieldAccess,
    },
    MethodCall {
        owner: &'a TypeScope,
        call: &'a MethodCall,
    },
    Variable {
        owner: &'a TypeScope,
        /// The method body the variable lives in; `None` for fields.
        method: Option<&'a BlockScope>,
        variable: &'a Variable,
    },
    TypeReference {
        owner: &'a TypeScope,
        reference: &'a TypeReference,
    },
}

impl<'a> Site<'a> {
    pub fn position(&self) -> Position {
        match self {
            Site::FieldAccess { access, .. } => access.range.begin,
            Site::MethodCall { call, .. } => call.range.begin,
            Site::Variable { variable, .. } => variable.range.begin,
            Site::TypeReference { reference, .. } => reference.range.begin,
        }
    }
}

impl ParsedSource {
    /// The innermost type declaration whose range contains `pos`.
    pub fn innermost_type_at(&self, pos: Position) -> Option<&TypeScope> {
        let mut current = self.types.iter().find(|t| t.range.contains(pos))?;
        while let Some(inner) = current.types.iter().find(|t| t.range.contains(pos)) {
            current = inner;
        }
        Some(current)
    }

    /// Blocks of the innermost type containing `pos`, outermost first.
    pub fn enclosing_blocks(&self, pos: Position) -> Vec<&BlockScope> {
        let Some(scope) = self.innermost_type_at(pos) else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut blocks = &scope.blocks;
        while let Some(block) = blocks.iter().find(|b| b.range.contains(pos)) {
            chain.push(block);
            blocks = &block.blocks;
        }
        chain
    }

    /// The method body containing `pos`, with its declaring type.
    pub fn enclosing_method(&self, pos: Position) -> Option<(&TypeScope, &BlockScope)> {
        let scope = self.innermost_type_at(pos)?;
        let block = self
            .enclosing_blocks(pos)
            .into_iter()
            .rev()
            .find(|b| b.method.is_some())?;
        Some((scope, block))
    }

    pub fn field_access_at(&self, pos: Position, name: &str) -> Option<(&TypeScope, &FieldAccess)> {
        let scope = self.innermost_type_at(pos)?;
        self.enclosing_blocks(pos)
            .into_iter()
            .rev()
            .flat_map(|b| b.field_accesses.iter())
            .find(|a| a.name == name && a.range.contains(pos))
            .map(|a| (scope, a))
    }

    pub fn method_call_at(&self, pos: Position, name: &str) -> Option<(&TypeScope, &MethodCall)> {
        let scope = self.innermost_type_at(pos)?;
        self.enclosing_blocks(pos)
            .into_iter()
            .rev()
            .flat_map(|b| b.method_calls.iter())
            .find(|c| c.name == name && c.range.contains(pos))
            .map(|c| (scope, c))
    }

    /// The call whose argument list contains `pos`, innermost first. Used to
    /// report which argument the cursor is in.
    pub fn call_enclosing_argument(&self, pos: Position) -> Option<(&MethodCall, usize)> {
        self.enclosing_blocks(pos)
            .into_iter()
            .rev()
            .flat_map(|b| b.method_calls.iter())
            .find_map(|c| c.argument_index_at(pos).map(|i| (c, i)))
    }

    /// A local variable or parameter occurrence named `name` at `pos`.
    pub fn variable_at(&self, pos: Position, name: &str) -> Option<(&TypeScope, &BlockScope, &Variable)> {
        let (scope, method) = self.enclosing_method(pos)?;
        self.enclosing_blocks(pos)
            .into_iter()
            .rev()
            .flat_map(|b| b.variables.iter())
            .find(|v| v.name == name && v.range.contains(pos))
            .map(|v| (scope, method, v))
    }

    pub fn type_reference_at(&self, pos: Position, name: &str) -> Option<&TypeReference> {
        self.enclosing_blocks(pos)
            .into_iter()
            .rev()
            .flat_map(|b| b.type_references.iter())
            .find(|r| r.range.contains(pos) && kite_core::simple_name(&r.name) == name)
    }

    /// The type whose declared name is at `pos`.
    pub fn type_declaration_at(&self, pos: Position, name: &str) -> Option<&TypeScope> {
        self.all_types()
            .into_iter()
            .find(|t| t.simple_name() == name && t.name_range.contains(pos))
    }

    /// The method or constructor whose declared name is at `pos`.
    pub fn method_declaration_at(
        &self,
        pos: Position,
        name: &str,
    ) -> Option<(&TypeScope, &BlockScope, &MethodDecl)> {
        let scope = self.innermost_type_at(pos)?;
        scope
            .methods()
            .find(|(_, decl)| decl.name == name && decl.name_range.contains(pos))
            .map(|(block, decl)| (scope, block, decl))
    }

    pub fn field_declaration_at(&self, pos: Position, name: &str) -> Option<(&TypeScope, &Variable)> {
        let scope = self.innermost_type_at(pos)?;
        scope
            .fields
            .iter()
            .find(|f| f.name == name && f.is_def && f.range.contains(pos))
            .map(|f| (scope, f))
    }

    /// The declaration `name` refers to at `pos`: the nearest local
    /// definition in the enclosing blocks, then a field of an enclosing type.
    pub fn visible_variable(&self, pos: Position, name: &str) -> Option<&Variable> {
        let local = self
            .enclosing_blocks(pos)
            .into_iter()
            .rev()
            .flat_map(|b| b.variables.iter().rev())
            .find(|v| v.is_def && v.name == name && v.range.begin <= pos);
        if local.is_some() {
            return local;
        }

        let mut types: Vec<&TypeScope> = Vec::new();
        let mut level = &self.types;
        while let Some(scope) = level.iter().find(|t| t.range.contains(pos)) {
            types.push(scope);
            level = &scope.types;
        }
        types
            .into_iter()
            .rev()
            .flat_map(|t| t.fields.iter())
            .find(|f| f.is_def && f.name == name)
    }

    /// FQCN candidates for a type name written in this file, most specific
    /// first: qualified names as written, single-type imports, types declared
    /// here, the file's package, on-demand imports, then `java.lang`.
    ///
    /// A dotted name is tried as written and then as a nested type of its
    /// first segment read as a simple name (`Map.Entry` -> `java.util.Map$Entry`).
    pub fn type_name_candidates(&self, name: &str) -> Vec<String> {
        let name = kite_core::erase_generics(name);
        let name = name.trim_end_matches("[]");
        let mut out: Vec<String> = Vec::new();

        let Some((head, rest)) = name.split_once('.') else {
            self.simple_type_candidates(name, &mut out);
            return out;
        };
        let nested = rest.replace('.', "$");
        if let Some(imported) = self.imports.get(head) {
            push_unique(&mut out, format!("{imported}${nested}"));
        }
        push_unique(&mut out, name.to_string());
        for candidate in kite_core::inner_class_candidates(name) {
            push_unique(&mut out, candidate);
        }
        let mut outers = Vec::new();
        self.simple_type_candidates(head, &mut outers);
        for outer in outers {
            push_unique(&mut out, format!("{outer}${nested}"));
        }
        out
    }

    fn simple_type_candidates(&self, name: &str, out: &mut Vec<String>) {
        if let Some(fqcn) = self.imports.get(name) {
            push_unique(out, fqcn.clone());
        }
        for scope in self.all_types() {
            if scope.simple_name() == name {
                push_unique(out, scope.name.clone());
            }
        }
        if self.package.is_empty() {
            push_unique(out, name.to_string());
        } else {
            push_unique(out, format!("{}.{name}", self.package));
        }
        for package in &self.wildcard_imports {
            push_unique(out, format!("{package}.{name}"));
        }
        push_unique(out, format!("{IMPLICIT_PACKAGE}.{name}"));
    }

    /// Every site in the file, in tree order.
    pub fn sites(&self) -> Vec<Site<'_>> {
        let mut out = Vec::new();
        for scope in self.all_types() {
            for field in &scope.fields {
                out.push(Site::Variable {
                    owner: scope,
                    method: None,
                    variable: field,
                });
            }
            for block in &scope.blocks {
                let method = block.method.as_ref().map(|_| block);
                collect_block_sites(scope, method, block, &mut out);
            }
        }
        out
    }
}

fn collect_block_sites<'a>(
    owner: &'a TypeScope,
    method: Option<&'a BlockScope>,
    block: &'a BlockScope,
    out: &mut Vec<Site<'a>>,
) {
    out.extend(block.variables.iter().map(|variable| Site::Variable {
        owner,
        method,
        variable,
    }));
    out.extend(
        block
            .field_accesses
            .iter()
            .map(|access| Site::FieldAccess { owner, access }),
    );
    out.extend(
        block
            .method_calls
            .iter()
            .map(|call| Site::MethodCall { owner, call }),
    );
    out.extend(
        block
            .type_references
            .iter()
            .map(|reference| Site::TypeReference { owner, reference }),
    );
    for inner in &block.blocks {
        let method = method.or_else(|| inner.method.as_ref().map(|_| inner));
        collect_block_sites(owner, method, inner, out);
    }
}

fn push_unique(out: &mut Vec<String>, candidate: String) {
    if !out.contains(&candidate) {
        out.push(candidate);
    }
}
