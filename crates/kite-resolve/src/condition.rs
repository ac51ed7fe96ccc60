use std::path::PathBuf;

use kite_core::SourceRange;
use kite_source::{ParsedSource, Site};

use crate::compat::arguments_compatible;
use crate::declaration::Reference;
use crate::hierarchy::TypeHierarchy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKind {
    Field,
    Method,
    Constructor,
    Type,
    /// A local variable or parameter, only visible inside one method body.
    Local { path: PathBuf, scope: SourceRange },
}

/// What a reference search looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCondition {
    /// The declaring class for members, the type itself for types.
    pub declaring_class: String,
    pub name: String,
    pub kind: ConditionKind,
    /// Parameter types for methods and constructors; `None` matches any
    /// argument list.
    pub params: Option<Vec<String>>,
    pub is_varargs: bool,
}

impl SearchCondition {
    pub fn new(kind: ConditionKind, declaring_class: &str, name: &str) -> Self {
        Self {
            declaring_class: declaring_class.to_string(),
            name: name.to_string(),
            kind,
            params: None,
            is_varargs: false,
        }
    }

    pub fn with_params(mut self, params: Vec<String>, is_varargs: bool) -> Self {
        self.params = Some(params);
        self.is_varargs = is_varargs;
        self
    }

    /// Sites in `source` that refer to what this condition describes.
    /// Declarations themselves are not references.
    pub fn references_in(&self, source: &ParsedSource, hierarchy: &TypeHierarchy<'_>) -> Vec<Reference> {
        if let ConditionKind::Local { path, .. } = &self.kind {
            if source.path() != path {
                return Vec::new();
            }
        }
        source
            .sites()
            .into_iter()
            .filter_map(|site| self.accepts(source, &site, hierarchy).then(|| site_range(&site)))
            .map(|range| Reference::new(source.path(), range))
            .collect()
    }

    fn accepts(&self, source: &ParsedSource, site: &Site<'_>, hierarchy: &TypeHierarchy<'_>) -> bool {
        match (&self.kind, site) {
            (ConditionKind::Field, Site::FieldAccess { owner, access }) => {
                access.name == self.name && {
                    let class = hierarchy.site_class(source, access.declaring_class.as_deref().unwrap_or(&owner.name));
                    self.member_class_matches(&class, false, hierarchy)
                }
            }
            (ConditionKind::Method, Site::MethodCall { owner, call }) if !call.is_constructor => {
                call.name == self.name && {
                    let class = hierarchy.site_class(source, call.declaring_class.as_deref().unwrap_or(&owner.name));
                    self.member_class_matches(&class, true, hierarchy)
                        && self.arguments_match(&call.arg_types, hierarchy)
                }
            }
            (ConditionKind::Constructor, Site::MethodCall { call, .. }) if call.is_constructor => {
                call.name == kite_core::simple_name(&self.declaring_class)
                    && call
                        .declaring_class
                        .as_deref()
                        .is_some_and(|class| hierarchy.site_class(source, class) == self.declaring_class)
                    && self.arguments_match(&call.arg_types, hierarchy)
            }
            (ConditionKind::Type, Site::TypeReference { reference, .. }) => {
                kite_core::simple_name(&reference.name) == kite_core::simple_name(&self.declaring_class)
                    && hierarchy.resolve_type_name(source, &reference.name).as_deref()
                        == Some(self.declaring_class.as_str())
            }
            (ConditionKind::Local { scope, .. }, Site::Variable { method: Some(method), variable, .. }) => {
                !variable.is_def && variable.name == self.name && method.range == *scope
            }
            _ => false,
        }
    }

    /// A site resolved against the declaring class, or against a subtype
    /// that inherits the member. Method calls resolved against a supertype
    /// may dispatch to the declaration and match too.
    fn member_class_matches(&self, site_class: &str, is_method: bool, hierarchy: &TypeHierarchy<'_>) -> bool {
        let target = self.declaring_class.as_str();
        site_class == target
            || hierarchy.is_subtype(site_class, target)
            || (is_method && site_class != kite_core::ROOT_TYPE && hierarchy.is_subtype(target, site_class))
    }

    fn arguments_match(&self, args: &[String], hierarchy: &TypeHierarchy<'_>) -> bool {
        match &self.params {
            Some(params) => arguments_compatible(params, self.is_varargs, args, hierarchy),
            None => true,
        }
    }
}

fn site_range(site: &Site<'_>) -> SourceRange {
    match site {
        Site::FieldAccess { access, .. } => access.range,
        Site::MethodCall { call, .. } => call.range,
        Site::Variable { variable, .. } => variable.range,
        Site::TypeReference { reference, .. } => reference.range,
    }
}
