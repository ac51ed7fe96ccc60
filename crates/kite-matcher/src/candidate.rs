use kite_classpath::ClassIndex;
use kite_core::{package_name, ClassKind};
use kite_members::{MemberDescriptor, MemberKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Class(ClassKind),
    Member(MemberKind),
    Package,
}

/// One completion or search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUnit {
    /// The text matched against the query: a member name, or a class name
    /// without its package (`Map$Entry`).
    pub name: String,
    pub kind: CandidateKind,
    pub declaration: String,
    pub display: String,
    pub fqcn: Option<String>,
    pub declaring_class: Option<String>,
}

impl CandidateUnit {
    /// A package offered after a dotted qualifier; matched on its last
    /// segment (`util` for `java.util`).
    pub fn package(name: &str) -> Self {
        let segment = name.rsplit('.').next().unwrap_or(name);
        Self {
            name: segment.to_string(),
            kind: CandidateKind::Package,
            declaration: format!("package {name}"),
            display: name.to_string(),
            fqcn: None,
            declaring_class: None,
        }
    }
}

impl From<&MemberDescriptor> for CandidateUnit {
    fn from(member: &MemberDescriptor) -> Self {
        Self {
            name: member.name.clone(),
            kind: CandidateKind::Member(member.kind),
            declaration: member.declaration.clone(),
            display: member.display.clone(),
            fqcn: None,
            declaring_class: Some(member.declaring_class.clone()),
        }
    }
}

impl From<&ClassIndex> for CandidateUnit {
    fn from(class: &ClassIndex) -> Self {
        let package = package_name(&class.fqcn);
        let name = if package.is_empty() {
            class.fqcn.clone()
        } else {
            class.fqcn[package.len() + 1..].to_string()
        };
        Self {
            declaration: format!("{} {}", class.kind.as_str(), class.fqcn),
            display: format!("{} - {}", class.simple_name, class.package),
            name,
            kind: CandidateKind::Class(class.kind),
            fqcn: Some(class.fqcn.clone()),
            declaring_class: None,
        }
    }
}
