use kite_classfile::{access, parse_field_descriptor, parse_method_descriptor};
use kite_classpath::MemberStub;
use kite_core::{binary_to_source_name, simple_name, Visibility};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
        }
    }
}

/// A field, method or constructor as seen from one class after flattening.
///
/// Types are spelled with binary class names (`java.util.Map$Entry[]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub kind: MemberKind,
    pub name: String,
    pub declaring_class: String,
    /// Parameter types; `None` for fields, which have no parameter list.
    pub params: Option<Vec<String>>,
    /// Field type, return type, or the declaring class for constructors.
    pub return_type: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_varargs: bool,
    /// `public static java.lang.String valueOf(int)`
    pub declaration: String,
    /// `valueOf(int) : String`
    pub display: String,
}

/// The identity of a member within one flattened set.
pub type SignatureKey = (String, Option<Vec<String>>);

impl MemberDescriptor {
    /// Build a descriptor for `stub` declared in `declaring_class`.
    ///
    /// Static initializers, synthetic and bridge members and members with an
    /// undecodable descriptor produce `None`.
    pub fn from_field(stub: &MemberStub, declaring_class: &str) -> Option<Self> {
        if stub.has_flag(access::SYNTHETIC) {
            return None;
        }
        let ty = match parse_field_descriptor(&stub.descriptor) {
            Ok(ty) => ty.java_name(),
            Err(err) => {
                tracing::debug!(
                    target = "kite.members",
                    class = declaring_class,
                    field = %stub.name,
                    error = %err,
                    "skipping field with bad descriptor"
                );
                return None;
            }
        };

        let mut member = Self {
            kind: MemberKind::Field,
            name: stub.name.clone(),
            declaring_class: declaring_class.to_string(),
            params: None,
            return_type: ty,
            visibility: Visibility::from_access_flags(stub.access_flags),
            is_static: stub.has_flag(access::STATIC),
            is_varargs: false,
            declaration: String::new(),
            display: String::new(),
        };
        member.declaration = format_declaration(&member);
        member.display = format_display(&member);
        Some(member)
    }

    pub fn from_method(stub: &MemberStub, declaring_class: &str) -> Option<Self> {
        if stub.name == "<clinit>" || stub.has_flag(access::SYNTHETIC) || stub.has_flag(access::BRIDGE) {
            return None;
        }
        let desc = match parse_method_descriptor(&stub.descriptor) {
            Ok(desc) => desc,
            Err(err) => {
                tracing::debug!(
                    target = "kite.members",
                    class = declaring_class,
                    method = %stub.name,
                    error = %err,
                    "skipping method with bad descriptor"
                );
                return None;
            }
        };

        let is_ctor = stub.name == "<init>";
        let (kind, name, return_type) = if is_ctor {
            (
                MemberKind::Constructor,
                simple_name(declaring_class).to_string(),
                declaring_class.to_string(),
            )
        } else {
            (MemberKind::Method, stub.name.clone(), desc.return_type.java_name())
        };

        let params: Vec<String> = desc.params.iter().map(|p| p.java_name()).collect();
        let is_varargs = stub.has_flag(access::VARARGS) && params.last().is_some_and(|p| p.ends_with("[]"));

        let mut member = Self {
            kind,
            name,
            declaring_class: declaring_class.to_string(),
            params: Some(params),
            return_type,
            visibility: Visibility::from_access_flags(stub.access_flags),
            is_static: stub.has_flag(access::STATIC),
            is_varargs,
            declaration: String::new(),
            display: String::new(),
        };
        member.declaration = format_declaration(&member);
        member.display = format_display(&member);
        Some(member)
    }

    pub fn signature_key(&self) -> SignatureKey {
        (self.name.clone(), self.params.clone())
    }

    pub fn param_count(&self) -> usize {
        self.params.as_ref().map_or(0, Vec::len)
    }

    /// Whether a call with `count` arguments could target this member.
    pub fn accepts_arg_count(&self, count: usize) -> bool {
        let params = self.param_count();
        if self.is_varargs {
            count + 1 >= params
        } else {
            count == params
        }
    }

    pub fn is_field(&self) -> bool {
        self.kind == MemberKind::Field
    }
}

fn format_declaration(member: &MemberDescriptor) -> String {
    let mut parts: Vec<String> = Vec::new();
    let vis = member.visibility.keyword();
    if !vis.is_empty() {
        parts.push(vis.to_string());
    }
    if member.is_static {
        parts.push("static".to_string());
    }

    match member.kind {
        MemberKind::Field => {
            parts.push(binary_to_source_name(&member.return_type));
            parts.push(member.name.clone());
        }
        MemberKind::Method => {
            parts.push(binary_to_source_name(&member.return_type));
            parts.push(format!(
                "{}({})",
                member.name,
                format_params(member, |p| binary_to_source_name(p))
            ));
        }
        MemberKind::Constructor => {
            parts.push(format!(
                "{}({})",
                binary_to_source_name(&member.declaring_class),
                format_params(member, |p| binary_to_source_name(p))
            ));
        }
    }
    parts.join(" ")
}

fn format_display(member: &MemberDescriptor) -> String {
    match member.kind {
        MemberKind::Field => format!("{} : {}", member.name, short_type_name(&member.return_type)),
        MemberKind::Method => format!(
            "{}({}) : {}",
            member.name,
            format_params(member, short_type_name),
            short_type_name(&member.return_type)
        ),
        MemberKind::Constructor => format!("{}({})", member.name, format_params(member, short_type_name)),
    }
}

fn format_params(member: &MemberDescriptor, spell: impl Fn(&str) -> String) -> String {
    let Some(params) = &member.params else {
        return String::new();
    };
    let last = params.len().saturating_sub(1);
    params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let spelled = spell(param);
            match spelled.strip_suffix("[]") {
                Some(element) if member.is_varargs && i == last => format!("{element}..."),
                _ => spelled,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `java.util.Map$Entry[]` -> `Entry[]`.
pub fn short_type_name(ty: &str) -> String {
    let dims = ty.len() - ty.trim_end_matches("[]").len();
    let element = &ty[..ty.len() - dims];
    format!("{}{}", simple_name(element), &ty[ty.len() - dims..])
}
