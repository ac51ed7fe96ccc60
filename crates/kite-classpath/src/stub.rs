use kite_classfile::{access, ClassFile, ClassMember};
use kite_core::{internal_to_binary, ClassKind};
use serde::{Deserialize, Serialize};

/// A field or method as recorded in a class file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStub {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub access_flags: u16,
}

impl MemberStub {
    pub fn has_flag(&self, flag: u16) -> bool {
        self.access_flags & flag != 0
    }
}

impl From<ClassMember> for MemberStub {
    fn from(member: ClassMember) -> Self {
        Self {
            name: member.name,
            descriptor: member.descriptor,
            signature: member.signature,
            access_flags: member.access_flags,
        }
    }
}

/// Everything the index keeps about one class file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStub {
    pub binary_name: String,
    pub internal_name: String,
    pub access_flags: u16,
    pub super_binary_name: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
    pub fields: Vec<MemberStub>,
    pub methods: Vec<MemberStub>,
    pub synthetic_or_anonymous: bool,
    /// Path of the class file inside its entry (`app/Dog.class`).
    pub location: String,
}

impl ClassStub {
    pub fn from_classfile(cf: ClassFile, location: String) -> Self {
        let synthetic_or_anonymous = cf.is_synthetic_or_anonymous();
        let binary_name = internal_to_binary(&cf.this_class);
        Self {
            binary_name,
            internal_name: cf.this_class,
            access_flags: cf.access_flags,
            super_binary_name: cf.super_class.map(|s| internal_to_binary(&s)),
            interfaces: cf.interfaces.iter().map(|i| internal_to_binary(i)).collect(),
            signature: cf.signature,
            fields: cf.fields.into_iter().map(MemberStub::from).collect(),
            methods: cf.methods.into_iter().map(MemberStub::from).collect(),
            synthetic_or_anonymous,
            location,
        }
    }

    pub fn kind(&self) -> ClassKind {
        ClassKind::from_access_flags(self.access_flags)
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & access::INTERFACE != 0
    }
}

/// `module-info` and `package-info` carry no types.
pub(crate) fn is_ignored_class(internal_name: &str) -> bool {
    internal_name == "module-info"
        || internal_name == "package-info"
        || internal_name.ends_with("/package-info")
}
