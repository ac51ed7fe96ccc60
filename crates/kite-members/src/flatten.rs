use std::collections::HashSet;

use kite_classfile::access;
use kite_classpath::{ClassStub, ClassTable};
use kite_core::Visibility;

use crate::descriptor::{MemberDescriptor, SignatureKey};

/// Own and inherited members of `fqcn`, nearest declaration first.
///
/// The class itself contributes everything it declares. Superclasses follow
/// in chain order, then every transitive interface; those contribute neither
/// constructors nor private members, and interfaces keep their static
/// methods to themselves. A (name, parameter list) pair seen once hides every
/// later declaration.
pub fn flatten(table: &ClassTable, fqcn: &str) -> Vec<MemberDescriptor> {
    let mut out = Vec::new();
    let mut seen: HashSet<SignatureKey> = HashSet::new();

    let Some(own) = table.stub(fqcn) else {
        return out;
    };
    collect(&own, Inheritance::Own, &mut seen, &mut out);

    for parent in table.supertype_chain(fqcn) {
        if let Some(stub) = table.stub(&parent) {
            collect(&stub, Inheritance::Superclass, &mut seen, &mut out);
        }
    }
    for iface in table.all_interfaces(fqcn) {
        if let Some(stub) = table.stub(&iface) {
            collect(&stub, Inheritance::Interface, &mut seen, &mut out);
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Inheritance {
    Own,
    Superclass,
    Interface,
}

fn collect(
    stub: &ClassStub,
    inheritance: Inheritance,
    seen: &mut HashSet<SignatureKey>,
    out: &mut Vec<MemberDescriptor>,
) {
    let fields = stub
        .fields
        .iter()
        .filter_map(|f| MemberDescriptor::from_field(f, &stub.binary_name));
    let methods = stub.methods.iter().filter_map(|m| {
        if inheritance == Inheritance::Interface && m.has_flag(access::STATIC) {
            return None;
        }
        MemberDescriptor::from_method(m, &stub.binary_name)
    });

    for member in fields.chain(methods) {
        if inheritance != Inheritance::Own
            && (member.visibility == Visibility::Private
                || member.kind == crate::MemberKind::Constructor)
        {
            continue;
        }
        if seen.insert(member.signature_key()) {
            out.push(member);
        }
    }
}
