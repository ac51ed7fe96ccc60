use std::collections::HashMap;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ABSTRACT: u16 = 0x0400;

struct Member {
    access_flags: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
}

struct InnerClass {
    inner: String,
    outer: Option<String>,
    name: Option<String>,
    access_flags: u16,
}

/// Assembles a minimal, valid class file.
///
/// Names are internal names (`app/Greeter`). Methods get no `Code`
/// attribute; the index never reads one.
///
/// ```ignore
/// let bytes = ClassFileBuilder::new("app/Dog")
///     .super_class("app/Animal")
///     .interface("app/Runnable")
///     .method(0x0001, "run", "()V")
///     .build();
/// ```
pub struct ClassFileBuilder {
    this_class: String,
    super_class: Option<String>,
    access_flags: u16,
    interfaces: Vec<String>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    signature: Option<String>,
    inner_classes: Vec<InnerClass>,
}

impl ClassFileBuilder {
    pub fn new(this_class: &str) -> Self {
        Self {
            this_class: this_class.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            signature: None,
            inner_classes: Vec::new(),
        }
    }

    /// A public interface extending `java/lang/Object`, as javac emits it.
    pub fn interface_type(this_class: &str) -> Self {
        Self::new(this_class).access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = Some(name.to_string());
        self
    }

    /// Only `java/lang/Object` itself has no superclass.
    pub fn no_super_class(mut self) -> Self {
        self.super_class = None;
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn field(mut self, access_flags: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
        });
        self
    }

    pub fn method(mut self, access_flags: u16, name: &str, descriptor: &str) -> Self {
        self.methods.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
        });
        self
    }

    pub fn generic_method(
        mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        signature: &str,
    ) -> Self {
        self.methods.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: Some(signature.to_string()),
        });
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    /// Record an `InnerClasses` entry. `name == None` marks an anonymous class.
    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        name: Option<&str>,
        access_flags: u16,
    ) -> Self {
        self.inner_classes.push(InnerClass {
            inner: inner.to_string(),
            outer: outer.map(str::to_string),
            name: name.map(str::to_string),
            access_flags,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = PoolBuilder::default();

        let this_idx = pool.class(&self.this_class);
        let super_idx = self.super_class.as_deref().map(|s| pool.class(s)).unwrap_or(0);
        let interface_idx: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();

        let fields = encode_members(&mut pool, &self.fields);
        let methods = encode_members(&mut pool, &self.methods);

        let mut class_attrs = Vec::new();
        let mut class_attr_count = 0u16;
        if let Some(sig) = &self.signature {
            class_attr_count += 1;
            encode_signature(&mut pool, &mut class_attrs, sig);
        }
        if !self.inner_classes.is_empty() {
            class_attr_count += 1;
            let name_idx = pool.utf8("InnerClasses");
            let mut info = Vec::new();
            put_u2(&mut info, self.inner_classes.len() as u16);
            for inner in &self.inner_classes {
                put_u2(&mut info, pool.class(&inner.inner));
                put_u2(&mut info, inner.outer.as_deref().map(|o| pool.class(o)).unwrap_or(0));
                put_u2(&mut info, inner.name.as_deref().map(|n| pool.utf8(n)).unwrap_or(0));
                put_u2(&mut info, inner.access_flags);
            }
            put_u2(&mut class_attrs, name_idx);
            put_u4(&mut class_attrs, info.len() as u32);
            class_attrs.extend_from_slice(&info);
        }

        let mut out = Vec::new();
        put_u4(&mut out, 0xCAFE_BABE);
        put_u2(&mut out, 0);
        put_u2(&mut out, 52);
        put_u2(&mut out, pool.count());
        out.extend_from_slice(&pool.bytes);
        put_u2(&mut out, self.access_flags);
        put_u2(&mut out, this_idx);
        put_u2(&mut out, super_idx);
        put_u2(&mut out, interface_idx.len() as u16);
        for idx in interface_idx {
            put_u2(&mut out, idx);
        }
        out.extend_from_slice(&fields);
        out.extend_from_slice(&methods);
        put_u2(&mut out, class_attr_count);
        out.extend_from_slice(&class_attrs);
        out
    }
}

fn encode_members(pool: &mut PoolBuilder, members: &[Member]) -> Vec<u8> {
    let mut out = Vec::new();
    put_u2(&mut out, members.len() as u16);
    for member in members {
        put_u2(&mut out, member.access_flags);
        put_u2(&mut out, pool.utf8(&member.name));
        put_u2(&mut out, pool.utf8(&member.descriptor));
        match &member.signature {
            Some(sig) => {
                put_u2(&mut out, 1);
                encode_signature(pool, &mut out, sig);
            }
            None => put_u2(&mut out, 0),
        }
    }
    out
}

fn encode_signature(pool: &mut PoolBuilder, out: &mut Vec<u8>, signature: &str) {
    let name_idx = pool.utf8("Signature");
    let sig_idx = pool.utf8(signature);
    put_u2(out, name_idx);
    put_u4(out, 2);
    put_u2(out, sig_idx);
}

#[derive(Default)]
struct PoolBuilder {
    bytes: Vec<u8>,
    next: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl PoolBuilder {
    fn alloc(&mut self) -> u16 {
        self.next += 1;
        self.next
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(idx) = self.utf8.get(value) {
            return *idx;
        }
        let idx = self.alloc();
        self.bytes.push(1);
        put_u2(&mut self.bytes, value.len() as u16);
        self.bytes.extend_from_slice(value.as_bytes());
        self.utf8.insert(value.to_string(), idx);
        idx
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(idx) = self.classes.get(name) {
            return *idx;
        }
        let name_idx = self.utf8(name);
        let idx = self.alloc();
        self.bytes.push(7);
        put_u2(&mut self.bytes, name_idx);
        self.classes.insert(name.to_string(), idx);
        idx
    }

    fn count(&self) -> u16 {
        self.next + 1
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
