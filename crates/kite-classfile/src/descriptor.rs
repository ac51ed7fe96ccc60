use std::fmt;

use crate::error::{ClassFileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Base(BaseType),
    /// Internal name, e.g. `java/lang/String`.
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Source-level spelling with binary class names:
    /// `[Ljava/util/Map$Entry;` -> `java.util.Map$Entry[]`.
    pub fn java_name(&self) -> String {
        match self {
            FieldType::Base(base) => base.keyword().to_string(),
            FieldType::Object(internal) => internal.replace('/', "."),
            FieldType::Array(component) => format!("{}[]", component.java_name()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.java_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

impl ReturnType {
    pub fn java_name(&self) -> String {
        match self {
            ReturnType::Void => "void".to_string(),
            ReturnType::Type(ty) => ty.java_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let (ty, rest) = parse_field_type(desc)?;
    if !rest.is_empty() {
        return Err(ClassFileError::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let invalid = || ClassFileError::InvalidDescriptor(desc.to_string());

    let mut rest = desc.strip_prefix('(').ok_or_else(invalid)?;
    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        if rest.is_empty() {
            return Err(invalid());
        }
        let (param, after) = parse_field_type(rest)?;
        params.push(param);
        rest = after;
    }

    let (return_type, rest) = match rest.strip_prefix('V') {
        Some(after) => (ReturnType::Void, after),
        None => {
            let (ty, after) = parse_field_type(rest)?;
            (ReturnType::Type(ty), after)
        }
    };

    if !rest.is_empty() {
        return Err(invalid());
    }

    Ok(MethodDescriptor { params, return_type })
}

fn parse_field_type(input: &str) -> Result<(FieldType, &str)> {
    let first = input
        .chars()
        .next()
        .ok_or_else(|| ClassFileError::InvalidDescriptor(input.to_string()))?;
    let rest = &input[first.len_utf8()..];
    let base = match first {
        'B' => Some(BaseType::Byte),
        'C' => Some(BaseType::Char),
        'D' => Some(BaseType::Double),
        'F' => Some(BaseType::Float),
        'I' => Some(BaseType::Int),
        'J' => Some(BaseType::Long),
        'S' => Some(BaseType::Short),
        'Z' => Some(BaseType::Boolean),
        _ => None,
    };
    if let Some(base) = base {
        return Ok((FieldType::Base(base), rest));
    }

    match first {
        'L' => match input.find(';') {
            Some(end) if end > 1 => Ok((
                FieldType::Object(input[1..end].to_string()),
                &input[end + 1..],
            )),
            _ => Err(ClassFileError::InvalidDescriptor(input.to_string())),
        },
        '[' => {
            let (component, rest) = parse_field_type(rest)?;
            Ok((FieldType::Array(Box::new(component)), rest))
        }
        _ => Err(ClassFileError::InvalidDescriptor(input.to_string())),
    }
}
