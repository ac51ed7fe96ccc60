use kite_core::{binary_to_source_name, erase_generics, ROOT_TYPE};

use crate::hierarchy::TypeHierarchy;

const BOXING: &[(&str, &str)] = &[
    ("boolean", "java.lang.Boolean"),
    ("byte", "java.lang.Byte"),
    ("char", "java.lang.Character"),
    ("double", "java.lang.Double"),
    ("float", "java.lang.Float"),
    ("int", "java.lang.Integer"),
    ("long", "java.lang.Long"),
    ("short", "java.lang.Short"),
];

fn is_primitive(ty: &str) -> bool {
    BOXING.iter().any(|(primitive, _)| *primitive == ty)
}

fn normalize(ty: &str) -> String {
    binary_to_source_name(&erase_generics(ty)).replace("...", "[]")
}

/// Whether an argument of static type `arg` can be passed for `param`.
///
/// An empty argument type means the front end could not type the
/// expression and is accepted everywhere.
pub fn is_assignable(arg: &str, param: &str, hierarchy: &TypeHierarchy<'_>) -> bool {
    let arg = normalize(arg);
    let param = normalize(param);
    if arg.is_empty() || arg == param {
        return true;
    }
    if arg == "null" {
        return !is_primitive(&param);
    }
    if BOXING
        .iter()
        .any(|(primitive, boxed)| (arg == *primitive && param == *boxed) || (arg == *boxed && param == *primitive))
    {
        return true;
    }
    if is_primitive(&arg) || is_primitive(&param) {
        return false;
    }

    match (arg.strip_suffix("[]"), param.strip_suffix("[]")) {
        (Some(arg_elem), Some(param_elem)) => {
            return !is_primitive(arg_elem) && !is_primitive(param_elem) && is_assignable(arg_elem, param_elem, hierarchy)
        }
        (Some(_), None) => return param == ROOT_TYPE,
        (None, Some(_)) => return false,
        (None, None) => {}
    }

    hierarchy.is_subtype(&hierarchy.canonical_name(&arg), &hierarchy.canonical_name(&param))
}

/// Whether `args` fit a parameter list; a varargs list also takes its last
/// parameter in array form or any number of trailing element arguments.
pub fn arguments_compatible(params: &[String], is_varargs: bool, args: &[String], hierarchy: &TypeHierarchy<'_>) -> bool {
    let pairwise = |params: &[String], args: &[String]| {
        params
            .iter()
            .zip(args)
            .all(|(param, arg)| is_assignable(arg, param, hierarchy))
    };

    if !is_varargs || params.is_empty() {
        return params.len() == args.len() && pairwise(params, args);
    }

    let fixed = params.len() - 1;
    if args.len() < fixed || !pairwise(&params[..fixed], &args[..fixed]) {
        return false;
    }
    let last = &params[fixed];
    if args.len() == params.len() && is_assignable(&args[fixed], last, hierarchy) {
        return true;
    }
    let element = normalize(last);
    let element = element.strip_suffix("[]").unwrap_or(&element).to_string();
    args[fixed..].iter().all(|arg| is_assignable(arg, &element, hierarchy))
}
