// Type reference classification: base name, list-ness and full signature

use apollo_parser::cst;

/// The five scalars every GraphQL schema has without declaring them
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// Base type name with every list and non-null wrapper removed.
///
/// Returns `None` when the tree is incomplete (e.g. `field: [` in a file with
/// syntax errors).
pub fn unwrap_type(ty: &cst::Type) -> Option<String> {
    match ty {
        cst::Type::NamedType(named) => named_type_name(named),
        cst::Type::ListType(list) => unwrap_type(&list.ty()?),
        cst::Type::NonNullType(non_null) => {
            if let Some(named) = non_null.named_type() {
                named_type_name(&named)
            } else {
                unwrap_type(&non_null.list_type()?.ty()?)
            }
        }
    }
}

/// True if any wrapper in the chain is a list
pub fn is_list_type(ty: &cst::Type) -> bool {
    match ty {
        cst::Type::NamedType(_) => false,
        cst::Type::ListType(_) => true,
        cst::Type::NonNullType(non_null) => non_null.list_type().is_some(),
    }
}

/// Full signature preserving wrapper order, e.g. `[String!]!`
pub fn full_type(ty: &cst::Type) -> Option<String> {
    match ty {
        cst::Type::NamedType(named) => named_type_name(named),
        cst::Type::ListType(list) => Some(format!("[{}]", full_type(&list.ty()?)?)),
        cst::Type::NonNullType(non_null) => {
            let inner = if let Some(named) = non_null.named_type() {
                named_type_name(&named)?
            } else {
                let list = non_null.list_type()?;
                format!("[{}]", full_type(&list.ty()?)?)
            };
            Some(format!("{inner}!"))
        }
    }
}

fn named_type_name(named: &cst::NamedType) -> Option<String> {
    named.name().map(|name| name.text().to_string())
}
