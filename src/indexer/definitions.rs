// Symbol table projection: type names and root operation fields

use std::path::Path;

use apollo_parser::cst;

use super::parser::ParsedSource;
use crate::index::IndexBuilder;

/// Types whose fields are also registered as standalone symbols
pub const ROOT_TYPES: [&str; 3] = ["Query", "Mutation", "Subscription"];

pub fn is_root_type(name: &str) -> bool {
    ROOT_TYPES.contains(&name)
}

/// Record every type-level definition and every root-type field of `parsed`
pub fn index_definitions(parsed: &ParsedSource<'_>, file_path: &Path, builder: &mut IndexBuilder) {
    for definition in parsed.document.definitions() {
        let (name, fields) = match &definition {
            cst::Definition::ObjectTypeDefinition(d) => (d.name(), d.fields_definition()),
            cst::Definition::ObjectTypeExtension(d) => (d.name(), d.fields_definition()),
            cst::Definition::InterfaceTypeDefinition(d) => (d.name(), None),
            cst::Definition::InterfaceTypeExtension(d) => (d.name(), None),
            cst::Definition::InputObjectTypeDefinition(d) => (d.name(), None),
            cst::Definition::InputObjectTypeExtension(d) => (d.name(), None),
            cst::Definition::EnumTypeDefinition(d) => (d.name(), None),
            cst::Definition::EnumTypeExtension(d) => (d.name(), None),
            cst::Definition::UnionTypeDefinition(d) => (d.name(), None),
            cst::Definition::UnionTypeExtension(d) => (d.name(), None),
            cst::Definition::ScalarTypeDefinition(d) => (d.name(), None),
            cst::Definition::ScalarTypeExtension(d) => (d.name(), None),
            _ => continue,
        };

        let Some(name_node) = name else {
            continue;
        };
        let type_name = name_node.text().to_string();
        builder.add_definition(&type_name, parsed.location_of(&name_node, file_path), None);

        if !is_root_type(&type_name) {
            continue;
        }
        let Some(fields) = fields else {
            continue;
        };
        for field in fields.field_definitions() {
            let Some(field_name) = field.name() else {
                continue;
            };
            builder.add_definition(
                &field_name.text().to_string(),
                parsed.location_of(&field_name, file_path),
                Some(type_name.clone()),
            );
        }
    }
}
