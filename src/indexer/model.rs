// Schema model projection: field index, type directives and the type graph

use std::path::Path;

use apollo_parser::cst;
use tracing::trace;

use super::definitions::is_root_type;
use super::parser::{directive_infos, name_text, ParsedSource};
use super::types::{full_type, is_builtin_scalar, is_list_type, unwrap_type};
use crate::index::{ArgInfo, FieldInfo, IndexBuilder, RootOperationInfo, TypeRelationship};

/// Project every object type (root or not) of `parsed` into the builder
pub fn build_schema_model(parsed: &ParsedSource<'_>, file_path: &Path, builder: &mut IndexBuilder) {
    for definition in parsed.document.definitions() {
        let (name, directives, fields) = match definition {
            cst::Definition::ObjectTypeDefinition(d) => {
                (d.name(), d.directives(), d.fields_definition())
            }
            cst::Definition::ObjectTypeExtension(d) => {
                (d.name(), d.directives(), d.fields_definition())
            }
            _ => continue,
        };
        let Some(type_name) = name_text(name) else {
            continue;
        };

        builder.add_type_directives(&type_name, directive_infos(directives));

        let Some(fields) = fields else {
            continue;
        };
        for field in fields.field_definitions() {
            project_field(parsed, file_path, &type_name, &field, builder);
        }
    }
}

fn project_field(
    parsed: &ParsedSource<'_>,
    file_path: &Path,
    type_name: &str,
    field: &cst::FieldDefinition,
    builder: &mut IndexBuilder,
) {
    let Some(name_node) = field.name() else {
        return;
    };
    let field_name = name_node.text().to_string();
    let Some(ty) = field.ty() else {
        trace!("Field {}.{} has no type", type_name, field_name);
        return;
    };
    let Some(base) = unwrap_type(&ty) else {
        trace!("Field {}.{} has an incomplete type", type_name, field_name);
        return;
    };
    let is_list = is_list_type(&ty);
    let args = field_args(field.arguments_definition());
    let location = parsed.location_of(&name_node, file_path);

    if is_root_type(type_name) {
        builder.add_root_operation(
            &field_name,
            RootOperationInfo {
                root_type: type_name.to_string(),
                return_type: base.clone(),
                is_list,
                args: args.clone(),
                location: location.clone(),
            },
        );
    }

    if !is_builtin_scalar(&base) {
        builder.add_relationship(TypeRelationship {
            from_type: type_name.to_string(),
            to_type: base.clone(),
            field_name: field_name.clone(),
            is_list,
        });
    }

    builder.add_field(
        type_name,
        FieldInfo {
            name: field_name,
            type_: base,
            is_list,
            args,
            directives: directive_infos(field.directives()),
            location,
        },
    );
}

fn field_args(arguments: Option<cst::ArgumentsDefinition>) -> Vec<ArgInfo> {
    let Some(arguments) = arguments else {
        return Vec::new();
    };
    arguments
        .input_value_definitions()
        .filter_map(|input| {
            Some(ArgInfo {
                name: name_text(input.name())?,
                type_: full_type(&input.ty()?)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexSnapshot;
    use crate::indexer::parser::parse;

    fn model(source: &str) -> IndexSnapshot {
        let parsed = parse(source);
        assert!(!parsed.has_errors(), "{:?}", parsed.errors);
        let mut builder = IndexBuilder::new();
        build_schema_model(&parsed, Path::new("schema.graphql"), &mut builder);
        builder.build()
    }

    #[test]
    fn test_fields_keep_parse_order() {
        let snapshot = model("type User { id: ID! name: String! friends: [User!] }");
        let names: Vec<_> = snapshot.fields_of("User").iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "friends"]);

        let friends = &snapshot.fields_of("User")[2];
        assert_eq!(friends.type_, "User");
        assert!(friends.is_list);
    }

    #[test]
    fn test_scalar_fields_produce_no_edges() {
        let snapshot = model(
            "type T { a: String b: [Int!]! c: Float d: Boolean! e: [[ID]] f: Other g: [Other!]! }",
        );
        let edges: Vec<_> = snapshot
            .type_relationships
            .iter()
            .map(|r| (r.field_name.as_str(), r.to_type.as_str(), r.is_list))
            .collect();
        assert_eq!(edges, [("f", "Other", false), ("g", "Other", true)]);
    }

    #[test]
    fn test_edges_to_undefined_types() {
        let snapshot = model("type T { m: Missing }");
        assert_eq!(
            snapshot.type_relationships,
            vec![TypeRelationship {
                from_type: "T".to_string(),
                to_type: "Missing".to_string(),
                field_name: "m".to_string(),
                is_list: false,
            }]
        );
    }

    #[test]
    fn test_arguments_keep_full_signature() {
        let snapshot = model("type Query { users(ids: [ID!]!, first: Int = 10): [User] }");
        let root = snapshot.root_operation("Query", "users").unwrap();
        assert_eq!(root.return_type, "User");
        assert!(root.is_list);
        assert_eq!(
            root.args,
            vec![
                ArgInfo { name: "ids".to_string(), type_: "[ID!]!".to_string() },
                ArgInfo { name: "first".to_string(), type_: "Int".to_string() },
            ]
        );
        assert_eq!(snapshot.fields_of("Query").len(), 1);
    }

    #[test]
    fn test_directives_on_types_and_fields() {
        let snapshot = model(
            r#"
type Customer @materializer(query: "customers") {
  orders: [Order] @rest(endpoint: "https://api.example.com/orders", timeout: 30)
  id: ID!
}
"#,
        );

        let type_directives = &snapshot.type_directives["Customer"];
        assert_eq!(type_directives[0].name, "materializer");
        assert_eq!(type_directives[0].args[0].value.as_deref(), Some("customers"));

        let orders = &snapshot.fields_of("Customer")[0];
        assert_eq!(orders.directives[0].name, "rest");
        assert_eq!(orders.directives[0].args[1].name, "timeout");
        assert_eq!(orders.directives[0].args[1].value, None);

        let id = &snapshot.fields_of("Customer")[1];
        assert!(id.directives.is_empty());
    }

    #[test]
    fn test_non_object_types_are_not_modelled() {
        let snapshot = model("input Filter { q: Other } interface Node { n: Other }");
        assert!(snapshot.field_index.is_empty());
        assert!(snapshot.type_relationships.is_empty());
    }
}
