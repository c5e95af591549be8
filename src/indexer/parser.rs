// GraphQL parser adapter over apollo-parser

use std::path::Path;

use apollo_parser::cst::{self, CstNode};
use apollo_parser::Parser as GraphQLParser;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::{DirectiveArg, DirectiveInfo, SourceLocation};

/// Directive that wires a project together: `@sdl(files: [...], executables: [...])`
pub const SDL_DIRECTIVE: &str = "sdl";

// `files:` may follow other arguments; `[^)]*?` stays inside the directive
static SDL_FILES_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@sdl\s*\([^)]*?\bfiles\s*:\s*\[([^\]]*)\]"#).expect("valid @sdl files pattern")
});

static QUOTED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("valid quoted path pattern"));

/// A parsed file plus everything needed to turn offsets into positions
pub struct ParsedSource<'a> {
    pub document: cst::Document,
    pub errors: Vec<String>,
    pub lines: LineIndex<'a>,
}

impl<'a> ParsedSource<'a> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Location of the first character of `node`
    pub fn location_of<N: CstNode>(&self, node: &N, file_path: &Path) -> SourceLocation {
        let offset: usize = node.syntax().text_range().start().into();
        let (line, character) = self.lines.position(offset);
        SourceLocation {
            file_path: file_path.to_path_buf(),
            line,
            character,
        }
    }
}

/// Parse GraphQL text; syntax errors are collected, never fatal here
pub fn parse(source: &str) -> ParsedSource<'_> {
    let tree = GraphQLParser::new(source).parse();
    let lines = LineIndex::new(source);
    let errors = tree
        .errors()
        .map(|err| {
            let (line, character) = lines.position(err.index().min(source.len()));
            format!("{} at {}:{}", err.message(), line + 1, character + 1)
        })
        .collect();

    ParsedSource {
        document: tree.document(),
        errors,
        lines,
    }
}

/// Byte offset to zero-based (line, UTF-16 character) conversion
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let character = self
            .text
            .get(start..offset)
            .map(|prefix| prefix.encode_utf16().count())
            .unwrap_or(0);
        (line as u32, character as u32)
    }
}

/// Text of an optional name node
pub fn name_text(name: Option<cst::Name>) -> Option<String> {
    name.map(|n| n.text().to_string())
}

/// String literal value, `None` for every other literal kind
pub fn string_literal(value: &cst::Value) -> Option<String> {
    match value {
        cst::Value::StringValue(s) => Some(String::from(s)),
        _ => None,
    }
}

pub fn boolean_literal(value: &cst::Value) -> Option<bool> {
    match value {
        cst::Value::BooleanValue(b) => Some(b.syntax().text().to_string().trim() == "true"),
        _ => None,
    }
}

/// Project directives into their name and string-valued arguments
pub fn directive_infos(directives: Option<cst::Directives>) -> Vec<DirectiveInfo> {
    let Some(directives) = directives else {
        return Vec::new();
    };

    directives
        .directives()
        .filter_map(|directive| {
            let name = name_text(directive.name())?;
            let args = directive
                .arguments()
                .map(|arguments| {
                    arguments
                        .arguments()
                        .filter_map(|arg| {
                            Some(DirectiveArg {
                                name: name_text(arg.name())?,
                                value: arg.value().as_ref().and_then(string_literal),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(DirectiveInfo { name, args })
        })
        .collect()
}

/// Directives attached to a type-system definition or extension
pub fn definition_directives(definition: &cst::Definition) -> Option<cst::Directives> {
    match definition {
        cst::Definition::SchemaDefinition(d) => d.directives(),
        cst::Definition::SchemaExtension(d) => d.directives(),
        cst::Definition::ObjectTypeDefinition(d) => d.directives(),
        cst::Definition::ObjectTypeExtension(d) => d.directives(),
        cst::Definition::InterfaceTypeDefinition(d) => d.directives(),
        cst::Definition::InterfaceTypeExtension(d) => d.directives(),
        cst::Definition::UnionTypeDefinition(d) => d.directives(),
        cst::Definition::UnionTypeExtension(d) => d.directives(),
        cst::Definition::EnumTypeDefinition(d) => d.directives(),
        cst::Definition::EnumTypeExtension(d) => d.directives(),
        cst::Definition::InputObjectTypeDefinition(d) => d.directives(),
        cst::Definition::InputObjectTypeExtension(d) => d.directives(),
        cst::Definition::ScalarTypeDefinition(d) => d.directives(),
        cst::Definition::ScalarTypeExtension(d) => d.directives(),
        _ => None,
    }
}

/// Every argument named `arg_name` of every `@sdl` directive in the document
pub fn sdl_arguments(document: &cst::Document, arg_name: &str) -> Vec<cst::Value> {
    let mut values = Vec::new();
    for definition in document.definitions() {
        let Some(directives) = definition_directives(&definition) else {
            continue;
        };
        for directive in directives.directives() {
            if name_text(directive.name()).as_deref() != Some(SDL_DIRECTIVE) {
                continue;
            }
            let Some(arguments) = directive.arguments() else {
                continue;
            };
            for arg in arguments.arguments() {
                if name_text(arg.name()).as_deref() == Some(arg_name) {
                    values.extend(arg.value());
                }
            }
        }
    }
    values
}

/// Paths listed in `@sdl(files: [...])`, read from the parsed directives
pub fn inclusion_paths(document: &cst::Document) -> Vec<String> {
    sdl_arguments(document, "files")
        .into_iter()
        .flat_map(|value| match value {
            cst::Value::ListValue(list) => list
                .values()
                .filter_map(|item| string_literal(&item))
                .collect::<Vec<_>>(),
            other => string_literal(&other).into_iter().collect(),
        })
        .collect()
}

/// Text-level recovery of `@sdl(files: [...])` for files that fail to parse.
///
/// This can match directive-shaped text inside comments or strings, so it is
/// only used when the syntax tree cannot be trusted.
pub fn inclusion_paths_from_text(text: &str) -> Vec<String> {
    SDL_FILES_BLOCK
        .captures_iter(text)
        .flat_map(|block| {
            QUOTED_PATH
                .captures_iter(block.get(1).map(|m| m.as_str()).unwrap_or_default())
                .map(|quoted| quoted[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// One `{ document: "...", persist: true }` entry of `@sdl(executables: [...])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableDecl {
    pub document: String,
    pub persist: bool,
}

pub fn executable_decls(document: &cst::Document) -> Vec<ExecutableDecl> {
    let mut decls = Vec::new();
    for value in sdl_arguments(document, "executables") {
        let cst::Value::ListValue(list) = value else {
            continue;
        };
        for item in list.values() {
            let cst::Value::ObjectValue(object) = item else {
                continue;
            };
            let mut path = None;
            let mut persist = false;
            for field in object.object_fields() {
                let Some(value) = field.value() else {
                    continue;
                };
                match name_text(field.name()).as_deref() {
                    Some("document") => path = string_literal(&value),
                    Some("persist") => persist = boolean_literal(&value).unwrap_or(false),
                    _ => {}
                }
            }
            if let Some(document) = path {
                decls.push(ExecutableDecl { document, persist });
            }
        }
    }
    decls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("type A\n  b: B\n");
        assert_eq!(index.position(0), (0, 0));
        assert_eq!(index.position(5), (0, 5));
        assert_eq!(index.position(7), (1, 0));
        assert_eq!(index.position(9), (1, 2));
    }

    #[test]
    fn test_line_index_counts_utf16_units() {
        let text = "\"é😀\" x";
        let index = LineIndex::new(text);
        let offset = text.find('x').unwrap();
        // quote + é (1 unit) + emoji (2 units) + quote + space
        assert_eq!(index.position(offset), (0, 6));
    }

    #[test]
    fn test_inclusion_paths_from_directives() {
        let source = r#"
            schema @sdl(files: ["types.graphql", "nested/more.graphql"]) {
              query: Query
            }
        "#;
        let parsed = parse(source);
        assert!(!parsed.has_errors());
        assert_eq!(
            inclusion_paths(&parsed.document),
            vec!["types.graphql".to_string(), "nested/more.graphql".to_string()]
        );
    }

    #[test]
    fn test_commented_directive_is_not_an_inclusion() {
        let source = r#"
            # schema @sdl(files: ["ghost.graphql"]) { query: Query }
            type Query { a: Int }
        "#;
        let parsed = parse(source);
        assert!(inclusion_paths(&parsed.document).is_empty());
        assert_eq!(inclusion_paths_from_text(source), vec!["ghost.graphql".to_string()]);
    }

    #[test]
    fn test_executable_decls() {
        let source = r#"
            schema @sdl(
              files: []
              executables: [
                { document: "ops/q.graphql", persist: true }
                { document: "ops/adhoc.graphql" }
              ]
            ) { query: Query }
        "#;
        let parsed = parse(source);
        assert_eq!(
            executable_decls(&parsed.document),
            vec![
                ExecutableDecl { document: "ops/q.graphql".to_string(), persist: true },
                ExecutableDecl { document: "ops/adhoc.graphql".to_string(), persist: false },
            ]
        );
    }

    #[test]
    fn test_directive_values_only_decode_strings() {
        let source = r#"type T @rest(endpoint: "https://x.io/\"q\"", limit: 5, cache: true) { a: Int }"#;
        let parsed = parse(source);
        let definition = parsed.document.definitions().next().unwrap();
        let infos = directive_infos(definition_directives(&definition));

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "rest");
        assert_eq!(infos[0].args[0].value.as_deref(), Some("https://x.io/\"q\""));
        assert_eq!(infos[0].args[1].value, None);
        assert_eq!(infos[0].args[2].value, None);
    }

    #[test]
    fn test_block_string_values_are_dedented() {
        let source = "type T @rest(query: \"\"\"\n    query { a }\n    \"\"\") { a: Int }";
        let parsed = parse(source);
        let definition = parsed.document.definitions().next().unwrap();
        let infos = directive_infos(definition_directives(&definition));

        assert_eq!(infos[0].args[0].value.as_deref(), Some("query { a }"));
    }

    #[test]
    fn test_block_string_executable_document() {
        let source = "schema @sdl(executables: [{ document: \"\"\"\n  ops/q.graphql\n\"\"\" }]) { query: Query }";
        let parsed = parse(source);
        assert_eq!(
            executable_decls(&parsed.document),
            vec![ExecutableDecl { document: "ops/q.graphql".to_string(), persist: false }]
        );
    }

    #[test]
    fn test_text_fallback_finds_files_after_other_arguments() {
        let source = r#"
            schema @sdl(executables: [{ document: "ops.graphql" }], files: ["a.graphql", "b.graphql"]) {
              query: Query
            type Broken {
        "#;
        assert_eq!(
            inclusion_paths_from_text(source),
            vec!["a.graphql".to_string(), "b.graphql".to_string()]
        );
    }

    #[test]
    fn test_syntax_errors_are_collected() {
        let parsed = parse("type Broken { a: }");
        assert!(parsed.has_errors());
    }
}
