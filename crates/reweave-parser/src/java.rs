//! Java source-set parsing via tree-sitter.
//!
//! Parses one source set at a time, collecting the fully qualified names of
//! the types the set declares. That declared-type list is the "resolved
//! symbol classpath" handed from a module's main source set into its test
//! source set, so test code referencing main types resolves.

use reweave_core::context::ExecutionContext;
use reweave_core::error::Diagnostic;
use reweave_core::source::{SourceFile, SourceFileKind};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// One decoded source file handed to a parser.
#[derive(Debug, Clone)]
pub struct ParserInput {
    pub path: PathBuf,
    pub text: String,
}

/// The outcome of parsing one source set: the parsed files plus the
/// fully qualified type names the set declares.
#[derive(Debug, Default)]
pub struct SourceSetParsingResult {
    pub files: Vec<SourceFile>,
    pub classpath: Vec<String>,
}

/// Language-syntax parsing of a source set. A single file failing to parse
/// is recorded as a diagnostic and omitted; the set parse continues.
pub trait SourceParser {
    fn parse_source_set(
        &self,
        inputs: Vec<ParserInput>,
        classpath: &[String],
        ctx: &mut ExecutionContext,
    ) -> SourceSetParsingResult;
}

/// Default Java parser.
#[derive(Debug, Default)]
pub struct TreeSitterJavaParser;

/// Declarations extracted from one parsed compilation unit.
struct ParsedUnit {
    path: PathBuf,
    text: String,
    package: Option<String>,
    types: Vec<String>,
    imports: Vec<String>,
}

impl SourceParser for TreeSitterJavaParser {
    fn parse_source_set(
        &self,
        inputs: Vec<ParserInput>,
        classpath: &[String],
        ctx: &mut ExecutionContext,
    ) -> SourceSetParsingResult {
        let language: tree_sitter::Language = tree_sitter_java::LANGUAGE.into();
        let mut parser = tree_sitter::Parser::new();
        if parser.set_language(&language).is_err() {
            for input in &inputs {
                ctx.record_diagnostic(Diagnostic::new(
                    &input.path,
                    "java grammar unavailable".to_string(),
                ));
            }
            return SourceSetParsingResult::default();
        }

        let mut units = Vec::new();
        for input in inputs {
            match parse_unit(&mut parser, input.path, input.text) {
                Ok(unit) => units.push(unit),
                Err((path, message)) => ctx.record_diagnostic(Diagnostic::new(path, message)),
            }
        }

        // The symbol table for reference checking: the handed-in classpath
        // plus everything this set declares.
        let mut declared: BTreeSet<String> = classpath.iter().cloned().collect();
        let mut set_classpath = Vec::new();
        for unit in &units {
            for name in &unit.types {
                declared.insert(name.clone());
                set_classpath.push(name.clone());
            }
        }
        let project_packages: BTreeSet<String> = declared
            .iter()
            .filter_map(|fqn| fqn.rsplit_once('.').map(|(pkg, _)| pkg.to_string()))
            .collect();

        let mut files = Vec::new();
        for unit in units {
            // Imports of project-local packages must resolve against the
            // symbol table; anything else is an external dependency whose
            // resolution is delegated.
            for import in &unit.imports {
                let Some((package, _)) = import.rsplit_once('.') else {
                    continue;
                };
                if project_packages.contains(package) && !declared.contains(import) {
                    ctx.record_diagnostic(Diagnostic::new(
                        &unit.path,
                        format!("unresolved symbol '{import}'"),
                    ));
                }
            }
            files.push(SourceFile::new(
                SourceFileKind::Java,
                unit.path,
                Some(unit.text),
            ));
        }

        debug!(
            "parsed {} java files declaring {} types",
            files.len(),
            set_classpath.len()
        );
        SourceSetParsingResult {
            files,
            classpath: set_classpath,
        }
    }
}

fn parse_unit(
    parser: &mut tree_sitter::Parser,
    path: PathBuf,
    text: String,
) -> Result<ParsedUnit, (PathBuf, String)> {
    let Some(tree) = parser.parse(text.as_bytes(), None) else {
        return Err((path, "java parse failed".to_string()));
    };
    let root = tree.root_node();
    if root.has_error() {
        return Err((path, "java parse failed: syntax error".to_string()));
    }

    let mut package = None;
    let mut types = Vec::new();
    let mut imports = Vec::new();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                package = identifier_text(&child, &text);
            }
            "import_declaration" => {
                // Wildcard imports cannot be checked against declared types.
                let mut inner = child.walk();
                let wildcard = child.children(&mut inner).any(|n| n.kind() == "asterisk");
                if !wildcard
                    && let Some(name) = identifier_text(&child, &text)
                {
                    imports.push(name);
                }
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let name = &text[name_node.byte_range()];
                    types.push(match &package {
                        Some(pkg) => format!("{pkg}.{name}"),
                        None => name.to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(ParsedUnit {
        path,
        text,
        package,
        types,
        imports,
    })
}

/// The (possibly scoped) identifier nested in a package or import node.
fn identifier_text(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
        .map(|n| source[n.byte_range()].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(path: &str, text: &str) -> ParserInput {
        ParserInput {
            path: PathBuf::from(path),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_declared_types_become_classpath() {
        let mut ctx = ExecutionContext::new();
        let result = TreeSitterJavaParser.parse_source_set(
            vec![input(
                "src/main/java/com/example/Calculator.java",
                "package com.example;\n\npublic class Calculator {\n    int add(int a, int b) { return a + b; }\n}\n",
            )],
            &[],
            &mut ctx,
        );

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.classpath, vec!["com.example.Calculator"]);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_syntax_error_skips_file_with_diagnostic() {
        let mut ctx = ExecutionContext::new();
        let result = TreeSitterJavaParser.parse_source_set(
            vec![
                input("src/main/java/Bad.java", "clazz Bad {{{"),
                input("src/main/java/Good.java", "class Good {}"),
            ],
            &[],
            &mut ctx,
        );

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path(), std::path::Path::new("src/main/java/Good.java"));
        assert!(ctx.has_diagnostic_for(std::path::Path::new("src/main/java/Bad.java")));
    }

    #[test]
    fn test_project_local_import_resolves_via_classpath() {
        let mut ctx = ExecutionContext::new();
        TreeSitterJavaParser.parse_source_set(
            vec![input(
                "src/test/java/com/example/CalculatorTest.java",
                "package com.example;\nimport com.example.Calculator;\nclass CalculatorTest {}\n",
            )],
            &["com.example.Calculator".to_string()],
            &mut ctx,
        );
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_unresolved_project_local_import_is_diagnosed() {
        let mut ctx = ExecutionContext::new();
        TreeSitterJavaParser.parse_source_set(
            vec![input(
                "src/test/java/com/example/CalculatorTest.java",
                "package com.example;\nimport com.example.Missing;\nclass CalculatorTest {}\n",
            )],
            &["com.example.Calculator".to_string()],
            &mut ctx,
        );
        assert!(ctx.has_diagnostic_for(std::path::Path::new(
            "src/test/java/com/example/CalculatorTest.java"
        )));
    }

    #[test]
    fn test_external_imports_are_not_diagnosed() {
        let mut ctx = ExecutionContext::new();
        TreeSitterJavaParser.parse_source_set(
            vec![input(
                "src/main/java/com/example/App.java",
                "package com.example;\nimport org.springframework.boot.SpringApplication;\npublic class App {}\n",
            )],
            &[],
            &mut ctx,
        );
        assert!(ctx.diagnostics().is_empty());
    }
}
