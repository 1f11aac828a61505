use reweave_core::config::ParserConfig;
use reweave_core::resource::Resource;
use reweave_core::source::SourceFile;
use reweave_parser::orchestrator::ProjectParser;
use std::path::Path;

fn nested_project_resources() -> Vec<Resource> {
    vec![
        Resource::in_memory(
            "pom.xml",
            r#"<project>
                <groupId>org.example</groupId>
                <artifactId>parent</artifactId>
                <version>2.0.0</version>
                <packaging>pom</packaging>
                <modules><module>module-a</module></modules>
            </project>"#,
        ),
        Resource::in_memory(
            "module-a/pom.xml",
            r#"<project>
                <parent>
                    <groupId>org.example</groupId>
                    <artifactId>parent</artifactId>
                    <version>2.0.0</version>
                </parent>
                <artifactId>module-a</artifactId>
            </project>"#,
        ),
        Resource::in_memory(
            "src/main/java/com/acme/RootService.java",
            "package com.acme;\npublic class RootService {\n}\n",
        ),
        Resource::in_memory(
            "module-a/src/main/java/com/acme/ChildService.java",
            "package com.acme;\npublic class ChildService {\n}\n",
        ),
        Resource::in_memory(
            "module-a/src/main/resources/app.yaml",
            "name: child\n",
        ),
    ]
}

fn find<'a>(files: &'a [SourceFile], path: &str) -> &'a SourceFile {
    files
        .iter()
        .find(|f| f.path() == Path::new(path))
        .unwrap_or_else(|| panic!("{path} missing from result"))
}

#[test]
fn nested_module_files_are_attributed_to_the_child() {
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser
        .parse_resources(Path::new("/work/nested"), nested_project_resources())
        .unwrap();

    // Files under the child's base directory carry the child's coordinates,
    // never the parent's.
    let child_source = find(
        &result.source_files,
        "module-a/src/main/java/com/acme/ChildService.java",
    );
    assert_eq!(
        child_source.markers().project(),
        Some(("org.example", "module-a", "2.0.0"))
    );

    let child_resource = find(&result.source_files, "module-a/src/main/resources/app.yaml");
    assert_eq!(
        child_resource.markers().project(),
        Some(("org.example", "module-a", "2.0.0"))
    );

    let root_source = find(&result.source_files, "src/main/java/com/acme/RootService.java");
    assert_eq!(
        root_source.markers().project(),
        Some(("org.example", "parent", "2.0.0"))
    );
}

#[test]
fn every_entry_under_a_module_carries_its_markers() {
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser
        .parse_resources(Path::new("/work/nested"), nested_project_resources())
        .unwrap();

    for file in &result.source_files {
        let expected = if file.path().starts_with("module-a") {
            "module-a"
        } else {
            "parent"
        };
        let (_, artifact_id, _) = file
            .markers()
            .project()
            .unwrap_or_else(|| panic!("{} has no project marker", file.path().display()));
        assert_eq!(artifact_id, expected, "wrong module for {}", file.path().display());
    }
}

#[test]
fn nested_module_files_appear_exactly_once() {
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser
        .parse_resources(Path::new("/work/nested"), nested_project_resources())
        .unwrap();

    let child_entries = result
        .source_files
        .iter()
        .filter(|f| f.path().starts_with("module-a") && f.path() != Path::new("module-a/pom.xml"))
        .count();
    assert_eq!(child_entries, 2);
    assert_eq!(result.source_files.len(), 5);
}

#[test]
fn ignored_path_patterns_drop_entries_from_pre_scanned_input() {
    // Scenario C: even when the scanner is bypassed, a resource matching an
    // ignored pattern never appears in the result.
    let mut resources = nested_project_resources();
    resources.push(Resource::in_memory(
        "module-a/target/generated/X.java",
        "package gen;\npublic class X {\n}\n",
    ));
    resources.push(Resource::in_memory(
        "target/classes/app.properties",
        "k=v\n",
    ));

    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser
        .parse_resources(Path::new("/work/nested"), resources)
        .unwrap();

    assert!(result
        .source_files
        .iter()
        .all(|f| !f.path().starts_with("module-a/target")));
    assert!(result
        .source_files
        .iter()
        .all(|f| !f.path().starts_with("target")));
}
