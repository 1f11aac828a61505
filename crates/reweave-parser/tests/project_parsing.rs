use reweave_core::config::ParserConfig;
use reweave_core::events::ParsingEventSink;
use reweave_core::resource::Resource;
use reweave_core::source::{SourceFile, SourceFileKind};
use reweave_parser::orchestrator::ProjectParser;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const ROOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>root-project</artifactId>
    <version>1.0.0</version>
    <properties>
        <maven.compiler.source>17</maven.compiler.source>
        <maven.compiler.target>17</maven.compiler.target>
    </properties>
</project>"#;

const MAIN_CLASS: &str = r#"package com.example;
import org.springframework.boot.SpringApplication;
import org.springframework.boot.autoconfigure.SpringBootApplication;

@SpringBootApplication
public class MyMain {
    public static void main(String[] args){
        SpringApplication.run(MyMain.class, args);
    }
}
"#;

fn paths_of(files: &[SourceFile]) -> Vec<PathBuf> {
    files.iter().map(|f| f.path().to_path_buf()).collect()
}

#[test]
fn single_module_project_yields_build_file_then_source() {
    // Scenario A: one pom, one source file.
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let resources = vec![
        Resource::in_memory("pom.xml", ROOT_POM),
        Resource::in_memory("src/main/java/com/example/MyMain.java", MAIN_CLASS),
    ];

    let result = parser
        .parse_resources(Path::new("/work/app"), resources)
        .unwrap();

    assert_eq!(
        paths_of(&result.source_files),
        vec![
            PathBuf::from("pom.xml"),
            PathBuf::from("src/main/java/com/example/MyMain.java"),
        ]
    );
    assert_eq!(result.source_files[0].kind(), SourceFileKind::BuildFile);

    let source = &result.source_files[1];
    assert_eq!(source.kind(), SourceFileKind::Java);
    assert_eq!(
        source.markers().project(),
        Some(("org.example", "root-project", "1.0.0"))
    );
    assert_eq!(source.markers().source_set(), Some("main"));
    assert!(result.context.diagnostics().is_empty());
}

fn multi_module_resources() -> Vec<Resource> {
    vec![
        Resource::in_memory(
            "pom.xml",
            r#"<project>
                <groupId>com.acme</groupId>
                <artifactId>parent</artifactId>
                <version>0.1.0</version>
                <packaging>pom</packaging>
                <modules>
                    <module>module-b</module>
                    <module>module-a</module>
                </modules>
            </project>"#,
        ),
        Resource::in_memory(
            "module-a/pom.xml",
            r#"<project>
                <parent>
                    <groupId>com.acme</groupId>
                    <artifactId>parent</artifactId>
                    <version>0.1.0</version>
                </parent>
                <artifactId>module-a</artifactId>
            </project>"#,
        ),
        Resource::in_memory(
            "module-b/pom.xml",
            r#"<project>
                <parent>
                    <groupId>com.acme</groupId>
                    <artifactId>parent</artifactId>
                    <version>0.1.0</version>
                </parent>
                <artifactId>module-b</artifactId>
            </project>"#,
        ),
        Resource::in_memory(
            "module-a/src/main/java/com/acme/SomeClass.java",
            "package com.acme;\n\npublic class SomeClass {\n}\n",
        ),
        Resource::in_memory(
            "module-b/src/test/resources/application.yaml",
            "logging:\n  level: info\n",
        ),
    ]
}

#[test]
fn multi_module_project_orders_build_files_before_module_sources() {
    // Scenario B: build files shallow-to-deep in reactor order, then each
    // module's files in module order.
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser
        .parse_resources(Path::new("/work/reactor"), multi_module_resources())
        .unwrap();

    assert_eq!(
        paths_of(&result.source_files),
        vec![
            PathBuf::from("pom.xml"),
            PathBuf::from("module-b/pom.xml"),
            PathBuf::from("module-a/pom.xml"),
            PathBuf::from("module-b/src/test/resources/application.yaml"),
            PathBuf::from("module-a/src/main/java/com/acme/SomeClass.java"),
        ]
    );
}

#[test]
fn result_paths_are_unique() {
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser
        .parse_resources(Path::new("/work/reactor"), multi_module_resources())
        .unwrap();

    let paths = paths_of(&result.source_files);
    let unique: BTreeSet<&PathBuf> = paths.iter().collect();
    assert_eq!(unique.len(), paths.len());
}

#[test]
fn build_files_are_depth_ordered() {
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser
        .parse_resources(Path::new("/work/reactor"), multi_module_resources())
        .unwrap();

    let build_depths: Vec<usize> = result
        .source_files
        .iter()
        .filter(|f| f.kind() == SourceFileKind::BuildFile)
        .map(|f| f.depth())
        .collect();
    assert!(build_depths.windows(2).all(|w| w[0] <= w[1]));
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<String>>,
}

impl ParsingEventSink for CollectingSink {
    fn started(&self, resources: &[Resource]) {
        self.events
            .lock()
            .unwrap()
            .push(format!("started:{}", resources.len()));
    }

    fn file_parsed(&self, file: &SourceFile) {
        self.events
            .lock()
            .unwrap()
            .push(format!("file:{}", file.path().display()));
    }

    fn finished(&self, files: &[SourceFile]) {
        self.events
            .lock()
            .unwrap()
            .push(format!("finished:{}", files.len()));
    }
}

#[test]
fn lifecycle_events_fire_in_order() {
    let sink = Arc::new(CollectingSink::default());
    let parser = ProjectParser::new(ParserConfig::default())
        .unwrap()
        .with_event_sink(Arc::clone(&sink) as Arc<dyn ParsingEventSink>);

    parser
        .parse_resources(Path::new("/work/reactor"), multi_module_resources())
        .unwrap();

    let events = sink.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "started:5".to_string(),
            "file:pom.xml".to_string(),
            "file:module-b/pom.xml".to_string(),
            "file:module-a/pom.xml".to_string(),
            "file:module-b/src/test/resources/application.yaml".to_string(),
            "file:module-a/src/main/java/com/acme/SomeClass.java".to_string(),
            "finished:5".to_string(),
        ]
    );
}

#[test]
fn skip_flag_omits_build_files_but_parses_sources() {
    let config = ParserConfig {
        skip_build_file_parsing: true,
        ..ParserConfig::default()
    };
    let parser = ProjectParser::new(config).unwrap();
    let resources = vec![
        Resource::in_memory("pom.xml", ROOT_POM),
        Resource::in_memory("src/main/java/com/example/MyMain.java", MAIN_CLASS),
    ];

    let result = parser
        .parse_resources(Path::new("/work/app"), resources)
        .unwrap();

    assert_eq!(
        paths_of(&result.source_files),
        vec![PathBuf::from("src/main/java/com/example/MyMain.java")]
    );
}

#[test]
fn module_encoding_overrides_decoding_charset() {
    let pom = r#"<project>
        <groupId>org.example</groupId>
        <artifactId>latin</artifactId>
        <version>1.0.0</version>
        <properties>
            <project.build.sourceEncoding>ISO-8859-1</project.build.sourceEncoding>
        </properties>
    </project>"#;
    // "café" with é encoded as latin1 0xE9, invalid as UTF-8.
    let mut source = b"package com.example;\nclass Menu {\n    String item = \"caf".to_vec();
    source.push(0xE9);
    source.extend_from_slice(b"\";\n}\n");

    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let resources = vec![
        Resource::in_memory("pom.xml", pom),
        Resource::in_memory("src/main/java/com/example/Menu.java", source),
    ];

    let result = parser
        .parse_resources(Path::new("/work/latin"), resources)
        .unwrap();

    let menu = result
        .source_files
        .iter()
        .find(|f| f.path().ends_with("Menu.java"))
        .expect("Menu.java parsed");
    assert!(menu.text().unwrap().contains("café"));
    assert!(result.context.diagnostics().is_empty());
}

#[test]
fn scanning_and_parsing_from_disk_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let write = |rel: &str, content: &str| {
        let path = tmp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    };
    write("pom.xml", ROOT_POM);
    write("src/main/java/com/example/MyMain.java", MAIN_CLASS);
    write("notes.txt", "release checklist");
    write("target/classes/Ignored.class", "\0\0");

    let parser = ProjectParser::new(ParserConfig::default()).unwrap();
    let result = parser.parse(tmp.path()).unwrap();

    assert_eq!(
        paths_of(&result.source_files),
        vec![
            PathBuf::from("pom.xml"),
            PathBuf::from("src/main/java/com/example/MyMain.java"),
            PathBuf::from("notes.txt"),
        ]
    );
    assert_eq!(result.source_files[2].kind(), SourceFileKind::PlainText);
}

#[test]
fn repeated_invocations_do_not_leak_state() {
    let parser = ProjectParser::new(ParserConfig::default()).unwrap();

    let first = parser
        .parse_resources(Path::new("/work/reactor"), multi_module_resources())
        .unwrap();
    assert_eq!(first.source_files.len(), 5);

    // A second invocation against a different base dir sees only its own
    // modules and re-parses paths the first run already claimed.
    let second = parser
        .parse_resources(
            Path::new("/work/other"),
            vec![
                Resource::in_memory("pom.xml", ROOT_POM),
                Resource::in_memory("src/main/java/com/example/MyMain.java", MAIN_CLASS),
            ],
        )
        .unwrap();
    assert_eq!(second.source_files.len(), 2);

    let third = parser
        .parse_resources(Path::new("/work/reactor"), multi_module_resources())
        .unwrap();
    assert_eq!(paths_of(&third.source_files), paths_of(&first.source_files));
}
