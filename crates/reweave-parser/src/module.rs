//! Per-module source parsing.
//!
//! Partitions a module's resources into main and test source sets, parses
//! them with the main set's resolved classpath handed into the test set,
//! parses the remaining resources generically, and keeps the invocation's
//! already-parsed set current so nested submodule files are never parsed
//! twice.

use crate::java::{ParserInput, SourceParser, SourceSetParsingResult, TreeSitterJavaParser};
use crate::resources::ResourceParser;
use crate::scan::build_globset;
use anyhow::Result;
use globset::GlobSet;
use reweave_core::config::ParserConfig;
use reweave_core::context::ExecutionContext;
use reweave_core::error::Diagnostic;
use reweave_core::marker::Marker;
use reweave_core::resource::Resource;
use reweave_core::source::{SourceCharset, SourceFile};
use reweave_maven::context::ParserContext;
use reweave_maven::graph::ProjectId;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MAIN_SOURCE_ROOT: &str = "src/main/java";
const TEST_SOURCE_ROOT: &str = "src/test/java";

pub struct ModuleParser {
    source_parser: Box<dyn SourceParser>,
    resource_parser: ResourceParser,
    exclusions: GlobSet,
}

impl ModuleParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            source_parser: Box::new(TreeSitterJavaParser),
            resource_parser: ResourceParser::new(config)?,
            exclusions: build_globset(&config.ignored_path_patterns)?,
        })
    }

    pub fn with_source_parser(mut self, source_parser: Box<dyn SourceParser>) -> Self {
        self.source_parser = source_parser;
        self
    }

    /// Parse one module's resources. Returns the module's files in main,
    /// test, other-resource order, all stamped with the module's provenance
    /// markers. Single-file parse failures are recorded and skipped.
    pub fn parse_module(
        &self,
        project_id: ProjectId,
        parser_context: &mut ParserContext,
        provenance_markers: &[Marker],
        resources: &[Resource],
        ctx: &mut ExecutionContext,
    ) -> Vec<SourceFile> {
        let (module_dir, pom_path, encoding, artifact_id) = {
            let project = parser_context.graph().get(project_id);
            (
                project.base_dir.clone(),
                project.pom_path.clone(),
                project.source_encoding.clone(),
                project.artifact_id.clone(),
            )
        };
        let skip_dirs = parser_context.graph().descendant_dirs(project_id);

        info!("parsing module {artifact_id}");

        // A module-declared encoding overrides the decoding charset for this
        // module's parse only; restored on the way out.
        let charset = encoding.as_deref().and_then(|label| {
            let parsed = SourceCharset::from_label(label);
            if parsed.is_none() {
                warn!(
                    "unsupported source encoding '{label}' declared by {}, decoding as lossy UTF-8",
                    pom_path.display()
                );
            }
            parsed
        });
        let previous_charset = charset.map(|c| ctx.swap_charset(Some(c)));

        parser_context.mark_parsed(pom_path);
        parser_context.mark_all_parsed(skip_dirs.iter().cloned());

        let main_result = self.parse_source_root(
            &module_dir.join(MAIN_SOURCE_ROOT),
            &[],
            resources,
            &skip_dirs,
            parser_context,
            ctx,
        );
        // Test sources see the fully resolved classpath the main set
        // produced, so test code referencing main types resolves.
        let test_result = self.parse_source_root(
            &module_dir.join(TEST_SOURCE_ROOT),
            &main_result.classpath,
            resources,
            &skip_dirs,
            parser_context,
            ctx,
        );

        let stamped_main = main_result
            .files
            .into_iter()
            .map(|f| stamp(f, provenance_markers, Some("main")));
        let stamped_test = test_result
            .files
            .into_iter()
            .map(|f| stamp(f, provenance_markers, Some("test")));
        let mut module_files: Vec<SourceFile> = stamped_main
            .chain(stamped_test)
            .filter(|f| !self.exclusions.is_match(f.path()))
            .collect();

        let resource_files = self.resource_parser.parse(
            &module_dir,
            resources,
            &skip_dirs,
            parser_context.already_parsed(),
            ctx,
        );
        parser_context.mark_all_parsed(resource_files.iter().map(|f| f.path().to_path_buf()));
        module_files.extend(
            resource_files
                .into_iter()
                .map(|f| stamp(f, provenance_markers, None)),
        );

        let sink = ctx.event_sink();
        for file in &module_files {
            sink.file_parsed(file);
        }

        if let Some(previous) = previous_charset {
            ctx.swap_charset(previous);
        }
        module_files
    }

    fn parse_source_root(
        &self,
        source_root: &Path,
        classpath: &[String],
        resources: &[Resource],
        skip_dirs: &BTreeSet<PathBuf>,
        parser_context: &mut ParserContext,
        ctx: &mut ExecutionContext,
    ) -> SourceSetParsingResult {
        let mut inputs = Vec::new();
        for resource in resources {
            let path = resource.path();
            if !resource.is_under(source_root)
                || resource.oversize()
                || parser_context.is_already_parsed(path)
                || skip_dirs.iter().any(|dir| resource.is_under(dir))
            {
                continue;
            }
            match resource.bytes() {
                Ok(bytes) => inputs.push(ParserInput {
                    path: path.to_path_buf(),
                    text: ctx.charset().decode(&bytes),
                }),
                Err(err) => {
                    ctx.record_diagnostic(Diagnostic::new(path, format!("{err:#}")));
                    parser_context.mark_parsed(path.to_path_buf());
                }
            }
        }
        parser_context.mark_all_parsed(inputs.iter().map(|i| i.path.clone()));
        self.source_parser.parse_source_set(inputs, classpath, ctx)
    }
}

fn stamp(mut file: SourceFile, markers: &[Marker], source_set: Option<&str>) -> SourceFile {
    file.add_markers(markers.iter().cloned());
    if let Some(name) = source_set {
        file.add_marker(Marker::SourceSet { name: name.into() });
    }
    file
}
