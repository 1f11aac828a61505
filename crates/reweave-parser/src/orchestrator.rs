//! Top-level parse orchestration.

use crate::module::ModuleParser;
use crate::scan::ProjectScanner;
use crate::style::StyleDetector;
use anyhow::Result;
use reweave_core::cache::cache_from_config;
use reweave_core::config::ParserConfig;
use reweave_core::context::{ExecutionContext, ParsingResult};
use reweave_core::error::ParseError;
use reweave_core::events::{NullSink, ParsingEventSink};
use reweave_core::resource::Resource;
use reweave_core::source::SourceFile;
use reweave_maven::build_file::BuildFileParser;
use reweave_maven::graph::{ProjectGraphAnalyzer, ProjectId};
use reweave_maven::provenance::ProvenanceMarkerFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Parses a multi-module project rooted at a base directory into a single
/// deterministically ordered collection of marker-tagged source files.
///
/// The orchestrator holds collaborators only; all per-invocation state (the
/// module graph, marker map, and already-parsed set) is constructed fresh in
/// [`parse_resources`](Self::parse_resources) so repeated invocations
/// against different base directories never leak state from a prior run.
pub struct ProjectParser {
    config: ParserConfig,
    scanner: ProjectScanner,
    analyzer: ProjectGraphAnalyzer,
    marker_factory: ProvenanceMarkerFactory,
    build_file_parser: BuildFileParser,
    module_parser: ModuleParser,
    style_detector: StyleDetector,
    sink: Arc<dyn ParsingEventSink>,
}

impl ProjectParser {
    /// Wire the pipeline for `config` with the default collaborators.
    pub fn new(config: ParserConfig) -> Result<Self> {
        let scanner = ProjectScanner::new(&config)?;
        let module_parser = ModuleParser::new(&config)?;
        let analyzer = ProjectGraphAnalyzer::new(cache_from_config(&config));
        Ok(Self {
            config,
            scanner,
            analyzer,
            marker_factory: ProvenanceMarkerFactory::new(),
            build_file_parser: BuildFileParser::new(),
            module_parser,
            style_detector: StyleDetector::new(),
            sink: Arc::new(NullSink),
        })
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn ParsingEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Scan `base_dir` and parse everything under it.
    pub fn parse(&self, base_dir: &Path) -> Result<ParsingResult, ParseError> {
        let resources = self.scanner.scan(base_dir)?;
        self.parse_resources(base_dir, resources)
    }

    /// Parse a pre-scanned resource list rooted at `base_dir`.
    pub fn parse_resources(
        &self,
        base_dir: &Path,
        resources: Vec<Resource>,
    ) -> Result<ParsingResult, ParseError> {
        let base_dir = normalize_base_dir(base_dir);

        // Fresh per-invocation scope; the sink is installed before any parse
        // begins so every per-file event reaches it.
        let mut ctx = ExecutionContext::new();
        ctx.set_event_sink(Arc::clone(&self.sink));
        let sink = ctx.event_sink();

        sink.started(&resources);

        if self.config.run_per_submodule {
            debug!("run_per_submodule is set but not implemented; parsing the full module tree");
        }

        let mut parser_context =
            self.analyzer
                .create_parser_context(&base_dir, &resources, &self.config)?;

        let provenance_markers = self
            .marker_factory
            .generate_markers(&base_dir, &parser_context);

        let build_files = parser_context.build_file_resources().to_vec();
        let active_profiles = parser_context.active_profiles().to_vec();
        let documents = self.build_file_parser.parse_build_files(
            &base_dir,
            &build_files,
            &active_profiles,
            self.config.skip_build_file_parsing,
            &provenance_markers,
            &mut ctx,
        )?;
        parser_context.set_parsed_build_files(documents);

        trace!(
            "parsing sources of {} modules under {}",
            parser_context.graph().len(),
            base_dir.display()
        );

        let module_ids: Vec<ProjectId> = parser_context
            .graph()
            .iter_in_order()
            .map(|p| p.id)
            .collect();
        let mut other_files = Vec::new();
        for id in module_ids {
            let pom_path = parser_context.graph().get(id).pom_path.clone();
            let markers = provenance_markers
                .get(&pom_path)
                .cloned()
                .unwrap_or_default();
            other_files.extend(self.module_parser.parse_module(
                id,
                &mut parser_context,
                &markers,
                &resources,
                &mut ctx,
            ));
        }

        // Build documents (already shallow-to-deep) lead the result.
        let mut combined: Vec<SourceFile> = parser_context.parsed_build_files().to_vec();
        combined.extend(other_files);
        let source_files = self.style_detector.detect_styles(combined);

        sink.finished(&source_files);

        Ok(ParsingResult {
            source_files,
            context: ctx,
        })
    }
}

/// Normalize the base directory to an absolute, lexically clean path.
fn normalize_base_dir(base_dir: &Path) -> PathBuf {
    if base_dir.is_absolute() {
        base_dir.to_path_buf()
    } else {
        std::path::absolute(base_dir).unwrap_or_else(|_| base_dir.to_path_buf())
    }
}
