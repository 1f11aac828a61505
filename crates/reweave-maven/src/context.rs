//! Per-invocation parser context.

use crate::graph::{ProjectGraph, ProjectId};
use reweave_core::resource::Resource;
use reweave_core::source::SourceFile;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Transient aggregate owned by exactly one parse invocation: the module
/// graph, the descriptor resources in parse order, the per-module descriptor
/// mapping, and the evolving set of already-parsed paths. Constructed by the
/// graph analyzer, mutated during the run, discarded at the end.
#[derive(Debug)]
pub struct ParserContext {
    graph: ProjectGraph,
    build_file_resources: Vec<Resource>,
    descriptors: BTreeMap<ProjectId, Resource>,
    active_profiles: Vec<String>,
    parsed_build_files: Vec<SourceFile>,
    already_parsed: BTreeSet<PathBuf>,
}

impl ParserContext {
    pub fn new(
        graph: ProjectGraph,
        build_file_resources: Vec<Resource>,
        descriptors: BTreeMap<ProjectId, Resource>,
        active_profiles: Vec<String>,
    ) -> Self {
        Self {
            graph,
            build_file_resources,
            descriptors,
            active_profiles,
            parsed_build_files: Vec::new(),
            already_parsed: BTreeSet::new(),
        }
    }

    pub fn graph(&self) -> &ProjectGraph {
        &self.graph
    }

    /// Descriptor resources sorted shallow-to-deep, restricted to modules
    /// that made it into the graph.
    pub fn build_file_resources(&self) -> &[Resource] {
        &self.build_file_resources
    }

    /// The descriptor resource matching a module.
    pub fn matching_descriptor(&self, id: ProjectId) -> Option<&Resource> {
        self.descriptors.get(&id)
    }

    pub fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }

    pub fn set_parsed_build_files(&mut self, parsed: Vec<SourceFile>) {
        self.parsed_build_files = parsed;
    }

    /// Parsed build documents in parse order (shallow-to-deep).
    pub fn parsed_build_files(&self) -> &[SourceFile] {
        &self.parsed_build_files
    }

    /// Whether a path was already produced or skipped by an earlier module,
    /// so later passes never re-parse it.
    pub fn is_already_parsed(&self, path: &Path) -> bool {
        self.already_parsed.contains(path)
    }

    pub fn mark_parsed(&mut self, path: impl Into<PathBuf>) {
        self.already_parsed.insert(path.into());
    }

    pub fn mark_all_parsed<I>(&mut self, paths: I)
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        for path in paths {
            self.already_parsed.insert(path.into());
        }
    }

    pub fn already_parsed(&self) -> &BTreeSet<PathBuf> {
        &self.already_parsed
    }
}
