//! Module-graph discovery from build descriptors.
//!
//! Resolves the `<modules>` declarations of all `pom.xml` files under the
//! base directory into a tree of [`MavenProject`] records. The tree is an
//! arena addressed by [`ProjectId`]: children are owned ids in the parent's
//! record, the parent link is a plain back-reference id.

use crate::build_file::filter_and_sort_build_files;
use crate::context::ParserContext;
use crate::pom::{PomError, RawPom, BUILD_FILE_NAME};
use reweave_core::cache::{DescriptorMetadata, MetadataCache};
use reweave_core::config::ParserConfig;
use reweave_core::error::ParseError;
use reweave_core::resource::Resource;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Stable identifier of a project in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProjectId(pub usize);

/// One module of the project: coordinates, directories, and tree links.
/// Constructed once during graph analysis, immutable for the rest of the
/// invocation.
#[derive(Debug, Clone)]
pub struct MavenProject {
    pub id: ProjectId,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    /// Module base directory relative to the project base directory; empty
    /// for the root module.
    pub base_dir: PathBuf,
    /// Path of the module's build descriptor relative to the base directory.
    pub pom_path: PathBuf,
    pub parent: Option<ProjectId>,
    pub children: Vec<ProjectId>,
    /// Profile ids declared by the descriptor.
    pub profiles: Vec<String>,
    /// Declared source encoding, if any.
    pub source_encoding: Option<String>,
    /// Declared Java language level as (source, target), if any.
    pub java_version: Option<(String, String)>,
}

/// Arena of project records in pre-order (parent before child, `<modules>`
/// declaration order among siblings).
#[derive(Debug, Default)]
pub struct ProjectGraph {
    projects: Vec<MavenProject>,
}

impl ProjectGraph {
    fn push(&mut self, project: MavenProject) -> ProjectId {
        let id = ProjectId(self.projects.len());
        debug_assert_eq!(project.id, id);
        self.projects.push(project);
        id
    }

    pub fn get(&self, id: ProjectId) -> &MavenProject {
        &self.projects[id.0]
    }

    /// Projects in deterministic pre-order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &MavenProject> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn root(&self) -> &MavenProject {
        &self.projects[0]
    }

    /// Base directories of every project strictly below `id`. A module's own
    /// resource scan excludes these so nested submodule subtrees are never
    /// attributed to an ancestor.
    pub fn descendant_dirs(&self, id: ProjectId) -> BTreeSet<PathBuf> {
        let mut dirs = BTreeSet::new();
        let mut stack: Vec<ProjectId> = self.get(id).children.clone();
        while let Some(child) = stack.pop() {
            let project = self.get(child);
            dirs.insert(project.base_dir.clone());
            stack.extend(project.children.iter().copied());
        }
        dirs
    }
}

/// Discovers the module graph and produces the per-invocation
/// [`ParserContext`].
pub struct ProjectGraphAnalyzer {
    cache: Box<dyn MetadataCache>,
}

impl ProjectGraphAnalyzer {
    pub fn new(cache: Box<dyn MetadataCache>) -> Self {
        Self { cache }
    }

    /// Build the module graph from the scanned resources and wrap it in a
    /// fresh `ParserContext`.
    ///
    /// Fatal errors: no root descriptor, a cycle among module declarations,
    /// or a parent `relativePath` pointing inside the base directory at a
    /// descriptor that does not exist. A module declared in a `<modules>`
    /// block whose descriptor is missing is dropped with a warning.
    pub fn create_parser_context(
        &self,
        base_dir: &Path,
        resources: &[Resource],
        config: &ParserConfig,
    ) -> Result<ParserContext, ParseError> {
        let build_files = filter_and_sort_build_files(resources);
        let by_path: BTreeMap<PathBuf, Resource> = build_files
            .iter()
            .map(|r| (r.path().to_path_buf(), r.clone()))
            .collect();

        if !by_path.contains_key(Path::new(BUILD_FILE_NAME)) {
            return Err(ParseError::ModuleGraph(format!(
                "no root {BUILD_FILE_NAME} found under {}",
                base_dir.display()
            )));
        }

        let mut graph = ProjectGraph::default();
        let mut visiting = BTreeSet::new();
        let mut parent_refs = Vec::new();
        let root_id = self.add_project(
            &mut graph,
            &by_path,
            Path::new(BUILD_FILE_NAME),
            None,
            &mut visiting,
            &mut parent_refs,
        )?;
        debug_assert_eq!(root_id, ProjectId(0));

        for (pom_path, target) in parent_refs {
            if !by_path.contains_key(&target) {
                return Err(ParseError::ModuleGraph(format!(
                    "descriptor {} declares a parent at {} which does not exist under the base directory",
                    pom_path.display(),
                    target.display()
                )));
            }
        }

        debug!(
            "resolved {} modules under {}",
            graph.len(),
            base_dir.display()
        );

        // Descriptors that made it into the reactor, in graph order
        // re-sorted shallow-to-deep (stable, so equal depths keep graph
        // order).
        let mut build_files: Vec<Resource> = graph
            .iter_in_order()
            .map(|p| by_path[&p.pom_path].clone())
            .collect();
        build_files.sort_by_key(|r| r.depth());

        let descriptors: BTreeMap<ProjectId, Resource> = graph
            .iter_in_order()
            .map(|p| (p.id, by_path[&p.pom_path].clone()))
            .collect();

        Ok(ParserContext::new(
            graph,
            build_files,
            descriptors,
            config.active_profiles.clone(),
        ))
    }

    fn add_project(
        &self,
        graph: &mut ProjectGraph,
        by_path: &BTreeMap<PathBuf, Resource>,
        pom_path: &Path,
        parent: Option<ProjectId>,
        visiting: &mut BTreeSet<PathBuf>,
        parent_refs: &mut Vec<(PathBuf, PathBuf)>,
    ) -> Result<ProjectId, ParseError> {
        if !visiting.insert(pom_path.to_path_buf()) {
            return Err(ParseError::ModuleGraph(format!(
                "cycle in module declarations through {}",
                pom_path.display()
            )));
        }

        let resource = &by_path[pom_path];
        let raw = RawPom::parse(resource)
            .map_err(|err| ParseError::ModuleGraph(err.to_string()))?;
        let coordinates = raw.effective_coordinates().ok_or_else(|| {
            ParseError::ModuleGraph(
                PomError::MissingCoordinates {
                    path: pom_path.to_path_buf(),
                }
                .to_string(),
            )
        })?;

        let metadata = self.resolve_metadata(&raw, &coordinates);
        let base_dir = pom_path.parent().unwrap_or(Path::new("")).to_path_buf();

        if let Some(parent_decl) = raw.parent.as_ref()
            && let Some(relative) = parent_decl.relative_path.as_deref()
            && let Some(target) = resolve_parent_path(&base_dir, relative)
        {
            parent_refs.push((pom_path.to_path_buf(), target));
        }

        let id = graph.push(MavenProject {
            id: ProjectId(graph.len()),
            group_id: metadata.group_id.clone(),
            artifact_id: metadata.artifact_id.clone(),
            version: metadata.version.clone(),
            packaging: metadata.packaging.clone(),
            base_dir: base_dir.clone(),
            pom_path: pom_path.to_path_buf(),
            parent,
            children: Vec::new(),
            profiles: metadata.profiles.clone(),
            source_encoding: metadata.source_encoding.clone(),
            java_version: raw.java_version(),
        });

        let mut children = Vec::new();
        for module in &raw.modules {
            let Some(child_pom) = normalize_rel(&base_dir.join(module).join(BUILD_FILE_NAME))
            else {
                warn!(
                    "module '{module}' declared in {} escapes the base directory, dropping it",
                    pom_path.display()
                );
                continue;
            };
            if by_path.contains_key(&child_pom) {
                children.push(self.add_project(
                    graph,
                    by_path,
                    &child_pom,
                    Some(id),
                    visiting,
                    parent_refs,
                )?);
            } else {
                warn!(
                    "module '{module}' declared in {} has no descriptor under the base directory, dropping it",
                    pom_path.display()
                );
            }
        }
        graph.projects[id.0].children = children;

        Ok(id)
    }

    fn resolve_metadata(
        &self,
        raw: &RawPom,
        coordinates: &crate::pom::Coordinates,
    ) -> DescriptorMetadata {
        let key = coordinates.to_string();
        if let Some(hit) = self.cache.get(&key) {
            debug!("metadata cache hit for {key}");
            return hit;
        }
        let metadata = DescriptorMetadata {
            group_id: coordinates.group_id.clone(),
            artifact_id: coordinates.artifact_id.clone(),
            version: coordinates.version.clone(),
            packaging: raw.packaging().to_string(),
            profiles: raw.profiles.clone(),
            source_encoding: raw.source_encoding(),
        };
        self.cache.put(metadata.clone());
        metadata
    }
}

/// Lexically normalize a base-dir-relative path. Returns `None` when `..`
/// components escape the base directory.
fn normalize_rel(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    Some(normalized)
}

/// Lexically resolve a parent `relativePath` against a module directory.
/// Returns `None` when the path escapes the base directory (an external
/// parent, resolved from a repository instead).
fn resolve_parent_path(module_dir: &Path, relative: &str) -> Option<PathBuf> {
    let mut normalized = normalize_rel(&module_dir.join(relative))?;
    if normalized.file_name().and_then(|n| n.to_str()) != Some(BUILD_FILE_NAME) {
        normalized.push(BUILD_FILE_NAME);
    }
    Some(normalized)
}
