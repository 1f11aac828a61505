//! Build-descriptor parsing with fail-fast precondition checks.

use crate::pom::BUILD_FILE_NAME;
use crate::settings;
use reweave_core::context::ExecutionContext;
use reweave_core::error::{Diagnostic, ParseError};
use reweave_core::marker::Marker;
use reweave_core::resource::Resource;
use reweave_core::source::{SourceFile, SourceFileKind};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{info, trace};

/// Byte-level descriptor parsing, delegated so the pipeline never depends on
/// a particular resolution engine.
pub trait DescriptorParser {
    /// Parse descriptor resources into build documents. A malformed
    /// descriptor is recorded as a diagnostic and omitted, not fatal.
    fn parse_descriptors(
        &self,
        base_dir: &Path,
        descriptors: &[Resource],
        active_profiles: &[String],
        ctx: &mut ExecutionContext,
    ) -> Vec<SourceFile>;
}

/// Default descriptor parser: decodes and validates each `pom.xml`.
/// Dependency-version resolution stays with the downstream build-metadata
/// machinery.
#[derive(Debug, Default)]
pub struct MavenDescriptorParser;

impl DescriptorParser for MavenDescriptorParser {
    fn parse_descriptors(
        &self,
        base_dir: &Path,
        descriptors: &[Resource],
        active_profiles: &[String],
        ctx: &mut ExecutionContext,
    ) -> Vec<SourceFile> {
        trace!(
            "parsing {} build descriptors under {} with active profiles {:?}",
            descriptors.len(),
            base_dir.display(),
            active_profiles
        );
        let mut documents = Vec::new();
        for resource in descriptors {
            let text = match resource.bytes() {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    ctx.record_diagnostic(Diagnostic::new(resource.path(), format!("{err:#}")));
                    continue;
                }
            };
            if let Err(err) = roxmltree::Document::parse(&text) {
                ctx.record_diagnostic(Diagnostic::new(
                    resource.path(),
                    format!("malformed descriptor: {err}"),
                ));
                continue;
            }
            documents.push(SourceFile::new(
                SourceFileKind::BuildFile,
                resource.path(),
                Some(text),
            ));
        }
        documents
    }
}

/// Parses each module's build descriptor and attaches the module's
/// provenance markers.
pub struct BuildFileParser {
    descriptor_parser: Box<dyn DescriptorParser>,
}

impl Default for BuildFileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildFileParser {
    pub fn new() -> Self {
        Self {
            descriptor_parser: Box::new(MavenDescriptorParser),
        }
    }

    pub fn with_descriptor_parser(descriptor_parser: Box<dyn DescriptorParser>) -> Self {
        Self { descriptor_parser }
    }

    /// Parse the build descriptors into marker-stamped build documents.
    ///
    /// Preconditions (fatal, never retried): a non-empty base directory and
    /// descriptor list, every resource named `pom.xml`, and a marker-map
    /// entry for every descriptor. Violations enumerate every offending
    /// path. With `skip` set, returns an empty list without invoking the
    /// descriptor parser.
    pub fn parse_build_files(
        &self,
        base_dir: &Path,
        build_files: &[Resource],
        active_profiles: &[String],
        skip: bool,
        provenance_markers: &BTreeMap<PathBuf, Vec<Marker>>,
        ctx: &mut ExecutionContext,
    ) -> Result<Vec<SourceFile>, ParseError> {
        if base_dir.as_os_str().is_empty() {
            return Err(ParseError::Precondition(
                "base directory must be provided".to_string(),
            ));
        }
        if build_files.is_empty() {
            return Err(ParseError::Precondition(
                "no build files provided".to_string(),
            ));
        }

        let non_pom: Vec<String> = build_files
            .iter()
            .filter(|r| r.file_name() != BUILD_FILE_NAME)
            .map(|r| base_dir.join(r.path()).display().to_string())
            .collect();
        if !non_pom.is_empty() {
            return Err(ParseError::Precondition(format!(
                "resources which are not build files: {non_pom:?}"
            )));
        }

        let without_markers: Vec<String> = build_files
            .iter()
            .filter(|r| !provenance_markers.contains_key(r.path()))
            .map(|r| base_dir.join(r.path()).display().to_string())
            .collect();
        if !without_markers.is_empty() {
            return Err(ParseError::Precondition(format!(
                "no provenance markers provided for these build files: {without_markers:?}"
            )));
        }

        if skip {
            info!("build-descriptor parsing skipped [skip_build_file_parsing=true]");
            return Ok(Vec::new());
        }

        settings::initialize_settings(ctx);

        let mut documents =
            self.descriptor_parser
                .parse_descriptors(base_dir, build_files, active_profiles, ctx);
        let sink = ctx.event_sink();
        for document in &mut documents {
            if let Some(markers) = provenance_markers.get(document.path()) {
                document.add_markers(markers.iter().cloned());
            }
            sink.file_parsed(document);
        }

        Ok(documents)
    }
}

/// Filter a resource list down to build descriptors relevant for the module
/// graph: only `pom.xml` files, descriptors under a `src/test` tree dropped
/// (they are test fixtures, logged and skipped), remainder sorted by
/// ascending path-segment count with ties in stable input order.
pub fn filter_and_sort_build_files(resources: &[Resource]) -> Vec<Resource> {
    let mut build_files: Vec<Resource> = resources
        .iter()
        .filter(|r| r.file_name() == BUILD_FILE_NAME)
        .filter(|r| {
            if is_under_test_sources(r.path()) {
                info!(
                    "ignoring build file '{}' under a src/test tree",
                    r.path().display()
                );
                false
            } else {
                true
            }
        })
        .cloned()
        .collect();
    build_files.sort_by_key(|r| r.depth());
    build_files
}

fn is_under_test_sources(path: &Path) -> bool {
    let components: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();
    components.windows(2).any(|w| w == ["src", "test"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_test_fixtures_and_sorts_by_depth() {
        let resources = vec![
            Resource::in_memory("deep/nested/module/pom.xml", "<project/>"),
            Resource::in_memory("module-a/src/test/resources/pom.xml", "<project/>"),
            Resource::in_memory("module-a/pom.xml", "<project/>"),
            Resource::in_memory("pom.xml", "<project/>"),
            Resource::in_memory("module-a/src/main/java/A.java", "class A {}"),
        ];

        let sorted = filter_and_sort_build_files(&resources);
        let paths: Vec<&Path> = sorted.iter().map(|r| r.path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("pom.xml"),
                Path::new("module-a/pom.xml"),
                Path::new("deep/nested/module/pom.xml"),
            ]
        );
    }

    #[test]
    fn test_equal_depth_preserves_input_order() {
        let resources = vec![
            Resource::in_memory("module-b/pom.xml", "<project/>"),
            Resource::in_memory("module-a/pom.xml", "<project/>"),
        ];
        let sorted = filter_and_sort_build_files(&resources);
        assert_eq!(sorted[0].path(), Path::new("module-b/pom.xml"));
        assert_eq!(sorted[1].path(), Path::new("module-a/pom.xml"));
    }
}
