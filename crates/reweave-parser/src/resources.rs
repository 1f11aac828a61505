//! Generic parsing of non-source module resources.

use crate::scan::build_globset;
use anyhow::Result;
use globset::GlobSet;
use reweave_core::config::ParserConfig;
use reweave_core::context::ExecutionContext;
use reweave_core::error::Diagnostic;
use reweave_core::resource::Resource;
use reweave_core::source::{SourceFile, SourceFileKind};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::trace;

/// Extensions parsed as structured resources rather than opaque quarks.
const RESOURCE_EXTENSIONS: &[&str] = &["yaml", "yml", "properties", "xml", "json"];

/// Parses the non-source resources of a module: configuration files, plain
/// text, and opaque leftovers. Oversize resources become quarks.
pub struct ResourceParser {
    plain_text_masks: GlobSet,
    /// Masks without a path separator match the file name only.
    name_only_masks: GlobSet,
    exclusions: GlobSet,
}

impl ResourceParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let (name_masks, path_masks): (Vec<String>, Vec<String>) = config
            .plain_text_masks
            .iter()
            .cloned()
            .partition(|mask| !mask.contains('/'));
        Ok(Self {
            plain_text_masks: build_globset(&path_masks)?,
            name_only_masks: build_globset(&name_masks)?,
            exclusions: build_globset(&config.ignored_path_patterns)?,
        })
    }

    /// Parse every resource under `module_dir` that no earlier pass claimed.
    /// `skip_dirs` are the base directories of nested submodules; anything
    /// under them belongs to those modules, never to this one.
    pub fn parse(
        &self,
        module_dir: &Path,
        resources: &[Resource],
        skip_dirs: &BTreeSet<std::path::PathBuf>,
        already_parsed: &BTreeSet<std::path::PathBuf>,
        ctx: &mut ExecutionContext,
    ) -> Vec<SourceFile> {
        let mut files = Vec::new();
        for resource in resources {
            let path = resource.path();
            if !resource.is_under(module_dir)
                || already_parsed.contains(path)
                || skip_dirs.iter().any(|dir| resource.is_under(dir))
                || self.exclusions.is_match(path)
            {
                continue;
            }
            if let Some(file) = self.parse_resource(resource, ctx) {
                files.push(file);
            }
        }
        files
    }

    fn parse_resource(&self, resource: &Resource, ctx: &mut ExecutionContext) -> Option<SourceFile> {
        let path = resource.path();
        if resource.oversize() {
            trace!("carrying {} as quark [oversize]", path.display());
            return Some(SourceFile::new(SourceFileKind::Quark, path, None));
        }

        if self.is_plain_text(resource) {
            let text = self.decode(resource, ctx)?;
            return Some(SourceFile::new(SourceFileKind::PlainText, path, Some(text)));
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if RESOURCE_EXTENSIONS.contains(&extension) {
            let text = self.decode(resource, ctx)?;
            return Some(SourceFile::new(
                SourceFileKind::OtherResource,
                path,
                Some(text),
            ));
        }

        trace!("carrying {} as quark [unrecognized format]", path.display());
        Some(SourceFile::new(SourceFileKind::Quark, path, None))
    }

    fn is_plain_text(&self, resource: &Resource) -> bool {
        self.plain_text_masks.is_match(resource.path())
            || self.name_only_masks.is_match(Path::new(resource.file_name()))
    }

    fn decode(&self, resource: &Resource, ctx: &mut ExecutionContext) -> Option<String> {
        match resource.bytes() {
            Ok(bytes) => Some(ctx.charset().decode(&bytes)),
            Err(err) => {
                ctx.record_diagnostic(Diagnostic::new(resource.path(), format!("{err:#}")));
                None
            }
        }
    }
}
