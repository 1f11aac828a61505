//! Project directory scanning.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use reweave_core::config::ParserConfig;
use reweave_core::error::ParseError;
use reweave_core::resource::Resource;
use std::path::Path;
use tracing::{debug, trace};

/// Walks the base directory and returns the addressable resources under it.
/// Files matching an ignore pattern are excluded entirely; files over the
/// size threshold are included but flagged for opaque handling downstream.
pub struct ProjectScanner {
    ignored: GlobSet,
    size_threshold_bytes: u64,
}

impl ProjectScanner {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            ignored: build_globset(&config.ignored_path_patterns)?,
            size_threshold_bytes: config.size_threshold_bytes(),
        })
    }

    /// Enumerate files under `base_dir` in deterministic (path-sorted)
    /// order. An unreadable base directory is fatal for the whole pipeline.
    pub fn scan(&self, base_dir: &Path) -> Result<Vec<Resource>, ParseError> {
        let metadata = std::fs::metadata(base_dir).map_err(|source| ParseError::Scan {
            path: base_dir.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ParseError::Scan {
                path: base_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "base directory is not a directory",
                ),
            });
        }

        let walker = ignore::WalkBuilder::new(base_dir)
            .standard_filters(false)
            .hidden(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut resources = Vec::new();
        for entry in walker.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let rel_path = path.strip_prefix(base_dir).unwrap_or(path);
            if self.ignored.is_match(rel_path) {
                trace!("excluding {} [ignored path pattern]", rel_path.display());
                continue;
            }
            let mut resource = Resource::from_file(rel_path, path);
            if let Ok(meta) = entry.metadata()
                && meta.len() > self.size_threshold_bytes
            {
                debug!(
                    "flagging {} for opaque handling ({} bytes over threshold)",
                    rel_path.display(),
                    meta.len()
                );
                resource = resource.mark_oversize();
            }
            resources.push(resource);
        }

        debug!("scanned {} resources under {}", resources.len(), base_dir.display());
        Ok(resources)
    }
}

/// Compile glob patterns into a set, rejecting invalid patterns up front.
pub(crate) fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern).with_context(|| format!("invalid glob pattern '{pattern}'"))?,
        );
    }
    builder.build().context("failed to compile glob set")
}
