//! Provenance-marker synthesis.
//!
//! For each module in graph order, derives the ordered marker list
//! identifying the module and its build context, and records it against the
//! module's build-descriptor path. Recomputation is idempotent; no state is
//! retained between invocations.

use crate::context::ParserContext;
use chrono::Utc;
use reweave_core::marker::Marker;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Build-tool identity stamped on every file. The version tracks the Maven
/// baseline whose resolution semantics this pipeline mirrors.
pub const BUILD_TOOL: &str = "maven";
pub const BUILD_TOOL_VERSION: &str = "3.9.6";

#[derive(Debug, Default)]
pub struct ProvenanceMarkerFactory;

impl ProvenanceMarkerFactory {
    pub fn new() -> Self {
        Self
    }

    /// Map each module's build-descriptor path (relative to `base_dir`) to
    /// its ordered marker list.
    pub fn generate_markers(
        &self,
        base_dir: &Path,
        context: &ParserContext,
    ) -> BTreeMap<PathBuf, Vec<Marker>> {
        let scanned_at = Utc::now();
        let mut result = BTreeMap::new();

        for project in context.graph().iter_in_order() {
            let Some(descriptor) = context.matching_descriptor(project.id) else {
                continue;
            };
            let mut markers = vec![
                Marker::BuildTool {
                    tool: BUILD_TOOL.to_string(),
                    version: BUILD_TOOL_VERSION.to_string(),
                },
                Marker::Project {
                    group_id: project.group_id.clone(),
                    artifact_id: project.artifact_id.clone(),
                    version: project.version.clone(),
                },
            ];
            if let Some((source, target)) = &project.java_version {
                markers.push(Marker::JavaVersion {
                    source: source.clone(),
                    target: target.clone(),
                });
            }
            markers.push(Marker::Scan { scanned_at });

            debug!(
                "generated {} provenance markers for {}",
                markers.len(),
                base_dir.join(descriptor.path()).display()
            );
            result.insert(descriptor.path().to_path_buf(), markers);
        }

        result
    }
}
