//! Addressable input resources discovered by the project scanner.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// An addressable unit of input: a path relative to the project base
/// directory plus a means to obtain its byte content. Immutable once scanned.
#[derive(Debug, Clone)]
pub struct Resource {
    rel_path: PathBuf,
    content: ResourceContent,
    oversize: bool,
}

#[derive(Debug, Clone)]
enum ResourceContent {
    /// Content read lazily from disk on first access.
    OnDisk { abs_path: PathBuf },
    /// Content held in memory. Used by tests and pre-scanned inputs.
    InMemory { bytes: Vec<u8> },
}

impl Resource {
    /// A resource backed by a file on disk. `rel_path` must be relative to
    /// the base directory that `abs_path` lives under.
    pub fn from_file(rel_path: impl Into<PathBuf>, abs_path: impl Into<PathBuf>) -> Self {
        Self {
            rel_path: rel_path.into(),
            content: ResourceContent::OnDisk {
                abs_path: abs_path.into(),
            },
            oversize: false,
        }
    }

    /// A resource with in-memory content.
    pub fn in_memory(rel_path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            rel_path: rel_path.into(),
            content: ResourceContent::InMemory {
                bytes: bytes.into(),
            },
            oversize: false,
        }
    }

    /// Flag this resource as exceeding the size threshold. Oversize resources
    /// are still carried through the pipeline but receive opaque (quark)
    /// handling instead of full parsing.
    pub fn mark_oversize(mut self) -> Self {
        self.oversize = true;
        self
    }

    pub fn oversize(&self) -> bool {
        self.oversize
    }

    /// Path relative to the project base directory.
    pub fn path(&self) -> &Path {
        &self.rel_path
    }

    /// Final path component, or the empty string for pathless resources.
    pub fn file_name(&self) -> &str {
        self.rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Number of path components. `pom.xml` has depth 1,
    /// `module-a/pom.xml` has depth 2.
    pub fn depth(&self) -> usize {
        self.rel_path.components().count()
    }

    /// Obtain the byte content, reading from disk if file-backed.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match &self.content {
            ResourceContent::OnDisk { abs_path } => {
                let bytes = std::fs::read(abs_path)
                    .with_context(|| format!("failed to read resource {}", abs_path.display()))?;
                Ok(Cow::Owned(bytes))
            }
            ResourceContent::InMemory { bytes } => Ok(Cow::Borrowed(bytes)),
        }
    }

    /// Whether this resource lives under `dir` (a base-dir-relative path).
    /// An empty `dir` matches everything.
    pub fn is_under(&self, dir: &Path) -> bool {
        dir.as_os_str().is_empty() || self.rel_path.starts_with(dir)
    }
}
