//! Provenance markers attached to parsed source files.
//!
//! Every file originating from a build module carries the module's identity
//! markers. Markers are produced once per module and reused for every file
//! under that module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A piece of provenance metadata attached to a parsed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    /// Module coordinates the file belongs to.
    Project {
        group_id: String,
        artifact_id: String,
        version: String,
    },
    /// The build tool that owns the module's descriptor.
    BuildTool { tool: String, version: String },
    /// Java language level declared by the module.
    JavaVersion { source: String, target: String },
    /// The source set a file was parsed in (`main` or `test`).
    SourceSet { name: String },
    /// When the scan that produced this file started.
    Scan { scanned_at: DateTime<Utc> },
    /// Auto-detected formatting style.
    Style { indent: IndentStyle },
}

/// Indentation style detected across a project's sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentStyle {
    Tabs,
    Spaces { width: usize },
}

/// An ordered set of markers. Attachment is additive and idempotent: adding
/// an already-present marker is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Markers(Vec<Marker>);

impl Markers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `marker` unless an equal one is already present. Returns whether
    /// the marker was added.
    pub fn add_if_absent(&mut self, marker: Marker) -> bool {
        if self.0.contains(&marker) {
            return false;
        }
        self.0.push(marker);
        true
    }

    /// Add every marker from `markers` that is not already present,
    /// preserving order (set-union semantics).
    pub fn extend_if_absent<I: IntoIterator<Item = Marker>>(&mut self, markers: I) {
        for marker in markers {
            self.add_if_absent(marker);
        }
    }

    pub fn contains(&self, marker: &Marker) -> bool {
        self.0.contains(marker)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The project coordinates marker, if attached.
    pub fn project(&self) -> Option<(&str, &str, &str)> {
        self.0.iter().find_map(|m| match m {
            Marker::Project {
                group_id,
                artifact_id,
                version,
            } => Some((group_id.as_str(), artifact_id.as_str(), version.as_str())),
            _ => None,
        })
    }

    /// The source-set marker name, if attached.
    pub fn source_set(&self) -> Option<&str> {
        self.0.iter().find_map(|m| match m {
            Marker::SourceSet { name } => Some(name.as_str()),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a Markers {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
