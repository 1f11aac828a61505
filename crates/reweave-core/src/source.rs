//! Parsed source representations and text decoding.

use crate::marker::{Marker, Markers};
use std::path::{Path, PathBuf};

/// How a resource was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFileKind {
    /// A build descriptor (`pom.xml`).
    BuildFile,
    /// A Java source file.
    Java,
    /// A resource matched by a plain-text filename mask.
    PlainText,
    /// An oversize or unrecognized resource carried as an opaque placeholder.
    Quark,
    /// Any other module resource (configuration, data files, ...).
    OtherResource,
}

/// A parsed source representation: path, content representation, and the
/// ordered set of attached provenance markers. Never mutated after creation
/// except to append markers.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    kind: SourceFileKind,
    text: Option<String>,
    markers: Markers,
}

impl SourceFile {
    pub fn new(kind: SourceFileKind, path: impl Into<PathBuf>, text: Option<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            text,
            markers: Markers::new(),
        }
    }

    /// Path relative to the project base directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SourceFileKind {
        self.kind
    }

    /// Decoded text content. `None` for quarks.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Append a marker unless an equal one is already attached.
    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.add_if_absent(marker);
    }

    /// Append every marker not already attached, preserving order.
    pub fn add_markers<I: IntoIterator<Item = Marker>>(&mut self, markers: I) {
        self.markers.extend_if_absent(markers);
    }

    /// Number of path components, used for shallow-to-deep ordering.
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }
}

/// Character sets supported for source decoding. The default is UTF-8; a
/// module may override it for its own parse via its declared build encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceCharset {
    #[default]
    Utf8,
    Latin1,
}

impl SourceCharset {
    /// Map a declared encoding label to a supported charset.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "iso-8859-1" | "latin1" | "latin-1" => Some(Self::Latin1),
            _ => None,
        }
    }

    /// Decode `bytes` to a string. UTF-8 decoding is lossy on invalid
    /// sequences; latin1 maps each byte to the code point of the same value.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}
