//! Error taxonomy and per-file diagnostics.

use std::path::PathBuf;

/// Fatal errors that abort a whole parse invocation.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A caller-side contract violation. The message enumerates every
    /// offending path. Never retried.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Cyclic or unresolvable parent/module references among build
    /// descriptors.
    #[error("unresolvable module graph: {0}")]
    ModuleGraph(String),

    /// The base directory could not be scanned.
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dependency artifact could not be retrieved. Fatal under the default
    /// download policy, since an incomplete dependency set would silently
    /// corrupt downstream symbol resolution.
    #[error("artifact download failed: {0}")]
    Download(String),
}

/// A non-fatal, per-file problem recorded during a parse invocation. The
/// affected file is omitted from the result; the invocation continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// How dependency-download failures are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadPolicy {
    /// Rethrow as a fatal [`ParseError::Download`].
    #[default]
    Fatal,
    /// Log a warning and continue with an incomplete dependency set.
    Lenient,
}

impl DownloadPolicy {
    /// Apply the policy to a failed download.
    pub fn handle(self, detail: impl Into<String>) -> Result<(), ParseError> {
        let detail = detail.into();
        match self {
            Self::Fatal => Err(ParseError::Download(detail)),
            Self::Lenient => {
                tracing::warn!("continuing after download failure: {detail}");
                Ok(())
            }
        }
    }
}
