//! Per-invocation execution context shared across pipeline stages.

use crate::error::Diagnostic;
use crate::events::{NullSink, ParsingEventSink};
use crate::source::{SourceCharset, SourceFile};
use std::path::PathBuf;
use std::sync::Arc;

/// Mutable state owned by exactly one parse invocation: recorded
/// diagnostics, the active decoding charset, the event sink, and resolved
/// build-tool environment data. Constructed fresh at the start of each
/// invocation and returned to the caller inside [`ParsingResult`].
pub struct ExecutionContext {
    charset: Option<SourceCharset>,
    diagnostics: Vec<Diagnostic>,
    sink: Arc<dyn ParsingEventSink>,
    local_repository: Option<PathBuf>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            charset: None,
            diagnostics: Vec::new(),
            sink: Arc::new(NullSink),
            local_repository: None,
        }
    }

    /// Install the event sink. Must happen before any parse begins so every
    /// per-file event reaches the sink.
    pub fn set_event_sink(&mut self, sink: Arc<dyn ParsingEventSink>) {
        self.sink = sink;
    }

    pub fn event_sink(&self) -> Arc<dyn ParsingEventSink> {
        Arc::clone(&self.sink)
    }

    /// The charset used to decode source bytes. Defaults to UTF-8.
    pub fn charset(&self) -> SourceCharset {
        self.charset.unwrap_or_default()
    }

    /// Replace the active charset override and return the previous one, so a
    /// module-scoped override can be restored when the module's parse ends.
    pub fn swap_charset(&mut self, charset: Option<SourceCharset>) -> Option<SourceCharset> {
        std::mem::replace(&mut self.charset, charset)
    }

    /// Record a non-fatal per-file problem. The file will not appear in the
    /// result.
    pub fn record_diagnostic(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            path = %diagnostic.path.display(),
            "recorded diagnostic: {}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether any diagnostic was recorded for `path`.
    pub fn has_diagnostic_for(&self, path: &std::path::Path) -> bool {
        self.diagnostics.iter().any(|d| d.path == path)
    }

    pub fn set_local_repository(&mut self, path: PathBuf) {
        self.local_repository = Some(path);
    }

    /// The resolved artifact repository root, if build-tool settings were
    /// initialized.
    pub fn local_repository(&self) -> Option<&std::path::Path> {
        self.local_repository.as_deref()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("charset", &self.charset)
            .field("diagnostics", &self.diagnostics.len())
            .field("local_repository", &self.local_repository)
            .finish_non_exhaustive()
    }
}

/// The final ordered collection of parsed files plus the execution context
/// the invocation ran with.
#[derive(Debug)]
pub struct ParsingResult {
    pub source_files: Vec<SourceFile>,
    pub context: ExecutionContext,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_charset_swap_restores() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(ctx.charset(), SourceCharset::Utf8);

        let prev = ctx.swap_charset(Some(SourceCharset::Latin1));
        assert_eq!(prev, None);
        assert_eq!(ctx.charset(), SourceCharset::Latin1);

        ctx.swap_charset(prev);
        assert_eq!(ctx.charset(), SourceCharset::Utf8);
    }

    #[test]
    fn test_diagnostics_recorded() {
        let mut ctx = ExecutionContext::new();
        ctx.record_diagnostic(Diagnostic::new("src/Broken.java", "parse failed"));
        assert_eq!(ctx.diagnostics().len(), 1);
        assert!(ctx.has_diagnostic_for(Path::new("src/Broken.java")));
        assert!(!ctx.has_diagnostic_for(Path::new("src/Fine.java")));
    }
}
