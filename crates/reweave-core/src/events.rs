//! Lifecycle notifications emitted during a parse invocation.
//!
//! The orchestrator calls the sink synchronously at defined points:
//! `started` once with the raw resource list, `file_parsed` once per
//! successfully parsed file in parse-completion order, and `finished` once
//! with the final ordered collection.

use crate::resource::Resource;
use crate::source::SourceFile;

/// Observer for parsing lifecycle events. All methods have empty default
/// implementations so sinks only override what they consume.
pub trait ParsingEventSink {
    /// Parsing of a project started; carries the scanned resource list.
    fn started(&self, resources: &[Resource]) {
        let _ = resources;
    }

    /// A single file finished parsing, with its markers attached.
    fn file_parsed(&self, file: &SourceFile) {
        let _ = file;
    }

    /// The whole project finished; carries the final ordered collection.
    fn finished(&self, files: &[SourceFile]) {
        let _ = files;
    }
}

/// A sink that discards every event.
pub struct NullSink;

impl ParsingEventSink for NullSink {}
