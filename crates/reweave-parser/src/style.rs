//! Best-effort indentation-style detection over the final file list.

use reweave_core::marker::{IndentStyle, Marker};
use reweave_core::source::{SourceFile, SourceFileKind};
use tracing::debug;

#[derive(Debug, Default)]
pub struct StyleDetector;

impl StyleDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the dominant indentation style across the parsed Java sources
    /// and attach it as a marker to each of them. Files with no clear
    /// winner project-wide stay unmarked.
    pub fn detect_styles(&self, mut files: Vec<SourceFile>) -> Vec<SourceFile> {
        let mut tab_lines = 0usize;
        let mut space_lines = 0usize;
        let mut four_space_lines = 0usize;

        for file in files.iter().filter(|f| f.kind() == SourceFileKind::Java) {
            let Some(text) = file.text() else { continue };
            for line in text.lines() {
                if line.starts_with('\t') {
                    tab_lines += 1;
                } else {
                    let indent = line.len() - line.trim_start_matches(' ').len();
                    if indent > 0 && !line.trim().is_empty() {
                        space_lines += 1;
                        if indent % 4 == 0 {
                            four_space_lines += 1;
                        }
                    }
                }
            }
        }

        if tab_lines == 0 && space_lines == 0 {
            return files;
        }

        let indent = if tab_lines > space_lines {
            IndentStyle::Tabs
        } else if four_space_lines * 2 >= space_lines {
            IndentStyle::Spaces { width: 4 }
        } else {
            IndentStyle::Spaces { width: 2 }
        };
        debug!("auto-detected indentation style {indent:?}");

        for file in files
            .iter_mut()
            .filter(|f| f.kind() == SourceFileKind::Java)
        {
            file.add_marker(Marker::Style { indent });
        }
        files
    }
}
