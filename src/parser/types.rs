//! Common types for parsers

use std::ops::Range;

use crate::source::SourceDescriptor;

/// One `module "<name>" { ... }` declaration found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBlock {
    /// Module name from the header
    pub name: String,
    /// Line of the header (1-indexed)
    pub start_line: usize,
    /// Line holding the closing brace (1-indexed, inclusive)
    pub end_line: usize,
    /// Whitespace preceding the header
    pub indent: String,
    /// Header line as written
    pub header: String,
    /// Active `source` value
    pub source: Option<String>,
    /// Commented-out `source` value; never used for classification
    pub commented_source: Option<String>,
    /// Active `version` value
    pub version: Option<String>,
    /// Every other line of the block body, verbatim
    pub body: Vec<String>,
    /// Text following the closing brace on its line, usually a comment
    pub trailer: Option<String>,
}

impl ModuleBlock {
    /// Classified active source, `None` when the block has no active `source`
    pub fn descriptor(&self) -> Option<SourceDescriptor> {
        self.source.as_deref().map(SourceDescriptor::classify)
    }

    /// 0-indexed range of the block's lines, header through closing brace
    pub fn line_range(&self) -> Range<usize> {
        self.start_line - 1..self.end_line
    }
}
