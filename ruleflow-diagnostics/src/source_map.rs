//! Registry of source texts behind the spans

use codespan_reporting::files::{Error as FilesError, Files, SimpleFiles};

use crate::source_span::SourceSpan;

/// A 1-based line/column position derived from a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Owns every source text a pipeline run has seen and maps our plain `u32`
/// file ids onto the reporting backend.
///
/// A rule document usually registers several files: the document itself plus
/// one pseudo-file per embedded DSL string.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: SimpleFiles<String, String>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
        }
    }

    /// Register a source text and return its file id.
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> u32 {
        self.files.add(name.into(), source.into()) as u32
    }

    /// The full source text of a file, if registered.
    pub fn source(&self, file_id: u32) -> Option<&str> {
        self.files.get(file_id as usize).ok().map(|f| f.source().as_str())
    }

    pub fn name(&self, file_id: u32) -> Option<&str> {
        self.files.get(file_id as usize).ok().map(|f| f.name().as_str())
    }

    /// 1-based line and column of the first character of a span.
    pub fn location(&self, span: &SourceSpan) -> Option<Location> {
        let id = span.file_id as usize;
        let line_index = self.files.line_index(id, span.start()).ok()?;
        let line = self.files.line_number(id, line_index).ok()?;
        let column = self.files.column_number(id, line_index, span.start()).ok()?;
        Some(Location { line, column })
    }

    /// The underlying reporting database, for `codespan_reporting::term`.
    pub fn files(&self) -> &SimpleFiles<String, String> {
        &self.files
    }
}

impl<'a> Files<'a> for SourceMap {
    type FileId = u32;
    type Name = String;
    type Source = &'a str;

    fn name(&'a self, id: u32) -> Result<String, FilesError> {
        self.files.name(id as usize)
    }

    fn source(&'a self, id: u32) -> Result<&'a str, FilesError> {
        self.files.source(id as usize)
    }

    fn line_index(&'a self, id: u32, byte_index: usize) -> Result<usize, FilesError> {
        self.files.line_index(id as usize, byte_index)
    }

    fn line_range(&'a self, id: u32, line_index: usize) -> Result<std::ops::Range<usize>, FilesError> {
        self.files.line_range(id as usize, line_index)
    }
}
