//! Source span representation

use serde::{Deserialize, Serialize};

/// A half-open byte range inside one registered source text.
///
/// Offsets are 0-based; line and column numbers derived from a span through
/// [`crate::SourceMap::location`] are 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file_id: u32,
    pub start: u32,
    pub end: u32,
}

impl SourceSpan {
    pub fn new(file_id: u32, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// A zero-width span at the start of a file, for diagnostics that have
    /// no better anchor.
    pub fn empty(file_id: u32) -> Self {
        Self::new(file_id, 0, 0)
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn end(&self) -> usize {
        self.end as usize
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans of the same file into one covering both.
    pub fn merge(&self, other: &SourceSpan) -> SourceSpan {
        SourceSpan {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
