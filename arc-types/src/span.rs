//! Source locations attached to constraints and diagnostics
//!
//! The checker never inspects these beyond printing them; the analyzer that
//! walks the AST decides what a span points at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    pub const INVALID: FileId = FileId(u32::MAX);

    pub fn new(id: u32) -> Self {
        FileId(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file:{}", self.0)
    }
}

/// Byte offset in a source file (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteOffset(pub u32);

impl ByteOffset {
    pub fn new(offset: u32) -> Self {
        ByteOffset(offset)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Span in a source file (inclusive start, exclusive end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub file_id: FileId,
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl Span {
    pub fn new(file_id: FileId, start: ByteOffset, end: ByteOffset) -> Self {
        Span { file_id, start, end }
    }

    /// Placeholder span for synthesized constraints that have no source text
    pub fn dummy() -> Self {
        Span::new(FileId::INVALID, ByteOffset(0), ByteOffset(0))
    }

    pub fn is_dummy(self) -> bool {
        self.file_id == FileId::INVALID
    }

    pub fn len(self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            return write!(f, "<unknown>");
        }
        write!(f, "{}:{}..{}", self.file_id, self.start.0, self.end.0)
    }
}
