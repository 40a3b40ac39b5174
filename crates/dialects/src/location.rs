//! Human-readable positions for diagnostics.

use ropey::Rope;
use std::fmt;

/// A position in the input expressed as line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset into the input.
    pub offset: usize,
    /// One-based line number.
    pub line: usize,
    /// One-based column, counted in characters.
    pub column: usize,
}

impl Location {
    /// Resolves a byte offset of `input`. Offsets past the end are clamped.
    #[must_use]
    pub fn resolve(input: &str, offset: usize) -> Self {
        let rope = Rope::from_str(input);
        let offset = offset.min(input.len());
        let char_idx = rope.byte_to_char(offset);
        let line = rope.char_to_line(char_idx);
        let column = char_idx - rope.line_to_char(line);
        Self {
            offset,
            line: line + 1,
            column: column + 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
