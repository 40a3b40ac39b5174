//! The parse cursor: read offset and line counter shared by every matching
//! call of one parse.

/// Current read position into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    offset: usize,
    line: usize,
}

/// Saved cursor state, restored when a speculative attempt fails.
///
/// Besides the cursor itself this records the length of the parse-tree arena
/// so parts appended by the failed attempt can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) cursor: Cursor,
    pub(crate) parts: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { offset: 0, line: 1 }
    }
}

impl Cursor {
    /// Byte offset of the next unread character.
    #[must_use]
    pub fn offset(self) -> usize {
        self.offset
    }

    /// One-based line number at the cursor.
    #[must_use]
    pub fn line(self) -> usize {
        self.line
    }

    /// Returns `true` once nothing is left to match.
    #[must_use]
    pub fn at_end(self, input: &str) -> bool {
        self.offset >= input.len()
    }

    /// Moves past `consumed`, counting the newlines it contains.
    pub fn advance(&mut self, consumed: &str) {
        self.offset += consumed.len();
        self.line += consumed.bytes().filter(|&b| b == b'\n').count();
    }
}
