use super::buffer::ConsoleBuffer;
use crate::editor::Cursor;

/// First position in the console the user may modify.
///
/// Everything before it is history; everything at or after it is the input
/// being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditableBoundary {
    pub row: usize,
    pub col: usize,
    pub offset: usize,
}

impl EditableBoundary {
    /// Boundary at the current end of `buffer`
    pub fn at_end(buffer: &ConsoleBuffer) -> Self {
        let end = buffer.end();
        Self {
            row: end.line,
            col: end.col,
            offset: buffer.len_chars(),
        }
    }

    /// Whether a caret at `pos` may edit
    pub fn admits(&self, pos: &Cursor) -> bool {
        pos.line > self.row || (pos.line == self.row && pos.col >= self.col)
    }
}
