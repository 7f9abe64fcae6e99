use std::ops::Range;

use ropey::{Rope, RopeSlice};

use crate::editor::Cursor;

/// Colour attribute of a run of console text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    /// Typed or echoed input
    #[default]
    Input,
    /// Child stdout
    Result,
    /// Child stderr
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StyleRun {
    range: Range<usize>,
    style: TextStyle,
}

/// Console text plus the colour runs of appended output.
///
/// Only `Result` and `Error` runs are recorded; everything else is `Input`.
/// Runs always end at or before the editable boundary, so edits in the
/// editable tail never shift them.
pub struct ConsoleBuffer {
    text: Rope,
    runs: Vec<StyleRun>,
}

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            runs: Vec::new(),
        }
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.text.len_chars() == 0
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    pub fn line(&self, idx: usize) -> RopeSlice<'_> {
        self.text.line(idx)
    }

    /// Length of a line excluding its line terminator
    pub fn line_len(&self, idx: usize) -> usize {
        if idx >= self.line_count() {
            return 0;
        }
        let line = self.text.line(idx);
        let len = line.len_chars();
        // Every line but the last ends in whichever break ropey split on
        if idx + 1 == self.line_count() {
            return len;
        }
        if len >= 2 && line.char(len - 2) == '\r' && line.char(len - 1) == '\n' {
            len - 2
        } else {
            len.saturating_sub(1)
        }
    }

    /// Offset of the first char of a line
    pub fn line_start(&self, idx: usize) -> usize {
        self.text.line_to_char(idx.min(self.line_count() - 1))
    }

    /// Convert a char offset into a (line, col) position
    pub fn position_of(&self, offset: usize) -> Cursor {
        let offset = offset.min(self.len_chars());
        let line = self.text.char_to_line(offset);
        Cursor {
            line,
            col: offset - self.text.line_to_char(line),
        }
    }

    /// Convert a position into a char offset, clamping to the line's text
    pub fn offset_of(&self, pos: &Cursor) -> usize {
        let line = pos.line.min(self.line_count() - 1);
        self.text.line_to_char(line) + pos.col.min(self.line_len(line))
    }

    /// Position just past the last char
    pub fn end(&self) -> Cursor {
        self.position_of(self.len_chars())
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.len_chars()).then(|| self.text.char(offset))
    }

    /// Append text at the end with a colour attribute
    pub fn append(&mut self, text: &str, style: TextStyle) -> Range<usize> {
        let start = self.len_chars();
        self.text.insert(start, text);
        let end = self.len_chars();

        if style != TextStyle::Input && start < end {
            match self.runs.last_mut() {
                Some(run) if run.style == style && run.range.end == start => run.range.end = end,
                _ => self.runs.push(StyleRun {
                    range: start..end,
                    style,
                }),
            }
        }
        start..end
    }

    /// Insert typed text at `offset`
    pub fn insert(&mut self, offset: usize, text: &str) {
        debug_assert!(self.runs.last().is_none_or(|r| r.range.end <= offset));
        self.text.insert(offset.min(self.len_chars()), text);
    }

    /// Remove a range of chars
    pub fn remove(&mut self, range: Range<usize>) {
        debug_assert!(self.runs.last().is_none_or(|r| r.range.end <= range.start));
        let end = range.end.min(self.len_chars());
        if range.start < end {
            self.text.remove(range.start..end);
        }
    }

    pub fn slice_to_string(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.len_chars());
        let start = range.start.min(end);
        self.text.slice(start..end).to_string()
    }

    /// Colour attribute of the char at `offset`
    pub fn style_at(&self, offset: usize) -> TextStyle {
        let idx = self.runs.partition_point(|run| run.range.end <= offset);
        match self.runs.get(idx) {
            Some(run) if run.range.contains(&offset) => run.style,
            _ => TextStyle::Input,
        }
    }

    /// Text of the last line, without terminator
    pub fn last_line(&self) -> String {
        let idx = self.line_count() - 1;
        self.text.line(idx).chars().take(self.line_len(idx)).collect()
    }

    pub fn clear(&mut self) {
        self.text = Rope::new();
        self.runs.clear();
    }
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConsoleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.text.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}
