use ropey::Rope;
use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use super::Cursor;

/// The host editor's document
pub struct Buffer {
    text: Rope,
    filepath: Option<PathBuf>,
    dirty: bool,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            filepath: None,
            dirty: false,
        }
    }

    /// Open a file; a path that does not exist yet gives an empty buffer
    pub fn from_file(path: PathBuf) -> io::Result<Self> {
        let text = match File::open(&path) {
            Ok(file) => Rope::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Rope::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            text,
            filepath: Some(path),
            dirty: false,
        })
    }

    #[cfg(test)]
    pub fn from_text(s: &str) -> Self {
        Self {
            text: Rope::from_str(s),
            filepath: None,
            dirty: false,
        }
    }

    pub fn save(&mut self) -> io::Result<()> {
        let path = self
            .filepath
            .as_ref()
            .ok_or_else(|| io::Error::other("No file path"))?;
        let mut file = File::create(path)?;
        self.text.write_to(&mut file)?;
        self.dirty = false;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    pub fn line(&self, idx: usize) -> ropey::RopeSlice<'_> {
        self.text.line(idx)
    }

    pub fn line_len(&self, idx: usize) -> usize {
        // Length excluding newline character
        let line = self.text.line(idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    fn line_col_to_char(&self, line: usize, col: usize) -> usize {
        self.text.line_to_char(line) + col
    }

    /// Text from `start` through `end`, both inclusive, clamped to the buffer
    pub fn text_between(&self, start: &Cursor, end: &Cursor) -> String {
        let (start, end) = (start.min(end), start.max(end));
        let len = self.text.len_chars();
        let from = self.line_col_to_char(start.line, start.col).min(len);
        let to = (self.line_col_to_char(end.line, end.col) + 1).min(len);
        self.text.slice(from..to).to_string()
    }

    pub fn insert_char(&mut self, line: usize, col: usize, ch: char) {
        let idx = self.line_col_to_char(line, col);
        self.text.insert_char(idx, ch);
        self.dirty = true;
    }

    /// Delete the character before the given position (backspace)
    pub fn delete_char_backward(&mut self, line: usize, col: usize) -> bool {
        let idx = self.line_col_to_char(line, col);
        if idx == 0 {
            return false;
        }
        self.text.remove(idx - 1..idx);
        self.dirty = true;
        true
    }

    pub fn insert_newline(&mut self, line: usize, col: usize) {
        self.insert_char(line, col, '\n');
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
