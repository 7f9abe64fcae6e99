use std::ops::Range;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::boundary::EditableBoundary;
use super::buffer::{ConsoleBuffer, TextStyle};
use super::LINE_ENDING;
use crate::editor::Cursor;
use crate::theme::ConsolePalette;

/// Prompt character the interpreter prints at the start of an input line
const PROMPT_CHAR: char = '>';

/// What a keystroke did to the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key edited or moved within the input region
    Handled,
    /// The key was refused (history, boundary, disabled console)
    Suppressed,
    /// Not a console key; the host may use it
    Ignored,
    /// Enter: the pending command, terminator included
    Submit(String),
}

/// Context-menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    Clear,
    Copy,
}

/// Tab handling for the input region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabPolicy {
    pub convert_to_spaces: bool,
    pub length: usize,
}

impl TabPolicy {
    /// Text a Tab keystroke inserts
    pub fn text(&self) -> String {
        if self.convert_to_spaces {
            " ".repeat(self.length)
        } else {
            "\t".to_string()
        }
    }
}

impl Default for TabPolicy {
    fn default() -> Self {
        Self {
            convert_to_spaces: true,
            length: 4,
        }
    }
}

/// Scrollback console: immutable history above an editable input tail.
pub struct ConsoleWidget {
    buffer: ConsoleBuffer,
    boundary: EditableBoundary,
    pub caret: Cursor,
    /// Mouse selection anchor; the selection runs from here to the caret
    anchor: Option<Cursor>,
    pub scroll_offset: usize,
    /// First visible column; lines are not wrapped
    pub col_offset: usize,
    follow_tail: bool,
    enabled: bool,
    tabs: TabPolicy,
    restart_marker: String,
    palette: ConsolePalette,
}

impl ConsoleWidget {
    pub fn new(tabs: TabPolicy, restart_marker: impl Into<String>, palette: ConsolePalette) -> Self {
        Self {
            buffer: ConsoleBuffer::new(),
            boundary: EditableBoundary::default(),
            caret: Cursor::new(),
            anchor: None,
            scroll_offset: 0,
            col_offset: 0,
            follow_tail: false,
            enabled: false,
            tabs,
            restart_marker: restart_marker.into(),
            palette,
        }
    }

    pub fn buffer(&self) -> &ConsoleBuffer {
        &self.buffer
    }

    #[cfg(test)]
    pub fn boundary(&self) -> EditableBoundary {
        self.boundary
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn palette(&self) -> &ConsolePalette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: ConsolePalette) {
        self.palette = palette;
    }

    pub fn set_tab_policy(&mut self, tabs: TabPolicy) {
        self.tabs = tabs;
    }

    pub fn set_restart_marker(&mut self, marker: impl Into<String>) {
        self.restart_marker = marker.into();
    }

    /// Whether the caret is inside the editable region
    pub fn caret_is_editable(&self) -> bool {
        self.boundary.admits(&self.caret)
    }

    /// Text typed since the boundary
    pub fn pending_command(&self) -> String {
        self.buffer
            .slice_to_string(self.boundary.offset..self.buffer.len_chars())
    }

    // Output

    /// Append text at the end of the buffer, whatever the caret position.
    ///
    /// The boundary moves to the new end and the view follows the tail.
    pub fn append(&mut self, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.buffer.append(text, style);
        self.reseed_boundary();
    }

    fn reseed_boundary(&mut self) {
        self.boundary = EditableBoundary::at_end(&self.buffer);
        self.caret = self.buffer.end();
        self.follow_tail = true;
    }

    /// Jump to the bottom if text was appended since the last call
    pub fn follow_output(&mut self, viewport_height: usize, viewport_width: usize) -> bool {
        if !self.follow_tail || viewport_height == 0 {
            return false;
        }
        self.scroll_offset = self.buffer.line_count().saturating_sub(viewport_height);
        self.reveal_caret_column(viewport_width);
        self.follow_tail = false;
        true
    }

    /// Keep the caret visible, or jump to the bottom after an append
    pub fn adjust_scroll(&mut self, viewport_height: usize, viewport_width: usize) {
        if viewport_height == 0 || self.follow_output(viewport_height, viewport_width) {
            return;
        }
        if self.caret.line < self.scroll_offset {
            self.scroll_offset = self.caret.line;
        }
        if self.caret.line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.caret.line - viewport_height + 1;
        }
        self.reveal_caret_column(viewport_width);
    }

    fn reveal_caret_column(&mut self, viewport_width: usize) {
        if viewport_width == 0 {
            return;
        }
        if self.caret.col < self.col_offset {
            self.col_offset = self.caret.col;
        }
        // Leave a cell for the caret past the last char
        if self.caret.col >= self.col_offset + viewport_width {
            self.col_offset = self.caret.col - viewport_width + 1;
        }
    }

    /// Scroll the view without moving the caret
    pub fn scroll_by(&mut self, lines: isize, viewport_height: usize) {
        let max = self.buffer.line_count().saturating_sub(viewport_height.max(1));
        self.scroll_offset = self.scroll_offset.saturating_add_signed(lines).min(max);
    }

    /// Scroll sideways; stops once the widest line's last char is at the left edge
    pub fn scroll_columns(&mut self, cols: isize) {
        let widest = (0..self.buffer.line_count())
            .map(|line| self.buffer.line_len(line))
            .max()
            .unwrap_or(0);
        self.col_offset = self
            .col_offset
            .saturating_add_signed(cols)
            .min(widest.saturating_sub(1));
    }

    // Keyboard

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Ignored;
        }
        if !self.enabled || !self.caret_is_editable() {
            return KeyOutcome::Suppressed;
        }

        let outcome = match key.code {
            KeyCode::Enter => KeyOutcome::Submit(self.submit()),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => {
                self.caret.col = self.buffer.line_len(self.caret.line);
                KeyOutcome::Handled
            }
            KeyCode::Backspace => self.delete_backward(),
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Tab => {
                let text = self.tabs.text();
                self.insert_text(&text)
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_text(c.encode_utf8(&mut [0; 4]))
            }
            _ => return KeyOutcome::Ignored,
        };

        if outcome != KeyOutcome::Suppressed {
            self.anchor = None;
        }
        outcome
    }

    /// Take the pending command and move the boundary past it
    fn submit(&mut self) -> String {
        let command = self.pending_command();
        self.buffer.append(LINE_ENDING, TextStyle::Input);
        self.reseed_boundary();
        format!("{command}{LINE_ENDING}")
    }

    fn on_boundary_row(&self) -> bool {
        self.caret.line == self.boundary.row
    }

    fn at_boundary(&self) -> bool {
        self.on_boundary_row() && self.caret.col <= self.boundary.col
    }

    fn move_up(&mut self) -> KeyOutcome {
        if self.on_boundary_row() {
            return KeyOutcome::Suppressed;
        }
        self.caret.move_up();
        self.clamp_caret();
        KeyOutcome::Handled
    }

    fn move_down(&mut self) -> KeyOutcome {
        self.caret.move_down(self.buffer.line_count());
        self.clamp_caret();
        KeyOutcome::Handled
    }

    fn move_left(&mut self) -> KeyOutcome {
        if self.at_boundary() {
            return KeyOutcome::Suppressed;
        }
        if self.caret.col == 0 {
            self.caret.line -= 1;
            self.caret.col = self.buffer.line_len(self.caret.line);
        } else {
            self.caret.col -= 1;
        }
        KeyOutcome::Handled
    }

    fn move_right(&mut self) -> KeyOutcome {
        let offset = self.caret_offset();
        if offset < self.buffer.len_chars() {
            let step = if self.caret.col >= self.buffer.line_len(self.caret.line) {
                // Step over the whole terminator, CRLF included
                self.buffer.line_start(self.caret.line + 1) - offset
            } else {
                1
            };
            self.caret = self.buffer.position_of(offset + step);
        }
        KeyOutcome::Handled
    }

    fn move_home(&mut self) -> KeyOutcome {
        self.caret.col = if self.on_boundary_row() {
            self.boundary.col
        } else {
            0
        };
        KeyOutcome::Handled
    }

    /// Clamp the caret to its line and keep it out of history
    fn clamp_caret(&mut self) {
        let line_len = self.buffer.line_len(self.caret.line);
        if self.caret.col > line_len {
            self.caret.col = line_len;
        }
        if self.on_boundary_row() && self.caret.col < self.boundary.col {
            self.caret.col = self.boundary.col;
        }
    }

    fn caret_offset(&self) -> usize {
        self.buffer.offset_of(&self.caret)
    }

    fn insert_text(&mut self, text: &str) -> KeyOutcome {
        let offset = self.caret_offset();
        self.buffer.insert(offset, text);
        self.caret = self.buffer.position_of(offset + text.chars().count());
        KeyOutcome::Handled
    }

    fn delete_backward(&mut self) -> KeyOutcome {
        if self.at_boundary() {
            return KeyOutcome::Suppressed;
        }
        let offset = self.caret_offset();
        let start = if self.caret.col == 0 && offset >= 2 {
            // Joining lines: take a CRLF terminator as one unit
            let crlf = self.buffer.char_at(offset - 2) == Some('\r');
            if crlf && offset - 2 >= self.boundary.offset {
                offset - 2
            } else {
                offset - 1
            }
        } else {
            offset - 1
        };
        self.buffer.remove(start..offset);
        self.caret = self.buffer.position_of(start);
        KeyOutcome::Handled
    }

    fn delete_forward(&mut self) -> KeyOutcome {
        let offset = self.caret_offset();
        if offset < self.buffer.len_chars() {
            let end = if self.buffer.char_at(offset) == Some('\r')
                && self.buffer.char_at(offset + 1) == Some('\n')
            {
                offset + 2
            } else {
                offset + 1
            };
            self.buffer.remove(offset..end);
        }
        KeyOutcome::Handled
    }

    // Mouse

    /// Place the caret at a clicked position and start a selection there.
    ///
    /// Clicks may land in history; keys are then refused until the caret is
    /// back in the input region.
    pub fn click(&mut self, pos: Cursor) {
        self.caret = self.clamp_to_text(pos);
        self.anchor = Some(self.caret.clone());
    }

    /// Extend the selection to a dragged-over position
    pub fn drag(&mut self, pos: Cursor) {
        if self.anchor.is_none() {
            self.anchor = Some(self.caret.clone());
        }
        self.caret = self.clamp_to_text(pos);
    }

    fn clamp_to_text(&self, pos: Cursor) -> Cursor {
        self.buffer.position_of(self.buffer.offset_of(&pos))
    }

    /// Selected char range, if any
    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.buffer.offset_of(self.anchor.as_ref()?);
        let caret = self.caret_offset();
        (anchor != caret).then(|| anchor.min(caret)..anchor.max(caret))
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selection()
            .map(|range| self.buffer.slice_to_string(range))
    }

    // Context actions

    pub fn is_action_enabled(&self, action: ConsoleAction) -> bool {
        match action {
            ConsoleAction::Clear => true,
            ConsoleAction::Copy => self.selection().is_some(),
        }
    }

    /// Empty the console.
    ///
    /// When the last line is an interpreter prompt the restart marker is put
    /// back so the next input still sits after a prompt.
    pub fn clear(&mut self) {
        let at_prompt = self.buffer.last_line().starts_with(PROMPT_CHAR);
        self.buffer.clear();
        self.anchor = None;
        self.scroll_offset = 0;
        self.col_offset = 0;
        if at_prompt && !self.restart_marker.is_empty() {
            self.buffer.append(&self.restart_marker, TextStyle::Result);
        }
        self.reseed_boundary();
    }
}
