use std::{io, path::PathBuf};

use super::{Buffer, Cursor, Mode};

/// Commands typed on the `:` line that the editor hands to its host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorRequest {
    /// `:theme <name>`
    SetTheme(String),
    /// `:console`
    ToggleConsole,
    /// `:send`
    SendSelection,
}

/// The host editor: one buffer, modal editing, a visual selection
pub struct Editor {
    pub buffer: Buffer,
    pub cursor: Cursor,
    pub mode: Mode,
    pub command_buffer: String,
    pub running: bool,
    pub message: Option<String>,
    pub scroll_offset: usize,
    visual_anchor: Option<Cursor>,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_buffer(Buffer::new())
    }

    pub fn open(path: PathBuf) -> io::Result<Self> {
        Ok(Self::with_buffer(Buffer::from_file(path)?))
    }

    fn with_buffer(buffer: Buffer) -> Self {
        Self {
            buffer,
            cursor: Cursor::new(),
            mode: Mode::default(),
            command_buffer: String::new(),
            running: true,
            message: None,
            scroll_offset: 0,
            visual_anchor: None,
        }
    }

    /// Adjust scroll offset to keep cursor visible within viewport
    pub fn adjust_scroll(&mut self, viewport_height: usize) {
        if self.cursor.line < self.scroll_offset {
            self.scroll_offset = self.cursor.line;
        }
        if viewport_height > 0 && self.cursor.line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor.line - viewport_height + 1;
        }
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    // Selection

    /// Selected text in visual mode
    pub fn selection_text(&self) -> Option<String> {
        let anchor = self.visual_anchor.as_ref()?;
        let text = self.buffer.text_between(anchor, &self.cursor);
        (!text.is_empty()).then_some(text)
    }

    pub fn selection_is_empty(&self) -> bool {
        self.selection_text().is_none()
    }

    /// Ordered (start, end) of the selection, both inclusive
    pub fn selection_range(&self) -> Option<(Cursor, Cursor)> {
        let anchor = self.visual_anchor.clone()?;
        let cursor = self.cursor.clone();
        Some((anchor.clone().min(cursor.clone()), anchor.max(cursor)))
    }

    pub fn enter_visual_mode(&mut self) {
        self.visual_anchor = Some(self.cursor.clone());
        self.mode = Mode::Visual;
    }

    // Movement

    pub fn move_left(&mut self) {
        self.cursor.move_left();
    }

    pub fn move_right(&mut self) {
        let line_len = self.buffer.line_len(self.cursor.line);
        self.cursor.move_right(line_len);
    }

    pub fn move_up(&mut self) {
        self.cursor.move_up();
        self.clamp_cursor_col();
    }

    pub fn move_down(&mut self) {
        self.cursor.move_down(self.buffer.line_count());
        self.clamp_cursor_col();
    }

    fn clamp_cursor_col(&mut self) {
        let line_len = self.buffer.line_len(self.cursor.line);
        if self.cursor.col > line_len {
            self.cursor.col = line_len;
        }
    }

    pub fn move_to_line_start(&mut self) {
        self.cursor.col = 0;
    }

    pub fn move_to_line_end(&mut self) {
        self.cursor.col = self.buffer.line_len(self.cursor.line).saturating_sub(1);
    }

    pub fn move_to_first_line(&mut self) {
        self.cursor.line = 0;
        self.clamp_cursor_col();
    }

    pub fn move_to_last_line(&mut self) {
        self.cursor.line = self.buffer.line_count().saturating_sub(1);
        self.clamp_cursor_col();
    }

    // Modes

    pub fn enter_insert_mode(&mut self) {
        self.mode = Mode::Insert;
    }

    /// Append after cursor (a)
    pub fn append(&mut self) {
        let line_len = self.buffer.line_len(self.cursor.line);
        if self.cursor.col < line_len {
            self.cursor.col += 1;
        }
        self.enter_insert_mode();
    }

    /// Append at end of line (A)
    pub fn append_end_of_line(&mut self) {
        self.cursor.col = self.buffer.line_len(self.cursor.line);
        self.enter_insert_mode();
    }

    /// Open line below (o)
    pub fn open_line_below(&mut self) {
        self.cursor.col = self.buffer.line_len(self.cursor.line);
        self.buffer.insert_newline(self.cursor.line, self.cursor.col);
        self.cursor.line += 1;
        self.cursor.col = 0;
        self.enter_insert_mode();
    }

    pub fn enter_normal_mode(&mut self) {
        self.mode = Mode::Normal;
        self.visual_anchor = None;
        self.command_buffer.clear();
        self.clamp_cursor_col();
    }

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_buffer.clear();
    }

    /// Run the `:` command line
    pub fn execute_command(&mut self) -> Option<EditorRequest> {
        let cmd = self.command_buffer.trim().to_string();
        self.command_buffer.clear();
        self.mode = Mode::Normal;

        let (name, arg) = match cmd.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (cmd.as_str(), ""),
        };

        match name {
            "q" | "quit" => self.quit(),
            "w" | "write" => match self.save() {
                Ok(_) => self.set_message("Written"),
                Err(e) => self.set_message(format!("Error: {}", e)),
            },
            "wq" => match self.save() {
                Ok(_) => self.quit(),
                Err(e) => self.set_message(format!("Error: {}", e)),
            },
            "theme" if !arg.is_empty() => return Some(EditorRequest::SetTheme(arg.to_string())),
            "console" => return Some(EditorRequest::ToggleConsole),
            "send" => return Some(EditorRequest::SendSelection),
            "" => {}
            _ => self.set_message(format!("Unknown command: {}", cmd)),
        }
        None
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn save(&mut self) -> io::Result<()> {
        self.buffer.save()
    }

    // Text editing

    pub fn insert_char(&mut self, ch: char) {
        self.buffer
            .insert_char(self.cursor.line, self.cursor.col, ch);
        self.cursor.col += 1;
    }

    pub fn delete_char_backward(&mut self) {
        if self.cursor.col > 0 {
            self.buffer
                .delete_char_backward(self.cursor.line, self.cursor.col);
            self.cursor.col -= 1;
        } else if self.cursor.line > 0 {
            // Join with previous line
            let prev_line_len = self.buffer.line_len(self.cursor.line - 1);
            self.buffer
                .delete_char_backward(self.cursor.line, self.cursor.col);
            self.cursor.line -= 1;
            self.cursor.col = prev_line_len;
        }
    }

    pub fn insert_newline(&mut self) {
        self.buffer
            .insert_newline(self.cursor.line, self.cursor.col);
        self.cursor.line += 1;
        self.cursor.col = 0;
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with_text(s: &str) -> Editor {
        Editor::with_buffer(Buffer::from_text(s))
    }

    #[test]
    fn visual_mode_selects_inclusive_range() {
        let mut editor = editor_with_text("let x = 5\nx + 1");
        editor.cursor = Cursor::at(0, 4);
        editor.enter_visual_mode();
        for _ in 0..4 {
            editor.move_right();
        }
        assert_eq!(editor.mode, Mode::Visual);
        assert_eq!(editor.selection_text().as_deref(), Some("x = 5"));
        assert!(!editor.selection_is_empty());
    }

    #[test]
    fn selection_works_backwards() {
        let mut editor = editor_with_text("let x = 5\nx + 1");
        editor.cursor = Cursor::at(1, 4);
        editor.enter_visual_mode();
        editor.move_up();
        editor.move_to_line_start();
        assert_eq!(editor.selection_text().as_deref(), Some("let x = 5\nx + 1"));
        assert_eq!(
            editor.selection_range(),
            Some((Cursor::at(0, 0), Cursor::at(1, 4)))
        );
    }

    #[test]
    fn normal_mode_has_no_selection() {
        let mut editor = editor_with_text("abc");
        assert!(editor.selection_is_empty());
        editor.enter_visual_mode();
        editor.enter_normal_mode();
        assert!(editor.selection_text().is_none());
    }

    #[test]
    fn empty_buffer_selection_is_empty() {
        let mut editor = Editor::new();
        editor.enter_visual_mode();
        assert!(editor.selection_is_empty());
    }

    #[test]
    fn move_down_clamps_col_to_shorter_line() {
        let mut editor = editor_with_text("hello world\nhi");
        editor.cursor.col = 10;
        editor.move_down();
        assert_eq!(editor.cursor, Cursor::at(1, 2));
    }

    #[test]
    fn insert_and_backspace_join_lines() {
        let mut editor = editor_with_text("ab");
        editor.append_end_of_line();
        editor.insert_newline();
        editor.insert_char('c');
        assert_eq!(editor.buffer.line_count(), 2);
        editor.delete_char_backward();
        editor.delete_char_backward();
        assert_eq!(editor.cursor, Cursor::at(0, 2));
        assert_eq!(editor.buffer.line(0).to_string(), "ab");
    }

    #[test]
    fn execute_command_q_quits() {
        let mut editor = Editor::new();
        editor.command_buffer = "q".to_string();
        assert_eq!(editor.execute_command(), None);
        assert!(!editor.running);
    }

    #[test]
    fn theme_command_is_handed_to_host() {
        let mut editor = Editor::new();
        editor.command_buffer = "theme nord".to_string();
        assert_eq!(
            editor.execute_command(),
            Some(EditorRequest::SetTheme("nord".to_string()))
        );
        assert_eq!(editor.mode, Mode::Normal);
    }

    #[test]
    fn console_and_send_commands_are_handed_to_host() {
        let mut editor = Editor::new();
        editor.command_buffer = "console".to_string();
        assert_eq!(editor.execute_command(), Some(EditorRequest::ToggleConsole));
        editor.command_buffer = "send".to_string();
        assert_eq!(editor.execute_command(), Some(EditorRequest::SendSelection));
    }

    #[test]
    fn unknown_command_sets_message() {
        let mut editor = Editor::new();
        editor.mode = Mode::Command;
        editor.command_buffer = "frobnicate".to_string();
        editor.execute_command();
        assert_eq!(editor.mode, Mode::Normal);
        assert_eq!(editor.message.as_deref(), Some("Unknown command: frobnicate"));
    }

    #[test]
    fn adjust_scroll_follows_cursor() {
        let mut editor = editor_with_text("1\n2\n3\n4\n5\n6\n7\n8\n9\n10");
        editor.cursor.line = 8;
        editor.adjust_scroll(5);
        assert_eq!(editor.scroll_offset, 4);
        editor.cursor.line = 2;
        editor.adjust_scroll(5);
        assert_eq!(editor.scroll_offset, 2);
    }
}
