use std::io::{self, Write, stdout};
use std::ops::Range;

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use super::layout::{Layout, Rect};
use crate::app::{App, Focus};
use crate::console::ConsoleWidget;
use crate::editor::{Editor, Mode};
use crate::theme::{Color, Theme};

const GUTTER_WIDTH: u16 = 4;

pub struct Renderer {
    pub width: u16,
    pub height: u16,
}

impl Renderer {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self { width, height })
    }

    pub fn setup() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    pub fn teardown() -> io::Result<()> {
        execute!(
            stdout(),
            SetCursorStyle::DefaultUserShape,
            Show,
            EnableLineWrap,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn layout(&self, app: &App) -> Layout {
        Layout::compute(self.width, self.height, app.console_visible())
    }

    /// Keep the editor caret on screen and the console on new output
    pub fn adjust_scroll(&self, app: &mut App) {
        let layout = self.layout(app);
        app.host.editor.adjust_scroll(layout.editor.height as usize);
        if let (Some(rect), Some(session)) = (layout.console, app.plugin.session_mut()) {
            session
                .widget_mut()
                .follow_output(rect.height as usize, rect.width as usize);
        }
    }

    pub fn render(&self, app: &App) -> io::Result<()> {
        let mut stdout = stdout();
        let theme = &app.theme;
        let layout = self.layout(app);

        // Hide cursor during redraw to prevent flicker
        queue!(stdout, Hide)?;
        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;

        self.render_editor_pane(&mut stdout, &app.host.editor, &layout.editor, theme)?;

        if let (Some(row), Some(rect), Some(session)) =
            (layout.separator, layout.console, app.plugin.session())
        {
            let widget = session.widget();
            let (label, color) = if session.is_running() {
                let label = format!(" {} ", app.plugin.settings().process.executable);
                let color = if app.focus == Focus::Console {
                    theme.pane_border_active
                } else {
                    theme.pane_border
                };
                (label, color)
            } else {
                (" stopped ".to_string(), theme.error)
            };
            self.render_separator(&mut stdout, row, &label, color, theme)?;
            self.render_console_pane(&mut stdout, widget, &rect)?;
        }

        self.render_status_line(&mut stdout, app, layout.status_row, theme)?;
        self.position_cursor(&mut stdout, app, &layout)?;

        stdout.flush()?;
        Ok(())
    }

    fn render_editor_pane(
        &self,
        stdout: &mut impl Write,
        editor: &Editor,
        rect: &Rect,
        theme: &Theme,
    ) -> io::Result<()> {
        let line_count = editor.buffer.line_count();
        let text_width = rect.width.saturating_sub(GUTTER_WIDTH) as usize;
        let selection = editor.selection_range();

        for row in 0..rect.height {
            let line_idx = row as usize + editor.scroll_offset;
            queue!(stdout, MoveTo(rect.x, rect.y + row))?;
            queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;

            if line_idx >= line_count {
                // Empty line indicator
                queue!(stdout, SetForegroundColor(theme.line_number.to_crossterm()))?;
                queue!(stdout, Print("  ~ "))?;
                queue!(stdout, Print(" ".repeat(text_width)))?;
                continue;
            }

            let is_cursor_line = line_idx == editor.cursor.line;
            let line_num = if is_cursor_line {
                line_idx + 1
            } else {
                line_idx.abs_diff(editor.cursor.line)
            };
            let line_num_color = if is_cursor_line {
                theme.line_number_active
            } else {
                theme.line_number
            };
            queue!(stdout, SetForegroundColor(line_num_color.to_crossterm()))?;
            queue!(stdout, Print(format!("{:>3} ", line_num)))?;

            // Selected columns of this line, inclusive of the end
            let selected: Option<Range<usize>> = selection.as_ref().and_then(|(start, end)| {
                if line_idx < start.line || line_idx > end.line {
                    return None;
                }
                let from = if line_idx == start.line { start.col } else { 0 };
                let to = if line_idx == end.line {
                    end.col + 1
                } else {
                    editor.buffer.line_len(line_idx) + 1
                };
                Some(from..to)
            });

            let line_len = editor.buffer.line_len(line_idx);
            let chars: Vec<char> = editor.buffer.line(line_idx).chars().take(line_len).collect();
            let mut col = 0;
            while col < text_width {
                let in_selection = selected.as_ref().is_some_and(|r| r.contains(&col));
                let bg = if in_selection { theme.selection } else { theme.background };
                let mut run = String::new();
                while col < text_width
                    && selected.as_ref().is_some_and(|r| r.contains(&col)) == in_selection
                {
                    run.push(printable(chars.get(col).copied()));
                    col += 1;
                }
                queue!(stdout, SetBackgroundColor(bg.to_crossterm()))?;
                queue!(stdout, SetForegroundColor(theme.foreground.to_crossterm()))?;
                queue!(stdout, Print(run))?;
            }
        }

        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
        Ok(())
    }

    fn render_separator(
        &self,
        stdout: &mut impl Write,
        row: u16,
        label: &str,
        color: Color,
        theme: &Theme,
    ) -> io::Result<()> {
        let width = self.width as usize;
        let mut line: String = format!("──{label}").chars().take(width).collect();
        let used = line.chars().count();
        line.push_str(&"─".repeat(width.saturating_sub(used)));

        queue!(stdout, MoveTo(0, row))?;
        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
        queue!(stdout, SetForegroundColor(color.to_crossterm()))?;
        queue!(stdout, Print(line))?;
        Ok(())
    }

    fn render_console_pane(
        &self,
        stdout: &mut impl Write,
        widget: &ConsoleWidget,
        rect: &Rect,
    ) -> io::Result<()> {
        let palette = widget.palette();
        let buffer = widget.buffer();
        let selection = widget.selection();
        let width = rect.width as usize;
        let first_col = widget.col_offset;
        // Caret cell marked while it sits in read-only history
        let readonly_caret = (!widget.caret_is_editable()).then(|| buffer.offset_of(&widget.caret));

        for row in 0..rect.height {
            let line_idx = row as usize + widget.scroll_offset;
            queue!(stdout, MoveTo(rect.x, rect.y + row))?;

            if line_idx >= buffer.line_count() {
                queue!(stdout, SetBackgroundColor(palette.background.to_crossterm()))?;
                queue!(stdout, Print(" ".repeat(width)))?;
                continue;
            }

            let line_start = buffer.line_start(line_idx);
            let line_len = buffer.line_len(line_idx);
            let chars: Vec<char> = buffer.line(line_idx).chars().take(line_len).collect();

            // Paint runs of equal colours
            let cell = |col: usize| -> (Color, Color) {
                let col = first_col + col;
                let offset = line_start + col;
                let fg = palette.color_for(buffer.style_at(offset));
                let selected = col < line_len
                    && selection.as_ref().is_some_and(|r| r.contains(&offset));
                let bg = if readonly_caret == Some(offset) && col <= line_len {
                    palette.readonly_cursor
                } else if selected {
                    palette.selection
                } else {
                    palette.background
                };
                (fg, bg)
            };

            let mut col = 0;
            while col < width {
                let colors = cell(col);
                let mut run = String::new();
                while col < width && cell(col) == colors {
                    run.push(printable(chars.get(first_col + col).copied()));
                    col += 1;
                }
                queue!(stdout, SetForegroundColor(colors.0.to_crossterm()))?;
                queue!(stdout, SetBackgroundColor(colors.1.to_crossterm()))?;
                queue!(stdout, Print(run))?;
            }
        }

        Ok(())
    }

    fn render_status_line(
        &self,
        stdout: &mut impl Write,
        app: &App,
        status_row: u16,
        theme: &Theme,
    ) -> io::Result<()> {
        let editor = &app.host.editor;
        queue!(stdout, MoveTo(0, status_row))?;

        // Command mode - just show the command
        if editor.mode == Mode::Command {
            queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
            queue!(stdout, SetForegroundColor(theme.foreground.to_crossterm()))?;
            queue!(stdout, Clear(ClearType::CurrentLine))?;
            queue!(stdout, Print(format!(":{}", editor.command_buffer)))?;
            return Ok(());
        }

        // Message - show prominently
        if let Some(ref msg) = editor.message {
            queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;
            queue!(stdout, SetForegroundColor(theme.info.to_crossterm()))?;
            queue!(stdout, Clear(ClearType::CurrentLine))?;
            let msg: String = msg.chars().take(self.width as usize).collect();
            queue!(stdout, Print(msg))?;
            return Ok(());
        }

        queue!(stdout, SetBackgroundColor(theme.status_bar_bg.to_crossterm()))?;
        queue!(stdout, SetForegroundColor(theme.status_bar_fg.to_crossterm()))?;

        let mode = match app.focus {
            Focus::Console if app.console_visible() => "CONSOLE",
            _ => editor.mode.display(),
        };
        let filename = editor
            .buffer
            .path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[No Name]".to_string());
        let dirty = if editor.buffer.is_dirty() { " [+]" } else { "" };
        let console = match app.plugin.session() {
            None => "off",
            Some(session) if session.is_running() => "running",
            Some(_) => "stopped",
        };
        let position = format!("{}:{}", editor.cursor.line + 1, editor.cursor.col + 1);

        let left = format!(" {} | {}{} | console: {} ", mode, filename, dirty, console);
        let right = format!(" {} ", position);

        let used = left.chars().count() + right.chars().count();
        let middle = " ".repeat((self.width as usize).saturating_sub(used));

        let status = format!("{}{}{}", left, middle, right);
        let status: String = status.chars().take(self.width as usize).collect();

        queue!(stdout, SetAttribute(Attribute::Bold))?;
        queue!(stdout, Print(status))?;
        queue!(stdout, SetAttribute(Attribute::Reset))?;
        queue!(stdout, SetBackgroundColor(theme.background.to_crossterm()))?;

        Ok(())
    }

    fn position_cursor(&self, stdout: &mut impl Write, app: &App, layout: &Layout) -> io::Result<()> {
        let editor = &app.host.editor;

        if editor.mode == Mode::Command {
            let cmd_col = 1 + editor.command_buffer.chars().count() as u16;
            queue!(stdout, MoveTo(cmd_col, layout.status_row))?;
            queue!(stdout, SetCursorStyle::BlinkingBar)?;
            queue!(stdout, Show)?;
            return Ok(());
        }

        if app.focus == Focus::Console {
            if let (Some(rect), Some(session)) = (layout.console, app.plugin.session()) {
                let widget = session.widget();
                let caret = &widget.caret;
                let visible = caret.line >= widget.scroll_offset
                    && caret.line < widget.scroll_offset + rect.height as usize
                    && caret.col >= widget.col_offset
                    && caret.col < widget.col_offset + rect.width as usize;
                if !visible {
                    queue!(stdout, Hide)?;
                    return Ok(());
                }
                let x = rect.x + (caret.col - widget.col_offset) as u16;
                let y = rect.y + (caret.line - widget.scroll_offset) as u16;
                queue!(stdout, MoveTo(x, y))?;
                let style = if widget.caret_is_editable() && widget.is_enabled() {
                    SetCursorStyle::BlinkingBar
                } else {
                    SetCursorStyle::SteadyUnderScore
                };
                queue!(stdout, style)?;
                queue!(stdout, Show)?;
                return Ok(());
            }
        }

        let rect = layout.editor;
        if editor.cursor.line < editor.scroll_offset {
            queue!(stdout, Hide)?;
            return Ok(());
        }
        let cursor_x = rect.x + GUTTER_WIDTH + editor.cursor.col as u16;
        let cursor_y = rect.y + (editor.cursor.line - editor.scroll_offset) as u16;
        queue!(stdout, MoveTo(cursor_x, cursor_y))?;

        let cursor_style = match editor.mode {
            Mode::Insert => SetCursorStyle::BlinkingBar,
            _ => SetCursorStyle::SteadyBlock,
        };
        queue!(stdout, cursor_style)?;
        queue!(stdout, Show)?;
        Ok(())
    }
}

/// Character drawn for a cell; tabs and past-the-end cells are blank
fn printable(ch: Option<char>) -> char {
    match ch {
        Some(c) if !c.is_control() => c,
        _ => ' ',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_chars_print_as_blanks() {
        assert_eq!(printable(Some('a')), 'a');
        assert_eq!(printable(Some('\t')), ' ');
        assert_eq!(printable(None), ' ');
    }
}
