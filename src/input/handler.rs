use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, Focus};
use crate::console::ConsoleAction;
use crate::editor::{Cursor, Editor, EditorRequest, Mode};
use crate::host::{HostNotification, command_for};
use crate::render::Layout;

/// Lines moved per wheel notch or page key in the console
const SCROLL_STEP: isize = 3;

pub fn handle_event(app: &mut App, event: Event, layout: &Layout) {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            // Clear any message on keypress
            app.host.editor.clear_message();
            handle_key(app, key, layout);
        }
        Event::Mouse(mouse) => handle_mouse(app, mouse, layout),
        Event::Resize(_, _) => {
            // Resize is handled by the renderer
        }
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent, layout: &Layout) {
    if let Some(command) = command_for(&key) {
        app.invoke(command);
        return;
    }
    if key.code == KeyCode::Char('w') && key.modifiers == KeyModifiers::ALT {
        app.switch_focus();
        return;
    }

    match app.focus {
        Focus::Console if app.console_visible() => handle_console_key(app, key, layout),
        _ => handle_editor_key(app, key),
    }
}

fn handle_console_key(app: &mut App, key: KeyEvent, layout: &Layout) {
    let (viewport, width) = layout
        .console
        .map_or((0, 0), |rect| (rect.height as usize, rect.width as usize));
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('l') if ctrl => app.plugin.console_action(&mut app.host, ConsoleAction::Clear),
        KeyCode::Char('c') if alt => app.plugin.console_action(&mut app.host, ConsoleAction::Copy),
        KeyCode::Esc => app.focus = Focus::Editor,
        KeyCode::PageUp | KeyCode::PageDown => {
            if let Some(session) = app.plugin.session_mut() {
                let lines = if key.code == KeyCode::PageUp {
                    -(viewport as isize)
                } else {
                    viewport as isize
                };
                session.widget_mut().scroll_by(lines, viewport);
            }
        }
        _ => {
            if let Some(session) = app.plugin.session_mut() {
                session.handle_key(key);
                session.widget_mut().adjust_scroll(viewport, width);
            }
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, layout: &Layout) {
    let Some(rect) = layout.console else {
        return;
    };
    if !rect.contains(mouse.column, mouse.row) {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            app.focus = Focus::Editor;
        }
        return;
    }
    let Some(session) = app.plugin.session_mut() else {
        return;
    };
    let widget = session.widget_mut();
    let pos = Cursor::at(
        (mouse.row - rect.y) as usize + widget.scroll_offset,
        (mouse.column - rect.x) as usize + widget.col_offset,
    );

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            widget.click(pos);
            app.focus = Focus::Console;
        }
        MouseEventKind::Drag(MouseButton::Left) => widget.drag(pos),
        // Shift turns the wheel sideways on terminals without horizontal scroll
        MouseEventKind::ScrollUp if mouse.modifiers.contains(KeyModifiers::SHIFT) => {
            widget.scroll_columns(-SCROLL_STEP)
        }
        MouseEventKind::ScrollDown if mouse.modifiers.contains(KeyModifiers::SHIFT) => {
            widget.scroll_columns(SCROLL_STEP)
        }
        MouseEventKind::ScrollUp => widget.scroll_by(-SCROLL_STEP, rect.height as usize),
        MouseEventKind::ScrollDown => widget.scroll_by(SCROLL_STEP, rect.height as usize),
        MouseEventKind::ScrollLeft => widget.scroll_columns(-SCROLL_STEP),
        MouseEventKind::ScrollRight => widget.scroll_columns(SCROLL_STEP),
        _ => {}
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    let had_selection = !app.host.editor.selection_is_empty();

    let editor = &mut app.host.editor;
    match editor.mode {
        Mode::Normal => handle_normal_mode(editor, key),
        Mode::Insert => handle_insert_mode(editor, key),
        Mode::Visual => handle_visual_mode(editor, key),
        Mode::Command => {
            if let Some(request) = handle_command_mode(editor, key) {
                app.handle_request(request);
            }
            // A command run from visual mode consumes the selection
            if app.host.editor.mode == Mode::Normal {
                app.host.editor.enter_normal_mode();
            }
        }
    }

    if had_selection != !app.host.editor.selection_is_empty() {
        app.notify(HostNotification::SelectionChanged);
    }
}

fn handle_normal_mode(editor: &mut Editor, key: KeyEvent) {
    match key.code {
        // Quick quit with Ctrl-C
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.quit();
        }

        KeyCode::Char('i') => editor.enter_insert_mode(),
        KeyCode::Char('a') => editor.append(),
        KeyCode::Char('A') => editor.append_end_of_line(),
        KeyCode::Char('o') => editor.open_line_below(),
        KeyCode::Char('v') => editor.enter_visual_mode(),

        // Command mode
        KeyCode::Char(':') => editor.enter_command_mode(),

        _ => handle_motion(editor, key),
    }
}

fn handle_visual_mode(editor: &mut Editor, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('v') => editor.enter_normal_mode(),
        // Keep the selection for `:send`
        KeyCode::Char(':') => editor.enter_command_mode(),
        _ => handle_motion(editor, key),
    }
}

fn handle_motion(editor: &mut Editor, key: KeyEvent) {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => editor.move_left(),
        KeyCode::Char('j') | KeyCode::Down => editor.move_down(),
        KeyCode::Char('k') | KeyCode::Up => editor.move_up(),
        KeyCode::Char('l') | KeyCode::Right => editor.move_right(),

        KeyCode::Char('0') | KeyCode::Home => editor.move_to_line_start(),
        KeyCode::Char('$') | KeyCode::End => editor.move_to_line_end(),
        KeyCode::Char('g') => editor.move_to_first_line(),
        KeyCode::Char('G') => editor.move_to_last_line(),

        _ => {}
    }
}

fn handle_insert_mode(editor: &mut Editor, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => editor.enter_normal_mode(),

        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            editor.insert_char(c);
        }
        KeyCode::Tab => editor.insert_char('\t'),

        KeyCode::Backspace => {
            editor.delete_char_backward();
        }

        KeyCode::Enter => {
            editor.insert_newline();
        }

        KeyCode::Left => editor.move_left(),
        KeyCode::Right => editor.move_right(),
        KeyCode::Up => editor.move_up(),
        KeyCode::Down => editor.move_down(),

        _ => {}
    }
}

fn handle_command_mode(editor: &mut Editor, key: KeyEvent) -> Option<EditorRequest> {
    match key.code {
        KeyCode::Esc => {
            editor.enter_normal_mode();
        }

        KeyCode::Enter => return editor.execute_command(),

        KeyCode::Backspace => {
            editor.command_buffer.pop();
            if editor.command_buffer.is_empty() {
                editor.enter_normal_mode();
            }
        }

        KeyCode::Char(c) => {
            editor.command_buffer.push(c);
        }

        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::host::CommandId;
    use tokio::sync::mpsc;

    fn app() -> App {
        let mut settings = Settings::default();
        settings.process.executable = "cat".to_string();
        settings.process.arguments = String::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let editor = Editor::new();
        App::new(editor, settings, tx)
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        let layout = Layout::compute(80, 24, app.console_visible());
        handle_event(app, Event::Key(KeyEvent::new(code, modifiers)), &layout);
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn visual_selection_enables_send() {
        let mut app = app();
        type_str(&mut app, "i1+1");
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.host.is_enabled(CommandId::SendSelection));

        type_str(&mut app, "0vl");
        assert_eq!(app.host.editor.selection_text().as_deref(), Some("1+"));
        assert!(app.host.is_enabled(CommandId::SendSelection));

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.host.is_enabled(CommandId::SendSelection));
    }

    #[test]
    fn theme_command_reaches_app() {
        let mut app = app();
        type_str(&mut app, ":theme nord");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.theme.name, "nord");
        assert_eq!(app.host.editor.mode, Mode::Normal);
    }

    #[test]
    fn alt_w_without_console_keeps_editor_focus() {
        let mut app = app();
        press(&mut app, KeyCode::Char('w'), KeyModifiers::ALT);
        assert_eq!(app.focus, Focus::Editor);
    }

    #[test]
    fn ctrl_c_quits_from_normal_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(!app.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn console_focus_routes_typing_to_widget() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'), KeyModifiers::ALT);
        assert_eq!(app.focus, Focus::Console);

        type_str(&mut app, "1+1");
        let session = app.plugin.session().unwrap();
        assert_eq!(session.widget().pending_command(), "1+1");
        assert!(app.host.editor.buffer.line(0).to_string().is_empty());

        press(&mut app, KeyCode::Char('l'), KeyModifiers::CONTROL);
        assert!(app.plugin.session().unwrap().widget().buffer().is_empty());
        app.shutdown();
    }

    #[cfg(unix)]
    #[test]
    fn shift_wheel_scrolls_console_sideways() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'), KeyModifiers::ALT);
        let wide = format!("{}\n", "x".repeat(200));
        app.plugin
            .session_mut()
            .unwrap()
            .widget_mut()
            .append(&wide, crate::console::TextStyle::Result);

        let layout = Layout::compute(80, 24, app.console_visible());
        let rect = layout.console.unwrap();
        let wheel = |kind, modifiers| {
            Event::Mouse(MouseEvent {
                kind,
                column: rect.x + 1,
                row: rect.y,
                modifiers,
            })
        };

        handle_event(&mut app, wheel(MouseEventKind::ScrollDown, KeyModifiers::SHIFT), &layout);
        assert_eq!(app.plugin.session().unwrap().widget().col_offset, SCROLL_STEP as usize);

        handle_event(&mut app, wheel(MouseEventKind::Down(MouseButton::Left), KeyModifiers::NONE), &layout);
        let caret = app.plugin.session().unwrap().widget().caret.clone();
        assert_eq!(caret.col, 1 + SCROLL_STEP as usize);
        app.shutdown();
    }

    #[cfg(unix)]
    #[test]
    fn send_selection_from_visual_mode() {
        let mut app = app();
        type_str(&mut app, "i1+1");
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        type_str(&mut app, "0v$");
        press(&mut app, KeyCode::Char('s'), KeyModifiers::ALT);

        let session = app.plugin.session().unwrap();
        assert_eq!(
            session.widget().buffer().to_string(),
            format!("1+1;;{}", crate::console::LINE_ENDING)
        );
        app.shutdown();
    }
}
