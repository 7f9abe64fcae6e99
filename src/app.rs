use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::Settings;
use crate::editor::{Editor, EditorRequest};
use crate::host::{CommandId, HostEditor, HostNotification, PluginAdapter, PluginCommands};
use crate::process::ChannelEvent;
use crate::theme::{self, Theme};

/// Which pane receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Console,
}

/// The editor side of the plugin boundary
pub struct Host {
    pub editor: Editor,
    checked: HashSet<CommandId>,
    disabled: HashSet<CommandId>,
}

impl Host {
    pub fn new(editor: Editor) -> Self {
        Self {
            editor,
            checked: HashSet::new(),
            disabled: HashSet::new(),
        }
    }

    pub fn is_checked(&self, command: CommandId) -> bool {
        self.checked.contains(&command)
    }

    pub fn is_enabled(&self, command: CommandId) -> bool {
        !self.disabled.contains(&command)
    }
}

impl HostEditor for Host {
    fn selection_text(&self) -> Option<String> {
        self.editor.selection_text()
    }

    fn selection_is_empty(&self) -> bool {
        self.editor.selection_is_empty()
    }

    fn set_menu_check(&mut self, command: CommandId, checked: bool) {
        if checked {
            self.checked.insert(command);
        } else {
            self.checked.remove(&command);
        }
    }

    fn set_command_enabled(&mut self, command: CommandId, enabled: bool) {
        if enabled {
            self.disabled.remove(&command);
        } else {
            self.disabled.insert(command);
        }
    }

    fn show_message(&mut self, message: &str) {
        self.editor.set_message(message);
    }
}

/// Everything the main loop drives
pub struct App {
    pub host: Host,
    pub plugin: PluginAdapter,
    pub theme: Theme,
    pub focus: Focus,
}

impl App {
    pub fn new(editor: Editor, settings: Settings, events: UnboundedSender<ChannelEvent>) -> Self {
        let theme = theme::get_builtin_theme(&settings.editor.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %settings.editor.theme, "unknown theme, using default");
            Theme::default()
        });
        let plugin = PluginAdapter::new(settings, theme.console, events);
        let mut app = Self {
            host: Host::new(editor),
            plugin,
            theme,
            focus: Focus::Editor,
        };
        app.notify(HostNotification::Ready);
        app
    }

    pub fn is_running(&self) -> bool {
        self.host.editor.running
    }

    pub fn console_visible(&self) -> bool {
        self.plugin.is_visible()
    }

    pub fn notify(&mut self, notification: HostNotification) {
        self.plugin.on_notification(&mut self.host, notification);
    }

    /// Run a plugin command, skipping ones the plugin disabled
    pub fn invoke(&mut self, command: CommandId) {
        if !self.host.is_enabled(command) {
            self.host.show_message(&format!("{}: nothing to do", command.label()));
            return;
        }
        self.plugin.invoke(&mut self.host, command);
        self.focus = match command {
            CommandId::ToggleSession if self.console_visible() => Focus::Console,
            _ if !self.console_visible() => Focus::Editor,
            _ => self.focus,
        };
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor if self.console_visible() => Focus::Console,
            _ => Focus::Editor,
        };
    }

    pub fn set_theme(&mut self, name: &str) {
        match theme::get_builtin_theme(name) {
            Some(theme) => {
                self.theme = theme;
                self.notify(HostNotification::ThemeChanged(name.to_string()));
            }
            None => self.host.show_message(&format!("Unknown theme: {name}")),
        }
    }

    pub fn handle_request(&mut self, request: EditorRequest) {
        match request {
            EditorRequest::SetTheme(name) => self.set_theme(&name),
            EditorRequest::ToggleConsole => self.invoke(CommandId::ToggleSession),
            EditorRequest::SendSelection => self.invoke(CommandId::SendSelection),
        }
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        self.plugin.handle_event(event);
    }

    /// Periodic work between events
    pub fn tick(&mut self) {
        self.plugin.poll(&mut self.host);
        if !self.console_visible() {
            self.focus = Focus::Editor;
        }
    }

    pub fn shutdown(&mut self) {
        self.notify(HostNotification::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn app(executable: &str) -> App {
        let mut settings = Settings::default();
        settings.process.executable = executable.to_string();
        settings.process.arguments = String::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Editor::new(), settings, tx)
    }

    #[test]
    fn ready_disables_send_without_selection() {
        let app = app("cat");
        assert!(!app.host.is_enabled(CommandId::SendSelection));
        assert!(app.host.is_enabled(CommandId::ToggleSession));
        assert!(!app.host.is_checked(CommandId::ToggleSession));
    }

    #[test]
    fn disabled_command_is_not_run() {
        let mut app = app("cat");
        app.invoke(CommandId::SendSelection);
        assert!(app.plugin.session().is_none());
        assert_eq!(
            app.host.editor.message.as_deref(),
            Some("Send selection: nothing to do")
        );
    }

    #[cfg(unix)]
    #[test]
    fn toggle_moves_focus_with_console() {
        let mut app = app("cat");
        app.invoke(CommandId::ToggleSession);
        assert!(app.console_visible());
        assert_eq!(app.focus, Focus::Console);
        assert!(app.host.is_checked(CommandId::ToggleSession));

        app.switch_focus();
        assert_eq!(app.focus, Focus::Editor);

        app.invoke(CommandId::ToggleSession);
        assert!(!app.console_visible());
        assert_eq!(app.focus, Focus::Editor);
        app.shutdown();
    }

    #[test]
    fn switch_focus_needs_visible_console() {
        let mut app = app("cat");
        app.switch_focus();
        assert_eq!(app.focus, Focus::Editor);
    }

    #[test]
    fn theme_request_updates_theme() {
        let mut app = app("cat");
        app.handle_request(EditorRequest::SetTheme("dracula".to_string()));
        assert_eq!(app.theme.name, "dracula");
        assert_eq!(app.plugin.settings().editor.theme, "dracula");

        app.handle_request(EditorRequest::SetTheme("missing".to_string()));
        assert_eq!(app.theme.name, "dracula");
        assert_eq!(app.host.editor.message.as_deref(), Some("Unknown theme: missing"));
    }
}
