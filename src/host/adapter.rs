use tokio::sync::mpsc::UnboundedSender;

use super::clipboard::{Clipboard, ClipboardError};
use super::commands::{CommandId, HostEditor, HostNotification, PluginCommands};
use crate::config::{ConfigError, Settings};
use crate::console::ConsoleAction;
use crate::process::ChannelEvent;
use crate::session::{Session, SessionNotification};
use crate::theme::{self, ConsolePalette};

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The plugin as the host sees it.
///
/// Owns at most one [`Session`], created on first use and stopped on host
/// shutdown.
pub struct PluginAdapter {
    settings: Settings,
    palette: ConsolePalette,
    events: UnboundedSender<ChannelEvent>,
    session: Option<Session>,
    visible: bool,
    clipboard: Option<Clipboard>,
}

impl PluginAdapter {
    pub fn new(settings: Settings, palette: ConsolePalette, events: UnboundedSender<ChannelEvent>) -> Self {
        Self {
            settings,
            palette,
            events,
            session: None,
            visible: false,
            clipboard: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Whether the console pane is shown
    pub fn is_visible(&self) -> bool {
        self.visible && self.session.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create and start the session on first use, otherwise show or hide it
    pub fn toggle_session(&mut self, host: &mut dyn HostEditor) {
        if self.session.is_none() {
            self.session = Some(self.start_new_session(host));
            self.visible = true;
        } else {
            self.visible = !self.visible;
            if self.visible {
                self.restart_if_exited(host);
            }
        }
        host.set_menu_check(CommandId::ToggleSession, self.visible);
    }

    fn start_new_session(&self, host: &mut dyn HostEditor) -> Session {
        let mut session = Session::new(
            self.settings.clone(),
            self.palette,
            self.events.clone(),
        );
        if let Err(e) = session.try_start() {
            host.show_message(&format!("Could not start interpreter: {e}"));
        }
        session
    }

    /// The session, created and shown if there is none yet
    fn ensure_session(&mut self, host: &mut dyn HostEditor) -> &mut Session {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                self.visible = true;
                host.set_menu_check(CommandId::ToggleSession, true);
                self.start_new_session(host)
            }
        };
        self.session.insert(session)
    }

    /// Send the host's selection as one statement
    pub fn send_selection(&mut self, host: &mut dyn HostEditor) {
        let Some(text) = host.selection_text().filter(|t| !t.is_empty()) else {
            host.show_message("Nothing selected");
            return;
        };
        self.send_statement(host, &text);
    }

    fn send_statement(&mut self, host: &mut dyn HostEditor, text: &str) {
        let echo = self.settings.editor.echo_sent_text;
        let session = self.ensure_session(host);
        if !session.is_running() {
            host.show_message("Interpreter is not running");
            return;
        }
        if let Err(e) = session.send_text(text, true, echo) {
            host.show_message(&e.to_string());
        }
    }

    /// Persist the current settings and tell the user where they went
    pub fn show_configuration(&mut self, host: &mut dyn HostEditor) {
        let saved = Settings::store_path()
            .ok_or(ConfigError::NoConfigDir)
            .and_then(|path| self.settings.save_to(&path).map(|()| path));
        match saved {
            Ok(path) => host.show_message(&format!(
                "{} (saved to {})",
                self.settings.summary(),
                path.display()
            )),
            Err(e) => {
                tracing::warn!("saving settings failed: {e}");
                host.show_message(&e.to_string());
            }
        }
    }

    pub fn show_about(&mut self, host: &mut dyn HostEditor) {
        host.show_message(&format!(
            "{NAME} {VERSION}: interactive console for {}",
            self.settings.process.executable
        ));
    }

    pub fn on_notification(&mut self, host: &mut dyn HostEditor, notification: HostNotification) {
        tracing::debug!(?notification, "host notification");
        match notification {
            HostNotification::Ready => self.on_ready(host),
            HostNotification::Shutdown => self.on_shutdown(),
            HostNotification::ThemeChanged(name) => self.on_theme_changed(host, &name),
            HostNotification::SelectionChanged => {
                host.set_command_enabled(CommandId::SendSelection, !host.selection_is_empty());
            }
        }
    }

    fn on_ready(&mut self, host: &mut dyn HostEditor) {
        host.set_menu_check(CommandId::ToggleSession, false);
        host.set_command_enabled(CommandId::SendSelection, !host.selection_is_empty());
    }

    fn on_shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
        self.visible = false;
    }

    fn on_theme_changed(&mut self, host: &mut dyn HostEditor, name: &str) {
        let Some(theme) = theme::get_builtin_theme(name) else {
            host.show_message(&format!("Unknown theme: {name}"));
            return;
        };
        self.settings.editor.theme = name.to_string();
        self.palette = theme.console;
        if let Some(session) = self.session.as_mut() {
            session.widget_mut().set_palette(self.palette);
        }
    }

    /// Run a console context action
    pub fn console_action(&mut self, host: &mut dyn HostEditor, action: ConsoleAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.widget().is_action_enabled(action) {
            return;
        }
        match action {
            ConsoleAction::Clear => session.widget_mut().clear(),
            ConsoleAction::Copy => {
                let Some(text) = session.widget().selected_text() else {
                    return;
                };
                let copied = self.clipboard().and_then(|clipboard| clipboard.set_text(&text));
                if let Err(e) = copied {
                    tracing::warn!("{e}");
                    host.show_message(&e.to_string());
                }
            }
        }
    }

    fn clipboard(&mut self) -> Result<&mut Clipboard, ClipboardError> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };
        Ok(self.clipboard.insert(clipboard))
    }

    /// Apply one chunk of interpreter output
    pub fn handle_event(&mut self, event: ChannelEvent) {
        if let Some(session) = self.session.as_mut() {
            session.handle_event(event);
        }
    }

    /// Periodic check for an interpreter that exited on its own
    pub fn poll(&mut self, host: &mut dyn HostEditor) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.poll();
        for notification in session.drain_notifications() {
            if notification == SessionNotification::SessionExited {
                host.show_message("Interpreter exited; hide and show the console to restart");
            }
        }
    }

    /// Start a fresh interpreter, with current settings, if the last one exited
    fn restart_if_exited(&mut self, host: &mut dyn HostEditor) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_running() {
            return;
        }
        session.stop();
        session.apply_settings(self.settings.clone());
        if !session.start() {
            host.show_message("Could not restart interpreter; see the log for details");
        }
    }
}

impl PluginCommands for PluginAdapter {
    fn invoke(&mut self, host: &mut dyn HostEditor, command: CommandId) {
        tracing::debug!(?command, "invoke");
        match command {
            CommandId::ToggleSession => self.toggle_session(host),
            CommandId::SendSelection => self.send_selection(host),
            CommandId::ShowConfiguration => self.show_configuration(host),
            CommandId::ShowAbout => self.show_about(host),
        }
    }

    fn send_text(&mut self, host: &mut dyn HostEditor, text: &str) {
        if !text.is_empty() {
            self.send_statement(host, text);
        }
    }

    fn show_config(&mut self, host: &mut dyn HostEditor) {
        self.show_configuration(host);
    }

    fn show_about(&mut self, host: &mut dyn HostEditor) {
        PluginAdapter::show_about(self, host);
    }
}
