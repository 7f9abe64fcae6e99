use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Commands the plugin registers with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    ToggleSession,
    SendSelection,
    ShowConfiguration,
    ShowAbout,
}

impl CommandId {
    pub fn label(&self) -> &'static str {
        match self {
            CommandId::ToggleSession => "Toggle console",
            CommandId::SendSelection => "Send selection",
            CommandId::ShowConfiguration => "Configuration",
            CommandId::ShowAbout => "About",
        }
    }
}

/// A key chord bound to a plugin command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub command: CommandId,
    pub modifiers: KeyModifiers,
    pub code: KeyCode,
}

impl ShortcutBinding {
    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.kind != KeyEventKind::Release && key.modifiers == self.modifiers && key.code == self.code
    }
}

pub static SHORTCUTS: [ShortcutBinding; 4] = [
    ShortcutBinding {
        command: CommandId::ToggleSession,
        modifiers: KeyModifiers::ALT,
        code: KeyCode::Char('t'),
    },
    ShortcutBinding {
        command: CommandId::SendSelection,
        modifiers: KeyModifiers::ALT,
        code: KeyCode::Char('s'),
    },
    ShortcutBinding {
        command: CommandId::ShowConfiguration,
        modifiers: KeyModifiers::ALT,
        code: KeyCode::Char('p'),
    },
    ShortcutBinding {
        command: CommandId::ShowAbout,
        modifiers: KeyModifiers::ALT,
        code: KeyCode::Char('i'),
    },
];

/// Look up the command bound to a key, if any
pub fn command_for(key: &KeyEvent) -> Option<CommandId> {
    SHORTCUTS
        .iter()
        .find(|binding| binding.matches(key))
        .map(|binding| binding.command)
}

/// Events the host reports to the plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification {
    Ready,
    Shutdown,
    ThemeChanged(String),
    SelectionChanged,
}

/// What the plugin needs from the editor hosting it
pub trait HostEditor {
    fn selection_text(&self) -> Option<String>;
    fn selection_is_empty(&self) -> bool;
    fn set_menu_check(&mut self, command: CommandId, checked: bool);
    fn set_command_enabled(&mut self, command: CommandId, enabled: bool);
    fn show_message(&mut self, message: &str);
}

/// Entry points the host calls on the plugin
pub trait PluginCommands {
    fn invoke(&mut self, host: &mut dyn HostEditor, command: CommandId);
    fn send_text(&mut self, host: &mut dyn HostEditor, text: &str);
    fn show_config(&mut self, host: &mut dyn HostEditor);
    fn show_about(&mut self, host: &mut dyn HostEditor);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alt_chords_map_to_commands() {
        let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::ALT);
        assert_eq!(command_for(&key), Some(CommandId::SendSelection));
        let key = KeyEvent::new(KeyCode::Char('t'), KeyModifiers::ALT);
        assert_eq!(command_for(&key), Some(CommandId::ToggleSession));
    }

    #[test]
    fn plain_and_other_chords_are_unbound() {
        assert_eq!(command_for(&KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE)), None);
        assert_eq!(
            command_for(&KeyEvent::new(KeyCode::Char('s'), KeyModifiers::ALT | KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn every_command_has_one_shortcut() {
        for command in [
            CommandId::ToggleSession,
            CommandId::SendSelection,
            CommandId::ShowConfiguration,
            CommandId::ShowAbout,
        ] {
            assert_eq!(SHORTCUTS.iter().filter(|b| b.command == command).count(), 1);
        }
    }
}
