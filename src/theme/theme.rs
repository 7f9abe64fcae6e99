use super::Color;
use crate::console::TextStyle;

/// Colours the console pane paints with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsolePalette {
    pub background: Color,
    /// Typed and echoed input
    pub input: Color,
    /// Interpreter stdout
    pub result: Color,
    /// Interpreter stderr
    pub error: Color,
    pub selection: Color,
    /// Caret colour while it sits in read-only history
    pub readonly_cursor: Color,
}

impl ConsolePalette {
    pub fn color_for(&self, style: TextStyle) -> Color {
        match style {
            TextStyle::Input => self.input,
            TextStyle::Result => self.result,
            TextStyle::Error => self.error,
        }
    }
}

impl Default for ConsolePalette {
    fn default() -> Self {
        Theme::default().console
    }
}

/// Complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // Editor chrome
    pub background: Color,
    pub foreground: Color,
    pub selection: Color,

    // UI elements
    pub line_number: Color,
    pub line_number_active: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub pane_border: Color,
    pub pane_border_active: Color,

    // Status line messages and a stopped console
    pub error: Color,
    pub info: Color,

    pub console: ConsolePalette,
}

impl Theme {
    /// Gruvbox Dark - warm retro theme
    pub fn gruvbox_dark() -> Self {
        Self {
            name: "gruvbox-dark".to_string(),
            background: Color::hex(0x282828),
            foreground: Color::hex(0xebdbb2),
            selection: Color::hex(0x504945),

            line_number: Color::hex(0x665c54),
            line_number_active: Color::hex(0xfabd2f),
            status_bar_bg: Color::hex(0x3c3836),
            status_bar_fg: Color::hex(0xebdbb2),
            pane_border: Color::hex(0x504945),
            pane_border_active: Color::hex(0xfe8019),

            error: Color::hex(0xfb4934),
            info: Color::hex(0x83a598),

            console: ConsolePalette {
                background: Color::hex(0x1d2021),
                input: Color::hex(0x83a598),
                result: Color::hex(0xebdbb2),
                error: Color::hex(0xfb4934),
                selection: Color::hex(0x504945),
                readonly_cursor: Color::hex(0x665c54),
            },
        }
    }

    /// Gruvbox Light
    pub fn gruvbox_light() -> Self {
        Self {
            name: "gruvbox-light".to_string(),
            background: Color::hex(0xfbf1c7),
            foreground: Color::hex(0x3c3836),
            selection: Color::hex(0xebdbb2),

            line_number: Color::hex(0xa89984),
            line_number_active: Color::hex(0xb57614),
            status_bar_bg: Color::hex(0xebdbb2),
            status_bar_fg: Color::hex(0x3c3836),
            pane_border: Color::hex(0xd5c4a1),
            pane_border_active: Color::hex(0xd65d0e),

            error: Color::hex(0x9d0006),
            info: Color::hex(0x076678),

            // Closest to the classic console look: black results, red errors
            console: ConsolePalette {
                background: Color::hex(0xf9f5d7),
                input: Color::hex(0x076678),
                result: Color::BLACK,
                error: Color::hex(0xcc241d),
                selection: Color::hex(0xebdbb2),
                readonly_cursor: Color::hex(0xa89984),
            },
        }
    }

    /// Nord - arctic, north-bluish color palette
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            background: Color::hex(0x2e3440),
            foreground: Color::hex(0xd8dee9),
            selection: Color::hex(0x434c5e),

            line_number: Color::hex(0x4c566a),
            line_number_active: Color::hex(0xd8dee9),
            status_bar_bg: Color::hex(0x3b4252),
            status_bar_fg: Color::hex(0xd8dee9),
            pane_border: Color::hex(0x4c566a),
            pane_border_active: Color::hex(0x88c0d0),

            error: Color::hex(0xbf616a),
            info: Color::hex(0x81a1c1),

            console: ConsolePalette {
                background: Color::hex(0x242933),
                input: Color::hex(0x88c0d0),
                result: Color::hex(0xeceff4),
                error: Color::hex(0xbf616a),
                selection: Color::hex(0x434c5e),
                readonly_cursor: Color::hex(0x4c566a),
            },
        }
    }

    /// Dracula - dark theme with vibrant colors
    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            background: Color::hex(0x282a36),
            foreground: Color::hex(0xf8f8f2),
            selection: Color::hex(0x44475a),

            line_number: Color::hex(0x6272a4),
            line_number_active: Color::hex(0xf8f8f2),
            status_bar_bg: Color::hex(0x44475a),
            status_bar_fg: Color::hex(0xf8f8f2),
            pane_border: Color::hex(0x44475a),
            pane_border_active: Color::hex(0xbd93f9),

            error: Color::hex(0xff5555),
            info: Color::hex(0x8be9fd),

            console: ConsolePalette {
                background: Color::hex(0x21222c),
                input: Color::hex(0x8be9fd),
                result: Color::hex(0xf8f8f2),
                error: Color::hex(0xff5555),
                selection: Color::hex(0x44475a),
                readonly_cursor: Color::hex(0x6272a4),
            },
        }
    }

    /// Solarized Dark
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            background: Color::hex(0x002b36),
            foreground: Color::hex(0x839496),
            selection: Color::hex(0x073642),

            line_number: Color::hex(0x586e75),
            line_number_active: Color::hex(0x93a1a1),
            status_bar_bg: Color::hex(0x073642),
            status_bar_fg: Color::hex(0x839496),
            pane_border: Color::hex(0x586e75),
            pane_border_active: Color::hex(0x268bd2),

            error: Color::hex(0xdc322f),
            info: Color::hex(0x268bd2),

            console: ConsolePalette {
                background: Color::hex(0x00212b),
                input: Color::hex(0x2aa198),
                result: Color::hex(0x93a1a1),
                error: Color::hex(0xdc322f),
                selection: Color::hex(0x073642),
                readonly_cursor: Color::hex(0x586e75),
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::gruvbox_dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_maps_styles_to_colors() {
        let palette = Theme::gruvbox_light().console;
        assert_eq!(palette.color_for(TextStyle::Result), Color::BLACK);
        assert_eq!(palette.color_for(TextStyle::Error), Color::hex(0xcc241d));
        assert_eq!(palette.color_for(TextStyle::Input), palette.input);
    }

    #[test]
    fn error_output_stands_out_from_results() {
        for theme in [
            Theme::gruvbox_dark(),
            Theme::gruvbox_light(),
            Theme::nord(),
            Theme::dracula(),
            Theme::solarized_dark(),
        ] {
            assert_ne!(theme.console.result, theme.console.error, "{}", theme.name);
            assert_ne!(theme.console.result, theme.console.background, "{}", theme.name);
        }
    }
}
