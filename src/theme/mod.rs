mod colors;
mod theme;

pub use colors::Color;
pub use theme::{ConsolePalette, Theme};

pub fn list_builtin_themes() -> Vec<&'static str> {
    vec![
        "gruvbox-dark",
        "gruvbox-light",
        "nord",
        "dracula",
        "solarized-dark",
    ]
}

pub fn get_builtin_theme(name: &str) -> Option<Theme> {
    match name {
        "gruvbox-dark" => Some(Theme::gruvbox_dark()),
        "gruvbox-light" => Some(Theme::gruvbox_light()),
        "nord" => Some(Theme::nord()),
        "dracula" => Some(Theme::dracula()),
        "solarized-dark" => Some(Theme::solarized_dark()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_theme_resolves() {
        for name in list_builtin_themes() {
            let theme = get_builtin_theme(name).unwrap();
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn unknown_theme_is_none() {
        assert!(get_builtin_theme("no-such-theme").is_none());
    }
}
