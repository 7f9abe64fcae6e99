mod settings;

pub use settings::{ConfigError, MAX_TAB_LENGTH, MIN_TAB_LENGTH, Settings};

use crate::scripting::ScriptEngine;

/// Load the persisted settings, then let the user's init script adjust them.
///
/// Problems are returned alongside usable settings rather than failing.
pub fn load() -> (Settings, Vec<ConfigError>) {
    let mut problems = Vec::new();

    let stored = match Settings::store_path() {
        Some(path) => Settings::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("settings store unusable, using defaults: {e}");
            problems.push(e);
            Settings::default()
        }),
        None => Settings::default(),
    };

    let mut engine = ScriptEngine::new(stored);
    if let Err(e) = engine.load_default() {
        tracing::warn!("init script failed: {e}");
        problems.push(e);
    }

    let settings = engine.settings();
    tracing::info!(
        executable = %settings.process.executable,
        theme = %settings.editor.theme,
        "settings loaded"
    );
    (settings, problems)
}
