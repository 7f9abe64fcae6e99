//! The Rhai engine that runs `init.rhai`
//!
//! Provides the `replpane` namespace:
//! - `replpane::process::*` - how the interpreter is launched
//! - `replpane::editor::*` - console behaviour and theme

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use rhai::{Engine, Scope};

use super::api;
use crate::config::{ConfigError, Settings};

pub struct ScriptEngine {
    engine: Engine,
    settings: Arc<RwLock<Settings>>,
}

impl ScriptEngine {
    /// Create an engine whose scripts start from `settings`
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(RwLock::new(settings));
        let engine = Self::create_engine(Arc::clone(&settings));
        Self { engine, settings }
    }

    fn create_engine(settings: Arc<RwLock<Settings>>) -> Engine {
        let mut engine = Engine::new();

        // Safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_operations(100_000);

        let mut root = rhai::Module::new();
        root.set_sub_module("process", api::process::create_module(Arc::clone(&settings)));
        root.set_sub_module("editor", api::editor::create_module(Arc::clone(&settings)));
        engine.register_static_module("replpane", root.into());

        engine.on_print(|msg| tracing::info!(target: "replpane::script", "{msg}"));
        engine.on_debug(|msg, _, pos| tracing::debug!(target: "replpane::script", "{pos:?}: {msg}"));

        engine
    }

    /// Load and execute a script file
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.eval(&content)
    }

    /// Evaluate a Rhai script string
    pub fn eval(&mut self, script: &str) -> Result<(), ConfigError> {
        let ast = self
            .engine
            .compile(script)
            .map_err(|e| ConfigError::Script(format!("init script parse error: {e}")))?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ConfigError::Script(format!("init script error: {e}")))
    }

    /// Current settings (cloned)
    pub fn settings(&self) -> Settings {
        self.settings.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Default script location
    pub fn script_file() -> Option<PathBuf> {
        Settings::config_dir().map(|p| p.join("init.rhai"))
    }

    /// Run the default script if it exists
    pub fn load_default(&mut self) -> Result<(), ConfigError> {
        match Self::script_file() {
            Some(path) if path.exists() => self.load_file(&path),
            _ => Ok(()), // No script is fine
        }
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_settings_are_scriptable() {
        let mut engine = ScriptEngine::default();
        engine
            .eval(
                r#"
                replpane::process::set_executable("fsharpi");
                replpane::process::set_arguments("--readline- --quiet");
                replpane::process::set_stop_timeout_ms(500);
            "#,
            )
            .unwrap();

        let settings = engine.settings();
        assert_eq!(settings.process.executable, "fsharpi");
        assert_eq!(settings.process.arguments, "--readline- --quiet");
        assert_eq!(settings.process.stop_timeout_ms, 500);
    }

    #[test]
    fn editor_settings_are_scriptable() {
        let mut engine = ScriptEngine::default();
        engine
            .eval(
                r#"
                replpane::editor::set_convert_tabs(false);
                replpane::editor::set_tab_length(2);
                replpane::editor::set_echo_sent_text(false);
                replpane::editor::set_theme("nord");
                replpane::editor::set_restart_marker("fsi> ");
            "#,
            )
            .unwrap();

        let settings = engine.settings();
        assert!(!settings.editor.convert_tabs);
        assert_eq!(settings.editor.tab_length, 2);
        assert!(!settings.editor.echo_sent_text);
        assert_eq!(settings.editor.theme, "nord");
        assert_eq!(settings.editor.restart_marker, "fsi> ");
    }

    #[test]
    fn tab_length_is_clamped() {
        let mut engine = ScriptEngine::default();
        engine.eval("replpane::editor::set_tab_length(100);").unwrap();
        assert_eq!(engine.settings().editor.tab_length, 16);
        engine.eval("replpane::editor::set_tab_length(0);").unwrap();
        assert_eq!(engine.settings().editor.tab_length, 1);
    }

    #[test]
    fn scripts_start_from_given_settings() {
        let mut stored = Settings::default();
        stored.process.executable = "stored-exe".to_string();
        let mut engine = ScriptEngine::new(stored);
        engine
            .eval(
                r#"
                if replpane::process::get_executable() != "stored-exe" {
                    throw "stored settings not visible";
                }
            "#,
            )
            .unwrap();
    }

    #[test]
    fn list_themes_is_not_empty() {
        let mut engine = ScriptEngine::default();
        engine
            .eval(
                r#"
                let themes = replpane::editor::list_themes();
                if themes.len() == 0 {
                    throw "No themes returned";
                }
            "#,
            )
            .unwrap();
    }

    #[test]
    fn syntax_errors_are_reported() {
        let mut engine = ScriptEngine::default();
        let err = engine.eval("replpane::editor::set_tab_length(").unwrap_err();
        assert!(matches!(err, ConfigError::Script(_)));
    }

    #[test]
    fn load_file_reads_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("init.rhai");
        std::fs::write(&path, r#"replpane::editor::set_theme("dracula");"#).unwrap();

        let mut engine = ScriptEngine::default();
        engine.load_file(&path).unwrap();
        assert_eq!(engine.settings().editor.theme, "dracula");
    }
}
