//! replpane::editor - console behaviour and theme
//!
//! Usage in Rhai:
//! ```rhai
//! replpane::editor::set_tab_length(2);
//! replpane::editor::set_theme("nord");
//! ```

use rhai::plugin::*;
use std::sync::{Arc, RwLock};

use crate::config::{MAX_TAB_LENGTH, MIN_TAB_LENGTH, Settings};

pub fn create_module(settings: Arc<RwLock<Settings>>) -> rhai::Module {
    let mut module = rhai::Module::new();

    // set_convert_tabs(enabled: bool)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_convert_tabs",
            move |enabled: bool| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.editor.convert_tabs = enabled;
                }
                Ok(())
            },
        );
    }

    // set_tab_length(length: i64)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_tab_length",
            move |length: i64| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.editor.tab_length =
                        length.clamp(MIN_TAB_LENGTH as i64, MAX_TAB_LENGTH as i64) as usize;
                }
                Ok(())
            },
        );
    }

    // get_tab_length() -> i64
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "get_tab_length",
            move || -> Result<i64, Box<EvalAltResult>> {
                Ok(s.read().map(|s| s.editor.tab_length as i64).unwrap_or(4))
            },
        );
    }

    // set_echo_sent_text(enabled: bool)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_echo_sent_text",
            move |enabled: bool| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.editor.echo_sent_text = enabled;
                }
                Ok(())
            },
        );
    }

    // set_theme(name: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_theme",
            move |name: &str| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.editor.theme = name.to_string();
                }
                Ok(())
            },
        );
    }

    // set_restart_marker(marker: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_restart_marker",
            move |marker: &str| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.editor.restart_marker = marker.to_string();
                }
                Ok(())
            },
        );
    }

    // list_themes() -> Array
    module.set_native_fn(
        "list_themes",
        || -> Result<rhai::Array, Box<EvalAltResult>> {
            Ok(crate::theme::list_builtin_themes()
                .into_iter()
                .map(|s| rhai::Dynamic::from(s.to_string()))
                .collect())
        },
    );

    module
}
