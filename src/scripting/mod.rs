//! Rhai runtime for the user's `init.rhai`
//!
//! Settings are exposed under the `replpane` namespace:
//! - `replpane::process::*` - executable, arguments, stop timeout
//! - `replpane::editor::*` - tabs, echo, theme, restart marker

mod api;
mod engine;

pub use engine::ScriptEngine;
