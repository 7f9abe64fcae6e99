//! replpane::process - how the interpreter is launched
//!
//! Usage in Rhai:
//! ```rhai
//! replpane::process::set_executable("dotnet");
//! replpane::process::set_arguments("fsi --readline-");
//! ```

use rhai::plugin::*;
use std::sync::{Arc, RwLock};

use crate::config::Settings;

pub fn create_module(settings: Arc<RwLock<Settings>>) -> rhai::Module {
    let mut module = rhai::Module::new();

    // set_executable(path: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_executable",
            move |path: &str| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.process.executable = path.to_string();
                }
                Ok(())
            },
        );
    }

    // get_executable() -> String
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "get_executable",
            move || -> Result<String, Box<EvalAltResult>> {
                Ok(s.read()
                    .map(|s| s.process.executable.clone())
                    .unwrap_or_default())
            },
        );
    }

    // set_arguments(args: &str)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_arguments",
            move |args: &str| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.process.arguments = args.to_string();
                }
                Ok(())
            },
        );
    }

    // get_arguments() -> String
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "get_arguments",
            move || -> Result<String, Box<EvalAltResult>> {
                Ok(s.read()
                    .map(|s| s.process.arguments.clone())
                    .unwrap_or_default())
            },
        );
    }

    // set_stop_timeout_ms(ms: i64)
    {
        let s = Arc::clone(&settings);
        module.set_native_fn(
            "set_stop_timeout_ms",
            move |ms: i64| -> Result<(), Box<EvalAltResult>> {
                if let Ok(mut settings) = s.write() {
                    settings.process.stop_timeout_ms = ms.max(0) as u64;
                }
                Ok(())
            },
        );
    }

    module
}
