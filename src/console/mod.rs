//! Scrollback console: append-only history with an editable input tail.

mod boundary;
mod buffer;
mod widget;

pub use buffer::TextStyle;
pub use widget::{ConsoleAction, ConsoleWidget, KeyOutcome, TabPolicy};

/// Line terminator written after submitted statements
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";
