//! The boundary between the console plugin and the editor hosting it.
//!
//! The host implements [`HostEditor`]; the plugin answers through
//! [`PluginAdapter`], which implements [`PluginCommands`].

mod adapter;
mod clipboard;
mod commands;

pub use adapter::{NAME, PluginAdapter, VERSION};
pub use commands::{CommandId, HostEditor, HostNotification, PluginCommands, command_for};
