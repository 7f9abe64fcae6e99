//! API modules for the `replpane` namespace
//!
//! Each submodule provides functions under `replpane::<module>::*`

pub mod editor;
pub mod process;
