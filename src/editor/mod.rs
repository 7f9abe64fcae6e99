//! The host editor: a small modal text editor the console is embedded in.

mod buffer;
mod cursor;
mod editor;
mod mode;

pub use buffer::Buffer;
pub use cursor::Cursor;
pub use editor::{Editor, EditorRequest};
pub use mode::Mode;
