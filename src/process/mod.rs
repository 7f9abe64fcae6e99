//! Child process with piped standard streams.
//!
//! Two reader threads per process (stdout, stderr) post decoded output to the
//! control thread through an unbounded tokio channel. Writes to stdin happen
//! on the caller's thread.

mod args;
mod channel;
mod event;

pub use channel::{ChannelError, ProcessChannel};
pub use event::{ChannelEvent, OutputStream};
