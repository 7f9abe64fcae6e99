//! One interpreter session: a process channel feeding a console widget.

mod controller;
mod delimiter;

pub use controller::{Session, SessionNotification};
