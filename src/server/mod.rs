//! Server core functionality
//!
//! Local socket listener that feeds request frames to the dispatcher.

pub mod listener;

pub use listener::{Server, handle_connection};
