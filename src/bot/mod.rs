//! Bot module for handling Telegram interactions
//!
//! - `message_handler`: routes incoming messages and runs the photo pipeline
//! - `lifecycle`: operator notices and session teardown around the polling loop

pub mod lifecycle;
pub mod message_handler;

// Re-export main handler functions for use in main.rs
pub use lifecycle::{on_shutdown, on_startup, run};
pub use message_handler::{dispatch, handle_photo, handle_start, message_handler};
