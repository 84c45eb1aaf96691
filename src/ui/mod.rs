//! Terminal User Interface module.
//!
//! The rendering layer of the feed client. It owns no feed logic: key presses
//! become `App` calls, and any fetch the feed controller asks for is run as a
//! background task whose completion comes back over the `AppEvent` channel.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `tasks` - Spawning API fetches
//! - `render` - Layout and overlay dispatch
//! - `header` - Title, category tabs, range selector
//! - `articles` - Article list widget
//! - `status` - Status bar widget
//! - `help` - Key binding overlay

mod articles;
mod events;
mod header;
mod help;
mod input;
mod loop_runner;
mod render;
mod status;
mod tasks;

pub use loop_runner::{run, Action};
