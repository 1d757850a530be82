//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background fetch and live-stream event processing
//! - `helpers` - Spawning of background fetches
//! - `render` - Screen layout, header, affordance and footer
//! - `list` - Feed list widget
//! - `rows` - Rendering of one entry into a row
//! - `status` - Status bar widget
//! - `help` - Keybinding overlay

mod events;
mod help;
mod helpers;
mod input;
mod list;
mod loop_runner;
mod render;
pub(crate) mod rows;
mod status;

pub(crate) use helpers::spawn_load;
pub use loop_runner::run;
use loop_runner::Action;
