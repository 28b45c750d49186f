//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and paste handling
//! - `render` - Layout, overlays and the too-small guard
//! - `snippets` - Snippet list panel
//! - `urls` - URL deck list panel
//! - `viewer` - Current-entry viewer pane
//! - `status` - Status bar widget

mod input;
mod loop_runner;
mod render;
mod snippets;
mod status;
mod urls;
mod viewer;

// Re-export the public API
pub use loop_runner::{run, Action};
