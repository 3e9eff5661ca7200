//! Native process launcher for handoff
//!
//! Provides:
//! - Updater invocations run to completion with line-by-line stdout capture
//! - Detached handoff launches that outlive the application
//! - Shell command-line rendering per platform
//! - Terminal emulator discovery for visible launches on Linux

mod launcher;
mod process;
mod terminal;

pub use launcher::*;
pub use process::*;
pub use terminal::*;
