//! Platform and process-launch interfaces for handoff
//!
//! This crate defines the boundary between the orchestrator and the host:
//! - One platform strategy per supported OS (executable names, launch policy)
//! - The platform resolver (which files exist in the working directory)
//! - The process launcher trait and its launch descriptions
//! - A mock launcher for tests
//!
//! It contains no process-spawning code itself.

mod capabilities;
mod handle;
mod launch;
mod mock;
mod platform;
mod resolver;
mod traits;

pub use capabilities::*;
pub use handle::*;
pub use launch::*;
pub use mock::*;
pub use platform::*;
pub use resolver::*;
pub use traits::*;
