//! Shared utilities for handoff
//!
//! This crate provides:
//! - Process identifier sets in their comma-joined wire form
//! - Resolution of files that must exist in the working directory
//! - Default paths for the tool's own settings

mod ids;
mod paths;

pub use ids::*;
pub use paths::*;
