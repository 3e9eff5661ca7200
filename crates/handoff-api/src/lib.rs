//! Shared types for handoff
//!
//! This crate defines the vocabulary used between the orchestrator, the
//! platform layer and callers:
//! - Updater verbs and their wire names
//! - Update checks, version probes and changelogs
//! - Orchestrator states and handoff outcomes
//! - Product identity (names and version of the running application)

mod state;
mod types;

pub use state::*;
pub use types::*;

/// Version assumed for any updater that cannot report its own.
///
/// The first updater release predates the `version` verb.
pub const OLDEST_UPDATER_VERSION: u32 = 1;

/// Application versions at or below this predate updater version reporting.
pub const LEGACY_APP_VERSION_CEILING: u32 = 4;

/// Marker prefixed to base64-encoded startup arguments on the reboot path.
pub const STARTUP_ARGS_MARKER: &str = "BASE64:";
