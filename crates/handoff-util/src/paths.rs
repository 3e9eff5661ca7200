//! Path helpers for handoff
//!
//! The updater binary and `UpdaterConfig.json` live next to the running
//! application, so both are looked up relative to a working directory and
//! only reported when the file actually exists there.
//!
//! The tool's own settings default to
//! `$XDG_CONFIG_HOME/handoff/handoff.toml` or `~/.config/handoff/handoff.toml`;
//! the CLI lets `HANDOFF_SETTINGS` override it.

use std::path::{Path, PathBuf};

/// File name of the updater config, resolved in the working directory
pub const UPDATER_CONFIG_FILE: &str = "UpdaterConfig.json";

/// Settings filename within the config directory
const SETTINGS_FILENAME: &str = "handoff.toml";

/// Application subdirectory name
const APP_DIR: &str = "handoff";

/// Resolve `file_name` inside `base_dir`, returning its absolute path only if
/// the file exists.
///
/// A missing file yields `None` rather than a path to nothing; callers treat
/// that as "not present".
pub fn resolve_existing(base_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let candidate = base_dir.join(file_name);
    if !candidate.is_file() {
        return None;
    }

    Some(std::path::absolute(&candidate).unwrap_or(candidate))
}

/// The directory files are resolved against when none is configured.
pub fn default_working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Default settings path under the user config directory.
pub fn default_settings_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR).join(SETTINGS_FILENAME),
        None => PathBuf::from(SETTINGS_FILENAME),
    }
}
