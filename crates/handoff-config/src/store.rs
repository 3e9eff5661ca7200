//! Updater config store

use handoff_util::resolve_existing;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{UPDATER_CONFIG_FILE, UpdaterConfig, load_updater_config};

/// Loads `UpdaterConfig.json` from a working directory.
///
/// Nothing is cached: every [`ConfigStore::load`] resolves and reads the file
/// again, so a config dropped in by the distribution is picked up on the next
/// query.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    base_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute path of the config, only if the file exists
    pub fn path(&self) -> Option<PathBuf> {
        resolve_existing(&self.base_dir, UPDATER_CONFIG_FILE)
    }

    /// Load the current config.
    ///
    /// A missing, unreadable or malformed file yields `None`; the reason is
    /// logged rather than returned.
    pub fn load(&self) -> Option<UpdaterConfig> {
        let Some(path) = self.path() else {
            warn!(
                dir = %self.base_dir.display(),
                file = UPDATER_CONFIG_FILE,
                "Failed to get updater config: file not found"
            );
            return None;
        };

        match load_updater_config(&path) {
            Ok(config) => {
                debug!(
                    path = %path.display(),
                    server = ?config.server,
                    version = config.version,
                    "Loaded updater config"
                );
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to get updater config");
                None
            }
        }
    }
}
