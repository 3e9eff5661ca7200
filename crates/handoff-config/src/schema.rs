//! Raw configuration schema

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `UpdaterConfig.json` as written by the update distribution
///
/// Keys are PascalCase on disk (`Server`, `Version`). Both are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdaterConfig {
    /// Base URL of the update server; absent or empty means no update source
    #[serde(default)]
    pub server: Option<String>,

    /// Pinned target version; values above zero bypass the remote lookup.
    /// A value outside the 32-bit range makes the whole file malformed.
    #[serde(default)]
    pub version: i32,
}

impl UpdaterConfig {
    /// True iff a non-empty server is configured
    pub fn has_valid_server(&self) -> bool {
        self.server.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The configured server, if valid
    pub fn valid_server(&self) -> Option<&str> {
        self.server.as_deref().filter(|s| !s.is_empty())
    }

    /// The operator-pinned version, if one is set
    pub fn pinned_version(&self) -> Option<u32> {
        if self.version > 0 {
            u32::try_from(self.version).ok()
        } else {
            None
        }
    }
}

/// Raw settings as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSettings {
    /// Identity of the application being updated
    pub product: RawProduct,

    /// Handoff behavior
    #[serde(default)]
    pub handoff: RawHandoff,
}

/// Product identity section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawProduct {
    pub app_name: String,

    pub app_version: u32,

    pub updater_name: String,

    /// Name in the updater's `"<banner> Updater v<N>"` line
    pub banner: String,

    /// macOS bundle stem (without `.app`)
    pub bundle_name: Option<String>,

    /// Override for the derived `<os>-<arch>` platform dist
    pub platform_dist: Option<String>,
}

/// Handoff behavior section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawHandoff {
    /// Seconds to wait after a self-update before touching the updater binary
    pub settle_seconds: Option<u64>,

    /// Directory holding the updater binary and `UpdaterConfig.json`
    pub working_dir: Option<PathBuf>,
}
