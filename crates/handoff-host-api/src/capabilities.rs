//! Per-platform launch policy

use serde::{Deserialize, Serialize};

/// How the update handoff is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffLaunch {
    /// Inside a visible terminal emulator, so the user can follow the update
    VisibleTerminal,
    /// Directly, through the platform shell
    Shell,
}

/// Describes how a platform launches the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPolicy {
    /// Launch mode for the `update` handoff
    pub handoff: HandoffLaunch,

    /// Restore execute permissions on the updater after it replaced itself
    pub repair_permissions: bool,
}

impl LaunchPolicy {
    /// Linux desktops do not guarantee a console, and replaced binaries can
    /// lose their execute bit
    pub fn linux() -> Self {
        Self {
            handoff: HandoffLaunch::VisibleTerminal,
            repair_permissions: true,
        }
    }

    pub fn windows() -> Self {
        Self {
            handoff: HandoffLaunch::Shell,
            repair_permissions: false,
        }
    }

    pub fn macos() -> Self {
        Self {
            handoff: HandoffLaunch::Shell,
            repair_permissions: false,
        }
    }
}
