//! Shared types for the handoff API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verbs understood by the external updater binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Exit with the updater's own version as the exit code
    Version,
    /// Report whether an update is available via the exit code
    Check,
    /// Wait for the listed processes, replace files, relaunch
    Update,
    /// Upgrade the updater binary itself
    #[serde(rename = "updateself")]
    UpdateSelf,
    /// Relaunch the application without updating (diagnostic)
    Reboot,
}

impl Verb {
    /// Name as passed on the updater command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Version => "version",
            Verb::Check => "check",
            Verb::Update => "update",
            Verb::UpdateSelf => "updateself",
            Verb::Reboot => "reboot",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meaning of the `check` verb's exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateAvailability {
    /// Exit code 1
    Available,
    /// Exit code 2
    UpToDate,
    /// Any other exit code (including crashes); reported as no update
    Unrecognized { exit_code: Option<i32> },
}

impl UpdateAvailability {
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(1) => UpdateAvailability::Available,
            Some(2) => UpdateAvailability::UpToDate,
            other => UpdateAvailability::Unrecognized { exit_code: other },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, UpdateAvailability::Available)
    }
}

/// Result of running the updater's `check` verb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub availability: UpdateAvailability,
    /// Version from the last `"<banner> Updater v<N>"` line, if any was printed
    pub updater_version: Option<u32>,
}

impl UpdateCheck {
    pub fn update_available(&self) -> bool {
        self.availability.is_available()
    }
}

/// Outcome of asking the updater binary for its own version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionProbe {
    pub version: u32,
    /// False when the updater could not be asked; `version` is then the floor
    pub found: bool,
}

impl VersionProbe {
    pub fn found(version: u32) -> Self {
        Self {
            version: version.max(crate::OLDEST_UPDATER_VERSION),
            found: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            version: crate::OLDEST_UPDATER_VERSION,
            found: false,
        }
    }

    /// Interpret the `version` verb's exit code; zero, negative or missing
    /// codes floor to the oldest updater version.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        let version = code
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or(crate::OLDEST_UPDATER_VERSION);
        Self::found(version)
    }
}

/// Release notes for a target version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    pub version: u32,
    pub server: String,
    pub platform: String,
    pub text: String,
}

/// What happened when handing control to the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandoffOutcome {
    /// The updater was started; the application should exit
    HandedOff { pid: u32 },
    /// A visible terminal was required but none was found, nothing was started
    NoTerminal,
}

impl HandoffOutcome {
    pub fn handed_off(&self) -> bool {
        matches!(self, HandoffOutcome::HandedOff { .. })
    }
}

/// Names and version of the application being updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductIdentity {
    /// Executable stem of the running application (e.g. `Grayjay`)
    pub app_name: String,
    /// Version of the running application
    pub app_version: u32,
    /// Executable stem of the updater binary
    pub updater_name: String,
    /// Product name printed by the updater as `"<banner> Updater v<N>"`
    pub banner: String,
    /// macOS `.app` bundle stem; defaults to `app_name`
    pub bundle_name: Option<String>,
    /// Platform dist used to namespace remote artifacts; derived when absent
    pub platform_dist: Option<String>,
}

impl ProductIdentity {
    pub fn new(
        app_name: impl Into<String>,
        app_version: u32,
        updater_name: impl Into<String>,
        banner: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            app_version,
            updater_name: updater_name.into(),
            banner: banner.into(),
            bundle_name: None,
            platform_dist: None,
        }
    }

    pub fn with_bundle_name(mut self, bundle_name: impl Into<String>) -> Self {
        self.bundle_name = Some(bundle_name.into());
        self
    }

    pub fn with_platform_dist(mut self, dist: impl Into<String>) -> Self {
        self.platform_dist = Some(dist.into());
        self
    }

    /// True when the running application predates updater version reporting
    pub fn is_legacy(&self) -> bool {
        self.app_version <= crate::LEGACY_APP_VERSION_CEILING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_wire_names() {
        assert_eq!(Verb::Version.as_str(), "version");
        assert_eq!(Verb::Check.as_str(), "check");
        assert_eq!(Verb::Update.as_str(), "update");
        assert_eq!(Verb::UpdateSelf.as_str(), "updateself");
        assert_eq!(Verb::Reboot.to_string(), "reboot");
    }

    #[test]
    fn verb_serde_matches_wire_name() {
        let json = serde_json::to_string(&Verb::UpdateSelf).unwrap();
        assert_eq!(json, "\"updateself\"");
    }

    #[test]
    fn availability_only_for_exit_code_one() {
        assert!(UpdateAvailability::from_exit_code(Some(1)).is_available());
        assert_eq!(
            UpdateAvailability::from_exit_code(Some(2)),
            UpdateAvailability::UpToDate
        );
        for code in [-1, 0, 3, 127, 255] {
            let availability = UpdateAvailability::from_exit_code(Some(code));
            assert!(!availability.is_available(), "exit code {code}");
        }
        assert!(!UpdateAvailability::from_exit_code(None).is_available());
    }

    #[test]
    fn version_probe_floors_at_one() {
        for (code, expected) in [(-7, 1), (0, 1), (1, 1), (2, 2), (42, 42)] {
            assert_eq!(VersionProbe::from_exit_code(Some(code)).version, expected);
        }
        assert_eq!(VersionProbe::from_exit_code(None).version, 1);
        assert!(!VersionProbe::not_found().found);
        assert_eq!(VersionProbe::not_found().version, 1);
    }

    #[test]
    fn legacy_marker() {
        let product = ProductIdentity::new("App", 4, "App.Updater", "App");
        assert!(product.is_legacy());
        let product = ProductIdentity::new("App", 5, "App.Updater", "App");
        assert!(!product.is_legacy());
    }

    #[test]
    fn handoff_outcome_serialization() {
        let json = serde_json::to_string(&HandoffOutcome::HandedOff { pid: 7 }).unwrap();
        assert_eq!(json, r#"{"kind":"handed_off","pid":7}"#);
        assert!(!HandoffOutcome::NoTerminal.handed_off());
    }
}
