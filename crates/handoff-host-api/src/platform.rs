//! Platform strategies
//!
//! The host OS is inspected once, yielding one [`Platform`] value that
//! answers every platform-specific question afterwards.

use handoff_api::ProductIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{HostError, HostResult, LaunchPolicy};

/// Supported host operating systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Windows,
    Linux,
    MacOs,
}

impl PlatformKind {
    /// Map a `std::env::consts::OS` value
    pub fn from_os(os: &str) -> HostResult<Self> {
        match os {
            "windows" => Ok(PlatformKind::Windows),
            "linux" => Ok(PlatformKind::Linux),
            "macos" => Ok(PlatformKind::MacOs),
            other => Err(HostError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn current() -> HostResult<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// OS part of the platform dist
    pub fn dist_prefix(&self) -> &'static str {
        match self {
            PlatformKind::Windows => "win",
            PlatformKind::Linux => "linux",
            PlatformKind::MacOs => "osx",
        }
    }

    /// `<os>-<arch>` dist for the given `std::env::consts::ARCH` value
    pub fn dist_for_arch(&self, arch: &str) -> String {
        let arch = match arch {
            "x86_64" => "x64",
            "x86" => "x86",
            "aarch64" => "arm64",
            "arm" => "arm",
            other => other,
        };
        format!("{}-{}", self.dist_prefix(), arch)
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformKind::Windows => f.write_str("windows"),
            PlatformKind::Linux => f.write_str("linux"),
            PlatformKind::MacOs => f.write_str("macos"),
        }
    }
}

/// Platform strategy: naming conventions and launch policy of one OS
pub trait Platform: Send + Sync + fmt::Debug {
    fn kind(&self) -> PlatformKind;

    /// Executable the updater relaunches after replacing files
    fn self_executable_name(&self, product: &ProductIdentity) -> String;

    /// Updater file looked up in the working directory
    fn updater_file_name(&self, product: &ProductIdentity) -> String;

    /// Updater artifact published on the server, `None` if the platform has
    /// no supported updater download
    fn updater_download_name(&self, product: &ProductIdentity) -> Option<String> {
        Some(self.updater_file_name(product))
    }

    fn launch_policy(&self) -> LaunchPolicy;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Windows
    }

    fn self_executable_name(&self, product: &ProductIdentity) -> String {
        format!("{}.exe", product.app_name)
    }

    fn updater_file_name(&self, product: &ProductIdentity) -> String {
        format!("{}.exe", product.updater_name)
    }

    fn launch_policy(&self) -> LaunchPolicy {
        LaunchPolicy::windows()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPlatform;

impl Platform for LinuxPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Linux
    }

    fn self_executable_name(&self, product: &ProductIdentity) -> String {
        product.app_name.clone()
    }

    fn updater_file_name(&self, product: &ProductIdentity) -> String {
        product.updater_name.clone()
    }

    fn launch_policy(&self) -> LaunchPolicy {
        LaunchPolicy::linux()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MacOsPlatform;

impl Platform for MacOsPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::MacOs
    }

    fn self_executable_name(&self, product: &ProductIdentity) -> String {
        let bundle = product.bundle_name.as_deref().unwrap_or(&product.app_name);
        format!("{bundle}.app")
    }

    fn updater_file_name(&self, product: &ProductIdentity) -> String {
        product.updater_name.clone()
    }

    // No updater is published for macOS
    fn updater_download_name(&self, _product: &ProductIdentity) -> Option<String> {
        None
    }

    fn launch_policy(&self) -> LaunchPolicy {
        LaunchPolicy::macos()
    }
}

/// Strategy for a platform kind
pub fn platform_for(kind: PlatformKind) -> Arc<dyn Platform> {
    match kind {
        PlatformKind::Windows => Arc::new(WindowsPlatform),
        PlatformKind::Linux => Arc::new(LinuxPlatform),
        PlatformKind::MacOs => Arc::new(MacOsPlatform),
    }
}

/// Strategy for the host OS; fails on anything but Windows, Linux and macOS
pub fn current_platform() -> HostResult<Arc<dyn Platform>> {
    PlatformKind::current().map(platform_for)
}
