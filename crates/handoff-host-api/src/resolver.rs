//! Platform resolver

use handoff_api::ProductIdentity;
use handoff_util::{UPDATER_CONFIG_FILE, resolve_existing};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{HostResult, LaunchPolicy, Platform, PlatformKind, current_platform};

/// Answers where the running application, the updater and its config are.
///
/// File lookups are relative to `base_dir` and only succeed for files that
/// exist, so a missing updater reads as "no updater present".
#[derive(Debug, Clone)]
pub struct PlatformResolver {
    platform: Arc<dyn Platform>,
    product: ProductIdentity,
    base_dir: PathBuf,
}

impl PlatformResolver {
    pub fn new(
        platform: Arc<dyn Platform>,
        product: ProductIdentity,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            platform,
            product,
            base_dir: base_dir.into(),
        }
    }

    /// Resolver for the host OS; fails on unsupported platforms
    pub fn for_current_os(product: ProductIdentity, base_dir: impl Into<PathBuf>) -> HostResult<Self> {
        Ok(Self::new(current_platform()?, product, base_dir))
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn kind(&self) -> PlatformKind {
        self.platform.kind()
    }

    pub fn product(&self) -> &ProductIdentity {
        &self.product
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn launch_policy(&self) -> LaunchPolicy {
        self.platform.launch_policy()
    }

    /// Executable the updater relaunches (passed as `-executable`)
    pub fn self_executable_path(&self) -> String {
        self.platform.self_executable_name(&self.product)
    }

    /// Updater artifact name on the server, if this platform has one
    pub fn updater_download_name(&self) -> Option<String> {
        self.platform.updater_download_name(&self.product)
    }

    /// Absolute path of the updater binary, only if it exists
    pub fn updater_path(&self) -> Option<PathBuf> {
        resolve_existing(&self.base_dir, &self.platform.updater_file_name(&self.product))
    }

    /// Absolute path of `UpdaterConfig.json`, only if it exists
    pub fn config_path(&self) -> Option<PathBuf> {
        resolve_existing(&self.base_dir, UPDATER_CONFIG_FILE)
    }

    /// Platform dist used to namespace remote artifacts
    pub fn platform_dist(&self) -> String {
        match &self.product.platform_dist {
            Some(dist) => dist.clone(),
            None => self.kind().dist_for_arch(std::env::consts::ARCH),
        }
    }
}
